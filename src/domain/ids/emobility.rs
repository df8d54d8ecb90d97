//! e-Mobility provider and account (eMAId) identifiers
//!
//! `DE-GDF`, `DE*GDF`, `DEGDF` and `DE-GDF-C12345678-X`. The separator
//! of an account id must match throughout.

use std::fmt;
use std::str::FromStr;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::country::Country;
use crate::support::errors::IdParseError;

static PROVIDER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([A-Z]{2})([-*]?)([A-Z0-9]{3})$").expect("valid regex"));
static ACCOUNT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([A-Z]{2})([-*]?)([A-Z0-9]{3})([-*]?)(C[A-Z0-9]{8})(?:([-*]?)([A-Z0-9]))?$")
        .expect("valid regex")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ProviderIdFormat {
    IsoHyphen,
    IsoStar,
    IsoStarless,
}

impl ProviderIdFormat {
    fn from_separator(separator: &str) -> Self {
        match separator {
            "-" => Self::IsoHyphen,
            "*" => Self::IsoStar,
            _ => Self::IsoStarless,
        }
    }

    fn separator(self) -> &'static str {
        match self {
            Self::IsoHyphen => "-",
            Self::IsoStar => "*",
            Self::IsoStarless => "",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EMobilityProviderId {
    country: Country,
    code: String,
    format: ProviderIdFormat,
}

impl EMobilityProviderId {
    pub fn parse(text: &str) -> Result<Self, IdParseError> {
        let text = text.trim().to_ascii_uppercase();
        if text.is_empty() {
            return Err(IdParseError::Empty {
                kind: "e-mobility provider id",
            });
        }
        let caps = PROVIDER
            .captures(&text)
            .ok_or_else(|| IdParseError::malformed("e-mobility provider id", text.as_str()))?;
        Ok(Self {
            country: Country::from_alpha2(&caps[1])?,
            format: ProviderIdFormat::from_separator(&caps[2]),
            code: caps[3].to_string(),
        })
    }

    pub fn country(&self) -> Country {
        self.country
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn format(&self) -> ProviderIdFormat {
        self.format
    }
}

impl fmt::Display for EMobilityProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}{}",
            self.country.alpha2,
            self.format.separator(),
            self.code
        )
    }
}

/// Contract id of a driver at an e-mobility provider
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EMobilityAccountId {
    provider_id: EMobilityProviderId,
    instance: String,
    check_digit: Option<char>,
}

impl EMobilityAccountId {
    pub fn parse(text: &str) -> Result<Self, IdParseError> {
        const KIND: &str = "e-mobility account id";

        let text = text.trim().to_ascii_uppercase();
        if text.is_empty() {
            return Err(IdParseError::Empty { kind: KIND });
        }
        let caps = ACCOUNT
            .captures(&text)
            .ok_or_else(|| IdParseError::malformed(KIND, text.as_str()))?;

        let separator = &caps[2];
        let consistent = &caps[4] == separator
            && caps.get(6).map_or(true, |m| m.as_str() == separator);
        if !consistent {
            return Err(IdParseError::malformed(KIND, text.as_str()));
        }

        Ok(Self {
            provider_id: EMobilityProviderId {
                country: Country::from_alpha2(&caps[1])?,
                format: ProviderIdFormat::from_separator(separator),
                code: caps[3].to_string(),
            },
            instance: caps[5].to_string(),
            check_digit: caps.get(7).and_then(|m| m.as_str().chars().next()),
        })
    }

    pub fn try_parse(text: &str) -> Option<Self> {
        Self::parse(text).ok()
    }

    pub fn provider_id(&self) -> &EMobilityProviderId {
        &self.provider_id
    }

    pub fn instance(&self) -> &str {
        &self.instance
    }

    pub fn check_digit(&self) -> Option<char> {
        self.check_digit
    }
}

impl fmt::Display for EMobilityAccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sep = self.provider_id.format.separator();
        write!(f, "{}{}{}", self.provider_id, sep, self.instance)?;
        if let Some(check) = self.check_digit {
            write!(f, "{sep}{check}")?;
        }
        Ok(())
    }
}

macro_rules! string_form_impls {
    ($ty:ident) => {
        impl FromStr for $ty {
            type Err = IdParseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::parse(s)
            }
        }

        impl Serialize for $ty {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.collect_str(self)
            }
        }

        impl<'de> Deserialize<'de> for $ty {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let text = String::deserialize(deserializer)?;
                Self::parse(&text).map_err(serde::de::Error::custom)
            }
        }
    };
}

string_form_impls!(EMobilityProviderId);
string_form_impls!(EMobilityAccountId);
