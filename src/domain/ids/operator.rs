//! Charging station operator identifiers
//!
//! `DE*GEF` (ISO), `DEGEF` (ISO without separator) and `+49*822` (DIN).

use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::country::Country;
use crate::support::errors::IdParseError;

const KIND: &str = "charging station operator id";

static ISO: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([A-Z]{2})(\*?)([A-Z0-9]{3})$").expect("valid regex"));
static DIN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\+?([0-9]{1,3})\*([0-9]{3,6})$").expect("valid regex"));

/// Textual format an operator id (and every id derived from it) is rendered in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OperatorIdFormat {
    Iso,
    IsoStarless,
    Din,
}

/// Operator id; equality ignores the textual format, so `DE*822` and
/// `+49*822` name the same operator.
#[derive(Debug, Clone)]
pub struct ChargingStationOperatorId {
    country: Country,
    code: String,
    format: OperatorIdFormat,
}

impl ChargingStationOperatorId {
    pub fn new(
        country: Country,
        code: impl Into<String>,
        format: OperatorIdFormat,
    ) -> Result<Self, IdParseError> {
        let code = code.into().trim().to_ascii_uppercase();
        let id = Self {
            country,
            code,
            format,
        };
        // Round-trip through the grammar so constructed ids are always parseable
        Self::parse(&id.to_string())
    }

    pub fn parse(text: &str) -> Result<Self, IdParseError> {
        let text = text.trim().to_ascii_uppercase();
        if text.is_empty() {
            return Err(IdParseError::Empty { kind: KIND });
        }
        if let Some(caps) = ISO.captures(&text) {
            return Self::from_iso_parts(&caps[1], &caps[3], !caps[2].is_empty());
        }
        if let Some(caps) = DIN.captures(&text) {
            return Self::from_din_parts(&caps[1], &caps[2]);
        }
        Err(IdParseError::malformed(KIND, text))
    }

    pub fn try_parse(text: &str) -> Option<Self> {
        Self::parse(text).ok()
    }

    pub(crate) fn from_iso_parts(
        country: &str,
        code: &str,
        with_separator: bool,
    ) -> Result<Self, IdParseError> {
        Ok(Self {
            country: Country::from_alpha2(country)?,
            code: code.to_string(),
            format: if with_separator {
                OperatorIdFormat::Iso
            } else {
                OperatorIdFormat::IsoStarless
            },
        })
    }

    pub(crate) fn from_din_parts(country: &str, code: &str) -> Result<Self, IdParseError> {
        Ok(Self {
            country: Country::from_telephone_code(country)?,
            code: code.to_string(),
            format: OperatorIdFormat::Din,
        })
    }

    pub fn country(&self) -> Country {
        self.country
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn format(&self) -> OperatorIdFormat {
        self.format
    }

    /// Re-render in another format.
    ///
    /// ISO operator codes are three alphanumerics, DIN codes three to six
    /// digits; only codes valid in both grammars convert.
    pub fn to_format(&self, format: OperatorIdFormat) -> Result<Self, IdParseError> {
        let convertible = match format {
            OperatorIdFormat::Iso | OperatorIdFormat::IsoStarless => self.code.len() == 3,
            OperatorIdFormat::Din => self.code.chars().all(|c| c.is_ascii_digit()),
        };
        if !convertible {
            return Err(IdParseError::Unconvertible {
                value: self.to_string(),
                target: match format {
                    OperatorIdFormat::Din => "DIN",
                    _ => "ISO",
                },
            });
        }
        Ok(Self {
            country: self.country,
            code: self.code.clone(),
            format,
        })
    }

    /// Separator placed between this operator id and a child id's type letter
    pub(crate) fn child_separator(&self) -> &'static str {
        match self.format {
            OperatorIdFormat::IsoStarless => "",
            OperatorIdFormat::Iso | OperatorIdFormat::Din => "*",
        }
    }
}

impl PartialEq for ChargingStationOperatorId {
    fn eq(&self, other: &Self) -> bool {
        self.country == other.country && self.code == other.code
    }
}

impl Eq for ChargingStationOperatorId {}

impl Hash for ChargingStationOperatorId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.country.hash(state);
        self.code.hash(state);
    }
}

impl PartialOrd for ChargingStationOperatorId {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ChargingStationOperatorId {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        (self.country.alpha2, &self.code).cmp(&(other.country.alpha2, &other.code))
    }
}

impl fmt::Display for ChargingStationOperatorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.format {
            OperatorIdFormat::Iso => write!(f, "{}*{}", self.country.alpha2, self.code),
            OperatorIdFormat::IsoStarless => write!(f, "{}{}", self.country.alpha2, self.code),
            OperatorIdFormat::Din => write!(f, "+{}*{}", self.country.telephone_code, self.code),
        }
    }
}

impl FromStr for ChargingStationOperatorId {
    type Err = IdParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for ChargingStationOperatorId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ChargingStationOperatorId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Self::parse(&text).map_err(serde::de::Error::custom)
    }
}
