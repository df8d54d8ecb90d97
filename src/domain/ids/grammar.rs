//! Shared grammar of ids nested below an operator id
//!
//! ISO: `{operator}[*]{type letter}{suffix}`, suffix alphanumeric with
//! inner `*` separators. DIN: `{operator}*{suffix}`, digits only, no type
//! letter.

use std::fmt;

use regex::Regex;

use super::operator::{ChargingStationOperatorId, OperatorIdFormat};
use crate::support::errors::IdParseError;

pub(crate) const MAX_SUFFIX_LEN: usize = 31;

pub(crate) struct ChildGrammar {
    kind: &'static str,
    letter: char,
    iso: Regex,
    din: Regex,
}

impl ChildGrammar {
    pub(crate) fn new(kind: &'static str, letter: char) -> Self {
        let iso = format!(
            r"^([A-Z]{{2}})(\*?)([A-Z0-9]{{3}})\*?{letter}([A-Z0-9](?:[A-Z0-9*]{{0,29}}[A-Z0-9])?)$"
        );
        let din = r"^\+?([0-9]{1,3})\*([0-9]{3,6})\*([0-9](?:[0-9*]{0,29}[0-9])?)$";
        Self {
            kind,
            letter,
            iso: Regex::new(&iso).expect("valid regex"),
            din: Regex::new(din).expect("valid regex"),
        }
    }

    pub(crate) fn parse(
        &self,
        text: &str,
    ) -> Result<(ChargingStationOperatorId, String), IdParseError> {
        let text = text.trim().to_ascii_uppercase();
        if text.is_empty() {
            return Err(IdParseError::Empty { kind: self.kind });
        }
        if let Some(caps) = self.iso.captures(&text) {
            let operator =
                ChargingStationOperatorId::from_iso_parts(&caps[1], &caps[3], !caps[2].is_empty())?;
            return Ok((operator, caps[4].to_string()));
        }
        if let Some(caps) = self.din.captures(&text) {
            let operator = ChargingStationOperatorId::from_din_parts(&caps[1], &caps[2])?;
            return Ok((operator, caps[3].to_string()));
        }
        Err(IdParseError::malformed(self.kind, text))
    }

    /// Check `suffix` against the grammar of `operator`'s format
    pub(crate) fn validate_suffix(
        &self,
        operator: &ChargingStationOperatorId,
        suffix: &str,
    ) -> Result<String, IdParseError> {
        let suffix = suffix.trim().to_ascii_uppercase();
        let rendered = Rendered {
            grammar: self,
            operator,
            suffix: &suffix,
        }
        .to_string();
        self.parse(&rendered).map(|(_, suffix)| suffix)
    }

    pub(crate) fn render(
        &self,
        f: &mut fmt::Formatter<'_>,
        operator: &ChargingStationOperatorId,
        suffix: &str,
    ) -> fmt::Result {
        match operator.format() {
            OperatorIdFormat::Din => write!(f, "{operator}*{suffix}"),
            OperatorIdFormat::Iso | OperatorIdFormat::IsoStarless => write!(
                f,
                "{operator}{}{}{suffix}",
                operator.child_separator(),
                self.letter
            ),
        }
    }
}

struct Rendered<'a> {
    grammar: &'a ChildGrammar,
    operator: &'a ChargingStationOperatorId,
    suffix: &'a str,
}

impl fmt::Display for Rendered<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.grammar.render(f, self.operator, self.suffix)
    }
}

/// String-form trait impls shared by the nested id types
macro_rules! child_id_impls {
    ($ty:ident, $grammar:ident) => {
        impl std::fmt::Display for $ty {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                $grammar.render(f, &self.operator_id, &self.suffix)
            }
        }

        impl std::str::FromStr for $ty {
            type Err = $crate::support::errors::IdParseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::parse(s)
            }
        }

        impl serde::Serialize for $ty {
            fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.collect_str(self)
            }
        }

        impl<'de> serde::Deserialize<'de> for $ty {
            fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let text = String::deserialize(deserializer)?;
                Self::parse(&text).map_err(serde::de::Error::custom)
            }
        }
    };
}

pub(crate) use child_id_impls;
