//! Countries known to operator and provider identifiers
//!
//! ISO operator ids carry the ISO 3166-1 alpha-2 code, DIN operator ids
//! the international telephone code. Conversion between both formats goes
//! through this table.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::support::errors::IdParseError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Country {
    pub alpha2: &'static str,
    pub telephone_code: u16,
    pub name: &'static str,
}

const COUNTRIES: &[Country] = &[
    Country { alpha2: "AT", telephone_code: 43, name: "Austria" },
    Country { alpha2: "BE", telephone_code: 32, name: "Belgium" },
    Country { alpha2: "BG", telephone_code: 359, name: "Bulgaria" },
    Country { alpha2: "CH", telephone_code: 41, name: "Switzerland" },
    Country { alpha2: "CZ", telephone_code: 420, name: "Czechia" },
    Country { alpha2: "DE", telephone_code: 49, name: "Germany" },
    Country { alpha2: "DK", telephone_code: 45, name: "Denmark" },
    Country { alpha2: "EE", telephone_code: 372, name: "Estonia" },
    Country { alpha2: "ES", telephone_code: 34, name: "Spain" },
    Country { alpha2: "FI", telephone_code: 358, name: "Finland" },
    Country { alpha2: "FR", telephone_code: 33, name: "France" },
    Country { alpha2: "GB", telephone_code: 44, name: "United Kingdom" },
    Country { alpha2: "GR", telephone_code: 30, name: "Greece" },
    Country { alpha2: "HR", telephone_code: 385, name: "Croatia" },
    Country { alpha2: "HU", telephone_code: 36, name: "Hungary" },
    Country { alpha2: "IE", telephone_code: 353, name: "Ireland" },
    Country { alpha2: "IT", telephone_code: 39, name: "Italy" },
    Country { alpha2: "LT", telephone_code: 370, name: "Lithuania" },
    Country { alpha2: "LU", telephone_code: 352, name: "Luxembourg" },
    Country { alpha2: "LV", telephone_code: 371, name: "Latvia" },
    Country { alpha2: "NL", telephone_code: 31, name: "Netherlands" },
    Country { alpha2: "NO", telephone_code: 47, name: "Norway" },
    Country { alpha2: "PL", telephone_code: 48, name: "Poland" },
    Country { alpha2: "PT", telephone_code: 351, name: "Portugal" },
    Country { alpha2: "RO", telephone_code: 40, name: "Romania" },
    Country { alpha2: "SE", telephone_code: 46, name: "Sweden" },
    Country { alpha2: "SI", telephone_code: 386, name: "Slovenia" },
    Country { alpha2: "SK", telephone_code: 421, name: "Slovakia" },
    Country { alpha2: "UZ", telephone_code: 998, name: "Uzbekistan" },
];

impl Country {
    /// Look up by ISO 3166-1 alpha-2 code, case-insensitive
    pub fn from_alpha2(code: &str) -> Result<Self, IdParseError> {
        let code = code.trim();
        COUNTRIES
            .iter()
            .find(|c| c.alpha2.eq_ignore_ascii_case(code))
            .copied()
            .ok_or_else(|| IdParseError::UnknownCountry(code.to_string()))
    }

    /// Look up by telephone code, with or without a leading `+`
    pub fn from_telephone_code(code: &str) -> Result<Self, IdParseError> {
        let trimmed = code.trim().trim_start_matches('+');
        let numeric: u16 = trimmed
            .parse()
            .map_err(|_| IdParseError::UnknownCountry(code.to_string()))?;
        COUNTRIES
            .iter()
            .find(|c| c.telephone_code == numeric)
            .copied()
            .ok_or_else(|| IdParseError::UnknownCountry(code.to_string()))
    }

    pub fn all() -> &'static [Country] {
        COUNTRIES
    }
}

impl fmt::Display for Country {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.alpha2)
    }
}

impl Serialize for Country {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.alpha2)
    }
}

impl<'de> Deserialize<'de> for Country {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let code = String::deserialize(deserializer)?;
        Country::from_alpha2(&code).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_by_alpha2_is_case_insensitive() {
        let de = Country::from_alpha2("de").unwrap();
        assert_eq!(de.alpha2, "DE");
        assert_eq!(de.telephone_code, 49);
    }

    #[test]
    fn lookup_by_telephone_code_accepts_plus() {
        assert_eq!(Country::from_telephone_code("+45").unwrap().alpha2, "DK");
        assert_eq!(Country::from_telephone_code("998").unwrap().alpha2, "UZ");
    }

    #[test]
    fn unknown_country_is_rejected() {
        assert!(matches!(
            Country::from_alpha2("XX"),
            Err(IdParseError::UnknownCountry(_))
        ));
        assert!(Country::from_telephone_code("+9999").is_err());
        assert!(Country::from_telephone_code("abc").is_err());
    }

    #[test]
    fn serializes_as_alpha2() {
        let json = serde_json::to_string(&Country::from_alpha2("NL").unwrap()).unwrap();
        assert_eq!(json, "\"NL\"");
        let back: Country = serde_json::from_str(&json).unwrap();
        assert_eq!(back.name, "Netherlands");
    }
}
