//! Charging pool identifiers (`DE*GEF*P1234`)

use once_cell::sync::Lazy;

use super::grammar::{child_id_impls, ChildGrammar};
use super::operator::ChargingStationOperatorId;
use crate::support::errors::IdParseError;

static GRAMMAR: Lazy<ChildGrammar> = Lazy::new(|| ChildGrammar::new("charging pool id", 'P'));

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChargingPoolId {
    operator_id: ChargingStationOperatorId,
    suffix: String,
}

impl ChargingPoolId {
    pub fn new(
        operator_id: ChargingStationOperatorId,
        suffix: &str,
    ) -> Result<Self, IdParseError> {
        let suffix = GRAMMAR.validate_suffix(&operator_id, suffix)?;
        Ok(Self {
            operator_id,
            suffix,
        })
    }

    pub fn parse(text: &str) -> Result<Self, IdParseError> {
        let (operator_id, suffix) = GRAMMAR.parse(text)?;
        Ok(Self {
            operator_id,
            suffix,
        })
    }

    pub fn try_parse(text: &str) -> Option<Self> {
        Self::parse(text).ok()
    }

    pub fn operator_id(&self) -> &ChargingStationOperatorId {
        &self.operator_id
    }

    pub fn suffix(&self) -> &str {
        &self.suffix
    }
}

child_id_impls!(ChargingPoolId, GRAMMAR);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_and_renders() {
        let id = ChargingPoolId::parse("de*gef*p42").unwrap();
        assert_eq!(id.to_string(), "DE*GEF*P42");
        assert_eq!(id.suffix(), "42");
        assert!(ChargingPoolId::parse("DE*GEF*S42").is_err());
    }

    #[test]
    fn pool_ids_of_equal_operators_compare_equal() {
        let a = ChargingPoolId::parse("DE*822*P1").unwrap();
        let b = ChargingPoolId::parse("DE822P1").unwrap();
        assert_eq!(a, b);
    }
}
