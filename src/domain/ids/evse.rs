//! EVSE identifiers (`DE*GEF*E1234*1`, `+49*822*1234*1`)

use once_cell::sync::Lazy;

use super::grammar::{child_id_impls, ChildGrammar};
use super::operator::ChargingStationOperatorId;
use super::station::ChargingStationId;
use crate::support::errors::IdParseError;

static GRAMMAR: Lazy<ChildGrammar> = Lazy::new(|| ChildGrammar::new("EVSE id", 'E'));

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EvseId {
    operator_id: ChargingStationOperatorId,
    suffix: String,
}

impl EvseId {
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

    /// Station this EVSE belongs to when it is the only one considered:
    /// the suffix up to its last `*`, or the whole suffix.
    pub fn station_id(&self) -> ChargingStationId {
        let station_suffix = match self.suffix.rfind('*') {
            Some(pos) => &self.suffix[..pos],
            None => self.suffix.as_str(),
        };
        ChargingStationId::from_parts(self.operator_id.clone(), station_suffix.to_string())
    }
}

child_id_impls!(EvseId, GRAMMAR);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ids::OperatorIdFormat;

    #[test]
    fn parses_iso_evse_ids() {
        let id = EvseId::parse("DE*GEF*E1234*1").unwrap();
        assert_eq!(id.operator_id().to_string(), "DE*GEF");
        assert_eq!(id.suffix(), "1234*1");
        assert_eq!(id.to_string(), "DE*GEF*E1234*1");

        let starless = EvseId::parse("degefe1234").unwrap();
        assert_eq!(starless.operator_id().format(), OperatorIdFormat::IsoStarless);
        assert_eq!(starless.to_string(), "DEGEFE1234");
    }

    #[test]
    fn parses_din_evse_ids() {
        let id = EvseId::parse("+49*822*4201*1").unwrap();
        assert_eq!(id.operator_id().format(), OperatorIdFormat::Din);
        assert_eq!(id.suffix(), "4201*1");
        assert_eq!(id.to_string(), "+49*822*4201*1");
    }

    #[test]
    fn rejects_malformed_evse_ids() {
        assert!(EvseId::parse("DE*GEF*S1234").is_err());
        assert!(EvseId::parse("DE*GEF*E").is_err());
        assert!(EvseId::parse("DE*GEF*E12*").is_err());
        assert!(EvseId::parse("+49*822*12A").is_err());
        assert!(EvseId::try_parse("   ").is_none());
    }

    #[test]
    fn single_evse_station_id() {
        let with_star = EvseId::parse("DE*GEF*E1234*1").unwrap();
        assert_eq!(with_star.station_id().to_string(), "DE*GEF*S1234");

        let without_star = EvseId::parse("DE*GEF*E1234").unwrap();
        assert_eq!(without_star.station_id().to_string(), "DE*GEF*S1234");

        let din = EvseId::parse("+49*822*4201*1").unwrap();
        assert_eq!(din.station_id().to_string(), "+49*822*4201");
    }

    #[test]
    fn constructor_normalises_suffix() {
        let operator = ChargingStationOperatorId::parse("DE*GEF").unwrap();
        let id = EvseId::new(operator.clone(), "ab*1").unwrap();
        assert_eq!(id.to_string(), "DE*GEF*EAB*1");
        assert!(EvseId::new(operator, "a-b").is_err());
    }
}
