//! Charging station identifiers (`DE*GEF*S1234`, `+49*822*1234`)
//!
//! Besides parsing, a station id can be derived from the ids of the EVSEs
//! it hosts: the longest common prefix of their suffixes, or a SHA-1 based
//! suffix when they share none.

use std::collections::BTreeSet;

use once_cell::sync::Lazy;
use sha1::{Digest, Sha1};

use super::evse::EvseId;
use super::grammar::{child_id_impls, ChildGrammar, MAX_SUFFIX_LEN};
use super::operator::{ChargingStationOperatorId, OperatorIdFormat};
use crate::support::errors::{DomainError, DomainResult, IdParseError};

static GRAMMAR: Lazy<ChildGrammar> = Lazy::new(|| ChildGrammar::new("charging station id", 'S'));

/// Hash suffix length used when no explicit length is configured
pub const DEFAULT_HASH_LENGTH: usize = 15;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChargingStationId {
    operator_id: ChargingStationOperatorId,
    suffix: String,
}

impl ChargingStationId {
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

    /// Suffix already known to satisfy the grammar
    pub(crate) fn from_parts(operator_id: ChargingStationOperatorId, suffix: String) -> Self {
        Self {
            operator_id,
            suffix,
        }
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

    /// EVSE id `{station suffix}*{number}` below this station
    pub fn evse_id(&self, number: impl std::fmt::Display) -> Result<EvseId, IdParseError> {
        EvseId::new(self.operator_id.clone(), &format!("{}*{}", self.suffix, number))
    }

    /// Whether `evse_id` has the `{station suffix}*...` shape produced by
    /// [`Self::evse_id`] or implied by [`EvseId::station_id`].
    ///
    /// Stations derived by [`Self::from_evse_ids`] from a prefix that does
    /// not end at a `*`, or from a hash, do not contain their own EVSEs in
    /// this sense; ownership of those is tracked by the entity hierarchy.
    pub fn contains(&self, evse_id: &EvseId) -> bool {
        evse_id.operator_id() == &self.operator_id
            && evse_id
                .suffix()
                .strip_prefix(self.suffix.as_str())
                .is_some_and(|rest| rest.is_empty() || rest.starts_with('*'))
    }

    /// Derive the id of the station hosting `evse_ids`.
    ///
    /// All EVSEs must belong to one operator. A single EVSE yields
    /// [`EvseId::station_id`]; several yield the longest common prefix of
    /// their suffixes with trailing `*` removed. When that prefix is empty
    /// the suffix is the SHA-1 of the sorted EVSE ids joined by `,`,
    /// rendered as upper-case hex (decimal digits for DIN operators) and
    /// cut to `hash_length` characters (clamped to 1..=31).
    pub fn from_evse_ids<'a, I>(evse_ids: I, hash_length: usize) -> DomainResult<Self>
    where
        I: IntoIterator<Item = &'a EvseId>,
    {
        let unique: BTreeSet<&EvseId> = evse_ids.into_iter().collect();

        let mut iter = unique.iter();
        let first = iter.next().ok_or_else(|| {
            DomainError::Validation("at least one EVSE id is required".to_string())
        })?;

        if let Some(foreign) = unique.iter().find(|id| id.operator_id() != first.operator_id()) {
            return Err(DomainError::Validation(format!(
                "EVSE {} does not belong to operator {}",
                foreign,
                first.operator_id()
            )));
        }

        if unique.len() == 1 {
            return Ok(first.station_id());
        }

        let suffixes: Vec<&str> = unique.iter().map(|id| id.suffix()).collect();
        let prefix = longest_common_prefix(&suffixes).trim_end_matches('*');
        if !prefix.is_empty() {
            return Ok(Self::from_parts(
                first.operator_id().clone(),
                prefix.to_string(),
            ));
        }

        let suffix = hashed_suffix(&unique, first.operator_id().format(), hash_length);
        Ok(Self::from_parts(first.operator_id().clone(), suffix))
    }
}

child_id_impls!(ChargingStationId, GRAMMAR);

fn longest_common_prefix<'a>(items: &[&'a str]) -> &'a str {
    let Some((first, rest)) = items.split_first() else {
        return "";
    };
    let mut len = first.len();
    for item in rest {
        len = first
            .bytes()
            .zip(item.bytes())
            .take(len)
            .take_while(|(a, b)| a == b)
            .count();
    }
    &first[..len]
}

fn hashed_suffix(
    evse_ids: &BTreeSet<&EvseId>,
    format: OperatorIdFormat,
    hash_length: usize,
) -> String {
    let joined = evse_ids
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(",");

    let mut hasher = Sha1::new();
    hasher.update(joined.as_bytes());
    let hex = hex::encode_upper(hasher.finalize());

    let length = hash_length.clamp(1, MAX_SUFFIX_LEN);
    match format {
        OperatorIdFormat::Din => hex
            .chars()
            .filter_map(|c| c.to_digit(16))
            .filter_map(|nibble| char::from_digit(nibble % 10, 10))
            .take(length)
            .collect(),
        OperatorIdFormat::Iso | OperatorIdFormat::IsoStarless => hex.chars().take(length).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn evses(ids: &[&str]) -> Vec<EvseId> {
        ids.iter().map(|id| EvseId::parse(id).unwrap()).collect()
    }

    #[test]
    fn parses_station_ids() {
        let id = ChargingStationId::parse("DE*GEF*S1234").unwrap();
        assert_eq!(id.suffix(), "1234");
        assert_eq!(id.to_string(), "DE*GEF*S1234");

        let din = ChargingStationId::parse("+49*822*4201").unwrap();
        assert_eq!(din.to_string(), "+49*822*4201");

        assert!(ChargingStationId::parse("DE*GEF*E1234").is_err());
    }

    #[test]
    fn builds_evse_ids_below_station() {
        let station = ChargingStationId::parse("DE*GEF*S1234").unwrap();
        let evse = station.evse_id(2).unwrap();
        assert_eq!(evse.to_string(), "DE*GEF*E1234*2");
        assert!(station.contains(&evse));
        assert!(!station.contains(&EvseId::parse("DE*GEF*E12345*1").unwrap()));
        assert!(!station.contains(&EvseId::parse("DE*ABC*E1234*1").unwrap()));
    }

    #[test]
    fn derives_from_single_evse() {
        let ids = evses(&["DE*GEF*E1234*1"]);
        let station = ChargingStationId::from_evse_ids(&ids, DEFAULT_HASH_LENGTH).unwrap();
        assert_eq!(station.to_string(), "DE*GEF*S1234");
    }

    #[test]
    fn duplicate_evse_ids_count_once() {
        let ids = evses(&["DE*GEF*E1234*1", "de*gef*e1234*1"]);
        let station = ChargingStationId::from_evse_ids(&ids, DEFAULT_HASH_LENGTH).unwrap();
        assert_eq!(station.to_string(), "DE*GEF*S1234");
    }

    #[test]
    fn derives_common_prefix_and_trims_separator() {
        let ids = evses(&["DE*GEF*E1234*1", "DE*GEF*E1234*2", "DE*GEF*E1234*3"]);
        let station = ChargingStationId::from_evse_ids(&ids, DEFAULT_HASH_LENGTH).unwrap();
        assert_eq!(station.to_string(), "DE*GEF*S1234");

        let ids = evses(&["DE*GEF*E12A1", "DE*GEF*E12A2"]);
        let station = ChargingStationId::from_evse_ids(&ids, DEFAULT_HASH_LENGTH).unwrap();
        assert_eq!(station.to_string(), "DE*GEF*S12A");
    }

    #[test]
    fn prefix_derived_station_does_not_contain_its_evses() {
        let ids = evses(&["DE*GEF*E12A1", "DE*GEF*E12A2"]);
        let station = ChargingStationId::from_evse_ids(&ids, DEFAULT_HASH_LENGTH).unwrap();
        assert!(ids.iter().all(|id| !station.contains(id)));
        assert!(station.contains(&station.evse_id(1).unwrap()));
    }

    #[test]
    fn derives_din_common_prefix() {
        let ids = evses(&["+49*822*4201*1", "+49*822*4201*2"]);
        let station = ChargingStationId::from_evse_ids(&ids, DEFAULT_HASH_LENGTH).unwrap();
        assert_eq!(station.to_string(), "+49*822*4201");
    }

    #[test]
    fn falls_back_to_hash_without_common_prefix() {
        let ids = evses(&["DE*GEF*EA1", "DE*GEF*EB1"]);
        let station = ChargingStationId::from_evse_ids(&ids, DEFAULT_HASH_LENGTH).unwrap();
        assert_eq!(station.suffix().len(), DEFAULT_HASH_LENGTH);
        assert!(station
            .suffix()
            .chars()
            .all(|c| c.is_ascii_digit() || ('A'..='F').contains(&c)));

        let reversed: Vec<EvseId> = ids.iter().rev().cloned().collect();
        let again = ChargingStationId::from_evse_ids(&reversed, DEFAULT_HASH_LENGTH).unwrap();
        assert_eq!(station, again);

        // The result is a well-formed station id
        assert_eq!(ChargingStationId::parse(&station.to_string()).unwrap(), station);
    }

    #[test]
    fn hash_length_is_clamped() {
        let ids = evses(&["DE*GEF*EA1", "DE*GEF*EB1"]);
        let short = ChargingStationId::from_evse_ids(&ids, 0).unwrap();
        assert_eq!(short.suffix().len(), 1);
        let long = ChargingStationId::from_evse_ids(&ids, 100).unwrap();
        assert_eq!(long.suffix().len(), MAX_SUFFIX_LEN);
    }

    #[test]
    fn din_hash_uses_digits_only() {
        let ids = evses(&["+49*822*1*1", "+49*822*2*1"]);
        let station = ChargingStationId::from_evse_ids(&ids, 10).unwrap();
        assert_eq!(station.suffix().len(), 10);
        assert!(station.suffix().chars().all(|c| c.is_ascii_digit()));
        assert!(ChargingStationId::parse(&station.to_string()).is_ok());
    }

    #[test]
    fn rejects_empty_and_mixed_operator_sets() {
        let none: Vec<EvseId> = Vec::new();
        assert!(matches!(
            ChargingStationId::from_evse_ids(&none, DEFAULT_HASH_LENGTH),
            Err(DomainError::Validation(_))
        ));

        let mixed = evses(&["DE*GEF*E1*1", "DE*ABC*E1*2"]);
        assert!(matches!(
            ChargingStationId::from_evse_ids(&mixed, DEFAULT_HASH_LENGTH),
            Err(DomainError::Validation(_))
        ));
    }

    #[test]
    fn common_prefix_helper() {
        assert_eq!(longest_common_prefix(&["abc", "abd", "ab"]), "ab");
        assert_eq!(longest_common_prefix(&["x", "y"]), "");
        assert_eq!(longest_common_prefix(&[]), "");
    }
}
