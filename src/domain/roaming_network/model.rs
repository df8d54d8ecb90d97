//! Roaming network entity

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::domain::charging_station::ChargingStation;
use crate::domain::evse::Evse;
use crate::domain::ids::{ChargingStationId, ChargingStationOperatorId, EvseId};
use crate::domain::operator::ChargingStationOperator;
use crate::domain::status::{EvseStatus, StatusPropagation};
use crate::support::errors::{DomainError, DomainResult};

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoamingNetworkId(String);

impl RoamingNetworkId {
    pub fn new(id: impl Into<String>) -> DomainResult<Self> {
        let id = id.into().trim().to_string();
        if id.is_empty() {
            return Err(DomainError::Validation(
                "roaming network id must not be empty".to_string(),
            ));
        }
        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoamingNetworkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoamingNetwork {
    id: RoamingNetworkId,
    description: Option<String>,
    operators: BTreeMap<ChargingStationOperatorId, ChargingStationOperator>,
    last_change: DateTime<Utc>,
}

impl RoamingNetwork {
    pub fn new(id: RoamingNetworkId) -> Self {
        Self {
            id,
            description: None,
            operators: BTreeMap::new(),
            last_change: Utc::now(),
        }
    }

    pub fn id(&self) -> &RoamingNetworkId {
        &self.id
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn set_description(&mut self, description: Option<String>) {
        if self.description != description {
            self.description = description;
            self.last_change = Utc::now();
        }
    }

    pub fn add_operator(&mut self, operator: ChargingStationOperator) -> DomainResult<()> {
        if self.operators.contains_key(operator.id()) {
            return Err(DomainError::Conflict(format!(
                "charging station operator {}",
                operator.id()
            )));
        }
        info!(
            roaming_network = %self.id,
            operator_id = %operator.id(),
            "Registering charging station operator"
        );
        self.operators.insert(operator.id().clone(), operator);
        self.last_change = Utc::now();
        Ok(())
    }

    pub fn remove_operator(
        &mut self,
        operator_id: &ChargingStationOperatorId,
    ) -> DomainResult<ChargingStationOperator> {
        let operator = self
            .operators
            .remove(operator_id)
            .ok_or_else(|| DomainError::not_found("charging station operator", "id", operator_id))?;
        self.last_change = Utc::now();
        Ok(operator)
    }

    pub fn operator(&self, operator_id: &ChargingStationOperatorId) -> Option<&ChargingStationOperator> {
        self.operators.get(operator_id)
    }

    pub fn operator_mut(
        &mut self,
        operator_id: &ChargingStationOperatorId,
    ) -> Option<&mut ChargingStationOperator> {
        self.operators.get_mut(operator_id)
    }

    pub fn operators(&self) -> impl Iterator<Item = &ChargingStationOperator> {
        self.operators.values()
    }

    pub fn operator_count(&self) -> usize {
        self.operators.len()
    }

    pub fn pool_count(&self) -> usize {
        self.operators.values().map(ChargingStationOperator::pool_count).sum()
    }

    pub fn station_count(&self) -> usize {
        self.operators
            .values()
            .map(ChargingStationOperator::station_count)
            .sum()
    }

    pub fn evse_count(&self) -> usize {
        self.operators.values().map(ChargingStationOperator::evse_count).sum()
    }

    /// The operator part of the id selects the subtree to search
    pub fn charging_station(&self, station_id: &ChargingStationId) -> Option<&ChargingStation> {
        self.operators
            .get(station_id.operator_id())?
            .charging_station(station_id)
    }

    pub fn evse(&self, evse_id: &EvseId) -> Option<&Evse> {
        self.operators.get(evse_id.operator_id())?.evse(evse_id)
    }

    pub fn set_evse_status(
        &mut self,
        evse_id: &EvseId,
        status: EvseStatus,
        timestamp: DateTime<Utc>,
    ) -> DomainResult<StatusPropagation> {
        let operator = self
            .operators
            .get_mut(evse_id.operator_id())
            .ok_or_else(|| {
                DomainError::not_found("charging station operator", "id", evse_id.operator_id())
            })?;
        let propagation = operator.set_evse_status(evse_id, status, timestamp)?;
        if let Some(previous) = &propagation.evse {
            info!(
                evse_id = %evse_id,
                from = %previous.value,
                to = %status,
                "EVSE status changed"
            );
        }
        Ok(propagation)
    }

    pub fn last_change(&self) -> DateTime<Utc> {
        self.last_change
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::charging_pool::ChargingPool;
    use crate::domain::ids::ChargingPoolId;
    use crate::domain::status::OperationalStatus;

    fn network() -> RoamingNetwork {
        let mut network = RoamingNetwork::new(RoamingNetworkId::new("TEST").unwrap());
        for (operator, name) in [("DE*GEF", "GEF"), ("+45*123", "DK Charge")] {
            let operator_id = ChargingStationOperatorId::parse(operator).unwrap();
            let mut op = ChargingStationOperator::new(operator_id.clone(), name);
            let mut pool = ChargingPool::new(ChargingPoolId::new(operator_id.clone(), "1").unwrap());
            let mut station = ChargingStation::new(ChargingStationId::new(operator_id, "42").unwrap());
            station.create_evse(1).unwrap();
            station.create_evse(2).unwrap();
            pool.add_station(station).unwrap();
            op.add_pool(pool).unwrap();
            network.add_operator(op).unwrap();
        }
        network
    }

    #[test]
    fn counts_across_operators() {
        let network = network();
        assert_eq!(network.operator_count(), 2);
        assert_eq!(network.pool_count(), 2);
        assert_eq!(network.station_count(), 2);
        assert_eq!(network.evse_count(), 4);
    }

    #[test]
    fn looks_up_by_id_in_any_format() {
        let network = network();
        assert!(network.evse(&EvseId::parse("DE*GEF*E42*1").unwrap()).is_some());
        assert!(network.evse(&EvseId::parse("+45*123*42*2").unwrap()).is_some());
        assert!(network
            .charging_station(&ChargingStationId::parse("DEGEFS42").unwrap())
            .is_some());
        assert!(network.evse(&EvseId::parse("NL*ABC*E42*1").unwrap()).is_none());
    }

    #[test]
    fn duplicate_operator_is_conflict() {
        let mut network = network();
        let duplicate =
            ChargingStationOperator::new(ChargingStationOperatorId::parse("DEGEF").unwrap(), "dup");
        assert!(matches!(
            network.add_operator(duplicate),
            Err(DomainError::Conflict(_))
        ));
    }

    #[test]
    fn evse_status_change_reaches_pool() {
        let mut network = network();
        let evse_id = EvseId::parse("+45*123*42*1").unwrap();
        let at = Utc::now() + chrono::Duration::seconds(1);
        network.set_evse_status(&evse_id, EvseStatus::OutOfService, at).unwrap();
        let propagation = network
            .set_evse_status(
                &EvseId::parse("+45*123*42*2").unwrap(),
                EvseStatus::OutOfService,
                at + chrono::Duration::seconds(1),
            )
            .unwrap();
        assert!(propagation.charging_station.is_some());
        assert!(propagation.charging_pool.is_some());
        let station = network
            .charging_station(&ChargingStationId::parse("+45*123*42").unwrap())
            .unwrap();
        assert_eq!(station.status(), OperationalStatus::OutOfService);
    }

    #[test]
    fn status_of_unknown_operator_is_not_found() {
        let mut network = network();
        let evse_id = EvseId::parse("NL*ABC*E1*1").unwrap();
        assert!(matches!(
            network.set_evse_status(&evse_id, EvseStatus::Faulted, Utc::now()),
            Err(DomainError::NotFound { .. })
        ));
    }

    #[test]
    fn network_id_must_not_be_empty() {
        assert!(RoamingNetworkId::new("  ").is_err());
    }
}
