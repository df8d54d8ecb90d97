//! Charging station operator entity

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::charging_pool::ChargingPool;
use crate::domain::charging_station::ChargingStation;
use crate::domain::evse::Evse;
use crate::domain::ids::{ChargingPoolId, ChargingStationId, ChargingStationOperatorId, EvseId};
use crate::domain::status::{AdminStatus, EvseStatus, OperationalStatus, StatusPropagation};
use crate::support::errors::{DomainError, DomainResult};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChargingStationOperator {
    id: ChargingStationOperatorId,
    name: String,
    homepage: Option<String>,
    hotline: Option<String>,
    admin_status: AdminStatus,
    pools: BTreeMap<ChargingPoolId, ChargingPool>,
    last_change: DateTime<Utc>,
}

impl ChargingStationOperator {
    pub fn new(id: ChargingStationOperatorId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            homepage: None,
            hotline: None,
            admin_status: AdminStatus::Operational,
            pools: BTreeMap::new(),
            last_change: Utc::now(),
        }
    }

    pub fn id(&self) -> &ChargingStationOperatorId {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        let name = name.into();
        if self.name != name {
            self.name = name;
            self.touch();
        }
    }

    pub fn homepage(&self) -> Option<&str> {
        self.homepage.as_deref()
    }

    pub fn set_homepage(&mut self, homepage: Option<String>) {
        if self.homepage != homepage {
            self.homepage = homepage;
            self.touch();
        }
    }

    pub fn hotline(&self) -> Option<&str> {
        self.hotline.as_deref()
    }

    pub fn set_hotline(&mut self, hotline: Option<String>) {
        if self.hotline != hotline {
            self.hotline = hotline;
            self.touch();
        }
    }

    pub fn admin_status(&self) -> AdminStatus {
        self.admin_status
    }

    pub fn set_admin_status(&mut self, admin_status: AdminStatus) {
        if self.admin_status != admin_status {
            self.admin_status = admin_status;
            self.touch();
        }
    }

    pub fn add_pool(&mut self, pool: ChargingPool) -> DomainResult<()> {
        if pool.id().operator_id() != &self.id {
            return Err(DomainError::Validation(format!(
                "charging pool {} does not belong to operator {}",
                pool.id(),
                self.id
            )));
        }
        if self.pools.contains_key(pool.id()) {
            return Err(DomainError::Conflict(format!("charging pool {}", pool.id())));
        }
        self.pools.insert(pool.id().clone(), pool);
        self.touch();
        Ok(())
    }

    pub fn remove_pool(&mut self, pool_id: &ChargingPoolId) -> DomainResult<ChargingPool> {
        let pool = self
            .pools
            .remove(pool_id)
            .ok_or_else(|| DomainError::not_found("charging pool", "id", pool_id))?;
        self.touch();
        Ok(pool)
    }

    pub fn pool(&self, pool_id: &ChargingPoolId) -> Option<&ChargingPool> {
        self.pools.get(pool_id)
    }

    pub fn pool_mut(&mut self, pool_id: &ChargingPoolId) -> Option<&mut ChargingPool> {
        self.pools.get_mut(pool_id)
    }

    pub fn pools(&self) -> impl Iterator<Item = &ChargingPool> {
        self.pools.values()
    }

    pub fn pool_count(&self) -> usize {
        self.pools.len()
    }

    pub fn station_count(&self) -> usize {
        self.pools.values().map(ChargingPool::station_count).sum()
    }

    pub fn evse_count(&self) -> usize {
        self.pools.values().map(ChargingPool::evse_count).sum()
    }

    pub fn charging_station(&self, station_id: &ChargingStationId) -> Option<&ChargingStation> {
        self.pools.values().find_map(|pool| pool.station(station_id))
    }

    pub fn evse(&self, evse_id: &EvseId) -> Option<&Evse> {
        self.pools.values().find_map(|pool| pool.evse(evse_id))
    }

    /// Pool containing `evse_id`
    pub fn pool_of(&self, evse_id: &EvseId) -> Option<&ChargingPool> {
        self.pools.values().find(|pool| pool.evse(evse_id).is_some())
    }

    /// Aggregated over all pools, computed on demand
    pub fn status(&self) -> OperationalStatus {
        OperationalStatus::aggregate(self.pools.values().map(ChargingPool::status))
    }

    pub fn set_evse_status(
        &mut self,
        evse_id: &EvseId,
        status: EvseStatus,
        timestamp: DateTime<Utc>,
    ) -> DomainResult<StatusPropagation> {
        let pool = self
            .pools
            .values_mut()
            .find(|pool| pool.evse(evse_id).is_some())
            .ok_or_else(|| DomainError::not_found("EVSE", "id", evse_id))?;
        let propagation = pool.set_evse_status(evse_id, status, timestamp)?;
        if !propagation.is_empty() {
            self.touch();
        }
        Ok(propagation)
    }

    pub fn last_change(&self) -> DateTime<Utc> {
        self.last_change
    }

    fn touch(&mut self) {
        self.last_change = Utc::now();
    }
}
