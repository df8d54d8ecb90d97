//! Charging pool domain entity

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::charging_station::ChargingStation;
use crate::domain::evse::Evse;
use crate::domain::ids::{ChargingPoolId, ChargingStationId, EvseId};
use crate::domain::location::{Address, GeoCoordinate};
use crate::domain::status::{
    ChargingPoolAdminStatus, ChargingPoolStatus, EvseStatus, OperationalStatus,
    StatusPropagation, StatusSchedule, Timestamped, DEFAULT_HISTORY_SIZE,
};
use crate::support::errors::{DomainError, DomainResult};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChargingPool {
    id: ChargingPoolId,
    name: Option<String>,
    address: Option<Address>,
    geo_location: Option<GeoCoordinate>,
    opening_hours: Option<String>,
    stations: BTreeMap<ChargingStationId, ChargingStation>,
    status: StatusSchedule<ChargingPoolStatus>,
    admin_status: StatusSchedule<ChargingPoolAdminStatus>,
    last_change: DateTime<Utc>,
}

impl ChargingPool {
    pub fn new(id: ChargingPoolId) -> Self {
        Self::with_history_size(id, DEFAULT_HISTORY_SIZE)
    }

    pub fn with_history_size(id: ChargingPoolId, history_size: usize) -> Self {
        let now = Utc::now();
        Self {
            id,
            name: None,
            address: None,
            geo_location: None,
            opening_hours: None,
            stations: BTreeMap::new(),
            status: StatusSchedule::starting_at(OperationalStatus::Unknown, now, history_size),
            admin_status: StatusSchedule::starting_at(
                ChargingPoolAdminStatus::Operational,
                now,
                history_size,
            ),
            last_change: now,
        }
    }

    pub fn id(&self) -> &ChargingPoolId {
        &self.id
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn set_name(&mut self, name: Option<String>) {
        if self.name != name {
            self.name = name;
            self.touch();
        }
    }

    pub fn address(&self) -> Option<&Address> {
        self.address.as_ref()
    }

    pub fn set_address(&mut self, address: Option<Address>) {
        if self.address != address {
            self.address = address;
            self.touch();
        }
    }

    pub fn geo_location(&self) -> Option<GeoCoordinate> {
        self.geo_location
    }

    pub fn set_geo_location(&mut self, geo_location: Option<GeoCoordinate>) {
        if self.geo_location != geo_location {
            self.geo_location = geo_location;
            self.touch();
        }
    }

    /// Free-form opening hours, `None` meaning always open
    pub fn opening_hours(&self) -> Option<&str> {
        self.opening_hours.as_deref()
    }

    pub fn set_opening_hours(&mut self, opening_hours: Option<String>) {
        if self.opening_hours != opening_hours {
            self.opening_hours = opening_hours;
            self.touch();
        }
    }

    pub fn add_station(&mut self, station: ChargingStation) -> DomainResult<()> {
        if station.id().operator_id() != self.id.operator_id() {
            return Err(DomainError::Validation(format!(
                "charging station {} does not belong to operator {}",
                station.id(),
                self.id.operator_id()
            )));
        }
        if self.stations.contains_key(station.id()) {
            return Err(DomainError::Conflict(format!(
                "charging station {}",
                station.id()
            )));
        }
        self.stations.insert(station.id().clone(), station);
        self.refresh_status(Utc::now());
        self.touch();
        Ok(())
    }

    pub fn remove_station(&mut self, station_id: &ChargingStationId) -> DomainResult<ChargingStation> {
        let station = self
            .stations
            .remove(station_id)
            .ok_or_else(|| DomainError::not_found("charging station", "id", station_id))?;
        self.refresh_status(Utc::now());
        self.touch();
        Ok(station)
    }

    pub fn station(&self, station_id: &ChargingStationId) -> Option<&ChargingStation> {
        self.stations.get(station_id)
    }

    pub fn station_mut(&mut self, station_id: &ChargingStationId) -> Option<&mut ChargingStation> {
        self.stations.get_mut(station_id)
    }

    pub fn stations(&self) -> impl Iterator<Item = &ChargingStation> {
        self.stations.values()
    }

    pub fn station_count(&self) -> usize {
        self.stations.len()
    }

    pub fn evse_count(&self) -> usize {
        self.stations.values().map(ChargingStation::evse_count).sum()
    }

    pub fn evse(&self, evse_id: &EvseId) -> Option<&Evse> {
        self.stations.values().find_map(|station| station.evse(evse_id))
    }

    /// Station hosting `evse_id`
    pub fn station_of(&self, evse_id: &EvseId) -> Option<&ChargingStation> {
        self.stations
            .values()
            .find(|station| station.evse(evse_id).is_some())
    }

    pub fn status(&self) -> ChargingPoolStatus {
        *self.status.value()
    }

    pub fn status_schedule(&self) -> &StatusSchedule<ChargingPoolStatus> {
        &self.status
    }

    pub fn admin_status(&self) -> ChargingPoolAdminStatus {
        *self.admin_status.value()
    }

    pub fn set_admin_status(
        &mut self,
        admin_status: ChargingPoolAdminStatus,
        timestamp: DateTime<Utc>,
    ) -> Option<Timestamped<ChargingPoolAdminStatus>> {
        let previous = self.admin_status.set(admin_status, timestamp);
        if previous.is_some() {
            self.touch();
        }
        previous
    }

    pub fn set_evse_status(
        &mut self,
        evse_id: &EvseId,
        status: EvseStatus,
        timestamp: DateTime<Utc>,
    ) -> DomainResult<StatusPropagation> {
        let station = self
            .stations
            .values_mut()
            .find(|station| station.evse(evse_id).is_some())
            .ok_or_else(|| DomainError::not_found("EVSE", "id", evse_id))?;

        let mut propagation = station.set_evse_status(evse_id, status, timestamp)?;
        if propagation.charging_station.is_some() {
            propagation.charging_pool = self.refresh_status(timestamp);
        }
        if !propagation.is_empty() {
            self.touch();
        }
        Ok(propagation)
    }

    pub fn refresh_status(
        &mut self,
        timestamp: DateTime<Utc>,
    ) -> Option<Timestamped<ChargingPoolStatus>> {
        let aggregated =
            OperationalStatus::aggregate(self.stations.values().map(ChargingStation::status));
        let timestamp = timestamp.max(self.status.current().timestamp);
        self.status.set(aggregated, timestamp)
    }

    pub fn last_change(&self) -> DateTime<Utc> {
        self.last_change
    }

    fn touch(&mut self) {
        self.last_change = Utc::now();
    }
}
