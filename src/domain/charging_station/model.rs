//! Charging station domain entity

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::auth::AuthenticationModes;
use crate::domain::evse::Evse;
use crate::domain::ids::{ChargingStationId, EvseId};
use crate::domain::location::{Address, GeoCoordinate};
use crate::domain::status::{
    ChargingStationAdminStatus, ChargingStationStatus, EvseStatus, OperationalStatus,
    StatusPropagation, StatusSchedule, Timestamped, DEFAULT_HISTORY_SIZE,
};
use crate::support::errors::{DomainError, DomainResult};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChargingStation {
    id: ChargingStationId,
    name: Option<String>,
    description: Option<String>,
    address: Option<Address>,
    geo_location: Option<GeoCoordinate>,
    hotline: Option<String>,
    authentication_modes: AuthenticationModes,
    evses: BTreeMap<EvseId, Evse>,
    status: StatusSchedule<ChargingStationStatus>,
    admin_status: StatusSchedule<ChargingStationAdminStatus>,
    history_size: usize,
    last_change: DateTime<Utc>,
}

impl ChargingStation {
    pub fn new(id: ChargingStationId) -> Self {
        Self::with_history_size(id, DEFAULT_HISTORY_SIZE)
    }

    pub fn with_history_size(id: ChargingStationId, history_size: usize) -> Self {
        let now = Utc::now();
        Self {
            id,
            name: None,
            description: None,
            address: None,
            geo_location: None,
            hotline: None,
            authentication_modes: AuthenticationModes::standard(),
            evses: BTreeMap::new(),
            status: StatusSchedule::starting_at(OperationalStatus::Unknown, now, history_size),
            admin_status: StatusSchedule::starting_at(
                ChargingStationAdminStatus::Operational,
                now,
                history_size,
            ),
            history_size,
            last_change: now,
        }
    }

    pub fn id(&self) -> &ChargingStationId {
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

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn set_description(&mut self, description: Option<String>) {
        if self.description != description {
            self.description = description;
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

    pub fn hotline(&self) -> Option<&str> {
        self.hotline.as_deref()
    }

    pub fn set_hotline(&mut self, hotline: Option<String>) {
        if self.hotline != hotline {
            self.hotline = hotline;
            self.touch();
        }
    }

    pub fn authentication_modes(&self) -> &AuthenticationModes {
        &self.authentication_modes
    }

    pub fn set_authentication_modes(&mut self, modes: AuthenticationModes) {
        if self.authentication_modes != modes {
            self.authentication_modes = modes;
            self.touch();
        }
    }

    // ── EVSEs ──────────────────────────────────────────────────

    /// Create an EVSE `{station suffix}*{number}` with this station's
    /// history size and add it.
    pub fn create_evse(&mut self, number: u32) -> DomainResult<&mut Evse> {
        let evse_id = self.id.evse_id(number)?;
        self.add_evse(Evse::with_history_size(evse_id.clone(), self.history_size))?;
        self.evses
            .get_mut(&evse_id)
            .ok_or_else(|| DomainError::not_found("EVSE", "id", &evse_id))
    }

    /// Add an EVSE of this station's operator
    pub fn add_evse(&mut self, evse: Evse) -> DomainResult<()> {
        if evse.id().operator_id() != self.id.operator_id() {
            return Err(DomainError::Validation(format!(
                "EVSE {} does not belong to operator {}",
                evse.id(),
                self.id.operator_id()
            )));
        }
        if self.evses.contains_key(evse.id()) {
            return Err(DomainError::Conflict(format!("EVSE {}", evse.id())));
        }
        debug!(charging_station_id = %self.id, evse_id = %evse.id(), "Adding EVSE");
        self.evses.insert(evse.id().clone(), evse);
        self.refresh_status(Utc::now());
        self.touch();
        Ok(())
    }

    pub fn remove_evse(&mut self, evse_id: &EvseId) -> DomainResult<Evse> {
        let evse = self
            .evses
            .remove(evse_id)
            .ok_or_else(|| DomainError::not_found("EVSE", "id", evse_id))?;
        self.refresh_status(Utc::now());
        self.touch();
        Ok(evse)
    }

    pub fn evse(&self, evse_id: &EvseId) -> Option<&Evse> {
        self.evses.get(evse_id)
    }

    pub fn evse_mut(&mut self, evse_id: &EvseId) -> Option<&mut Evse> {
        self.evses.get_mut(evse_id)
    }

    pub fn evses(&self) -> impl Iterator<Item = &Evse> {
        self.evses.values()
    }

    pub fn evse_ids(&self) -> impl Iterator<Item = &EvseId> {
        self.evses.keys()
    }

    pub fn evse_count(&self) -> usize {
        self.evses.len()
    }

    // ── Status ─────────────────────────────────────────────────

    pub fn status(&self) -> ChargingStationStatus {
        *self.status.value()
    }

    pub fn status_schedule(&self) -> &StatusSchedule<ChargingStationStatus> {
        &self.status
    }

    pub fn admin_status(&self) -> ChargingStationAdminStatus {
        *self.admin_status.value()
    }

    pub fn admin_status_schedule(&self) -> &StatusSchedule<ChargingStationAdminStatus> {
        &self.admin_status
    }

    pub fn set_admin_status(
        &mut self,
        admin_status: ChargingStationAdminStatus,
        timestamp: DateTime<Utc>,
    ) -> Option<Timestamped<ChargingStationAdminStatus>> {
        let previous = self.admin_status.set(admin_status, timestamp);
        if previous.is_some() {
            self.touch();
        }
        previous
    }

    /// Update one EVSE and recompute the station status from all EVSEs
    pub fn set_evse_status(
        &mut self,
        evse_id: &EvseId,
        status: EvseStatus,
        timestamp: DateTime<Utc>,
    ) -> DomainResult<StatusPropagation> {
        let evse = self
            .evses
            .get_mut(evse_id)
            .ok_or_else(|| DomainError::not_found("EVSE", "id", evse_id))?;

        let mut propagation = StatusPropagation {
            evse: evse.set_status(status, timestamp),
            ..Default::default()
        };
        if propagation.evse.is_some() {
            propagation.charging_station = self.refresh_status(timestamp);
            self.touch();
        }
        Ok(propagation)
    }

    /// Recompute the aggregated status; returns the previous entry on change
    pub fn refresh_status(
        &mut self,
        timestamp: DateTime<Utc>,
    ) -> Option<Timestamped<ChargingStationStatus>> {
        let aggregated = OperationalStatus::aggregate(self.evses.values().map(Evse::status));
        // Keep the schedule monotonic when the caller's clock lags ours
        let timestamp = timestamp.max(self.status.current().timestamp);
        self.status.set(aggregated, timestamp)
    }

    /// EVSEs that currently accept a new reservation or session
    pub fn available_evses(&self) -> impl Iterator<Item = &Evse> {
        let station_operational = self.admin_status().is_operational();
        self.evses
            .values()
            .filter(move |evse| station_operational && evse.is_usable() && evse.status().is_available())
    }

    pub fn last_change(&self) -> DateTime<Utc> {
        self.last_change
    }

    fn touch(&mut self) {
        self.last_change = Utc::now();
    }
}
