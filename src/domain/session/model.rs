//! Charging session domain entity

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::auth::AuthIdentification;
use crate::domain::ids::{ChargingReservationId, ChargingSessionId, ChargingStationId, EvseId};
use crate::support::errors::{DomainError, DomainResult};

/// Session status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionStatus {
    /// Energy may flow
    Active,
    /// Session stopped; a charge detail record can be built
    Completed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StopReason {
    Remote,
    Local,
    EvDisconnected,
    PowerLoss,
    Emergency,
}

/// Energy meter reading (Wh)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeterValue {
    pub timestamp: DateTime<Utc>,
    pub energy_wh: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChargingSession {
    pub id: ChargingSessionId,
    pub evse_id: EvseId,
    pub charging_station_id: ChargingStationId,
    /// Reservation consumed by this session
    pub reservation_id: Option<ChargingReservationId>,
    pub auth_start: AuthIdentification,
    pub auth_stop: Option<AuthIdentification>,
    /// Meter value at start (Wh)
    pub meter_start_wh: i64,
    /// Readings after the start value, oldest first
    pub meter_values: Vec<MeterValue>,
    pub started_at: DateTime<Utc>,
    pub stopped_at: Option<DateTime<Utc>>,
    pub stop_reason: Option<StopReason>,
    pub status: SessionStatus,
}

impl ChargingSession {
    pub fn new(
        id: ChargingSessionId,
        evse_id: EvseId,
        charging_station_id: ChargingStationId,
        auth_start: AuthIdentification,
        meter_start_wh: i64,
        started_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            evse_id,
            charging_station_id,
            reservation_id: None,
            auth_start,
            auth_stop: None,
            meter_start_wh,
            meter_values: Vec::new(),
            started_at,
            stopped_at: None,
            stop_reason: None,
            status: SessionStatus::Active,
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == SessionStatus::Active
    }

    /// Latest reading, the start value when none was recorded
    pub fn last_meter_wh(&self) -> i64 {
        self.meter_values
            .last()
            .map_or(self.meter_start_wh, |value| value.energy_wh)
    }

    /// Append a reading; meters only count up
    pub fn record_meter_value(&mut self, timestamp: DateTime<Utc>, energy_wh: i64) -> DomainResult<()> {
        if !self.is_active() {
            return Err(DomainError::Validation(format!(
                "session {} is not active",
                self.id
            )));
        }
        let last = self.last_meter_wh();
        if energy_wh < last {
            return Err(DomainError::Validation(format!(
                "meter value {energy_wh} Wh is below the previous reading {last} Wh"
            )));
        }
        self.meter_values.push(MeterValue {
            timestamp,
            energy_wh,
        });
        Ok(())
    }

    pub fn stop(
        &mut self,
        stopped_at: DateTime<Utc>,
        auth_stop: Option<AuthIdentification>,
        reason: StopReason,
    ) {
        self.stopped_at = Some(stopped_at);
        self.auth_stop = auth_stop;
        self.stop_reason = Some(reason);
        self.status = SessionStatus::Completed;
    }

    /// Energy consumed so far in Wh
    pub fn energy_consumed_wh(&self) -> i64 {
        self.last_meter_wh() - self.meter_start_wh
    }
}

// ── Tests ──────────────────────────────────────────────────────
