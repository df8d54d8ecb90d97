//! Charging reservation domain entity

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::auth::AuthIdentification;
use crate::domain::ids::{ChargingReservationId, ChargingStationId, EvseId};

/// Reservation status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReservationStatus {
    /// Reservation accepted by the charging station
    Accepted,
    /// Reservation cancelled by the driver, operator or system
    Cancelled,
    /// Reservation expired (past its end time)
    Expired,
    /// Reservation was used (session started)
    Used,
}

impl ReservationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Accepted => "Accepted",
            Self::Cancelled => "Cancelled",
            Self::Expired => "Expired",
            Self::Used => "Used",
        }
    }
}

impl std::fmt::Display for ReservationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// What was reserved: one EVSE, or any EVSE of a station
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReservationLevel {
    Evse,
    ChargingStation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CancellationReason {
    /// Cancelled on request
    Deleted,
    /// Cancelled because the station could not keep it
    Aborted,
    /// Removed by the expiry check
    Expired,
}

/// EVSE reservation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChargingReservation {
    pub id: ChargingReservationId,
    pub level: ReservationLevel,
    /// EVSE held by this reservation; for station level reservations the
    /// EVSE the station picked
    pub evse_id: EvseId,
    pub charging_station_id: ChargingStationId,
    /// Credential allowed to use the reservation; `None` means anyone
    pub auth: Option<AuthIdentification>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub status: ReservationStatus,
    pub cancellation_reason: Option<CancellationReason>,
    pub created_at: DateTime<Utc>,
}

impl ChargingReservation {
    pub fn new(
        id: ChargingReservationId,
        level: ReservationLevel,
        evse_id: EvseId,
        charging_station_id: ChargingStationId,
        auth: Option<AuthIdentification>,
        start_time: DateTime<Utc>,
        duration: Duration,
    ) -> Self {
        Self {
            id,
            level,
            evse_id,
            charging_station_id,
            auth,
            start_time,
            end_time: start_time + duration,
            status: ReservationStatus::Accepted,
            cancellation_reason: None,
            created_at: Utc::now(),
        }
    }

    pub fn duration(&self) -> Duration {
        self.end_time - self.start_time
    }

    /// Remaining time, zero once past the end
    pub fn time_left(&self, now: DateTime<Utc>) -> Duration {
        (self.end_time - now).max(Duration::zero())
    }

    /// Move the end so the reservation lasts `duration` from its start
    pub fn extend(&mut self, duration: Duration) {
        self.end_time = self.start_time + duration;
    }

    pub fn cancel(&mut self, reason: CancellationReason) {
        self.status = ReservationStatus::Cancelled;
        self.cancellation_reason = Some(reason);
    }

    /// Mark as expired
    pub fn expire(&mut self) {
        self.status = ReservationStatus::Expired;
        self.cancellation_reason = Some(CancellationReason::Expired);
    }

    /// Mark as used (session started)
    pub fn mark_used(&mut self) {
        self.status = ReservationStatus::Used;
    }

    /// Check if this reservation is still active
    pub fn is_active(&self) -> bool {
        self.status == ReservationStatus::Accepted
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.status == ReservationStatus::Expired || now >= self.end_time
    }

    /// Whether `auth` may use this reservation
    pub fn accepts(&self, auth: Option<&AuthIdentification>) -> bool {
        match (&self.auth, auth) {
            (None, _) => true,
            (Some(expected), Some(given)) => expected == given,
            (Some(_), None) => false,
        }
    }
}

// ── Tests ──────────────────────────────────────────────────────
