//! Requests to and answers of a charging station
//!
//! Refusals such as "already reserved" are regular answers, not errors.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::auth::AuthIdentification;
use crate::domain::cdr::ChargeDetailRecord;
use crate::domain::ids::{ChargingReservationId, ChargingSessionId, EvseId};
use crate::domain::reservation::ChargingReservation;
use crate::domain::session::ChargingSession;

#[derive(Debug, Clone, Default)]
pub struct ReserveRequest {
    /// `None` lets the station pick any available EVSE
    pub evse_id: Option<EvseId>,
    /// Reusing the id of an active reservation on the same EVSE extends it
    pub reservation_id: Option<ChargingReservationId>,
    pub start_time: Option<DateTime<Utc>>,
    pub duration: Option<Duration>,
    pub auth: Option<AuthIdentification>,
}

impl ReserveRequest {
    pub fn evse(evse_id: EvseId) -> Self {
        Self {
            evse_id: Some(evse_id),
            ..Default::default()
        }
    }

    pub fn any_evse() -> Self {
        Self::default()
    }

    pub fn with_reservation_id(mut self, reservation_id: ChargingReservationId) -> Self {
        self.reservation_id = Some(reservation_id);
        self
    }

    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = Some(duration);
        self
    }

    pub fn with_start_time(mut self, start_time: DateTime<Utc>) -> Self {
        self.start_time = Some(start_time);
        self
    }

    pub fn with_auth(mut self, auth: AuthIdentification) -> Self {
        self.auth = Some(auth);
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "result", content = "reservation")]
pub enum ReservationResult {
    Success(ChargingReservation),
    UnknownEvse,
    OutOfService,
    AlreadyInUse,
    AlreadyReserved,
    NoEvseAvailable,
    InvalidCredentials,
    InvalidDuration,
}

impl ReservationResult {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    pub fn reservation(&self) -> Option<&ChargingReservation> {
        match self {
            Self::Success(reservation) => Some(reservation),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "result", content = "reservation")]
pub enum CancelReservationResult {
    Success(ChargingReservation),
    UnknownReservation,
}

impl CancelReservationResult {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }
}

#[derive(Debug, Clone)]
pub struct RemoteStartRequest {
    pub evse_id: EvseId,
    pub auth: AuthIdentification,
    pub reservation_id: Option<ChargingReservationId>,
    pub session_id: Option<ChargingSessionId>,
}

impl RemoteStartRequest {
    pub fn new(evse_id: EvseId, auth: AuthIdentification) -> Self {
        Self {
            evse_id,
            auth,
            reservation_id: None,
            session_id: None,
        }
    }

    pub fn with_reservation_id(mut self, reservation_id: ChargingReservationId) -> Self {
        self.reservation_id = Some(reservation_id);
        self
    }

    pub fn with_session_id(mut self, session_id: ChargingSessionId) -> Self {
        self.session_id = Some(session_id);
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "result", content = "session")]
pub enum RemoteStartResult {
    Success(ChargingSession),
    UnknownEvse,
    OutOfService,
    AlreadyInUse,
    /// Held by a reservation the request does not match
    Reserved,
    UnknownReservation,
    InvalidCredentials,
}

impl RemoteStartResult {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    pub fn session(&self) -> Option<&ChargingSession> {
        match self {
            Self::Success(session) => Some(session),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "result", content = "charge_detail_record")]
pub enum RemoteStopResult {
    Success(Box<ChargeDetailRecord>),
    UnknownSession,
    InvalidCredentials,
}

impl RemoteStopResult {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    pub fn charge_detail_record(&self) -> Option<&ChargeDetailRecord> {
        match self {
            Self::Success(cdr) => Some(cdr),
            _ => None,
        }
    }
}
