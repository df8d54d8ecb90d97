//! Virtual charging station
//!
//! In-memory reservation and session bookkeeping on top of a
//! [`ChargingStation`] entity. Each EVSE holds at most one active
//! reservation and one active session; all state sits behind a single
//! `RwLock` so every operation sees a consistent station.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use super::results::{
    CancelReservationResult, RemoteStartRequest, RemoteStartResult, RemoteStopResult,
    ReservationResult, ReserveRequest,
};
use crate::config::ReservationConfig;
use crate::domain::auth::AuthIdentification;
use crate::domain::cdr::ChargeDetailRecord;
use crate::domain::charging_station::ChargingStation;
use crate::domain::ids::{
    ChargingPoolId, ChargingReservationId, ChargingSessionId, ChargingStationId, EvseId,
};
use crate::domain::reservation::{CancellationReason, ChargingReservation, ReservationLevel};
use crate::domain::session::{ChargingSession, StopReason};
use crate::domain::status::{EvseStatus, StatusPropagation};
use crate::support::errors::{DomainError, DomainResult};

/// Reservation duration limits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VirtualStationSettings {
    pub default_reservation_duration: Duration,
    pub max_reservation_duration: Duration,
}

impl Default for VirtualStationSettings {
    fn default() -> Self {
        Self::from(&ReservationConfig::default())
    }
}

impl From<&ReservationConfig> for VirtualStationSettings {
    fn from(config: &ReservationConfig) -> Self {
        Self {
            default_reservation_duration: config.default_duration(),
            max_reservation_duration: config.max_duration(),
        }
    }
}

struct StationState {
    station: ChargingStation,
    reservations: HashMap<ChargingReservationId, ChargingReservation>,
    sessions: HashMap<ChargingSessionId, ChargingSession>,
    /// Energy meter per EVSE (Wh)
    meters: HashMap<EvseId, i64>,
    charge_detail_records: Vec<ChargeDetailRecord>,
    /// Expired while serving a request; handed out by the next sweep
    expired: Vec<ChargingReservation>,
}

impl StationState {
    fn reservation_on(&self, evse_id: &EvseId) -> Option<&ChargingReservation> {
        self.reservations
            .values()
            .find(|reservation| &reservation.evse_id == evse_id)
    }

    /// Drop reservations past their end time and free their EVSEs
    fn expire_reservations(&mut self, now: DateTime<Utc>) {
        let expired_ids: Vec<ChargingReservationId> = self
            .reservations
            .values()
            .filter(|reservation| reservation.is_expired(now))
            .map(|reservation| reservation.id.clone())
            .collect();

        for reservation_id in expired_ids {
            if let Some(mut reservation) = self.reservations.remove(&reservation_id) {
                reservation.expire();
                self.release_evse(&reservation.evse_id, EvseStatus::Reserved);
                debug!(
                    reservation_id = %reservation.id,
                    evse_id = %reservation.evse_id,
                    "Reservation expired"
                );
                self.expired.push(reservation);
            }
        }
    }

    fn set_evse_status(&mut self, evse_id: &EvseId, status: EvseStatus) {
        if let Err(e) = self.station.set_evse_status(evse_id, status, Utc::now()) {
            warn!(evse_id = %evse_id, error = %e, "Failed to update EVSE status");
        }
    }

    /// Back to Available unless the EVSE has moved on to another state
    fn release_evse(&mut self, evse_id: &EvseId, from: EvseStatus) {
        let current = self.station.evse(evse_id).map(|evse| evse.status());
        if current == Some(from) {
            self.set_evse_status(evse_id, EvseStatus::Available);
        }
    }
}

pub struct VirtualChargingStation {
    id: ChargingStationId,
    pool_id: Option<ChargingPoolId>,
    settings: VirtualStationSettings,
    state: RwLock<StationState>,
}

impl VirtualChargingStation {
    pub fn new(station: ChargingStation, settings: VirtualStationSettings) -> Self {
        Self {
            id: station.id().clone(),
            pool_id: None,
            settings,
            state: RwLock::new(StationState {
                station,
                reservations: HashMap::new(),
                sessions: HashMap::new(),
                meters: HashMap::new(),
                charge_detail_records: Vec::new(),
                expired: Vec::new(),
            }),
        }
    }

    /// Pool reported in charge detail records
    pub fn with_pool_id(mut self, pool_id: ChargingPoolId) -> Self {
        self.pool_id = Some(pool_id);
        self
    }

    pub fn id(&self) -> &ChargingStationId {
        &self.id
    }

    pub fn pool_id(&self) -> Option<&ChargingPoolId> {
        self.pool_id.as_ref()
    }

    pub fn settings(&self) -> &VirtualStationSettings {
        &self.settings
    }

    // ── Reservations ───────────────────────────────────────────

    pub async fn reserve(&self, request: ReserveRequest) -> ReservationResult {
        let now = Utc::now();
        let mut state = self.state.write().await;
        state.expire_reservations(now);

        if let Some(auth) = &request.auth {
            if !state.station.authentication_modes().accepts(auth) {
                return ReservationResult::InvalidCredentials;
            }
        }
        if !state.station.admin_status().is_operational() {
            return ReservationResult::OutOfService;
        }

        let duration = request
            .duration
            .unwrap_or(self.settings.default_reservation_duration)
            .min(self.settings.max_reservation_duration);
        if duration <= Duration::zero() {
            return ReservationResult::InvalidDuration;
        }

        if let Some(reservation_id) = &request.reservation_id {
            if let Some(existing) = state.reservations.get_mut(reservation_id) {
                let same_evse = request
                    .evse_id
                    .as_ref()
                    .map_or(true, |evse_id| evse_id == &existing.evse_id);
                if !same_evse {
                    return ReservationResult::AlreadyReserved;
                }
                // A bound credential is never replaced
                if existing.auth.is_some() && !existing.accepts(request.auth.as_ref()) {
                    return ReservationResult::InvalidCredentials;
                }
                existing.extend(duration);
                if existing.auth.is_none() {
                    existing.auth = request.auth.clone();
                }
                info!(
                    reservation_id = %reservation_id,
                    evse_id = %existing.evse_id,
                    until = %existing.end_time,
                    "Reservation updated"
                );
                return ReservationResult::Success(existing.clone());
            }
        }

        let (evse_id, level) = match &request.evse_id {
            Some(evse_id) => {
                let Some(evse) = state.station.evse(evse_id) else {
                    return ReservationResult::UnknownEvse;
                };
                if !evse.is_usable() {
                    return ReservationResult::OutOfService;
                }
                match evse.status() {
                    EvseStatus::Available => {}
                    EvseStatus::Charging => return ReservationResult::AlreadyInUse,
                    EvseStatus::Reserved => return ReservationResult::AlreadyReserved,
                    _ => return ReservationResult::OutOfService,
                }
                (evse_id.clone(), ReservationLevel::Evse)
            }
            None => match state.station.available_evses().next() {
                Some(evse) => (evse.id().clone(), ReservationLevel::ChargingStation),
                None => return ReservationResult::NoEvseAvailable,
            },
        };

        let reservation = ChargingReservation::new(
            request
                .reservation_id
                .clone()
                .unwrap_or_else(ChargingReservationId::new_random),
            level,
            evse_id.clone(),
            self.id.clone(),
            request.auth.clone(),
            request.start_time.unwrap_or(now),
            duration,
        );

        state.set_evse_status(&evse_id, EvseStatus::Reserved);
        state
            .reservations
            .insert(reservation.id.clone(), reservation.clone());

        info!(
            reservation_id = %reservation.id,
            evse_id = %evse_id,
            until = %reservation.end_time,
            "Reservation accepted"
        );
        ReservationResult::Success(reservation)
    }

    pub async fn cancel_reservation(
        &self,
        reservation_id: &ChargingReservationId,
        reason: CancellationReason,
    ) -> CancelReservationResult {
        let mut state = self.state.write().await;

        let Some(mut reservation) = state.reservations.remove(reservation_id) else {
            return CancelReservationResult::UnknownReservation;
        };
        reservation.cancel(reason);
        state.release_evse(&reservation.evse_id, EvseStatus::Reserved);

        info!(
            reservation_id = %reservation_id,
            evse_id = %reservation.evse_id,
            ?reason,
            "Reservation cancelled"
        );
        CancelReservationResult::Success(reservation)
    }

    /// Remove reservations whose end time has passed at `now`, together
    /// with those already expired while serving requests
    pub async fn check_reservation_expiry(&self, now: DateTime<Utc>) -> Vec<ChargingReservation> {
        let mut state = self.state.write().await;
        state.expire_reservations(now);
        std::mem::take(&mut state.expired)
    }

    pub async fn reservation(
        &self,
        reservation_id: &ChargingReservationId,
    ) -> Option<ChargingReservation> {
        let now = Utc::now();
        self.state
            .read()
            .await
            .reservations
            .get(reservation_id)
            .filter(|reservation| !reservation.is_expired(now))
            .cloned()
    }

    /// Active reservations
    pub async fn reservations(&self) -> Vec<ChargingReservation> {
        let now = Utc::now();
        self.state
            .read()
            .await
            .reservations
            .values()
            .filter(|reservation| !reservation.is_expired(now))
            .cloned()
            .collect()
    }

    // ── Sessions ───────────────────────────────────────────────

    pub async fn remote_start(&self, request: RemoteStartRequest) -> RemoteStartResult {
        let now = Utc::now();
        let mut state = self.state.write().await;
        state.expire_reservations(now);

        if !state.station.authentication_modes().accepts(&request.auth) {
            return RemoteStartResult::InvalidCredentials;
        }
        if !state.station.admin_status().is_operational() {
            return RemoteStartResult::OutOfService;
        }

        let evse_status = match state.station.evse(&request.evse_id) {
            None => return RemoteStartResult::UnknownEvse,
            Some(evse) if !evse.is_usable() => return RemoteStartResult::OutOfService,
            Some(evse) => evse.status(),
        };
        if evse_status == EvseStatus::Charging {
            return RemoteStartResult::AlreadyInUse;
        }

        // Reservation this start consumes, if any
        let consumed = match &request.reservation_id {
            Some(reservation_id) => match state.reservations.get(reservation_id) {
                Some(reservation) if reservation.evse_id == request.evse_id => {
                    if !reservation.accepts(Some(&request.auth)) {
                        return RemoteStartResult::InvalidCredentials;
                    }
                    Some(reservation_id.clone())
                }
                _ => return RemoteStartResult::UnknownReservation,
            },
            None => match state.reservation_on(&request.evse_id) {
                Some(reservation)
                    if reservation.auth.is_some() && reservation.accepts(Some(&request.auth)) =>
                {
                    Some(reservation.id.clone())
                }
                Some(_) => return RemoteStartResult::Reserved,
                None => None,
            },
        };

        if consumed.is_none() && evse_status != EvseStatus::Available {
            return RemoteStartResult::OutOfService;
        }

        let session_id = request
            .session_id
            .clone()
            .unwrap_or_else(ChargingSessionId::new_random);
        if state.sessions.contains_key(&session_id) {
            return RemoteStartResult::AlreadyInUse;
        }

        let meter_start = state.meters.get(&request.evse_id).copied().unwrap_or(0);
        let mut session = ChargingSession::new(
            session_id.clone(),
            request.evse_id.clone(),
            self.id.clone(),
            request.auth.clone(),
            meter_start,
            now,
        );

        if let Some(reservation_id) = consumed {
            if let Some(mut reservation) = state.reservations.remove(&reservation_id) {
                reservation.mark_used();
                debug!(reservation_id = %reservation_id, "Reservation used");
            }
            session.reservation_id = Some(reservation_id);
        }

        state.set_evse_status(&request.evse_id, EvseStatus::Charging);
        state.sessions.insert(session_id.clone(), session.clone());

        info!(
            session_id = %session_id,
            evse_id = %request.evse_id,
            auth = %request.auth,
            "Charging session started"
        );
        RemoteStartResult::Success(session)
    }

    /// Record an energy meter reading (Wh) for an active session
    pub async fn record_meter_value(
        &self,
        session_id: &ChargingSessionId,
        energy_wh: i64,
    ) -> DomainResult<()> {
        let mut state = self.state.write().await;
        let session = state
            .sessions
            .get_mut(session_id)
            .ok_or_else(|| DomainError::not_found("charging session", "id", session_id))?;
        session.record_meter_value(Utc::now(), energy_wh)?;
        let evse_id = session.evse_id.clone();
        state.meters.insert(evse_id, energy_wh);
        Ok(())
    }

    /// Stop a session and build its charge detail record.
    ///
    /// Without `auth` the stop counts as an operator stop; with `auth` it
    /// must be the credential that started the session.
    pub async fn remote_stop(
        &self,
        session_id: &ChargingSessionId,
        reason: StopReason,
        auth: Option<AuthIdentification>,
    ) -> RemoteStopResult {
        let now = Utc::now();
        let mut state = self.state.write().await;

        let Some(session) = state.sessions.get(session_id) else {
            return RemoteStopResult::UnknownSession;
        };
        if auth.as_ref().is_some_and(|auth| auth != &session.auth_start) {
            return RemoteStopResult::InvalidCredentials;
        }

        let Some(mut session) = state.sessions.remove(session_id) else {
            return RemoteStopResult::UnknownSession;
        };
        session.stop(now, auth, reason);
        state.release_evse(&session.evse_id, EvseStatus::Charging);

        let cdr = match ChargeDetailRecord::from_session(&session, self.pool_id.clone()) {
            Ok(cdr) => cdr,
            // from_session only fails for sessions that were not stopped
            Err(e) => {
                warn!(session_id = %session_id, error = %e, "Failed to build charge detail record");
                return RemoteStopResult::UnknownSession;
            }
        };
        state.charge_detail_records.push(cdr.clone());

        info!(
            session_id = %session_id,
            evse_id = %session.evse_id,
            energy_kwh = %cdr.consumed_energy_kwh,
            ?reason,
            "Charging session stopped"
        );
        RemoteStopResult::Success(Box::new(cdr))
    }

    pub async fn session(&self, session_id: &ChargingSessionId) -> Option<ChargingSession> {
        self.state.read().await.sessions.get(session_id).cloned()
    }

    /// Active sessions
    pub async fn sessions(&self) -> Vec<ChargingSession> {
        self.state.read().await.sessions.values().cloned().collect()
    }

    pub async fn charge_detail_records(&self) -> Vec<ChargeDetailRecord> {
        self.state.read().await.charge_detail_records.clone()
    }

    // ── EVSEs ──────────────────────────────────────────────────

    pub async fn evse_ids(&self) -> Vec<EvseId> {
        self.state.read().await.station.evse_ids().cloned().collect()
    }

    pub async fn evse_status(&self, evse_id: &EvseId) -> Option<EvseStatus> {
        self.state
            .read()
            .await
            .station
            .evse(evse_id)
            .map(|evse| evse.status())
    }

    /// Operator status override, e.g. taking an EVSE out of service
    pub async fn set_evse_status(
        &self,
        evse_id: &EvseId,
        status: EvseStatus,
    ) -> DomainResult<StatusPropagation> {
        self.state
            .write()
            .await
            .station
            .set_evse_status(evse_id, status, Utc::now())
    }

    /// Copy of the underlying entity
    pub async fn snapshot(&self) -> ChargingStation {
        self.state.read().await.station.clone()
    }
}
