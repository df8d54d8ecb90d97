//! Station registry: routes remote operations to virtual charging stations

use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tracing::{info, warn};

use super::results::{
    CancelReservationResult, RemoteStartRequest, RemoteStartResult, RemoteStopResult,
    ReservationResult, ReserveRequest,
};
use super::virtual_station::VirtualChargingStation;
use crate::domain::auth::AuthIdentification;
use crate::domain::ids::{ChargingReservationId, ChargingSessionId, ChargingStationId, EvseId};
use crate::domain::reservation::{CancellationReason, ChargingReservation};
use crate::domain::session::StopReason;
use crate::support::errors::{DomainError, DomainResult};

/// Thread-safe registry of virtual charging stations
///
/// Reservation and session ids are indexed to the station that issued
/// them so cancel/stop requests need only the id.
#[derive(Default)]
pub struct StationRegistry {
    stations: DashMap<ChargingStationId, Arc<VirtualChargingStation>>,
    evses: DashMap<EvseId, ChargingStationId>,
    reservations: DashMap<ChargingReservationId, ChargingStationId>,
    sessions: DashMap<ChargingSessionId, ChargingStationId>,
}

/// Shared, reference-counted station registry
pub type SharedStationRegistry = Arc<StationRegistry>;

impl StationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap in `Arc` for shared ownership
    pub fn shared() -> SharedStationRegistry {
        Arc::new(Self::new())
    }

    pub async fn register(
        &self,
        station: VirtualChargingStation,
    ) -> DomainResult<Arc<VirtualChargingStation>> {
        let station_id = station.id().clone();
        let evse_ids = station.evse_ids().await;

        let station = match self.stations.entry(station_id.clone()) {
            Entry::Occupied(_) => {
                return Err(DomainError::Conflict(format!(
                    "charging station {station_id} is already registered"
                )));
            }
            Entry::Vacant(vacant) => vacant.insert(Arc::new(station)).value().clone(),
        };
        for evse_id in evse_ids {
            self.evses.insert(evse_id, station_id.clone());
        }

        info!(station_id = %station_id, "Registered charging station");
        Ok(station)
    }

    pub fn unregister(&self, station_id: &ChargingStationId) -> Option<Arc<VirtualChargingStation>> {
        let Some((_, station)) = self.stations.remove(station_id) else {
            warn!(station_id = %station_id, "Attempted to unregister unknown station");
            return None;
        };
        self.evses.retain(|_, owner| owner != station_id);
        self.reservations.retain(|_, owner| owner != station_id);
        self.sessions.retain(|_, owner| owner != station_id);
        info!(station_id = %station_id, "Unregistered charging station");
        Some(station)
    }

    pub fn get(&self, station_id: &ChargingStationId) -> Option<Arc<VirtualChargingStation>> {
        self.stations.get(station_id).map(|entry| entry.value().clone())
    }

    /// Station owning `evse_id`; EVSEs added after registration are found
    /// through the station id derived from the EVSE id
    pub fn station_for_evse(&self, evse_id: &EvseId) -> Option<Arc<VirtualChargingStation>> {
        let station_id = self
            .evses
            .get(evse_id)
            .map(|entry| entry.value().clone())
            .unwrap_or_else(|| evse_id.station_id());
        self.get(&station_id)
    }

    pub fn station_ids(&self) -> Vec<ChargingStationId> {
        self.stations.iter().map(|entry| entry.key().clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.stations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stations.is_empty()
    }

    /// Reserve a specific EVSE
    pub async fn reserve(&self, request: ReserveRequest) -> ReservationResult {
        let Some(station) = request
            .evse_id
            .as_ref()
            .and_then(|evse_id| self.station_for_evse(evse_id))
        else {
            return ReservationResult::UnknownEvse;
        };
        self.reserve_on(station, request).await
    }

    /// Reserve at a station; without an EVSE in the request the station picks one
    pub async fn reserve_station(
        &self,
        station_id: &ChargingStationId,
        request: ReserveRequest,
    ) -> ReservationResult {
        let Some(station) = self.get(station_id) else {
            return ReservationResult::UnknownEvse;
        };
        self.reserve_on(station, request).await
    }

    async fn reserve_on(
        &self,
        station: Arc<VirtualChargingStation>,
        request: ReserveRequest,
    ) -> ReservationResult {
        if let Some(reservation_id) = &request.reservation_id {
            if !self.claim_reservation_id(reservation_id, station.id()) {
                return ReservationResult::AlreadyReserved;
            }
        }

        let result = station.reserve(request.clone()).await;
        match result.reservation() {
            Some(reservation) => {
                self.reservations
                    .insert(reservation.id.clone(), station.id().clone());
            }
            None => {
                // Give back a claim the station did not take up
                if let Some(reservation_id) = &request.reservation_id {
                    if station.reservation(reservation_id).await.is_none() {
                        self.reservations
                            .remove_if(reservation_id, |_, owner| owner == station.id());
                    }
                }
            }
        }
        result
    }

    /// Route `reservation_id` to `station_id` unless another station holds it.
    ///
    /// Index entries leave with cancel, session start, a failed reserve or
    /// the expiry sweep.
    fn claim_reservation_id(
        &self,
        reservation_id: &ChargingReservationId,
        station_id: &ChargingStationId,
    ) -> bool {
        match self.reservations.entry(reservation_id.clone()) {
            Entry::Vacant(vacant) => {
                vacant.insert(station_id.clone());
                true
            }
            Entry::Occupied(occupied) => occupied.get() == station_id,
        }
    }

    pub async fn cancel_reservation(
        &self,
        reservation_id: &ChargingReservationId,
        reason: CancellationReason,
    ) -> CancelReservationResult {
        let Some(station) = self.station_for_reservation(reservation_id) else {
            return CancelReservationResult::UnknownReservation;
        };
        self.reservations.remove(reservation_id);
        station.cancel_reservation(reservation_id, reason).await
    }

    pub async fn remote_start(&self, request: RemoteStartRequest) -> RemoteStartResult {
        let Some(station) = self.station_for_evse(&request.evse_id) else {
            return RemoteStartResult::UnknownEvse;
        };
        let result = station.remote_start(request).await;
        if let Some(session) = result.session() {
            if let Some(reservation_id) = &session.reservation_id {
                self.reservations.remove(reservation_id);
            }
            self.sessions
                .insert(session.id.clone(), station.id().clone());
        }
        result
    }

    pub async fn record_meter_value(
        &self,
        session_id: &ChargingSessionId,
        energy_wh: i64,
    ) -> DomainResult<()> {
        let station = self
            .station_for_session(session_id)
            .ok_or_else(|| DomainError::not_found("charging session", "id", session_id))?;
        station.record_meter_value(session_id, energy_wh).await
    }

    pub async fn remote_stop(
        &self,
        session_id: &ChargingSessionId,
        reason: StopReason,
        auth: Option<AuthIdentification>,
    ) -> RemoteStopResult {
        let Some(station) = self.station_for_session(session_id) else {
            return RemoteStopResult::UnknownSession;
        };
        let result = station.remote_stop(session_id, reason, auth).await;
        if result.is_success() {
            self.sessions.remove(session_id);
        }
        result
    }

    /// Expire overdue reservations on every station
    pub async fn check_reservation_expiry(&self, now: DateTime<Utc>) -> Vec<ChargingReservation> {
        // Collect first: no DashMap guard may live across an await
        let stations: Vec<Arc<VirtualChargingStation>> = self
            .stations
            .iter()
            .map(|entry| entry.value().clone())
            .collect();

        let mut expired = Vec::new();
        for station in stations {
            for reservation in station.check_reservation_expiry(now).await {
                self.reservations.remove(&reservation.id);
                expired.push(reservation);
            }
        }
        expired
    }

    fn station_for_reservation(
        &self,
        reservation_id: &ChargingReservationId,
    ) -> Option<Arc<VirtualChargingStation>> {
        let station_id = self.reservations.get(reservation_id)?.value().clone();
        self.get(&station_id)
    }

    fn station_for_session(
        &self,
        session_id: &ChargingSessionId,
    ) -> Option<Arc<VirtualChargingStation>> {
        let station_id = self.sessions.get(session_id)?.value().clone();
        self.get(&station_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::charging::VirtualStationSettings;
    use crate::domain::charging_station::ChargingStation;
    use chrono::Duration;

    fn virtual_station(id: &str, evses: u32) -> VirtualChargingStation {
        let mut entity = ChargingStation::new(ChargingStationId::parse(id).unwrap());
        for n in 1..=evses {
            entity.create_evse(n).unwrap();
        }
        VirtualChargingStation::new(entity, VirtualStationSettings::default())
    }

    fn token() -> AuthIdentification {
        AuthIdentification::token("04A2B3C4").unwrap()
    }

    #[tokio::test]
    async fn register_rejects_duplicates() {
        let registry = StationRegistry::new();
        registry.register(virtual_station("DE*GEF*S1", 1)).await.unwrap();
        let duplicate = registry.register(virtual_station("DE*GEF*S1", 1)).await;
        assert!(matches!(duplicate, Err(DomainError::Conflict(_))));
        assert_eq!(registry.len(), 1);
    }

    #[tokio::test]
    async fn routes_by_evse_id() {
        let registry = StationRegistry::new();
        registry.register(virtual_station("DE*GEF*S1", 2)).await.unwrap();
        registry.register(virtual_station("DE*GEF*S2", 1)).await.unwrap();

        let evse_id = EvseId::parse("DE*GEF*E2*1").unwrap();
        let result = registry.reserve(ReserveRequest::evse(evse_id.clone())).await;
        let reservation = result.reservation().unwrap();
        assert_eq!(reservation.charging_station_id.to_string(), "DE*GEF*S2");

        let unknown = EvseId::parse("DE*GEF*E9*1").unwrap();
        assert!(matches!(
            registry.reserve(ReserveRequest::evse(unknown)).await,
            ReservationResult::UnknownEvse
        ));
    }

    #[tokio::test]
    async fn cancel_by_reservation_id_only() {
        let registry = StationRegistry::new();
        let station_id = ChargingStationId::parse("DE*GEF*S1").unwrap();
        registry.register(virtual_station("DE*GEF*S1", 1)).await.unwrap();

        let reservation = registry
            .reserve_station(&station_id, ReserveRequest::any_evse())
            .await
            .reservation()
            .unwrap()
            .clone();
        assert!(registry
            .cancel_reservation(&reservation.id, CancellationReason::Aborted)
            .await
            .is_success());
        assert!(matches!(
            registry
                .cancel_reservation(&reservation.id, CancellationReason::Aborted)
                .await,
            CancelReservationResult::UnknownReservation
        ));
    }

    #[tokio::test]
    async fn session_lifecycle_through_registry() {
        let registry = StationRegistry::new();
        registry.register(virtual_station("DE*GEF*S1", 1)).await.unwrap();
        let evse_id = EvseId::parse("DE*GEF*E1*1").unwrap();

        let session = registry
            .remote_start(RemoteStartRequest::new(evse_id, token()))
            .await
            .session()
            .unwrap()
            .clone();
        registry.record_meter_value(&session.id, 7000).await.unwrap();

        let stopped = registry
            .remote_stop(&session.id, StopReason::Remote, None)
            .await;
        assert_eq!(stopped.charge_detail_record().unwrap().meter_stop_wh, 7000);
        assert!(matches!(
            registry.remote_stop(&session.id, StopReason::Remote, None).await,
            RemoteStopResult::UnknownSession
        ));
        assert!(registry.record_meter_value(&session.id, 8000).await.is_err());
    }

    #[tokio::test]
    async fn concurrent_registration_has_one_winner() {
        let registry = StationRegistry::new();
        let (first, second) = tokio::join!(
            registry.register(virtual_station("DE*GEF*S1", 1)),
            registry.register(virtual_station("DE*GEF*S1", 2)),
        );
        assert_eq!([first.is_ok(), second.is_ok()].iter().filter(|ok| **ok).count(), 1);
        assert!(matches!(
            first.err().or(second.err()),
            Some(DomainError::Conflict(_))
        ));
        assert_eq!(registry.len(), 1);
    }

    #[tokio::test]
    async fn reservation_id_is_unique_across_stations() {
        let registry = StationRegistry::new();
        let first_station = registry.register(virtual_station("DE*GEF*S1", 1)).await.unwrap();
        let second_station = registry.register(virtual_station("DE*GEF*S2", 1)).await.unwrap();
        let id = ChargingReservationId::parse("R-1").unwrap();

        let first = registry
            .reserve(
                ReserveRequest::evse(EvseId::parse("DE*GEF*E1*1").unwrap())
                    .with_reservation_id(id.clone()),
            )
            .await;
        assert!(first.is_success());
        let second = registry
            .reserve(
                ReserveRequest::evse(EvseId::parse("DE*GEF*E2*1").unwrap())
                    .with_reservation_id(id.clone()),
            )
            .await;
        assert!(matches!(second, ReservationResult::AlreadyReserved));
        assert!(second_station.reservations().await.is_empty());

        assert!(registry
            .cancel_reservation(&id, CancellationReason::Deleted)
            .await
            .is_success());
        assert!(first_station.reservations().await.is_empty());

        // Free again once cancelled
        let reused = registry
            .reserve(
                ReserveRequest::evse(EvseId::parse("DE*GEF*E2*1").unwrap())
                    .with_reservation_id(id.clone()),
            )
            .await;
        assert!(reused.is_success());
    }

    #[tokio::test]
    async fn refused_reservation_releases_its_id() {
        let registry = StationRegistry::new();
        registry.register(virtual_station("DE*GEF*S1", 1)).await.unwrap();
        registry.register(virtual_station("DE*GEF*S2", 1)).await.unwrap();
        let id = ChargingReservationId::parse("R-7").unwrap();

        let unknown_evse = registry
            .reserve_station(
                &ChargingStationId::parse("DE*GEF*S1").unwrap(),
                ReserveRequest::evse(EvseId::parse("DE*GEF*E1*9").unwrap())
                    .with_reservation_id(id.clone()),
            )
            .await;
        assert!(matches!(unknown_evse, ReservationResult::UnknownEvse));
        assert!(registry.reservations.is_empty());

        let elsewhere = registry
            .reserve(
                ReserveRequest::evse(EvseId::parse("DE*GEF*E2*1").unwrap())
                    .with_reservation_id(id),
            )
            .await;
        assert!(elsewhere.is_success());
    }

    #[tokio::test]
    async fn sweep_clears_index_of_reservations_expired_on_request() {
        let registry = StationRegistry::new();
        let station = registry.register(virtual_station("DE*GEF*S1", 1)).await.unwrap();
        let evse_id = EvseId::parse("DE*GEF*E1*1").unwrap();

        let request = ReserveRequest::evse(evse_id.clone())
            .with_reservation_id(ChargingReservationId::parse("R-9").unwrap())
            .with_duration(Duration::milliseconds(1));
        assert!(registry.reserve(request).await.is_success());
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;

        // Served after the end time: the stale reservation no longer blocks
        assert!(registry
            .remote_start(RemoteStartRequest::new(evse_id, token()))
            .await
            .is_success());
        assert!(station.reservations().await.is_empty());

        let expired = registry.check_reservation_expiry(Utc::now()).await;
        assert_eq!(expired.len(), 1);
        assert!(registry.reservations.is_empty());
    }

    #[tokio::test]
    async fn expiry_spans_all_stations() {
        let registry = StationRegistry::new();
        registry.register(virtual_station("DE*GEF*S1", 1)).await.unwrap();
        registry.register(virtual_station("DE*GEF*S2", 1)).await.unwrap();

        for id in ["DE*GEF*E1*1", "DE*GEF*E2*1"] {
            let request = ReserveRequest::evse(EvseId::parse(id).unwrap())
                .with_duration(Duration::minutes(1));
            assert!(registry.reserve(request).await.is_success());
        }

        let expired = registry
            .check_reservation_expiry(Utc::now() + Duration::minutes(5))
            .await;
        assert_eq!(expired.len(), 2);
        assert!(registry.reservations.is_empty());
    }

    #[tokio::test]
    async fn unregister_drops_indexes() {
        let registry = StationRegistry::new();
        let station_id = ChargingStationId::parse("DE*GEF*S1").unwrap();
        registry.register(virtual_station("DE*GEF*S1", 1)).await.unwrap();

        assert!(registry.unregister(&station_id).is_some());
        assert!(registry.is_empty());
        assert!(registry.evses.is_empty());
        assert!(registry.unregister(&station_id).is_none());
    }
}
