//! End-to-end use of the public API: build a network, derive ids, run a
//! virtual station through reservation, session and expiry.

use chrono::{Duration, Utc};

use chargenet::application::charging::{
    RemoteStartRequest, RemoteStartResult, ReservationResult, ReserveRequest,
};
use chargenet::application::{StationRegistry, VirtualChargingStation, VirtualStationSettings};
use chargenet::config::AppConfig;
use chargenet::domain::auth::AuthIdentification;
use chargenet::domain::ids::{
    ChargingPoolId, ChargingStationId, ChargingStationOperatorId, EvseId, DEFAULT_HASH_LENGTH,
};
use chargenet::domain::session::StopReason;
use chargenet::domain::{
    ChargingPool, ChargingStation, ChargingStationOperator, DomainError, EvseStatus,
    OperationalStatus, RoamingNetwork, RoamingNetworkId,
};

fn evse_ids(ids: &[&str]) -> Vec<EvseId> {
    ids.iter().map(|id| EvseId::parse(id).unwrap()).collect()
}

#[test]
fn station_id_from_evses_of_one_station() {
    let ids = evse_ids(&["DE*GEF*E1234*2", "DE*GEF*E1234*1"]);
    let station_id = ChargingStationId::from_evse_ids(&ids, DEFAULT_HASH_LENGTH).unwrap();
    assert_eq!(station_id.to_string(), "DE*GEF*S1234");
    assert!(ids.iter().all(|id| station_id.contains(id)));
}

#[test]
fn station_id_falls_back_to_hash() {
    let ids = evse_ids(&["DE*GEF*EA*1", "DE*GEF*EB*1"]);
    let forward = ChargingStationId::from_evse_ids(&ids, DEFAULT_HASH_LENGTH).unwrap();
    let reversed = ChargingStationId::from_evse_ids(ids.iter().rev(), DEFAULT_HASH_LENGTH).unwrap();
    assert_eq!(forward, reversed);
    assert_eq!(forward.suffix().len(), DEFAULT_HASH_LENGTH);
    assert!(forward
        .suffix()
        .chars()
        .all(|c| c.is_ascii_digit() || ('A'..='F').contains(&c)));
}

#[test]
fn station_id_requires_single_operator() {
    let ids = evse_ids(&["DE*GEF*E1*1", "DE*ABC*E1*2"]);
    assert!(matches!(
        ChargingStationId::from_evse_ids(&ids, DEFAULT_HASH_LENGTH),
        Err(DomainError::Validation(_))
    ));
}

#[test]
fn network_hierarchy_routes_status_changes() {
    let operator_id = ChargingStationOperatorId::parse("DE*GEF").unwrap();
    let station_id = ChargingStationId::parse("DE*GEF*S1").unwrap();

    let mut station = ChargingStation::new(station_id.clone());
    station.create_evse(1).unwrap();
    station.create_evse(2).unwrap();

    let mut pool = ChargingPool::new(ChargingPoolId::parse("DE*GEF*P1").unwrap());
    pool.add_station(station).unwrap();

    let mut operator = ChargingStationOperator::new(operator_id, "GraphDefined");
    operator.add_pool(pool).unwrap();

    let mut network = RoamingNetwork::new(RoamingNetworkId::new("TEST").unwrap());
    network.add_operator(operator).unwrap();
    assert_eq!(network.evse_count(), 2);

    let later = Utc::now() + Duration::seconds(1);
    for n in 1..=2 {
        let evse_id = EvseId::parse(&format!("DE*GEF*E1*{n}")).unwrap();
        network
            .set_evse_status(&evse_id, EvseStatus::Available, later)
            .unwrap();
    }
    let charging = EvseId::parse("DE*GEF*E1*1").unwrap();
    network
        .set_evse_status(&charging, EvseStatus::Charging, later + Duration::seconds(1))
        .unwrap();

    assert_eq!(network.evse(&charging).unwrap().status(), EvseStatus::Charging);
    // One EVSE is still free
    assert_eq!(
        network.charging_station(&station_id).unwrap().status(),
        OperationalStatus::Available
    );

    let json = serde_json::to_string(&network).unwrap();
    let back: RoamingNetwork = serde_json::from_str(&json).unwrap();
    assert_eq!(back.evse(&charging).unwrap().status(), EvseStatus::Charging);
}

#[tokio::test]
async fn reserve_start_stop_and_expire() {
    let config = AppConfig::default();
    let mut entity = ChargingStation::new(ChargingStationId::parse("DE*GEF*S1234").unwrap());
    entity.create_evse(1).unwrap();
    entity.create_evse(2).unwrap();

    let registry = StationRegistry::shared();
    registry
        .register(
            VirtualChargingStation::new(entity, VirtualStationSettings::from(&config.reservations))
                .with_pool_id(ChargingPoolId::parse("DE*GEF*P1").unwrap()),
        )
        .await
        .unwrap();

    let driver = AuthIdentification::token("04A2B3C4").unwrap();
    let evse_1 = EvseId::parse("DE*GEF*E1234*1").unwrap();
    let evse_2 = EvseId::parse("DE*GEF*E1234*2").unwrap();

    // Reserve for the driver, then start with the same token
    let reserved = registry
        .reserve(ReserveRequest::evse(evse_1.clone()).with_auth(driver.clone()))
        .await;
    assert!(reserved.is_success());
    assert!(matches!(
        registry.reserve(ReserveRequest::evse(evse_1.clone())).await,
        ReservationResult::AlreadyReserved
    ));

    let session = match registry
        .remote_start(RemoteStartRequest::new(evse_1.clone(), driver.clone()))
        .await
    {
        RemoteStartResult::Success(session) => session,
        other => panic!("unexpected {other:?}"),
    };
    assert!(session.reservation_id.is_some());

    registry.record_meter_value(&session.id, 21_000).await.unwrap();
    let stopped = registry
        .remote_stop(&session.id, StopReason::EvDisconnected, Some(driver))
        .await;
    let cdr = stopped.charge_detail_record().unwrap();
    assert_eq!(cdr.consumed_energy_kwh.to_string(), "21.000");
    assert_eq!(cdr.evse_id, evse_1);

    // A reservation nobody picks up
    let short = registry
        .reserve(ReserveRequest::evse(evse_2.clone()).with_duration(Duration::minutes(1)))
        .await;
    assert!(short.is_success());
    let expired = registry
        .check_reservation_expiry(Utc::now() + Duration::minutes(2))
        .await;
    assert_eq!(expired.len(), 1);

    let station = registry
        .station_for_evse(&evse_2)
        .expect("registered station");
    assert_eq!(station.evse_status(&evse_2).await, Some(EvseStatus::Available));
    assert_eq!(station.charge_detail_records().await.len(), 1);
}
