//! Domain model of a charging network
//!
//! Containment: EVSE → ChargingStation → ChargingPool →
//! ChargingStationOperator → RoamingNetwork.

pub mod auth;
pub mod cdr;
pub mod charging_pool;
pub mod charging_station;
pub mod evse;
pub mod ids;
pub mod location;
pub mod operator;
pub mod reservation;
pub mod roaming_network;
pub mod session;
pub mod status;

// Re-export commonly used types
pub use auth::{AuthIdentification, AuthToken, AuthenticationMode, AuthenticationModes};
pub use cdr::ChargeDetailRecord;
pub use charging_pool::ChargingPool;
pub use charging_station::ChargingStation;
pub use evse::Evse;
pub use ids::{
    ChargingPoolId, ChargingReservationId, ChargingSessionId, ChargingStationId,
    ChargingStationOperatorId, EvseId,
};
pub use operator::ChargingStationOperator;
pub use reservation::{CancellationReason, ChargingReservation, ReservationLevel, ReservationStatus};
pub use roaming_network::{RoamingNetwork, RoamingNetworkId};
pub use session::{ChargingSession, StopReason};
pub use status::{AdminStatus, EvseStatus, OperationalStatus};

pub use crate::support::errors::{DomainError, DomainResult};
