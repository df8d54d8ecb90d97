//! Virtual charging stations and the registry routing remote operations
//! to them

pub mod registry;
pub mod results;
pub mod services;
pub mod virtual_station;

pub use registry::{SharedStationRegistry, StationRegistry};
pub use results::{
    CancelReservationResult, RemoteStartRequest, RemoteStartResult, RemoteStopResult,
    ReservationResult, ReserveRequest,
};
pub use services::start_reservation_expiry_task;
pub use virtual_station::{VirtualChargingStation, VirtualStationSettings};
