//! Application layer
//!
//! Stateful services on top of the domain model.

pub mod charging;

pub use charging::{
    start_reservation_expiry_task, SharedStationRegistry, StationRegistry, VirtualChargingStation,
    VirtualStationSettings,
};
