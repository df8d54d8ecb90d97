//! Charging pool aggregate: stations sharing one location

pub mod model;

pub use model::ChargingPool;
