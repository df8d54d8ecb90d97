//! Charging station aggregate
//!
//! A charging station hosts one or more EVSEs of the same operator.

pub mod model;

pub use model::ChargingStation;
