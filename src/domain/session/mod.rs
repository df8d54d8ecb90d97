//! Charging session aggregate

pub mod model;

pub use model::{ChargingSession, MeterValue, SessionStatus, StopReason};
