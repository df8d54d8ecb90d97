//! Reservation aggregate
//!
//! A reservation holds an EVSE for one driver until it is used, cancelled
//! or expires.

pub mod model;

pub use model::{CancellationReason, ChargingReservation, ReservationLevel, ReservationStatus};
