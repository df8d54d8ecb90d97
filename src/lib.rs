//! # chargenet
//!
//! Domain model of an EV charging network.
//!
//! - **domain**: identifiers, entities (EVSE → charging station → pool →
//!   operator → roaming network), status schedules, reservations,
//!   sessions and charge detail records
//! - **application**: virtual charging stations doing reservation and
//!   session bookkeeping, the station registry and the reservation
//!   expiry task
//! - **config**, **telemetry**, **support**: configuration, tracing
//!   setup, errors and shutdown signalling

pub mod application;
pub mod config;
pub mod domain;
pub mod support;
pub mod telemetry;

pub use config::{default_config_path, AppConfig};
pub use support::errors::{ConfigError, DomainError, DomainResult, IdParseError};
pub use telemetry::init_tracing;
