//! Identifier value objects
//!
//! Operator ids anchor the id tree: pool, station and EVSE ids embed the
//! operator id of their owner and render in its format.

pub mod country;
pub mod emobility;
pub mod evse;
mod grammar;
pub mod operator;
pub mod pool;
pub mod session;
pub mod station;

pub use country::Country;
pub use emobility::{EMobilityAccountId, EMobilityProviderId, ProviderIdFormat};
pub use evse::EvseId;
pub use operator::{ChargingStationOperatorId, OperatorIdFormat};
pub use pool::ChargingPoolId;
pub use session::{ChargingReservationId, ChargingSessionId};
pub use station::{ChargingStationId, DEFAULT_HASH_LENGTH};
