//! Operational/admin status values and their change-tracked schedules

pub mod propagation;
pub mod schedule;
pub mod types;

pub use propagation::StatusPropagation;
pub use schedule::{StatusSchedule, Timestamped, DEFAULT_HISTORY_SIZE};
pub use types::{
    AdminStatus, ChargingPoolAdminStatus, ChargingPoolStatus, ChargingStationAdminStatus,
    ChargingStationStatus, EvseAdminStatus, EvseStatus, OperationalStatus,
};
