//! Status changes caused by one EVSE status update
//!
//! Containers recompute their status from their children when an EVSE
//! changes; the previous values of every level that changed are reported.

use super::schedule::Timestamped;
use super::types::{ChargingPoolStatus, ChargingStationStatus, EvseStatus};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusPropagation {
    pub evse: Option<Timestamped<EvseStatus>>,
    pub charging_station: Option<Timestamped<ChargingStationStatus>>,
    pub charging_pool: Option<Timestamped<ChargingPoolStatus>>,
}

impl StatusPropagation {
    pub fn is_empty(&self) -> bool {
        self.evse.is_none() && self.charging_station.is_none() && self.charging_pool.is_none()
    }
}
