//! Status values shared by EVSEs, charging stations and charging pools

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::support::errors::DomainError;

/// What a charging point is currently doing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OperationalStatus {
    Unknown,
    Available,
    Reserved,
    Charging,
    Faulted,
    OutOfService,
    Offline,
}

impl Default for OperationalStatus {
    fn default() -> Self {
        Self::Unknown
    }
}

impl OperationalStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unknown => "Unknown",
            Self::Available => "Available",
            Self::Reserved => "Reserved",
            Self::Charging => "Charging",
            Self::Faulted => "Faulted",
            Self::OutOfService => "OutOfService",
            Self::Offline => "Offline",
        }
    }

    /// Whether a new reservation or session may be placed
    pub fn is_available(&self) -> bool {
        *self == Self::Available
    }

    /// Whether the point cannot serve drivers at all
    pub fn is_out_of_order(&self) -> bool {
        matches!(self, Self::Faulted | Self::OutOfService | Self::Offline)
    }

    /// Status of a container (station, pool) from the statuses it holds.
    ///
    /// One available child makes the container available; otherwise the
    /// first present of Charging, Reserved, Faulted, OutOfService, Offline
    /// wins. No children means Unknown.
    pub fn aggregate<I>(statuses: I) -> Self
    where
        I: IntoIterator<Item = Self>,
    {
        const PRECEDENCE: [OperationalStatus; 6] = [
            OperationalStatus::Available,
            OperationalStatus::Charging,
            OperationalStatus::Reserved,
            OperationalStatus::Faulted,
            OperationalStatus::OutOfService,
            OperationalStatus::Offline,
        ];

        let seen: Vec<Self> = statuses.into_iter().collect();
        PRECEDENCE
            .into_iter()
            .find(|candidate| seen.contains(candidate))
            .unwrap_or(Self::Unknown)
    }
}

impl fmt::Display for OperationalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OperationalStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "unknown" => Ok(Self::Unknown),
            "available" => Ok(Self::Available),
            "reserved" => Ok(Self::Reserved),
            "charging" => Ok(Self::Charging),
            "faulted" => Ok(Self::Faulted),
            "outofservice" => Ok(Self::OutOfService),
            "offline" => Ok(Self::Offline),
            other => Err(DomainError::Validation(format!("unknown status '{other}'"))),
        }
    }
}

/// Operator-controlled lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AdminStatus {
    Planned,
    InDeployment,
    Operational,
    InternalUse,
    OutOfService,
    Blocked,
}

impl Default for AdminStatus {
    fn default() -> Self {
        Self::Operational
    }
}

impl AdminStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Planned => "Planned",
            Self::InDeployment => "InDeployment",
            Self::Operational => "Operational",
            Self::InternalUse => "InternalUse",
            Self::OutOfService => "OutOfService",
            Self::Blocked => "Blocked",
        }
    }

    /// Open to public reservations and sessions
    pub fn is_operational(&self) -> bool {
        *self == Self::Operational
    }
}

impl fmt::Display for AdminStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AdminStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "planned" => Ok(Self::Planned),
            "indeployment" => Ok(Self::InDeployment),
            "operational" => Ok(Self::Operational),
            "internaluse" => Ok(Self::InternalUse),
            "outofservice" => Ok(Self::OutOfService),
            "blocked" => Ok(Self::Blocked),
            other => Err(DomainError::Validation(format!(
                "unknown admin status '{other}'"
            ))),
        }
    }
}

pub type EvseStatus = OperationalStatus;
pub type ChargingStationStatus = OperationalStatus;
pub type ChargingPoolStatus = OperationalStatus;

pub type EvseAdminStatus = AdminStatus;
pub type ChargingStationAdminStatus = AdminStatus;
pub type ChargingPoolAdminStatus = AdminStatus;
