//! EVSE domain entity

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::ids::EvseId;
use crate::domain::status::{
    EvseAdminStatus, EvseStatus, StatusSchedule, Timestamped, DEFAULT_HISTORY_SIZE,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlugType {
    Type2Outlet,
    Type2Connector,
    CcsCombo2,
    Chademo,
    TeslaConnector,
    SchukoTypeF,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SocketOutlet {
    pub plug: PlugType,
    pub cable_attached: bool,
    pub max_power_kw: Option<f64>,
}

impl SocketOutlet {
    pub fn new(plug: PlugType) -> Self {
        Self {
            plug,
            cable_attached: matches!(
                plug,
                PlugType::Type2Connector | PlugType::CcsCombo2 | PlugType::Chademo
            ),
            max_power_kw: None,
        }
    }
}

/// Electric vehicle supply equipment: one point where one vehicle charges
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Evse {
    id: EvseId,
    description: Option<String>,
    max_power_kw: Option<f64>,
    sockets: Vec<SocketOutlet>,
    energy_meter_id: Option<String>,
    status: StatusSchedule<EvseStatus>,
    admin_status: StatusSchedule<EvseAdminStatus>,
    last_change: DateTime<Utc>,
}

impl Evse {
    pub fn new(id: EvseId) -> Self {
        Self::with_history_size(id, DEFAULT_HISTORY_SIZE)
    }

    pub fn with_history_size(id: EvseId, history_size: usize) -> Self {
        let now = Utc::now();
        Self {
            id,
            description: None,
            max_power_kw: None,
            sockets: Vec::new(),
            energy_meter_id: None,
            status: StatusSchedule::starting_at(EvseStatus::Available, now, history_size),
            admin_status: StatusSchedule::starting_at(
                EvseAdminStatus::Operational,
                now,
                history_size,
            ),
            last_change: now,
        }
    }

    pub fn id(&self) -> &EvseId {
        &self.id
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn set_description(&mut self, description: Option<String>) {
        if self.description != description {
            self.description = description;
            self.touch();
        }
    }

    pub fn max_power_kw(&self) -> Option<f64> {
        self.max_power_kw
    }

    pub fn set_max_power_kw(&mut self, max_power_kw: Option<f64>) {
        if self.max_power_kw != max_power_kw {
            self.max_power_kw = max_power_kw;
            self.touch();
        }
    }

    pub fn sockets(&self) -> &[SocketOutlet] {
        &self.sockets
    }

    pub fn add_socket(&mut self, socket: SocketOutlet) {
        self.sockets.push(socket);
        self.touch();
    }

    pub fn energy_meter_id(&self) -> Option<&str> {
        self.energy_meter_id.as_deref()
    }

    pub fn set_energy_meter_id(&mut self, energy_meter_id: Option<String>) {
        if self.energy_meter_id != energy_meter_id {
            self.energy_meter_id = energy_meter_id;
            self.touch();
        }
    }

    pub fn status(&self) -> EvseStatus {
        *self.status.value()
    }

    pub fn status_schedule(&self) -> &StatusSchedule<EvseStatus> {
        &self.status
    }

    pub fn set_status(
        &mut self,
        status: EvseStatus,
        timestamp: DateTime<Utc>,
    ) -> Option<Timestamped<EvseStatus>> {
        let previous = self.status.set(status, timestamp);
        if previous.is_some() {
            self.touch();
        }
        previous
    }

    pub fn admin_status(&self) -> EvseAdminStatus {
        *self.admin_status.value()
    }

    pub fn admin_status_schedule(&self) -> &StatusSchedule<EvseAdminStatus> {
        &self.admin_status
    }

    pub fn set_admin_status(
        &mut self,
        admin_status: EvseAdminStatus,
        timestamp: DateTime<Utc>,
    ) -> Option<Timestamped<EvseAdminStatus>> {
        let previous = self.admin_status.set(admin_status, timestamp);
        if previous.is_some() {
            self.touch();
        }
        previous
    }

    /// Admin status operational and not out of order
    pub fn is_usable(&self) -> bool {
        self.admin_status().is_operational() && !self.status().is_out_of_order()
    }

    pub fn last_change(&self) -> DateTime<Utc> {
        self.last_change
    }

    fn touch(&mut self) {
        self.last_change = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn sample_evse() -> Evse {
        Evse::new(EvseId::parse("DE*GEF*E1234*1").unwrap())
    }

    #[test]
    fn new_evse_is_available_and_operational() {
        let evse = sample_evse();
        assert_eq!(evse.status(), EvseStatus::Available);
        assert_eq!(evse.admin_status(), EvseAdminStatus::Operational);
        assert!(evse.is_usable());
        assert!(evse.sockets().is_empty());
    }

    #[test]
    fn status_changes_are_tracked() {
        let mut evse = sample_evse();
        let before = evse.last_change();
        let at = Utc::now() + Duration::seconds(1);
        let previous = evse.set_status(EvseStatus::Charging, at).unwrap();
        assert_eq!(previous.value, EvseStatus::Available);
        assert!(evse.last_change() >= before);
        assert!(evse.set_status(EvseStatus::Charging, at).is_none());
        assert_eq!(evse.status_schedule().len(), 2);
    }

    #[test]
    fn blocked_evse_is_not_usable() {
        let mut evse = sample_evse();
        evse.set_admin_status(EvseAdminStatus::Blocked, Utc::now() + Duration::seconds(1));
        assert!(!evse.is_usable());
    }

    #[test]
    fn sockets_default_cable_attachment() {
        assert!(SocketOutlet::new(PlugType::CcsCombo2).cable_attached);
        assert!(!SocketOutlet::new(PlugType::Type2Outlet).cable_attached);
    }

    #[test]
    fn serializes_to_json() {
        let mut evse = sample_evse();
        evse.set_max_power_kw(Some(22.0));
        evse.add_socket(SocketOutlet::new(PlugType::Type2Outlet));
        let json = serde_json::to_value(&evse).unwrap();
        assert_eq!(json["id"], "DE*GEF*E1234*1");
        assert_eq!(json["max_power_kw"], 22.0);
        assert_eq!(json["sockets"][0]["plug"], "Type2Outlet");
        let back: Evse = serde_json::from_value(json).unwrap();
        assert_eq!(back.id(), evse.id());
    }
}
