//! Charge detail record: the billing view of a finished session

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::auth::AuthIdentification;
use crate::domain::ids::{
    ChargingPoolId, ChargingReservationId, ChargingSessionId, ChargingStationId,
    ChargingStationOperatorId, EvseId,
};
use crate::domain::session::{ChargingSession, MeterValue, StopReason};
use crate::support::errors::{DomainError, DomainResult};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChargeDetailRecord {
    pub id: String,
    pub session_id: ChargingSessionId,
    pub reservation_id: Option<ChargingReservationId>,
    pub operator_id: ChargingStationOperatorId,
    pub charging_pool_id: Option<ChargingPoolId>,
    pub charging_station_id: ChargingStationId,
    pub evse_id: EvseId,
    pub auth_start: AuthIdentification,
    pub auth_stop: Option<AuthIdentification>,
    pub session_start: DateTime<Utc>,
    pub session_end: DateTime<Utc>,
    pub meter_start_wh: i64,
    pub meter_stop_wh: i64,
    pub meter_values: Vec<MeterValue>,
    /// kWh with Wh precision
    pub consumed_energy_kwh: Decimal,
    pub stop_reason: Option<StopReason>,
    pub created_at: DateTime<Utc>,
}

impl ChargeDetailRecord {
    /// Build the record of a stopped session
    pub fn from_session(
        session: &ChargingSession,
        charging_pool_id: Option<ChargingPoolId>,
    ) -> DomainResult<Self> {
        let session_end = session.stopped_at.ok_or_else(|| {
            DomainError::Validation(format!("session {} has not been stopped", session.id))
        })?;

        Ok(Self {
            id: Uuid::new_v4().to_string(),
            session_id: session.id.clone(),
            reservation_id: session.reservation_id.clone(),
            operator_id: session.evse_id.operator_id().clone(),
            charging_pool_id,
            charging_station_id: session.charging_station_id.clone(),
            evse_id: session.evse_id.clone(),
            auth_start: session.auth_start.clone(),
            auth_stop: session.auth_stop.clone(),
            session_start: session.started_at,
            session_end,
            meter_start_wh: session.meter_start_wh,
            meter_stop_wh: session.last_meter_wh(),
            meter_values: session.meter_values.clone(),
            consumed_energy_kwh: Decimal::new(session.energy_consumed_wh(), 3),
            stop_reason: session.stop_reason,
            created_at: Utc::now(),
        })
    }

    pub fn duration(&self) -> Duration {
        self.session_end - self.session_start
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn stopped_session() -> ChargingSession {
        let start = Utc::now();
        let mut session = ChargingSession::new(
            ChargingSessionId::parse("S-7").unwrap(),
            EvseId::parse("DE*GEF*E1*2").unwrap(),
            ChargingStationId::parse("DE*GEF*S1").unwrap(),
            AuthIdentification::remote("DE-GDF-C12345678").unwrap(),
            10_000,
            start,
        );
        session.record_meter_value(start + Duration::minutes(30), 17_345).unwrap();
        session.stop(start + Duration::minutes(45), None, StopReason::Remote);
        session
    }

    #[test]
    fn builds_record_from_stopped_session() {
        let session = stopped_session();
        let pool = ChargingPoolId::parse("DE*GEF*P1").ok();
        let cdr = ChargeDetailRecord::from_session(&session, pool.clone()).unwrap();
        assert_eq!(cdr.session_id, session.id);
        assert_eq!(cdr.operator_id.to_string(), "DE*GEF");
        assert_eq!(cdr.charging_pool_id, pool);
        assert_eq!(cdr.meter_stop_wh, 17_345);
        assert_eq!(cdr.consumed_energy_kwh, Decimal::from_str("7.345").unwrap());
        assert_eq!(cdr.duration(), Duration::minutes(45));
        assert_eq!(cdr.stop_reason, Some(StopReason::Remote));
    }

    #[test]
    fn active_session_has_no_record() {
        let session = ChargingSession::new(
            ChargingSessionId::parse("S-8").unwrap(),
            EvseId::parse("DE*GEF*E1*1").unwrap(),
            ChargingStationId::parse("DE*GEF*S1").unwrap(),
            AuthIdentification::token("AABB").unwrap(),
            0,
            Utc::now(),
        );
        assert!(matches!(
            ChargeDetailRecord::from_session(&session, None),
            Err(DomainError::Validation(_))
        ));
    }

    #[test]
    fn energy_serializes_as_string() {
        let cdr = ChargeDetailRecord::from_session(&stopped_session(), None).unwrap();
        let json = serde_json::to_value(&cdr).unwrap();
        assert_eq!(json["consumed_energy_kwh"], "7.345");
        assert_eq!(json["evse_id"], "DE*GEF*E1*2");
    }
}
