//! Background task that periodically expires overdue reservations.
//!
//! Runs in a tokio::spawn loop, asking every registered station to drop
//! reservations whose end time has passed.

use std::time::Duration;

use chrono::Utc;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::application::charging::SharedStationRegistry;
use crate::support::shutdown::ShutdownSignal;

/// Start the reservation expiry background task.
///
/// Stops when `shutdown` is triggered.
pub fn start_reservation_expiry_task(
    registry: SharedStationRegistry,
    shutdown: ShutdownSignal,
    check_interval: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!(
            check_interval_secs = check_interval.as_secs(),
            "📅 Reservation expiry task started"
        );

        let mut interval = tokio::time::interval(check_interval);

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    expire_reservations(&registry).await;
                }
                _ = shutdown.notified().wait() => {
                    info!("📅 Reservation expiry task shutting down");
                    break;
                }
            }
        }

        info!("📅 Reservation expiry task stopped");
    })
}

async fn expire_reservations(registry: &SharedStationRegistry) -> usize {
    let expired = registry.check_reservation_expiry(Utc::now()).await;

    if expired.is_empty() {
        return 0;
    }

    info!(count = expired.len(), "Expired overdue reservations");
    for reservation in &expired {
        debug!(
            reservation_id = %reservation.id,
            evse_id = %reservation.evse_id,
            end_time = %reservation.end_time,
            "Reservation expired"
        );
    }
    expired.len()
}
