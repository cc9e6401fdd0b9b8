use std::time::Duration;

use chrono::{DateTime, Utc};
use common::ChallengeStatus;
use sea_orm::DatabaseConnection;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::events::{EventHub, ServerEvent};
use crate::services::phase::PhaseService;

/// Close coding phases whose deadline has passed, until `shutdown` fires.
pub async fn run_phase_sweep(
    db: DatabaseConnection,
    events: EventHub,
    interval_secs: u64,
    shutdown: CancellationToken,
) {
    let mut interval = tokio::time::interval(Duration::from_secs(interval_secs.max(1)));
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    info!(interval_secs, "Starting coding phase sweep");

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => {
                info!("Coding phase sweep stopped");
                return;
            }
            _ = interval.tick() => {
                sweep_once(&db, &events, Utc::now()).await;
            }
        }
    }
}

/// One pass. Returns the challenges that were moved out of the coding phase.
pub(crate) async fn sweep_once(
    db: &DatabaseConnection,
    events: &EventHub,
    now: DateTime<Utc>,
) -> Vec<i32> {
    match PhaseService::new(db).end_expired_coding_phases(now).await {
        Ok(ended) => {
            for &challenge_id in &ended {
                info!(challenge_id, "Coding deadline reached, phase ended");
                events.broadcast(
                    ServerEvent::challenge_updated(challenge_id, ChallengeStatus::EndedPhaseOne),
                    None,
                );
            }
            ended
        }
        Err(e) => {
            warn!(error = %e, "Coding phase sweep failed");
            Vec::new()
        }
    }
}
