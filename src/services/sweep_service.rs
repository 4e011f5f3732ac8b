use std::time::Duration;

use sqlx::SqlitePool;
use tracing::{info, warn};

use crate::database::{activity_repo, registration_repo};
use crate::models::ActivityRow;
use crate::services::errors::{EngineError, EngineResult};
use crate::services::notifier_service::{
    self, NotificationKind, Notifier, PendingNotification,
};
use crate::services::promotion_service;

/// Cancel registered rows whose payment window ran out and backfill the
/// freed slots. Each activity is swept in its own transaction: all of its
/// expired rows are cancelled and their slots re-promoted as one atomic
/// unit, and a failure on one activity does not stop the others.
pub async fn sweep_expired_payment_deadlines(
    pool: &SqlitePool,
    notifier: &Notifier,
) -> EngineResult<u64> {
    let mut conn = pool.acquire().await?;
    let activity_ids = registration_repo::list_activities_with_expired_payments(&mut conn).await?;
    drop(conn);

    let mut released = 0u64;
    for activity_id in activity_ids {
        match sweep_activity(pool, notifier, &activity_id).await {
            Ok(n) => released += n,
            Err(e) => warn!("payment sweep failed for activity {}: {}", activity_id, e),
        }
    }
    Ok(released)
}

async fn sweep_activity(
    pool: &SqlitePool,
    notifier: &Notifier,
    activity_id: &str,
) -> EngineResult<u64> {
    let mut tx = pool.begin().await?;
    if activity_repo::touch_for_update(&mut tx, activity_id).await? == 0 {
        return Err(EngineError::ActivityNotFound);
    }
    let activity = activity_repo::load_by_id(&mut tx, activity_id)
        .await?
        .ok_or(EngineError::ActivityNotFound)?;

    let expired = registration_repo::list_expired_for_activity(&mut tx, activity_id).await?;
    let mut batch: Vec<PendingNotification> = Vec::new();
    let mut released = 0u64;

    for row in expired {
        registration_repo::set_cancelled(&mut tx, &row.registration_id).await?;
        batch.push(expired_notification(&activity, &row.participant_user_id));

        let outcome = promotion_service::promote_waitlisted(&mut tx, &activity, 1).await?;
        batch.extend(outcome.pending_notifications);
        released += 1;
    }

    tx.commit().await?;
    notifier_service::dispatch_all(pool, notifier, batch).await;
    Ok(released)
}

/// Periodic driver, spawned from main.
pub async fn run_periodic(pool: SqlitePool, notifier: Notifier, interval_secs: u64) {
    let mut ticker = tokio::time::interval(Duration::from_secs(interval_secs.max(1)));
    loop {
        ticker.tick().await;
        match sweep_expired_payment_deadlines(&pool, &notifier).await {
            Ok(0) => {}
            Ok(n) => info!("payment sweep released {} expired slot(s)", n),
            Err(e) => warn!("payment sweep failed: {}", e),
        }
    }
}

fn expired_notification(activity: &ActivityRow, participant_user_id: &str) -> PendingNotification {
    PendingNotification {
        recipient_user_id: participant_user_id.to_string(),
        kind: NotificationKind::PaymentExpired,
        title: "Payment window expired".to_string(),
        body: format!(
            "Your payment window for '{}' has expired and your spot was released.",
            activity.title
        ),
        activity_id: activity.activity_id.clone(),
        registration_id: None,
    }
}
