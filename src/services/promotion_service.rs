use sqlx::{SqliteConnection, SqlitePool};

use crate::database::{activity_repo, registration_repo};
use crate::models::{ActivityRow, RegistrationRow};
use crate::services::errors::{EngineError, EngineResult};
use crate::services::notifier_service::{
    self, NotificationKind, Notifier, PendingNotification,
};
use crate::services::{team_service, waitlist_service};

#[derive(Debug, Default)]
pub struct PromotionOutcome {
    pub promoted: Vec<RegistrationRow>,
    pub pending_notifications: Vec<PendingNotification>,
}

/// Fill freed slots from the waitlist, inside the caller's transaction.
///
/// Verified payers are promoted in rank order. On paid activities an
/// unverified entry is never promoted; instead the earliest-queued
/// unverified entries are told a spot is open, up to the number of slots
/// still free, and keep their waitlist place until they pay. Free
/// activities have no payment tier and promote straight down the order.
///
/// Nothing is dispatched here: the returned batch belongs to whoever
/// commits the transaction.
pub async fn promote_waitlisted(
    conn: &mut SqliteConnection,
    activity: &ActivityRow,
    freed_slots: i64,
) -> EngineResult<PromotionOutcome> {
    let mut outcome = PromotionOutcome::default();
    if freed_slots <= 0 {
        return Ok(outcome);
    }

    let waitlist = registration_repo::list_waitlisted(conn, &activity.activity_id).await?;
    if waitlist.is_empty() {
        return Ok(outcome);
    }

    let ranked = waitlist_service::rank_waitlist(waitlist);
    let mut roster = registration_repo::list_registered(conn, &activity.activity_id).await?;
    let paid = activity.requires_payment();

    let mut slots = freed_slots;
    let mut notified: i64 = 0;

    for row in &ranked {
        if slots <= 0 {
            break;
        }

        if !paid || row.is_verified() {
            let team = team_service::assign_team(&roster, row.role.as_deref());
            registration_repo::promote(conn, &row.registration_id, Some(team), paid).await?;
            let updated =
                registration_repo::find_by_id(conn, &activity.activity_id, &row.registration_id)
                    .await?
                    .ok_or(EngineError::RegistrationNotFound)?;

            outcome
                .pending_notifications
                .push(promoted_notification(activity, &updated));
            outcome
                .pending_notifications
                .push(owner_promotion_notification(activity, &updated));
            roster.push(updated.clone());
            outcome.promoted.push(updated);
            slots -= 1;
        } else {
            // Unverified on a paid activity: the slot is held open, the
            // participant is asked to pay.
            if notified >= slots {
                break;
            }
            outcome
                .pending_notifications
                .push(spot_available_notification(activity, row));
            notified += 1;
        }
    }

    waitlist_service::renumber_waitlist(conn, &activity.activity_id).await?;

    Ok(outcome)
}

/// Promotion as a self-contained unit of work: opens its own transaction,
/// commits, and only then dispatches the notification batch.
pub async fn promote_and_dispatch(
    pool: &SqlitePool,
    notifier: &Notifier,
    activity_id: &str,
    freed_slots: i64,
) -> EngineResult<PromotionOutcome> {
    let mut tx = pool.begin().await?;
    if activity_repo::touch_for_update(&mut tx, activity_id).await? == 0 {
        return Err(EngineError::ActivityNotFound);
    }
    let activity = activity_repo::load_by_id(&mut tx, activity_id)
        .await?
        .ok_or(EngineError::ActivityNotFound)?;

    let outcome = promote_waitlisted(&mut tx, &activity, freed_slots).await?;
    tx.commit().await?;

    notifier_service::dispatch_all(pool, notifier, outcome.pending_notifications.clone()).await;
    Ok(outcome)
}

fn promoted_notification(activity: &ActivityRow, row: &RegistrationRow) -> PendingNotification {
    PendingNotification {
        recipient_user_id: row.participant_user_id.clone(),
        kind: NotificationKind::Promoted,
        title: "You're in".to_string(),
        body: format!(
            "A spot opened up in '{}' and you are now registered.",
            activity.title
        ),
        activity_id: activity.activity_id.clone(),
        registration_id: Some(row.registration_id.clone()),
    }
}

fn owner_promotion_notification(
    activity: &ActivityRow,
    row: &RegistrationRow,
) -> PendingNotification {
    PendingNotification {
        recipient_user_id: activity.organizer_user_id.clone(),
        kind: NotificationKind::OwnerAutoPromotion,
        title: "Waitlist promotion".to_string(),
        body: format!(
            "A waitlisted participant was automatically promoted into '{}'.",
            activity.title
        ),
        activity_id: activity.activity_id.clone(),
        registration_id: Some(row.registration_id.clone()),
    }
}

fn spot_available_notification(
    activity: &ActivityRow,
    row: &RegistrationRow,
) -> PendingNotification {
    PendingNotification {
        recipient_user_id: row.participant_user_id.clone(),
        kind: NotificationKind::SpotAvailable,
        title: "Spot available".to_string(),
        body: format!(
            "A spot is available in '{}'. Complete your payment to claim it.",
            activity.title
        ),
        activity_id: activity.activity_id.clone(),
        registration_id: Some(row.registration_id.clone()),
    }
}
