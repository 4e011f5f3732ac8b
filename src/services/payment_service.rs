use sqlx::SqlitePool;

use crate::database::{activity_repo, org_admin_repo, registration_repo};
use crate::models::{PaymentStatus, RegistrationRow};
use crate::services::errors::{EngineError, EngineResult};
use crate::services::notifier_service::{self, Notifier};
use crate::services::{capacity, promotion_service};

/// Participant claims to have paid: pending -> marked_paid. Returns false
/// when no row was awaiting payment.
pub async fn mark_payment(
    pool: &SqlitePool,
    activity_id: &str,
    participant_user_id: &str,
) -> EngineResult<bool> {
    let mut conn = pool.acquire().await?;
    let updated =
        registration_repo::mark_paid(&mut conn, activity_id, participant_user_id).await?;
    Ok(updated > 0)
}

/// Admin confirms (or revokes) a payment claim.
///
/// Verification grants waitlist priority, so a verified waitlisted row
/// immediately competes for any open slots: the promotion engine runs in
/// the same transaction and its batch is dispatched after commit.
/// Returns None when the registration does not exist.
pub async fn verify_payment(
    pool: &SqlitePool,
    notifier: &Notifier,
    activity_id: &str,
    registration_id: &str,
    verified: bool,
    acting_admin_id: &str,
) -> EngineResult<Option<RegistrationRow>> {
    let mut conn = pool.acquire().await?;
    if !org_admin_repo::can_manage(&mut conn, activity_id, acting_admin_id).await? {
        return Err(EngineError::NotAuthorized);
    }
    drop(conn);

    let mut tx = pool.begin().await?;
    if activity_repo::touch_for_update(&mut tx, activity_id).await? == 0 {
        return Err(EngineError::ActivityNotFound);
    }
    let activity = activity_repo::load_by_id(&mut tx, activity_id)
        .await?
        .ok_or(EngineError::ActivityNotFound)?;

    let Some(row) = registration_repo::find_by_id(&mut tx, activity_id, registration_id).await?
    else {
        return Ok(None);
    };

    let next_status = if verified {
        if row.payment_status.as_deref() != Some(PaymentStatus::MarkedPaid.as_str()) {
            return Err(EngineError::InvalidPaymentState);
        }
        PaymentStatus::Verified
    } else {
        match row.payment_status.as_deref() {
            Some("verified") | Some("marked_paid") => PaymentStatus::Pending,
            _ => return Err(EngineError::InvalidPaymentState),
        }
    };

    registration_repo::set_payment_status(&mut tx, registration_id, next_status.as_str())
        .await?;

    let mut batch = Vec::new();
    if verified && row.is_waitlisted() {
        let registered_count = registration_repo::count_registered(&mut tx, activity_id).await?;
        let free = capacity::free_slots(activity.capacity, registered_count);
        if free > 0 {
            let outcome =
                promotion_service::promote_waitlisted(&mut tx, &activity, free).await?;
            batch = outcome.pending_notifications;
        }
    }

    let updated = registration_repo::find_by_id(&mut tx, activity_id, registration_id).await?;
    tx.commit().await?;

    notifier_service::dispatch_all(pool, notifier, batch).await;
    Ok(updated)
}
