use sqlx::{SqliteConnection, SqlitePool};
use uuid::Uuid;

use crate::database::{activity_repo, org_admin_repo, registration_repo, user_repo};
use crate::models::{
    ActivityRow, PaymentStatus, RegistrationRow, RegistrationStatus, UsersRow,
};
use crate::services::errors::{EngineError, EngineResult};
use crate::services::notifier_service::{
    self, NotificationKind, Notifier, PendingNotification,
};
use crate::services::{capacity, promotion_service, team_service, waitlist_service};

#[derive(Debug)]
pub struct RegistrationOutcome {
    pub registration_id: String,
    pub status: RegistrationStatus,
    pub waitlist_position: Option<i64>,
    pub message: String,
}

/// Admit a participant: confirm into an open slot, or queue them.
///
/// Paid activities never auto-confirm; the participant always lands on the
/// waitlist with payment pending, whatever the current capacity. A row
/// left over from an earlier cancel is reactivated in place so the
/// (participant, activity) pair never gets a second row.
pub async fn register(
    pool: &SqlitePool,
    notifier: &Notifier,
    activity_id: &str,
    participant_user_id: &str,
    requested_role: Option<&str>,
) -> EngineResult<RegistrationOutcome> {
    let mut tx = pool.begin().await?;
    if activity_repo::touch_for_update(&mut tx, activity_id).await? == 0 {
        return Err(EngineError::ActivityNotFound);
    }
    let activity = activity_repo::load_by_id(&mut tx, activity_id)
        .await?
        .ok_or(EngineError::ActivityNotFound)?;

    if activity.is_cancelled() {
        return Err(EngineError::ActivityNotOpen);
    }
    if activity.deadline_passed == 1 {
        return Err(EngineError::DeadlinePassed);
    }

    let user = user_repo::load_user(&mut tx, participant_user_id)
        .await?
        .ok_or(EngineError::ParticipantNotFound)?;
    let role = resolve_role(&user, requested_role)?;

    let existing = registration_repo::find_by_pair(&mut tx, activity_id, participant_user_id)
        .await?;
    if let Some(row) = &existing {
        if row.is_active() {
            return Err(EngineError::AlreadyRegistered);
        }
    }

    let queue_seq = registration_repo::next_queue_seq(&mut tx, activity_id).await?;
    let mut owner_note: Option<PendingNotification> = None;

    let (status, waitlist_position, payment_status, team, message) =
        if activity.requires_payment() {
            let position = registration_repo::next_waitlist_position(&mut tx, activity_id).await?;
            if activity.organization_id.is_some() {
                owner_note = Some(owner_paid_signup_notification(&activity));
            }
            (
                RegistrationStatus::Waitlisted,
                Some(position),
                Some(PaymentStatus::Pending.as_str()),
                None,
                format!(
                    "You are on the waitlist at position {}. Your spot is confirmed once your payment is verified.",
                    position
                ),
            )
        } else {
            let registered_count =
                registration_repo::count_registered(&mut tx, activity_id).await?;
            if capacity::has_open_slot(activity.capacity, registered_count) {
                let roster = registration_repo::list_registered(&mut tx, activity_id).await?;
                let team = team_service::assign_team(&roster, role.as_deref());
                (
                    RegistrationStatus::Registered,
                    None,
                    None,
                    Some(team),
                    "You are registered.".to_string(),
                )
            } else {
                let position =
                    registration_repo::next_waitlist_position(&mut tx, activity_id).await?;
                (
                    RegistrationStatus::Waitlisted,
                    Some(position),
                    None,
                    None,
                    format!(
                        "Activity is full. You are on the waitlist at position {}.",
                        position
                    ),
                )
            }
        };

    let registration_id = match &existing {
        Some(row) => {
            registration_repo::reactivate(
                &mut tx,
                &row.registration_id,
                registration_repo::NewRegistration {
                    registration_id: &row.registration_id,
                    activity_id,
                    participant_user_id,
                    status: status.as_str(),
                    waitlist_position,
                    payment_status,
                    queue_seq,
                    team,
                    role: role.as_deref(),
                },
            )
            .await?;
            row.registration_id.clone()
        }
        None => {
            let id = Uuid::new_v4().to_string();
            registration_repo::insert(
                &mut tx,
                registration_repo::NewRegistration {
                    registration_id: &id,
                    activity_id,
                    participant_user_id,
                    status: status.as_str(),
                    waitlist_position,
                    payment_status,
                    queue_seq,
                    team,
                    role: role.as_deref(),
                },
            )
            .await?;
            id
        }
    };

    tx.commit().await?;

    if let Some(note) = owner_note {
        notifier_service::dispatch_all(pool, notifier, vec![note]).await;
    }

    Ok(RegistrationOutcome {
        registration_id,
        status,
        waitlist_position,
        message,
    })
}

/// Self-service cancel. A freed confirmed slot is backfilled from the
/// waitlist within the same transaction; notifications go out after the
/// commit. Returns false when there was nothing to cancel.
pub async fn cancel_registration(
    pool: &SqlitePool,
    notifier: &Notifier,
    activity_id: &str,
    participant_user_id: &str,
) -> EngineResult<bool> {
    let mut tx = pool.begin().await?;
    if activity_repo::touch_for_update(&mut tx, activity_id).await? == 0 {
        return Ok(false);
    }
    let Some(activity) = activity_repo::load_by_id(&mut tx, activity_id).await? else {
        return Ok(false);
    };
    let Some(row) =
        registration_repo::find_by_pair(&mut tx, activity_id, participant_user_id).await?
    else {
        return Ok(false);
    };

    let Some(batch) = cancel_active_row(&mut tx, &activity, &row).await? else {
        return Ok(false);
    };

    tx.commit().await?;
    notifier_service::dispatch_all(pool, notifier, batch).await;
    Ok(true)
}

/// Admin-forced removal: same cascade as a self-cancel, gated on
/// `can_manage` before any mutable state is read.
pub async fn remove_registration(
    pool: &SqlitePool,
    notifier: &Notifier,
    activity_id: &str,
    registration_id: &str,
    acting_admin_id: &str,
) -> EngineResult<bool> {
    let mut conn = pool.acquire().await?;
    if !org_admin_repo::can_manage(&mut conn, activity_id, acting_admin_id).await? {
        return Err(EngineError::NotAuthorized);
    }
    drop(conn);

    let mut tx = pool.begin().await?;
    if activity_repo::touch_for_update(&mut tx, activity_id).await? == 0 {
        return Ok(false);
    }
    let Some(activity) = activity_repo::load_by_id(&mut tx, activity_id).await? else {
        return Ok(false);
    };
    let Some(row) = registration_repo::find_by_id(&mut tx, activity_id, registration_id).await?
    else {
        return Ok(false);
    };

    let Some(batch) = cancel_active_row(&mut tx, &activity, &row).await? else {
        return Ok(false);
    };

    tx.commit().await?;
    notifier_service::dispatch_all(pool, notifier, batch).await;
    Ok(true)
}

// Cancel one active row and repair the queue: a confirmed slot is
// backfilled via the promotion engine, a waitlist removal just renumbers.
// Returns None when the row was already cancelled.
async fn cancel_active_row(
    conn: &mut SqliteConnection,
    activity: &ActivityRow,
    row: &RegistrationRow,
) -> EngineResult<Option<Vec<PendingNotification>>> {
    if !row.is_active() {
        return Ok(None);
    }

    let was_registered = row.is_registered();
    registration_repo::set_cancelled(conn, &row.registration_id).await?;

    if was_registered {
        let outcome = promotion_service::promote_waitlisted(conn, activity, 1).await?;
        Ok(Some(outcome.pending_notifications))
    } else {
        waitlist_service::renumber_waitlist(conn, &activity.activity_id).await?;
        Ok(Some(Vec::new()))
    }
}

fn resolve_role(user: &UsersRow, requested: Option<&str>) -> EngineResult<Option<String>> {
    let eligible = parse_string_array_json(&user.eligible_roles);

    match requested {
        Some(wanted) => {
            let canonical = eligible
                .iter()
                .find(|r| r.eq_ignore_ascii_case(wanted.trim()))
                .cloned();
            canonical
                .map(Some)
                .ok_or_else(|| EngineError::InvalidRole(wanted.trim().to_string()))
        }
        None => match eligible.len() {
            0 => Ok(None),
            1 => Ok(Some(eligible[0].clone())),
            _ => Err(EngineError::RoleAmbiguous),
        },
    }
}

fn parse_string_array_json(raw: &str) -> Vec<String> {
    serde_json::from_str::<Vec<String>>(raw)
        .unwrap_or_default()
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn owner_paid_signup_notification(activity: &ActivityRow) -> PendingNotification {
    PendingNotification {
        recipient_user_id: activity.organizer_user_id.clone(),
        kind: NotificationKind::OwnerPaidSignup,
        title: "New waitlist signup".to_string(),
        body: format!(
            "A new participant joined the waitlist for '{}' and still owes payment.",
            activity.title
        ),
        activity_id: activity.activity_id.clone(),
        registration_id: None,
    }
}
