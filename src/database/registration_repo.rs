use sqlx::SqliteConnection;

use crate::models::RegistrationRow;

const REGISTRATION_COLUMNS: &str = r#"
  registration_id,
  activity_id,
  participant_user_id,
  status,
  waitlist_position,
  payment_status,
  queue_seq,
  registered_at,
  promoted_at,
  payment_deadline_at,
  team,
  role
"#;

fn select_registrations(filter: &str) -> String {
    format!(
        "SELECT {} FROM registrations WHERE {}",
        REGISTRATION_COLUMNS, filter
    )
}

pub async fn find_by_pair(
    conn: &mut SqliteConnection,
    activity_id: &str,
    participant_user_id: &str,
) -> sqlx::Result<Option<RegistrationRow>> {
    let sql = select_registrations("activity_id = ? AND participant_user_id = ? LIMIT 1");
    sqlx::query_as::<_, RegistrationRow>(&sql)
        .bind(activity_id)
        .bind(participant_user_id)
        .fetch_optional(conn)
        .await
}

pub async fn find_by_id(
    conn: &mut SqliteConnection,
    activity_id: &str,
    registration_id: &str,
) -> sqlx::Result<Option<RegistrationRow>> {
    let sql = select_registrations("activity_id = ? AND registration_id = ? LIMIT 1");
    sqlx::query_as::<_, RegistrationRow>(&sql)
        .bind(activity_id)
        .bind(registration_id)
        .fetch_optional(conn)
        .await
}

pub async fn count_registered(
    conn: &mut SqliteConnection,
    activity_id: &str,
) -> sqlx::Result<i64> {
    sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM registrations WHERE activity_id = ? AND status = 'registered'",
    )
    .bind(activity_id)
    .fetch_one(conn)
    .await
}

pub async fn list_registered(
    conn: &mut SqliteConnection,
    activity_id: &str,
) -> sqlx::Result<Vec<RegistrationRow>> {
    let sql =
        select_registrations("activity_id = ? AND status = 'registered' ORDER BY queue_seq ASC");
    sqlx::query_as::<_, RegistrationRow>(&sql)
        .bind(activity_id)
        .fetch_all(conn)
        .await
}

pub async fn list_waitlisted(
    conn: &mut SqliteConnection,
    activity_id: &str,
) -> sqlx::Result<Vec<RegistrationRow>> {
    let sql = select_registrations(
        "activity_id = ? AND status = 'waitlisted' ORDER BY waitlist_position ASC, queue_seq ASC",
    );
    sqlx::query_as::<_, RegistrationRow>(&sql)
        .bind(activity_id)
        .fetch_all(conn)
        .await
}

// Next admission sequence for the activity. Callers hold the activity
// writer lock, so MAX+1 cannot race.
pub async fn next_queue_seq(
    conn: &mut SqliteConnection,
    activity_id: &str,
) -> sqlx::Result<i64> {
    sqlx::query_scalar::<_, i64>(
        "SELECT COALESCE(MAX(queue_seq), 0) + 1 FROM registrations WHERE activity_id = ?",
    )
    .bind(activity_id)
    .fetch_one(conn)
    .await
}

pub async fn next_waitlist_position(
    conn: &mut SqliteConnection,
    activity_id: &str,
) -> sqlx::Result<i64> {
    sqlx::query_scalar::<_, i64>(
        r#"
        SELECT COALESCE(MAX(waitlist_position), 0) + 1
        FROM registrations
        WHERE activity_id = ? AND status = 'waitlisted'
        "#,
    )
    .bind(activity_id)
    .fetch_one(conn)
    .await
}

const SQL_INSERT_REGISTRATION: &str = r#"
INSERT INTO registrations (
  registration_id,
  activity_id,
  participant_user_id,
  status,
  waitlist_position,
  payment_status,
  queue_seq,
  team,
  role
) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
"#;

pub struct NewRegistration<'a> {
    pub registration_id: &'a str,
    pub activity_id: &'a str,
    pub participant_user_id: &'a str,
    pub status: &'a str,
    pub waitlist_position: Option<i64>,
    pub payment_status: Option<&'a str>,
    pub queue_seq: i64,
    pub team: Option<&'a str>,
    pub role: Option<&'a str>,
}

pub async fn insert(
    conn: &mut SqliteConnection,
    reg: NewRegistration<'_>,
) -> sqlx::Result<u64> {
    let res = sqlx::query(SQL_INSERT_REGISTRATION)
        .bind(reg.registration_id)
        .bind(reg.activity_id)
        .bind(reg.participant_user_id)
        .bind(reg.status)
        .bind(reg.waitlist_position)
        .bind(reg.payment_status)
        .bind(reg.queue_seq)
        .bind(reg.team)
        .bind(reg.role)
        .execute(conn)
        .await?;
    Ok(res.rows_affected())
}

// Re-registration after a cancel reuses the existing row: fresh admission
// fields, cleared promotion and payment-deadline state.
const SQL_REACTIVATE_REGISTRATION: &str = r#"
UPDATE registrations
SET status = ?,
    waitlist_position = ?,
    payment_status = ?,
    queue_seq = ?,
    team = ?,
    role = ?,
    registered_at = strftime('%Y-%m-%dT%H:%M:%f', 'now'),
    promoted_at = NULL,
    payment_deadline_at = NULL,
    updated_at = strftime('%Y-%m-%dT%H:%M:%f', 'now')
WHERE registration_id = ?
"#;

pub async fn reactivate(
    conn: &mut SqliteConnection,
    registration_id: &str,
    reg: NewRegistration<'_>,
) -> sqlx::Result<u64> {
    let res = sqlx::query(SQL_REACTIVATE_REGISTRATION)
        .bind(reg.status)
        .bind(reg.waitlist_position)
        .bind(reg.payment_status)
        .bind(reg.queue_seq)
        .bind(reg.team)
        .bind(reg.role)
        .bind(registration_id)
        .execute(conn)
        .await?;
    Ok(res.rows_affected())
}

// Waitlisted -> registered via the promotion engine. promoted_at is set
// here and nowhere else; the payment deadline applies only when the
// activity charges a fee.
const SQL_PROMOTE: &str = r#"
UPDATE registrations
SET status = 'registered',
    waitlist_position = NULL,
    promoted_at = strftime('%Y-%m-%dT%H:%M:%f', 'now'),
    team = ?,
    payment_deadline_at = CASE
      WHEN ? THEN strftime('%Y-%m-%dT%H:%M:%f', 'now', '+2 hours')
      ELSE NULL
    END,
    updated_at = strftime('%Y-%m-%dT%H:%M:%f', 'now')
WHERE registration_id = ? AND status = 'waitlisted'
"#;

pub async fn promote(
    conn: &mut SqliteConnection,
    registration_id: &str,
    team: Option<&str>,
    with_payment_deadline: bool,
) -> sqlx::Result<u64> {
    let res = sqlx::query(SQL_PROMOTE)
        .bind(team)
        .bind(with_payment_deadline)
        .bind(registration_id)
        .execute(conn)
        .await?;
    Ok(res.rows_affected())
}

const SQL_SET_CANCELLED: &str = r#"
UPDATE registrations
SET status = 'cancelled',
    waitlist_position = NULL,
    team = NULL,
    payment_deadline_at = NULL,
    updated_at = strftime('%Y-%m-%dT%H:%M:%f', 'now')
WHERE registration_id = ?
"#;

pub async fn set_cancelled(
    conn: &mut SqliteConnection,
    registration_id: &str,
) -> sqlx::Result<u64> {
    let res = sqlx::query(SQL_SET_CANCELLED)
        .bind(registration_id)
        .execute(conn)
        .await?;
    Ok(res.rows_affected())
}

pub async fn set_waitlist_position(
    conn: &mut SqliteConnection,
    registration_id: &str,
    position: i64,
) -> sqlx::Result<u64> {
    let res = sqlx::query(
        r#"
        UPDATE registrations
        SET waitlist_position = ?,
            updated_at = strftime('%Y-%m-%dT%H:%M:%f', 'now')
        WHERE registration_id = ?
        "#,
    )
    .bind(position)
    .bind(registration_id)
    .execute(conn)
    .await?;
    Ok(res.rows_affected())
}

// Self-service payment claim: pending -> marked_paid on the active row.
const SQL_MARK_PAID: &str = r#"
UPDATE registrations
SET payment_status = 'marked_paid',
    updated_at = strftime('%Y-%m-%dT%H:%M:%f', 'now')
WHERE activity_id = ?
  AND participant_user_id = ?
  AND status != 'cancelled'
  AND payment_status = 'pending'
"#;

pub async fn mark_paid(
    conn: &mut SqliteConnection,
    activity_id: &str,
    participant_user_id: &str,
) -> sqlx::Result<u64> {
    let res = sqlx::query(SQL_MARK_PAID)
        .bind(activity_id)
        .bind(participant_user_id)
        .execute(conn)
        .await?;
    Ok(res.rows_affected())
}

pub async fn set_payment_status(
    conn: &mut SqliteConnection,
    registration_id: &str,
    payment_status: &str,
) -> sqlx::Result<u64> {
    let res = sqlx::query(
        r#"
        UPDATE registrations
        SET payment_status = ?,
            updated_at = strftime('%Y-%m-%dT%H:%M:%f', 'now')
        WHERE registration_id = ?
        "#,
    )
    .bind(payment_status)
    .bind(registration_id)
    .execute(conn)
    .await?;
    Ok(res.rows_affected())
}

const EXPIRED_PAYMENT_FILTER: &str = r#"
status = 'registered'
  AND payment_status = 'pending'
  AND payment_deadline_at IS NOT NULL
  AND datetime(payment_deadline_at) <= datetime('now')
"#;

pub async fn list_activities_with_expired_payments(
    conn: &mut SqliteConnection,
) -> sqlx::Result<Vec<String>> {
    let sql = format!(
        "SELECT DISTINCT activity_id FROM registrations WHERE {} ORDER BY activity_id",
        EXPIRED_PAYMENT_FILTER
    );
    sqlx::query_scalar::<_, String>(&sql).fetch_all(conn).await
}

pub async fn list_expired_for_activity(
    conn: &mut SqliteConnection,
    activity_id: &str,
) -> sqlx::Result<Vec<RegistrationRow>> {
    let sql = select_registrations(&format!(
        "activity_id = ? AND {} ORDER BY queue_seq ASC",
        EXPIRED_PAYMENT_FILTER
    ));
    sqlx::query_as::<_, RegistrationRow>(&sql)
        .bind(activity_id)
        .fetch_all(conn)
        .await
}
