use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;

use matchday::models::RegistrationRow;

// Single-connection pool: every connection to ":memory:" is its own
// database, so the pool must never open a second one.
pub async fn setup_pool() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect(":memory:")
        .await
        .expect("connect to in-memory sqlite");
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("run migrations");
    pool
}

pub async fn create_user(pool: &SqlitePool, user_id: &str, eligible_roles: &str) {
    sqlx::query("INSERT INTO users (user_id, name, eligible_roles) VALUES (?, ?, ?)")
        .bind(user_id)
        .bind(user_id)
        .bind(eligible_roles)
        .execute(pool)
        .await
        .expect("insert user");
}

pub async fn create_activity(
    pool: &SqlitePool,
    activity_id: &str,
    organizer_user_id: &str,
    capacity: i64,
    cost_cents: i64,
) {
    sqlx::query(
        r#"
        INSERT INTO activities (
          activity_id, title, capacity, cost_cents, scheduled_at, organizer_user_id
        ) VALUES (?, ?, ?, ?, datetime('now', '+7 days'), ?)
        "#,
    )
    .bind(activity_id)
    .bind(format!("Activity {}", activity_id))
    .bind(capacity)
    .bind(cost_cents)
    .bind(organizer_user_id)
    .execute(pool)
    .await
    .expect("insert activity");
}

pub async fn link_organization(pool: &SqlitePool, activity_id: &str, organization_id: &str) {
    sqlx::query("UPDATE activities SET organization_id = ? WHERE activity_id = ?")
        .bind(organization_id)
        .bind(activity_id)
        .execute(pool)
        .await
        .expect("link organization");
}

pub async fn add_org_admin(pool: &SqlitePool, organization_id: &str, user_id: &str) {
    sqlx::query("INSERT INTO organization_admins (organization_id, user_id) VALUES (?, ?)")
        .bind(organization_id)
        .bind(user_id)
        .execute(pool)
        .await
        .expect("insert org admin");
}

pub async fn set_deadline_passed(pool: &SqlitePool, activity_id: &str) {
    sqlx::query(
        "UPDATE activities SET registration_deadline = datetime('now', '-1 hours') WHERE activity_id = ?",
    )
    .bind(activity_id)
    .execute(pool)
    .await
    .expect("set deadline");
}

pub async fn expire_payment_deadline(pool: &SqlitePool, registration_id: &str) {
    sqlx::query(
        r#"
        UPDATE registrations
        SET payment_deadline_at = strftime('%Y-%m-%dT%H:%M:%f', 'now', '-3 hours')
        WHERE registration_id = ?
        "#,
    )
    .bind(registration_id)
    .execute(pool)
    .await
    .expect("expire payment deadline");
}

pub async fn registration_for(
    pool: &SqlitePool,
    activity_id: &str,
    participant_user_id: &str,
) -> RegistrationRow {
    sqlx::query_as::<_, RegistrationRow>(
        r#"
        SELECT
          registration_id, activity_id, participant_user_id, status,
          waitlist_position, payment_status, queue_seq, registered_at,
          promoted_at, payment_deadline_at, team, role
        FROM registrations
        WHERE activity_id = ? AND participant_user_id = ?
        "#,
    )
    .bind(activity_id)
    .bind(participant_user_id)
    .fetch_one(pool)
    .await
    .expect("load registration")
}

pub async fn row_count_for_pair(
    pool: &SqlitePool,
    activity_id: &str,
    participant_user_id: &str,
) -> i64 {
    sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM registrations WHERE activity_id = ? AND participant_user_id = ?",
    )
    .bind(activity_id)
    .bind(participant_user_id)
    .fetch_one(pool)
    .await
    .expect("count rows")
}

pub async fn registered_count(pool: &SqlitePool, activity_id: &str) -> i64 {
    sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM registrations WHERE activity_id = ? AND status = 'registered'",
    )
    .bind(activity_id)
    .fetch_one(pool)
    .await
    .expect("count registered")
}

pub async fn waitlist_positions(pool: &SqlitePool, activity_id: &str) -> Vec<(String, i64)> {
    sqlx::query_as::<_, (String, i64)>(
        r#"
        SELECT participant_user_id, waitlist_position
        FROM registrations
        WHERE activity_id = ? AND status = 'waitlisted'
        ORDER BY waitlist_position ASC
        "#,
    )
    .bind(activity_id)
    .fetch_all(pool)
    .await
    .expect("list positions")
}
