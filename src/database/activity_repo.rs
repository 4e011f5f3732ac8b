use sqlx::SqliteConnection;

use crate::models::ActivityRow;

// Bumping the version acquires the SQLite writer lock for the owning
// transaction before any capacity read, so all mutations of one activity's
// registration set are serialized against each other.
const SQL_TOUCH_FOR_UPDATE: &str = r#"
UPDATE activities
SET version = version + 1,
    updated_at = strftime('%Y-%m-%dT%H:%M:%f', 'now')
WHERE activity_id = ?
"#;

pub async fn touch_for_update(
    conn: &mut SqliteConnection,
    activity_id: &str,
) -> sqlx::Result<u64> {
    let res = sqlx::query(SQL_TOUCH_FOR_UPDATE)
        .bind(activity_id)
        .execute(conn)
        .await?;
    Ok(res.rows_affected())
}

const SQL_LOAD_ACTIVITY_BY_ID: &str = r#"
SELECT
  activity_id,
  title,
  status,
  capacity,
  cost_cents,
  registration_deadline,
  scheduled_at,
  organizer_user_id,
  organization_id,
  CASE
    WHEN registration_deadline IS NOT NULL
     AND datetime(registration_deadline) <= datetime('now')
    THEN 1 ELSE 0
  END AS deadline_passed
FROM activities
WHERE activity_id = ?
LIMIT 1
"#;

pub async fn load_by_id(
    conn: &mut SqliteConnection,
    activity_id: &str,
) -> sqlx::Result<Option<ActivityRow>> {
    sqlx::query_as::<_, ActivityRow>(SQL_LOAD_ACTIVITY_BY_ID)
        .bind(activity_id)
        .fetch_optional(conn)
        .await
}
