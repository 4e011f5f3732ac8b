use sqlx::SqliteConnection;

// A user may manage an activity if they organize it, or if they are an
// admin of the organization the activity belongs to.
const SQL_CAN_MANAGE: &str = r#"
SELECT EXISTS (
  SELECT 1
  FROM activities a
  WHERE a.activity_id = ?1
    AND (
      a.organizer_user_id = ?2
      OR (
        a.organization_id IS NOT NULL
        AND EXISTS (
          SELECT 1
          FROM organization_admins oa
          WHERE oa.organization_id = a.organization_id
            AND oa.user_id = ?2
        )
      )
    )
)
"#;

pub async fn can_manage(
    conn: &mut SqliteConnection,
    activity_id: &str,
    user_id: &str,
) -> sqlx::Result<bool> {
    let allowed = sqlx::query_scalar::<_, i64>(SQL_CAN_MANAGE)
        .bind(activity_id)
        .bind(user_id)
        .fetch_one(conn)
        .await?;
    Ok(allowed == 1)
}
