use sqlx::SqliteConnection;

use crate::models::UsersRow;

const SQL_LOAD_USER: &str = r#"
SELECT
  user_id,
  name,
  push_token,
  eligible_roles
FROM users
WHERE user_id = ?
LIMIT 1
"#;

pub async fn load_user(
    conn: &mut SqliteConnection,
    user_id: &str,
) -> sqlx::Result<Option<UsersRow>> {
    sqlx::query_as::<_, UsersRow>(SQL_LOAD_USER)
        .bind(user_id)
        .fetch_optional(conn)
        .await
}
