#[allow(dead_code)]
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UsersRow {
    pub user_id: String,
    pub name: String,
    pub push_token: Option<String>,
    // JSON array of role names, e.g. ["goalie","skater"].
    pub eligible_roles: String,
}
