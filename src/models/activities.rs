#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ActivityRow {
    pub activity_id: String,
    pub title: String,
    pub status: String,
    pub capacity: i64,
    pub cost_cents: i64,
    pub registration_deadline: Option<String>,
    pub scheduled_at: String,
    pub organizer_user_id: String,
    pub organization_id: Option<String>,
    // Computed in SQL against datetime('now').
    pub deadline_passed: i64,
}

impl ActivityRow {
    pub fn requires_payment(&self) -> bool {
        self.cost_cents > 0
    }

    pub fn is_cancelled(&self) -> bool {
        self.status == "cancelled"
    }
}
