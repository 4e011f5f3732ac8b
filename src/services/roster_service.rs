use serde::Serialize;
use sqlx::SqlitePool;

use crate::database::{activity_repo, registration_repo};
use crate::models::{ActivityRow, RegistrationRow};
use crate::services::capacity;
use crate::services::errors::EngineResult;

#[derive(Serialize)]
pub struct RosterEntryView {
    pub registration_id: String,
    pub participant_user_id: String,
    pub team: Option<String>,
    pub role: Option<String>,
    pub payment_status: Option<String>,
    pub waitlist_position: Option<i64>,
    pub promoted_at: Option<String>,
}

#[derive(Serialize)]
pub struct ActivityRosterView {
    pub activity_id: String,
    pub title: String,
    pub status: String,
    pub capacity: i64,
    pub cost_cents: i64,
    pub scheduled_at: String,
    pub registration_deadline: Option<String>,
    pub registered_count: i64,
    pub waitlist_count: i64,
    pub free_slots: i64,
    pub is_full: bool,
    pub participants_registered: Vec<RosterEntryView>,
    pub participants_waitlisted: Vec<RosterEntryView>,
}

pub async fn load_activity_roster_view(
    pool: &SqlitePool,
    activity_id: &str,
) -> EngineResult<Option<ActivityRosterView>> {
    let mut conn = pool.acquire().await?;
    let Some(activity) = activity_repo::load_by_id(&mut conn, activity_id).await? else {
        return Ok(None);
    };
    let registered = registration_repo::list_registered(&mut conn, activity_id).await?;
    let waitlisted = registration_repo::list_waitlisted(&mut conn, activity_id).await?;
    Ok(Some(build_view(activity, registered, waitlisted)))
}

fn build_view(
    activity: ActivityRow,
    registered: Vec<RegistrationRow>,
    waitlisted: Vec<RegistrationRow>,
) -> ActivityRosterView {
    let registered_count = registered.len() as i64;
    let waitlist_count = waitlisted.len() as i64;
    let free_slots = capacity::free_slots(activity.capacity, registered_count);

    ActivityRosterView {
        activity_id: activity.activity_id,
        title: activity.title,
        status: activity.status,
        capacity: activity.capacity,
        cost_cents: activity.cost_cents,
        scheduled_at: activity.scheduled_at,
        registration_deadline: activity.registration_deadline,
        registered_count,
        waitlist_count,
        free_slots,
        is_full: free_slots == 0,
        participants_registered: registered.into_iter().map(entry_view).collect(),
        participants_waitlisted: waitlisted.into_iter().map(entry_view).collect(),
    }
}

fn entry_view(row: RegistrationRow) -> RosterEntryView {
    RosterEntryView {
        registration_id: row.registration_id,
        participant_user_id: row.participant_user_id,
        team: row.team,
        role: row.role,
        payment_status: row.payment_status,
        waitlist_position: row.waitlist_position,
        promoted_at: row.promoted_at,
    }
}
