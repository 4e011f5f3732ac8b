use sqlx::{SqliteConnection, SqlitePool};

use crate::database::registration_repo;
use crate::models::RegistrationRow;
use crate::services::errors::EngineResult;

/// Promotion order for a waitlist: payment-verified entries first, then
/// everyone else, FIFO by admission sequence inside each tier, with the
/// row id as the final deterministic tie-break.
pub fn rank_waitlist(mut rows: Vec<RegistrationRow>) -> Vec<RegistrationRow> {
    rows.sort_by(|a, b| {
        b.is_verified()
            .cmp(&a.is_verified())
            .then(a.queue_seq.cmp(&b.queue_seq))
            .then(a.registration_id.cmp(&b.registration_id))
    });
    rows
}

/// Reassign waitlist positions to a gapless 1..N, preserving the current
/// relative order. Idempotent; must run after every promotion and every
/// waitlist removal.
pub async fn renumber_waitlist(
    conn: &mut SqliteConnection,
    activity_id: &str,
) -> EngineResult<()> {
    let rows = registration_repo::list_waitlisted(conn, activity_id).await?;
    for (i, row) in rows.iter().enumerate() {
        let position = (i + 1) as i64;
        if row.waitlist_position != Some(position) {
            registration_repo::set_waitlist_position(conn, &row.registration_id, position)
                .await?;
        }
    }
    Ok(())
}

/// Position-ordered waitlist for an activity.
pub async fn get_waitlist(
    pool: &SqlitePool,
    activity_id: &str,
) -> EngineResult<Vec<RegistrationRow>> {
    let mut conn = pool.acquire().await?;
    let rows = registration_repo::list_waitlisted(&mut conn, activity_id).await?;
    Ok(rows)
}
