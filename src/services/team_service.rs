use crate::models::RegistrationRow;

pub const TEAM_HOME: &str = "home";
pub const TEAM_AWAY: &str = "away";

// Every side needs exactly one of these, so it is balanced independently
// of total headcount.
const KEEPER_ROLE: &str = "goalie";

/// Pick a side for a newly confirmed participant.
///
/// Goalies go to whichever side has fewer goalies; everyone else goes to
/// whichever side has fewer players overall. Ties go to the home side.
/// A side with many skaters but no goalie still receives the next goalie
/// even though it is bigger overall.
pub fn assign_team(roster: &[RegistrationRow], new_role: Option<&str>) -> &'static str {
    let is_keeper = new_role
        .map(|r| r.eq_ignore_ascii_case(KEEPER_ROLE))
        .unwrap_or(false);

    let (home, away) = if is_keeper {
        (
            count_side_role(roster, TEAM_HOME, KEEPER_ROLE),
            count_side_role(roster, TEAM_AWAY, KEEPER_ROLE),
        )
    } else {
        (
            count_side(roster, TEAM_HOME),
            count_side(roster, TEAM_AWAY),
        )
    };

    if away < home {
        TEAM_AWAY
    } else {
        TEAM_HOME
    }
}

fn count_side(roster: &[RegistrationRow], team: &str) -> usize {
    roster
        .iter()
        .filter(|r| r.team.as_deref() == Some(team))
        .count()
}

fn count_side_role(roster: &[RegistrationRow], team: &str, role: &str) -> usize {
    roster
        .iter()
        .filter(|r| {
            r.team.as_deref() == Some(team)
                && r.role
                    .as_deref()
                    .map(|x| x.eq_ignore_ascii_case(role))
                    .unwrap_or(false)
        })
        .count()
}
