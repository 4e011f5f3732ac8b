mod common;

use matchday::services::notifier_service::{NotificationKind, Notifier};
use matchday::services::{admission_service, payment_service, promotion_service};

use common::*;

#[tokio::test]
async fn free_event_promotion_cascade() {
    let pool = setup_pool().await;
    let notifier = Notifier::disabled();
    create_user(&pool, "org", "[]").await;
    for u in ["a", "b", "c", "d"] {
        create_user(&pool, u, r#"["skater"]"#).await;
    }
    create_activity(&pool, "act", "org", 2, 0).await;

    for u in ["a", "b", "c", "d"] {
        admission_service::register(&pool, &notifier, "act", u, None)
            .await
            .unwrap();
    }
    assert_eq!(registered_count(&pool, "act").await, 2);

    admission_service::cancel_registration(&pool, &notifier, "act", "a")
        .await
        .unwrap();

    // c was first in line: now confirmed, with the promotion stamp.
    let c = registration_for(&pool, "act", "c").await;
    assert_eq!(c.status, "registered");
    assert_eq!(c.waitlist_position, None);
    assert!(c.promoted_at.is_some());
    assert_eq!(c.payment_deadline_at, None);

    // d moves up into a gapless list.
    let positions = waitlist_positions(&pool, "act").await;
    assert_eq!(positions, vec![("d".to_string(), 1)]);
    assert_eq!(registered_count(&pool, "act").await, 2);
}

#[tokio::test]
async fn verified_entry_outranks_earlier_unverified_entry() {
    let pool = setup_pool().await;
    let notifier = Notifier::disabled();
    create_user(&pool, "org", "[]").await;
    for u in ["occupant", "u_early", "v_late"] {
        create_user(&pool, u, r#"["skater"]"#).await;
    }
    create_activity(&pool, "act", "org", 1, 2000).await;

    // Fill the single slot through the paid path.
    admission_service::register(&pool, &notifier, "act", "occupant", None)
        .await
        .unwrap();
    let occupant = registration_for(&pool, "act", "occupant").await;
    payment_service::mark_payment(&pool, "act", "occupant")
        .await
        .unwrap();
    payment_service::verify_payment(&pool, &notifier, "act", &occupant.registration_id, true, "org")
        .await
        .unwrap();
    assert_eq!(registered_count(&pool, "act").await, 1);

    // u_early queues first but never pays; v_late pays and is verified
    // while the activity is full, so verification alone promotes nobody.
    admission_service::register(&pool, &notifier, "act", "u_early", None)
        .await
        .unwrap();
    admission_service::register(&pool, &notifier, "act", "v_late", None)
        .await
        .unwrap();
    let v_late = registration_for(&pool, "act", "v_late").await;
    payment_service::mark_payment(&pool, "act", "v_late")
        .await
        .unwrap();
    payment_service::verify_payment(&pool, &notifier, "act", &v_late.registration_id, true, "org")
        .await
        .unwrap();
    assert_eq!(registration_for(&pool, "act", "v_late").await.status, "waitlisted");

    // Freeing the slot promotes the verified latecomer over the earlier
    // unverified entry.
    admission_service::cancel_registration(&pool, &notifier, "act", "occupant")
        .await
        .unwrap();

    let v_late = registration_for(&pool, "act", "v_late").await;
    assert_eq!(v_late.status, "registered");
    assert!(v_late.promoted_at.is_some());
    assert!(v_late.payment_deadline_at.is_some());

    let u_early = registration_for(&pool, "act", "u_early").await;
    assert_eq!(u_early.status, "waitlisted");
    assert_eq!(u_early.waitlist_position, Some(1));
}

#[tokio::test]
async fn unverified_entries_are_notified_not_promoted() {
    let pool = setup_pool().await;
    let notifier = Notifier::disabled();
    create_user(&pool, "org", "[]").await;
    for u in ["u1", "u2", "u3"] {
        create_user(&pool, u, r#"["skater"]"#).await;
    }
    create_activity(&pool, "act", "org", 3, 1000).await;

    for u in ["u1", "u2", "u3"] {
        admission_service::register(&pool, &notifier, "act", u, None)
            .await
            .unwrap();
    }

    let outcome = promotion_service::promote_and_dispatch(&pool, &notifier, "act", 2)
        .await
        .unwrap();

    assert!(outcome.promoted.is_empty());
    let spot_notices: Vec<&str> = outcome
        .pending_notifications
        .iter()
        .filter(|n| n.kind == NotificationKind::SpotAvailable)
        .map(|n| n.recipient_user_id.as_str())
        .collect();
    // Only the earliest-queued entries get asked to pay, one per open slot.
    assert_eq!(spot_notices, ["u1", "u2"]);

    assert_eq!(registered_count(&pool, "act").await, 0);
    let positions = waitlist_positions(&pool, "act").await;
    assert_eq!(positions.len(), 3);
}

#[tokio::test]
async fn promotion_batch_contains_participant_and_owner_notices() {
    let pool = setup_pool().await;
    let notifier = Notifier::disabled();
    create_user(&pool, "org", "[]").await;
    for u in ["a", "b", "c"] {
        create_user(&pool, u, r#"["skater"]"#).await;
    }
    create_activity(&pool, "act", "org", 2, 0).await;

    for u in ["a", "b", "c"] {
        admission_service::register(&pool, &notifier, "act", u, None)
            .await
            .unwrap();
    }
    // Free the slot by hand so the engine call is observable.
    sqlx::query("UPDATE registrations SET status = 'cancelled', team = NULL WHERE activity_id = 'act' AND participant_user_id = 'a'")
        .execute(&pool)
        .await
        .unwrap();

    let outcome = promotion_service::promote_and_dispatch(&pool, &notifier, "act", 1)
        .await
        .unwrap();

    assert_eq!(outcome.promoted.len(), 1);
    assert_eq!(outcome.promoted[0].participant_user_id, "c");

    let kinds: Vec<NotificationKind> = outcome
        .pending_notifications
        .iter()
        .map(|n| n.kind)
        .collect();
    assert_eq!(
        kinds,
        [NotificationKind::Promoted, NotificationKind::OwnerAutoPromotion]
    );
    assert_eq!(outcome.pending_notifications[0].recipient_user_id, "c");
    assert_eq!(outcome.pending_notifications[1].recipient_user_id, "org");
}

#[tokio::test]
async fn empty_waitlist_promotion_is_a_no_op() {
    let pool = setup_pool().await;
    let notifier = Notifier::disabled();
    create_user(&pool, "org", "[]").await;
    create_activity(&pool, "act", "org", 2, 0).await;

    let outcome = promotion_service::promote_and_dispatch(&pool, &notifier, "act", 1)
        .await
        .unwrap();
    assert!(outcome.promoted.is_empty());
    assert!(outcome.pending_notifications.is_empty());
}

#[tokio::test]
async fn confirmed_teams_stay_balanced() {
    let pool = setup_pool().await;
    let notifier = Notifier::disabled();
    create_user(&pool, "org", "[]").await;
    create_user(&pool, "g1", r#"["goalie"]"#).await;
    create_user(&pool, "g2", r#"["goalie"]"#).await;
    create_user(&pool, "s1", r#"["skater"]"#).await;
    create_user(&pool, "s2", r#"["skater"]"#).await;
    create_activity(&pool, "act", "org", 4, 0).await;

    for u in ["g1", "g2", "s1", "s2"] {
        admission_service::register(&pool, &notifier, "act", u, None)
            .await
            .unwrap();
    }

    let g1 = registration_for(&pool, "act", "g1").await;
    let g2 = registration_for(&pool, "act", "g2").await;
    let s1 = registration_for(&pool, "act", "s1").await;
    let s2 = registration_for(&pool, "act", "s2").await;

    // One goalie per side, two players per side.
    assert_eq!(g1.team.as_deref(), Some("home"));
    assert_eq!(g2.team.as_deref(), Some("away"));
    assert_eq!(s1.team.as_deref(), Some("home"));
    assert_eq!(s2.team.as_deref(), Some("away"));
}

#[tokio::test]
async fn direct_admission_never_sets_promoted_at() {
    let pool = setup_pool().await;
    let notifier = Notifier::disabled();
    create_user(&pool, "org", "[]").await;
    create_user(&pool, "u1", r#"["skater"]"#).await;
    create_activity(&pool, "act", "org", 1, 0).await;

    admission_service::register(&pool, &notifier, "act", "u1", None)
        .await
        .unwrap();
    let row = registration_for(&pool, "act", "u1").await;
    assert_eq!(row.status, "registered");
    assert_eq!(row.promoted_at, None);
}
