use sqlx::SqlitePool;
use tracing::{debug, warn};

use crate::database::user_repo;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    Promoted,
    SpotAvailable,
    OwnerAutoPromotion,
    OwnerPaidSignup,
    PaymentExpired,
}

impl NotificationKind {
    pub fn as_str(self) -> &'static str {
        match self {
            NotificationKind::Promoted => "promoted",
            NotificationKind::SpotAvailable => "spot_available",
            NotificationKind::OwnerAutoPromotion => "owner_auto_promotion",
            NotificationKind::OwnerPaidSignup => "owner_paid_signup",
            NotificationKind::PaymentExpired => "payment_expired",
        }
    }
}

// Produced by a mutation, dispatched strictly after its transaction
// commits, then discarded. Never persisted.
#[derive(Debug, Clone)]
pub struct PendingNotification {
    pub recipient_user_id: String,
    pub kind: NotificationKind,
    pub title: String,
    pub body: String,
    pub activity_id: String,
    pub registration_id: Option<String>,
}

#[derive(Clone)]
pub struct Notifier {
    client: reqwest::Client,
    gateway_url: Option<String>,
}

impl Notifier {
    pub fn from_env() -> Self {
        Self {
            client: reqwest::Client::new(),
            gateway_url: std::env::var("PUSH_GATEWAY_URL").ok(),
        }
    }

    /// No-op transport; notifications are logged and dropped.
    pub fn disabled() -> Self {
        Self {
            client: reqwest::Client::new(),
            gateway_url: None,
        }
    }
}

/// Deliver a committed batch. Best-effort by contract: a failed send is
/// logged and skipped, and never unwinds into the registration state that
/// produced it.
pub async fn dispatch_all(pool: &SqlitePool, notifier: &Notifier, batch: Vec<PendingNotification>) {
    for notification in batch {
        if let Err(e) = dispatch_one(pool, notifier, &notification).await {
            warn!(
                "notification dispatch failed (kind={}, recipient={}): {}",
                notification.kind.as_str(),
                notification.recipient_user_id,
                e
            );
        }
    }
}

async fn dispatch_one(
    pool: &SqlitePool,
    notifier: &Notifier,
    notification: &PendingNotification,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let mut conn = pool.acquire().await?;
    let user = user_repo::load_user(&mut conn, &notification.recipient_user_id).await?;
    drop(conn);

    let Some(token) = user.and_then(|u| u.push_token) else {
        debug!(
            "no push token for {}; dropping {} notification",
            notification.recipient_user_id,
            notification.kind.as_str()
        );
        return Ok(());
    };

    let Some(gateway) = notifier.gateway_url.as_deref() else {
        debug!(
            "push gateway not configured; dropping {} notification for {}",
            notification.kind.as_str(),
            notification.recipient_user_id
        );
        return Ok(());
    };

    let url = format!("{}/api/v1/push", gateway.trim_end_matches('/'));
    notifier
        .client
        .post(&url)
        .json(&serde_json::json!({
            "token": token,
            "title": notification.title,
            "body": notification.body,
            "type": notification.kind.as_str(),
            "activity_id": notification.activity_id,
            "registration_id": notification.registration_id,
        }))
        .send()
        .await?
        .error_for_status()?;

    Ok(())
}
