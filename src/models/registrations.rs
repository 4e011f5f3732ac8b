// High-churn registration rows: one per (activity, participant) pair,
// reactivated in place after a cancel instead of inserting a duplicate.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct RegistrationRow {
    pub registration_id: String,
    pub activity_id: String,
    pub participant_user_id: String,
    pub status: String,
    pub waitlist_position: Option<i64>,
    pub payment_status: Option<String>,
    pub queue_seq: i64,
    pub registered_at: String,
    pub promoted_at: Option<String>,
    pub payment_deadline_at: Option<String>,
    pub team: Option<String>,
    pub role: Option<String>,
}

impl RegistrationRow {
    pub fn is_active(&self) -> bool {
        self.status != RegistrationStatus::Cancelled.as_str()
    }

    pub fn is_registered(&self) -> bool {
        self.status == RegistrationStatus::Registered.as_str()
    }

    pub fn is_waitlisted(&self) -> bool {
        self.status == RegistrationStatus::Waitlisted.as_str()
    }

    pub fn is_verified(&self) -> bool {
        self.payment_status.as_deref() == Some(PaymentStatus::Verified.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistrationStatus {
    Registered,
    Waitlisted,
    Cancelled,
}

impl RegistrationStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            RegistrationStatus::Registered => "registered",
            RegistrationStatus::Waitlisted => "waitlisted",
            RegistrationStatus::Cancelled => "cancelled",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentStatus {
    Pending,
    MarkedPaid,
    Verified,
}

impl PaymentStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::MarkedPaid => "marked_paid",
            PaymentStatus::Verified => "verified",
        }
    }
}
