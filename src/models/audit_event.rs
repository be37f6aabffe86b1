use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct AuditEvent {
    pub id: Uuid,
    pub candidate_id: Uuid,
    pub at: DateTime<Utc>,
    pub action: String,
    #[serde(rename = "from")]
    pub from_value: Option<String>,
    #[serde(rename = "to")]
    pub to_value: Option<String>,
}

/// Tracked-field actions recorded on candidate updates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditAction {
    StatusUpdated,
    ShortlistedUpdated,
    RejectedUpdated,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditAction::StatusUpdated => "status_updated",
            AuditAction::ShortlistedUpdated => "shortlisted_updated",
            AuditAction::RejectedUpdated => "rejected_updated",
        }
    }
}
