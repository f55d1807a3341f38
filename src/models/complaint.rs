// src/models/complaint.rs
use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};

use crate::models::user::UserRole;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ComplaintPriority {
    Low,
    #[default]
    Medium,
    High,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub enum ComplaintStatus {
    #[serde(alias = "pending")]
    Open,
    #[serde(alias = "resolved")]
    Resolved,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Complaint {
    pub id: String,
    pub ticket_id: String, // e.g. "TKT-4HZ8Q2LM"
    pub reported_by: String,
    pub role: UserRole,
    pub subject: String,
    pub description: String,
    pub priority: ComplaintPriority,
    pub status: ComplaintStatus,
    pub created_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ComplaintRequest {
    pub reported_by: String,
    pub role: UserRole,
    pub subject: String,
    pub description: String,
    #[serde(default)]
    pub priority: ComplaintPriority,
}
