use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    pub id: Uuid,
    pub full_name: String,
    pub headline: String,
    pub location: String,
    pub years_of_experience: i32,
    pub skills: Vec<String>,
    pub availability: String,
    pub status: String,
    pub score: i32,
    pub shortlisted: bool,
    pub rejected: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

pub const CANDIDATE_COLUMNS: &str = "id, full_name, headline, location, years_of_experience, \
     skills, availability, status, score, shortlisted, rejected, created_at, updated_at";
