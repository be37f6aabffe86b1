use std::collections::HashSet;

use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::models::candidate::{Candidate, CANDIDATE_COLUMNS};

#[derive(Clone)]
pub struct RelatedService {
    pool: PgPool,
}

impl RelatedService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Scores every other candidate against the target and returns the top
    /// `limit` by descending similarity. The scan loads the whole table, so
    /// cost grows linearly with the candidate count.
    pub async fn related(&self, id: Uuid, limit: usize) -> Result<Vec<Candidate>> {
        let target_query = format!("SELECT {} FROM candidates WHERE id = $1", CANDIDATE_COLUMNS);
        let target = sqlx::query_as::<_, Candidate>(&target_query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| Error::NotFound("Candidate not found".to_string()))?;

        let others_query = format!(
            "SELECT {} FROM candidates WHERE id <> $1 ORDER BY created_at ASC, id ASC",
            CANDIDATE_COLUMNS
        );
        let others = sqlx::query_as::<_, Candidate>(&others_query)
            .bind(id)
            .fetch_all(&self.pool)
            .await?;

        Ok(rank_related(&target, others, limit))
    }
}

fn rank_related(target: &Candidate, others: Vec<Candidate>, limit: usize) -> Vec<Candidate> {
    let mut scored: Vec<(f64, Candidate)> = others
        .into_iter()
        .map(|candidate| (similarity_score(target, &candidate), candidate))
        .collect();
    // Stable sort keeps enumeration order for equal scores.
    scored.sort_by(|a, b| b.0.total_cmp(&a.0));
    scored.truncate(limit);
    scored.into_iter().map(|(_, candidate)| candidate).collect()
}

/// Weighted similarity out of 100: up to 50 for skill overlap, 30 for a
/// matching location, up to 20 for close experience.
fn similarity_score(target: &Candidate, other: &Candidate) -> f64 {
    let target_skills: HashSet<&str> = target.skills.iter().map(String::as_str).collect();
    let other_skills: HashSet<&str> = other.skills.iter().map(String::as_str).collect();
    let shared = target_skills.intersection(&other_skills).count();
    let denominator = target_skills.len().max(other_skills.len()).max(1);
    let skill_score = (shared as f64 / denominator as f64) * 50.0;

    // Lowercasing rather than an ASCII-only comparison keeps this consistent
    // with the ILIKE filters elsewhere.
    let location_score = if target.location.to_lowercase() == other.location.to_lowercase() {
        30.0
    } else {
        0.0
    };

    let gap = (target.years_of_experience - other.years_of_experience).abs() as f64;
    let experience_score = (20.0 - 2.0 * gap).max(0.0);

    skill_score + location_score + experience_score
}
