use serde::Deserialize;
use sqlx::PgPool;

use crate::error::{Error, Result};

const SEED_DATA: &str = include_str!("seed_candidates.json");

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SeedCandidate {
    full_name: String,
    headline: String,
    location: String,
    years_of_experience: i32,
    skills: Vec<String>,
    availability: String,
    status: String,
    score: i32,
}

/// Loads the bundled sample candidates when the table is empty. A populated
/// table is left untouched so restarts never duplicate rows.
pub async fn seed_candidates(pool: &PgPool) -> Result<()> {
    let existing = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM candidates")
        .fetch_one(pool)
        .await?;
    if existing > 0 {
        tracing::debug!(existing, "candidates already present, skipping seed");
        return Ok(());
    }

    let seeds: Vec<SeedCandidate> = serde_json::from_str(SEED_DATA)
        .map_err(|err| Error::Internal(format!("invalid seed data: {}", err)))?;

    let count = seeds.len();
    for seed in seeds {
        sqlx::query(
            "INSERT INTO candidates \
             (full_name, headline, location, years_of_experience, skills, availability, status, score) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
        )
        .bind(seed.full_name)
        .bind(seed.headline)
        .bind(seed.location)
        .bind(seed.years_of_experience)
        .bind(seed.skills)
        .bind(seed.availability)
        .bind(seed.status)
        .bind(seed.score)
        .execute(pool)
        .await?;
    }

    tracing::info!(count, "seeded candidates table");
    Ok(())
}
