use sqlx::PgPool;
use uuid::Uuid;

use crate::cache::ListCache;
use crate::dto::candidate_dto::UpdateCandidatePayload;
use crate::error::{Error, Result};
use crate::models::audit_event::{AuditAction, AuditEvent};
use crate::models::candidate::{Candidate, CANDIDATE_COLUMNS};
use crate::query::{CandidateFilter, CandidateQuery};

#[derive(Clone)]
pub struct CandidateService {
    pool: PgPool,
}

#[derive(Debug, Clone)]
pub struct CandidateList {
    pub data: Vec<Candidate>,
    pub total: i64,
    pub page: i64,
    pub page_size: i64,
    pub total_pages: i64,
}

enum SqlArg {
    Text(String),
    Int(i32),
}

impl CandidateService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list(
        &self,
        query: &CandidateQuery,
        cache: &ListCache<CandidateList>,
    ) -> Result<CandidateList> {
        let cache_key = query.cache_key();
        if let Some(cached) = cache.get(&cache_key) {
            tracing::debug!(key = %cache_key, "candidate list served from cache");
            return Ok(cached);
        }

        let (where_clause, args) = where_clause(&query.filters);

        let data_query = format!(
            "SELECT {} FROM candidates {} ORDER BY {} {}, id ASC LIMIT ${} OFFSET ${}",
            CANDIDATE_COLUMNS,
            where_clause,
            query.sort.column(),
            query.order.sql(),
            args.len() + 1,
            args.len() + 2
        );
        let total_query = format!("SELECT COUNT(*) FROM candidates {}", where_clause);

        let mut data_statement = sqlx::query_as::<_, Candidate>(&data_query);
        for arg in &args {
            data_statement = match arg {
                SqlArg::Text(value) => data_statement.bind(value),
                SqlArg::Int(value) => data_statement.bind(*value),
            };
        }
        data_statement = data_statement.bind(query.page_size).bind(query.offset());
        let data = data_statement.fetch_all(&self.pool).await?;

        let mut total_statement = sqlx::query_scalar::<_, i64>(&total_query);
        for arg in &args {
            total_statement = match arg {
                SqlArg::Text(value) => total_statement.bind(value),
                SqlArg::Int(value) => total_statement.bind(*value),
            };
        }
        let total = total_statement.fetch_one(&self.pool).await?;

        let total_pages = ((total as f64) / (query.page_size as f64)).ceil() as i64;

        let list = CandidateList {
            data,
            total,
            page: query.page,
            page_size: query.page_size,
            total_pages,
        };
        cache.insert(cache_key, list.clone());
        Ok(list)
    }

    pub async fn get_with_audit(&self, id: Uuid) -> Result<(Candidate, Vec<AuditEvent>)> {
        let candidate = self.fetch_candidate(id).await?;
        let audit = self.audit_trail(id).await?;
        Ok((candidate, audit))
    }

    /// Applies a partial update and appends one audit event per tracked field
    /// that actually changed. Candidate row and audit rows commit together.
    /// An empty diff still bumps updated_at.
    pub async fn update(
        &self,
        id: Uuid,
        payload: &UpdateCandidatePayload,
        cache: &ListCache<CandidateList>,
    ) -> Result<(Candidate, Vec<AuditEvent>)> {
        let mut tx = self.pool.begin().await?;

        let current_query = format!(
            "SELECT {} FROM candidates WHERE id = $1 FOR UPDATE",
            CANDIDATE_COLUMNS
        );
        let current = sqlx::query_as::<_, Candidate>(&current_query)
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| Error::NotFound("Candidate not found".to_string()))?;

        let staged = staged_events(&current, payload);

        let update_query = format!(
            "UPDATE candidates SET \
             status = COALESCE($2, status), \
             shortlisted = COALESCE($3, shortlisted), \
             rejected = COALESCE($4, rejected), \
             updated_at = NOW() \
             WHERE id = $1 \
             RETURNING {}",
            CANDIDATE_COLUMNS
        );
        let updated = sqlx::query_as::<_, Candidate>(&update_query)
            .bind(id)
            .bind(payload.status.as_deref())
            .bind(payload.shortlisted)
            .bind(payload.rejected)
            .fetch_one(&mut *tx)
            .await?;

        for event in &staged {
            sqlx::query(
                "INSERT INTO audit_events (candidate_id, action, from_value, to_value) \
                 VALUES ($1, $2, $3, $4)",
            )
            .bind(id)
            .bind(event.action.as_str())
            .bind(&event.from)
            .bind(&event.to)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        cache.clear();
        if payload.is_empty() {
            tracing::debug!(candidate_id = %id, "empty patch, only updated_at advanced");
        } else {
            tracing::info!(candidate_id = %id, changes = staged.len(), "candidate updated");
        }

        let audit = self.audit_trail(id).await?;
        Ok((updated, audit))
    }

    async fn fetch_candidate(&self, id: Uuid) -> Result<Candidate> {
        let query = format!("SELECT {} FROM candidates WHERE id = $1", CANDIDATE_COLUMNS);
        sqlx::query_as::<_, Candidate>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| Error::NotFound("Candidate not found".to_string()))
    }

    async fn audit_trail(&self, id: Uuid) -> Result<Vec<AuditEvent>> {
        let events = sqlx::query_as::<_, AuditEvent>(
            "SELECT id, candidate_id, at, action, from_value, to_value \
             FROM audit_events \
             WHERE candidate_id = $1 \
             ORDER BY at DESC, action",
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;
        Ok(events)
    }
}

struct StagedAudit {
    action: AuditAction,
    from: String,
    to: String,
}

/// Compares the patch against the current row and stages one audit entry per
/// tracked field whose value actually changes.
fn staged_events(current: &Candidate, patch: &UpdateCandidatePayload) -> Vec<StagedAudit> {
    let mut events = Vec::new();
    if let Some(status) = &patch.status {
        if *status != current.status {
            events.push(StagedAudit {
                action: AuditAction::StatusUpdated,
                from: current.status.clone(),
                to: status.clone(),
            });
        }
    }
    if let Some(shortlisted) = patch.shortlisted {
        if shortlisted != current.shortlisted {
            events.push(StagedAudit {
                action: AuditAction::ShortlistedUpdated,
                from: current.shortlisted.to_string(),
                to: shortlisted.to_string(),
            });
        }
    }
    if let Some(rejected) = patch.rejected {
        if rejected != current.rejected {
            events.push(StagedAudit {
                action: AuditAction::RejectedUpdated,
                from: current.rejected.to_string(),
                to: rejected.to_string(),
            });
        }
    }
    events
}

fn where_clause(filters: &[CandidateFilter]) -> (String, Vec<SqlArg>) {
    let mut predicates = Vec::new();
    let mut args: Vec<SqlArg> = Vec::new();

    for filter in filters {
        match filter {
            CandidateFilter::Search(q) => {
                let pattern = format!("%{}%", escape_like(q));
                let first = args.len() + 1;
                let second = first + 1;
                let third = second + 1;
                predicates.push(format!(
                    "(full_name ILIKE ${} OR headline ILIKE ${} \
                     OR EXISTS (SELECT 1 FROM unnest(skills) AS skill WHERE skill ILIKE ${}))",
                    first, second, third
                ));
                args.push(SqlArg::Text(pattern.clone()));
                args.push(SqlArg::Text(pattern.clone()));
                args.push(SqlArg::Text(pattern));
            }
            CandidateFilter::Contains { field, needle } => {
                predicates.push(format!("{} ILIKE ${}", field.column(), args.len() + 1));
                args.push(SqlArg::Text(format!("%{}%", escape_like(needle))));
            }
            CandidateFilter::HasSkill(skill) => {
                predicates.push(format!("${} = ANY(skills)", args.len() + 1));
                args.push(SqlArg::Text(skill.clone()));
            }
            CandidateFilter::ExperienceRange { min, max } => {
                if let Some(min) = min {
                    predicates.push(format!("years_of_experience >= ${}", args.len() + 1));
                    args.push(SqlArg::Int(*min));
                }
                if let Some(max) = max {
                    predicates.push(format!("years_of_experience <= ${}", args.len() + 1));
                    args.push(SqlArg::Int(*max));
                }
            }
        }
    }

    let clause = if predicates.is_empty() {
        String::new()
    } else {
        format!("WHERE {}", predicates.join(" AND "))
    };
    (clause, args)
}

// Wildcards in user input must match literally.
fn escape_like(raw: &str) -> String {
    raw.replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}
