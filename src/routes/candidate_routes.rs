use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    Json,
};
use uuid::Uuid;

use crate::dto::candidate_dto::{
    CandidateDetailResponse, CandidateListQuery, CandidateListResponse, RelatedListQuery,
    RelatedListResponse, UpdateCandidatePayload,
};
use crate::error::Result;
use crate::query::{self, DEFAULT_RELATED_LIMIT};
use crate::AppState;

#[utoipa::path(
    get,
    path = "/candidates",
    params(
        ("q" = Option<String>, Query, description = "Matches full name, headline, or any skill"),
        ("location" = Option<String>, Query, description = "Location substring filter"),
        ("skill" = Option<String>, Query, description = "Exact skill membership filter"),
        ("status" = Option<String>, Query, description = "Status substring filter"),
        ("availability" = Option<String>, Query, description = "Availability substring filter"),
        ("minExp" = Option<i32>, Query, description = "Minimum years of experience"),
        ("maxExp" = Option<i32>, Query, description = "Maximum years of experience"),
        ("sort" = Option<String>, Query, description = "updatedAt, createdAt, fullName, yearsOfExperience or score"),
        ("order" = Option<String>, Query, description = "asc or desc"),
        ("page" = Option<i64>, Query, description = "Page number"),
        ("pageSize" = Option<i64>, Query, description = "Items per page, 1 to 100")
    ),
    responses(
        (status = 200, description = "Page of candidates", body = Json<CandidateListResponse>),
        (status = 400, description = "Invalid query parameters")
    )
)]
#[axum::debug_handler]
pub async fn list_candidates(
    State(state): State<AppState>,
    Query(raw): Query<CandidateListQuery>,
) -> Result<impl IntoResponse> {
    let compiled = query::compile(&raw)?;
    let list = state
        .candidate_service
        .list(&compiled, &state.list_cache)
        .await?;
    Ok(Json(CandidateListResponse::from(list)))
}

#[utoipa::path(
    get,
    path = "/candidates/{id}",
    params(
        ("id" = Uuid, Path, description = "Candidate ID")
    ),
    responses(
        (status = 200, description = "Candidate with audit trail", body = Json<CandidateDetailResponse>),
        (status = 404, description = "Candidate not found")
    )
)]
#[axum::debug_handler]
pub async fn get_candidate(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let detail = state.candidate_service.get_with_audit(id).await?;
    Ok(Json(CandidateDetailResponse::from(detail)))
}

#[utoipa::path(
    patch,
    path = "/candidates/{id}",
    params(
        ("id" = Uuid, Path, description = "Candidate ID")
    ),
    request_body = UpdateCandidatePayload,
    responses(
        (status = 200, description = "Candidate updated", body = Json<CandidateDetailResponse>),
        (status = 400, description = "Invalid payload"),
        (status = 404, description = "Candidate not found")
    )
)]
#[axum::debug_handler]
pub async fn update_candidate(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<serde_json::Value>,
) -> Result<impl IntoResponse> {
    let payload = UpdateCandidatePayload::from_json(&body)?;
    let detail = state
        .candidate_service
        .update(id, &payload, &state.list_cache)
        .await?;
    Ok(Json(CandidateDetailResponse::from(detail)))
}

#[utoipa::path(
    get,
    path = "/candidates/{id}/related",
    params(
        ("id" = Uuid, Path, description = "Candidate ID"),
        ("limit" = Option<i64>, Query, description = "Number of related candidates to return")
    ),
    responses(
        (status = 200, description = "Candidates ranked by similarity", body = Json<RelatedListResponse>),
        (status = 404, description = "Candidate not found")
    )
)]
#[axum::debug_handler]
pub async fn related_candidates(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(query): Query<RelatedListQuery>,
) -> Result<impl IntoResponse> {
    let limit = query
        .limit
        .as_deref()
        .and_then(|raw| raw.trim().parse::<usize>().ok())
        .filter(|limit| *limit > 0)
        .unwrap_or(DEFAULT_RELATED_LIMIT);
    let data = state.related_service.related(id, limit).await?;
    Ok(Json(RelatedListResponse { data }))
}
