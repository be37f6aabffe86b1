use serde::{Deserialize, Serialize};
use validator::{ValidationError, ValidationErrors};

use crate::error::Result;
use crate::models::audit_event::AuditEvent;
use crate::models::candidate::Candidate;
use crate::services::candidate_service::CandidateList;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default, rename_all = "camelCase")]
pub struct CandidateListQuery {
    pub q: Option<String>,
    pub location: Option<String>,
    pub skill: Option<String>,
    pub status: Option<String>,
    pub availability: Option<String>,
    pub min_exp: Option<String>,
    pub max_exp: Option<String>,
    pub sort: Option<String>,
    pub order: Option<String>,
    pub page: Option<String>,
    pub page_size: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct RelatedListQuery {
    pub limit: Option<String>,
}

/// Partial update over the three tracked candidate fields.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpdateCandidatePayload {
    pub status: Option<String>,
    pub shortlisted: Option<bool>,
    pub rejected: Option<bool>,
}

impl UpdateCandidatePayload {
    /// Strict parse of the request body. Unknown fields and wrong types,
    /// including explicit nulls, are collected as per-field messages so a
    /// bad patch never reaches storage.
    pub fn from_json(body: &serde_json::Value) -> Result<Self> {
        let mut errors = ValidationErrors::new();

        let object = match body.as_object() {
            Some(object) => object,
            None => {
                add_payload_error(&mut errors, "payload", "request body must be a JSON object");
                return Err(errors.into());
            }
        };

        let mut payload = UpdateCandidatePayload::default();
        for (field, value) in object {
            match field.as_str() {
                "status" => match value.as_str() {
                    Some(status) => payload.status = Some(status.to_string()),
                    None => add_payload_error(&mut errors, "status", "status must be a string"),
                },
                "shortlisted" => match value.as_bool() {
                    Some(flag) => payload.shortlisted = Some(flag),
                    None => add_payload_error(
                        &mut errors,
                        "shortlisted",
                        "shortlisted must be a boolean",
                    ),
                },
                "rejected" => match value.as_bool() {
                    Some(flag) => payload.rejected = Some(flag),
                    None => {
                        add_payload_error(&mut errors, "rejected", "rejected must be a boolean")
                    }
                },
                unknown => add_payload_error(
                    &mut errors,
                    "payload",
                    &format!("unknown field: {}", unknown),
                ),
            }
        }

        if errors.is_empty() {
            Ok(payload)
        } else {
            Err(errors.into())
        }
    }

    pub fn is_empty(&self) -> bool {
        self.status.is_none() && self.shortlisted.is_none() && self.rejected.is_none()
    }
}

fn add_payload_error(errors: &mut ValidationErrors, field: &'static str, message: &str) {
    let mut error = ValidationError::new("invalid");
    error.message = Some(message.to_string().into());
    errors.add(field, error);
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListMeta {
    pub page: i64,
    pub page_size: i64,
    pub total: i64,
    pub total_pages: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateListResponse {
    pub data: Vec<Candidate>,
    pub meta: ListMeta,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateDetailResponse {
    #[serde(flatten)]
    pub candidate: Candidate,
    pub audit_log: Vec<AuditEvent>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RelatedListResponse {
    pub data: Vec<Candidate>,
}

impl From<CandidateList> for CandidateListResponse {
    fn from(value: CandidateList) -> Self {
        Self {
            data: value.data,
            meta: ListMeta {
                page: value.page,
                page_size: value.page_size,
                total: value.total,
                total_pages: value.total_pages,
            },
        }
    }
}

impl From<(Candidate, Vec<AuditEvent>)> for CandidateDetailResponse {
    fn from((candidate, audit_log): (Candidate, Vec<AuditEvent>)) -> Self {
        Self {
            candidate,
            audit_log,
        }
    }
}
