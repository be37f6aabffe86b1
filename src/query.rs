use std::fmt::Write;

use validator::{ValidationError, ValidationErrors};

use crate::dto::candidate_dto::CandidateListQuery;
use crate::error::Result;

pub const DEFAULT_PAGE_SIZE: i64 = 12;
pub const MAX_PAGE_SIZE: i64 = 100;
pub const DEFAULT_RELATED_LIMIT: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    UpdatedAt,
    CreatedAt,
    FullName,
    YearsOfExperience,
    Score,
}

impl SortField {
    fn parse(raw: &str) -> Option<Self> {
        match raw {
            "updatedAt" => Some(SortField::UpdatedAt),
            "createdAt" => Some(SortField::CreatedAt),
            "fullName" => Some(SortField::FullName),
            "yearsOfExperience" => Some(SortField::YearsOfExperience),
            "score" => Some(SortField::Score),
            _ => None,
        }
    }

    pub fn column(&self) -> &'static str {
        match self {
            SortField::UpdatedAt => "updated_at",
            SortField::CreatedAt => "created_at",
            SortField::FullName => "full_name",
            SortField::YearsOfExperience => "years_of_experience",
            SortField::Score => "score",
        }
    }

    fn key(&self) -> &'static str {
        match self {
            SortField::UpdatedAt => "updatedAt",
            SortField::CreatedAt => "createdAt",
            SortField::FullName => "fullName",
            SortField::YearsOfExperience => "yearsOfExperience",
            SortField::Score => "score",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    fn parse(raw: &str) -> Option<Self> {
        match raw {
            "asc" => Some(SortOrder::Asc),
            "desc" => Some(SortOrder::Desc),
            _ => None,
        }
    }

    pub fn sql(&self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }

    fn key(&self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }
}

/// Text columns that support case-insensitive substring filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextField {
    Location,
    Status,
    Availability,
}

impl TextField {
    pub fn column(&self) -> &'static str {
        match self {
            TextField::Location => "location",
            TextField::Status => "status",
            TextField::Availability => "availability",
        }
    }
}

/// One validated filter. Every variant has exactly one SQL rendering; the
/// store never re-inspects raw user input.
#[derive(Debug, Clone, PartialEq)]
pub enum CandidateFilter {
    /// `q`: matches full_name, headline, or any skill, case-insensitively.
    Search(String),
    /// Case-insensitive substring match on one text column.
    Contains { field: TextField, needle: String },
    /// Exact membership in the skills array, case-sensitive as stored.
    HasSkill(String),
    /// Inclusive bounds on years_of_experience.
    ExperienceRange { min: Option<i32>, max: Option<i32> },
}

/// Normalized descriptor consumed by the candidate store.
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateQuery {
    pub filters: Vec<CandidateFilter>,
    pub sort: SortField,
    pub order: SortOrder,
    pub page: i64,
    pub page_size: i64,
}

impl CandidateQuery {
    pub fn offset(&self) -> i64 {
        // page is only bounded below, so a huge page must not overflow the
        // multiplication.
        (self.page - 1).saturating_mul(self.page_size)
    }

    /// Canonical cache key. Filters are emitted in the fixed order `compile`
    /// builds them, and separator characters inside values are escaped, so
    /// equal queries always serialize identically and distinct queries never
    /// collide.
    pub fn cache_key(&self) -> String {
        let mut key = String::new();
        for filter in &self.filters {
            match filter {
                CandidateFilter::Search(q) => {
                    let _ = write!(key, "q={};", escape_key_value(q));
                }
                CandidateFilter::Contains { field, needle } => {
                    let _ = write!(key, "{}={};", field.column(), escape_key_value(needle));
                }
                CandidateFilter::HasSkill(skill) => {
                    let _ = write!(key, "skill={};", escape_key_value(skill));
                }
                CandidateFilter::ExperienceRange { min, max } => {
                    let _ = write!(
                        key,
                        "exp={}..{};",
                        min.map(|v| v.to_string()).unwrap_or_default(),
                        max.map(|v| v.to_string()).unwrap_or_default()
                    );
                }
            }
        }
        let _ = write!(
            key,
            "sort={}:{};page={};pageSize={}",
            self.sort.key(),
            self.order.key(),
            self.page,
            self.page_size
        );
        key
    }
}

/// Compiles the raw query-string parameters into a `CandidateQuery`,
/// collecting one message per offending field. Storage is never touched on
/// failure.
pub fn compile(raw: &CandidateListQuery) -> Result<CandidateQuery> {
    let mut errors = ValidationErrors::new();

    let page = match parse_integer(&raw.page) {
        Parsed::Absent => 1,
        Parsed::Value(p) if p >= 1 => p,
        Parsed::Value(_) => {
            add_error(&mut errors, "page", "range", "page must be 1 or greater");
            1
        }
        Parsed::Invalid => {
            add_error(&mut errors, "page", "invalid", "page must be a number");
            1
        }
    };

    let page_size = match parse_integer(&raw.page_size) {
        Parsed::Absent => DEFAULT_PAGE_SIZE,
        Parsed::Value(s) if (1..=MAX_PAGE_SIZE).contains(&s) => s,
        Parsed::Value(_) => {
            add_error(
                &mut errors,
                "pageSize",
                "range",
                "pageSize must be between 1 and 100",
            );
            DEFAULT_PAGE_SIZE
        }
        Parsed::Invalid => {
            add_error(&mut errors, "pageSize", "invalid", "pageSize must be a number");
            DEFAULT_PAGE_SIZE
        }
    };

    let sort = match present(&raw.sort) {
        None => SortField::UpdatedAt,
        Some(value) => SortField::parse(value).unwrap_or_else(|| {
            add_error(
                &mut errors,
                "sort",
                "invalid",
                "sort must be one of updatedAt, createdAt, fullName, yearsOfExperience, score",
            );
            SortField::UpdatedAt
        }),
    };

    let order = match present(&raw.order) {
        None => SortOrder::Desc,
        Some(value) => SortOrder::parse(value).unwrap_or_else(|| {
            add_error(&mut errors, "order", "invalid", "order must be asc or desc");
            SortOrder::Desc
        }),
    };

    let min_exp = match parse_bound(&raw.min_exp) {
        Parsed::Absent => None,
        Parsed::Value(v) => Some(v),
        Parsed::Invalid => {
            add_error(&mut errors, "minExp", "invalid", "minExp must be a number");
            None
        }
    };
    let max_exp = match parse_bound(&raw.max_exp) {
        Parsed::Absent => None,
        Parsed::Value(v) => Some(v),
        Parsed::Invalid => {
            add_error(&mut errors, "maxExp", "invalid", "maxExp must be a number");
            None
        }
    };
    if let (Some(min), Some(max)) = (min_exp, max_exp) {
        if min > max {
            add_error(
                &mut errors,
                "minExp",
                "range",
                "minExp cannot be greater than maxExp",
            );
        }
    }

    if !errors.is_empty() {
        return Err(errors.into());
    }

    // Fixed filter order keeps the cache key canonical.
    let mut filters = Vec::new();
    if let Some(q) = present(&raw.q) {
        filters.push(CandidateFilter::Search(q.to_string()));
    }
    if let Some(location) = present(&raw.location) {
        filters.push(CandidateFilter::Contains {
            field: TextField::Location,
            needle: location.to_string(),
        });
    }
    if let Some(skill) = present(&raw.skill) {
        filters.push(CandidateFilter::HasSkill(skill.to_string()));
    }
    if let Some(status) = present(&raw.status) {
        filters.push(CandidateFilter::Contains {
            field: TextField::Status,
            needle: status.to_string(),
        });
    }
    if let Some(availability) = present(&raw.availability) {
        filters.push(CandidateFilter::Contains {
            field: TextField::Availability,
            needle: availability.to_string(),
        });
    }
    if min_exp.is_some() || max_exp.is_some() {
        filters.push(CandidateFilter::ExperienceRange {
            min: min_exp,
            max: max_exp,
        });
    }

    Ok(CandidateQuery {
        filters,
        sort,
        order,
        page,
        page_size,
    })
}

enum Parsed<T> {
    Absent,
    Value(T),
    Invalid,
}

// Blank values behave as if the parameter was not sent at all.
fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn parse_integer(value: &Option<String>) -> Parsed<i64> {
    match present(value) {
        None => Parsed::Absent,
        Some(raw) => raw.parse().map(Parsed::Value).unwrap_or(Parsed::Invalid),
    }
}

fn parse_bound(value: &Option<String>) -> Parsed<i32> {
    match present(value) {
        None => Parsed::Absent,
        Some(raw) => raw.parse().map(Parsed::Value).unwrap_or(Parsed::Invalid),
    }
}

// `;` and `=` delimit cache-key segments, so values containing them must be
// escaped to keep the serialization injective.
fn escape_key_value(raw: &str) -> String {
    raw.replace('\\', "\\\\")
        .replace(';', "\\;")
        .replace('=', "\\=")
}

fn add_error(errors: &mut ValidationErrors, field: &'static str, code: &'static str, message: &str) {
    let mut error = ValidationError::new(code);
    error.message = Some(message.to_string().into());
    errors.add(field, error);
}
