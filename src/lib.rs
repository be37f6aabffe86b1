pub mod cache;
pub mod config;
pub mod database;
pub mod dto;
pub mod error;
pub mod middleware;
pub mod models;
pub mod query;
pub mod routes;
pub mod services;

use std::time::Duration;

use sqlx::PgPool;

use crate::cache::ListCache;
use crate::services::candidate_service::{CandidateList, CandidateService};
use crate::services::related_service::RelatedService;

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub candidate_service: CandidateService,
    pub related_service: RelatedService,
    pub list_cache: ListCache<CandidateList>,
}

impl AppState {
    pub fn new(pool: PgPool) -> Self {
        let config = crate::config::get_config();

        let candidate_service = CandidateService::new(pool.clone());
        let related_service = RelatedService::new(pool.clone());
        let list_cache = ListCache::new(Duration::from_secs(config.cache_ttl_seconds));

        Self {
            pool,
            candidate_service,
            related_service,
            list_cache,
        }
    }
}
