pub mod candidate_service;
pub mod related_service;
