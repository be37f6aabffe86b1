pub mod audit_event;
pub mod candidate;
