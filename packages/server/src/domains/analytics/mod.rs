//! Email event tracking and aggregate reporting.

pub mod dashboard;
pub mod ingest;
pub mod models;

pub use models::{EmailEvent, EmailEventType};
