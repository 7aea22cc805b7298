//! Account security: audit trail of login and credential activity.

pub mod models;

pub use models::{SecurityEvent, SecurityEventType};
