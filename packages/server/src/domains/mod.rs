//! Domain modules: models and business logic, grouped by concern.

pub mod ai;
pub mod analytics;
pub mod auth;
pub mod automation;
pub mod campaigns;
pub mod contacts;
pub mod integrations;
pub mod notifications;
pub mod security;
pub mod templates;
pub mod two_factor;
