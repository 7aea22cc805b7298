// Encore - Music Promotion CRM API Core
//
// This crate provides the backend API for managing promo contacts, email
// campaigns, templates, analytics, and outbound integrations. Domains own
// their models and logic; infrastructure clients live in kernel/.

pub mod common;
pub mod config;
pub mod domains;
pub mod kernel;
pub mod server;

pub use config::*;
