//! In-app notifications and push device tokens.

pub mod models;

pub use models::{DeviceToken, Notification};
