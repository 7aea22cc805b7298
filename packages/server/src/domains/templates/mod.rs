//! Email templates and the placeholder renderer.

pub mod models;
pub mod render;

pub use models::{CreateTemplate, EmailTemplate, UpdateTemplate};
pub use render::{render, Rendered};
