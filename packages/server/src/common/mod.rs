// Common types and utilities shared across the application

pub mod app_state;
pub mod entity_ids;
pub mod errors;
pub mod id;
pub mod pagination;

pub use app_state::RequestAuth;
pub use entity_ids::*;
pub use errors::ApiError;
pub use id::Id;
pub use pagination::{Cursor, ListParams, Page};
