pub mod template;

pub use template::{CreateTemplate, EmailTemplate, UpdateTemplate};
