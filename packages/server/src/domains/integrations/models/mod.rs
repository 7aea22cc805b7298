pub mod integration;

pub use integration::{CreateIntegration, Integration, UpdateIntegration};
