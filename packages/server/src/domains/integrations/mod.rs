//! Outbound webhook integrations and event fanout.

pub mod fanout;
pub mod models;

pub use models::Integration;
