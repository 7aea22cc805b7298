//! Two-factor authentication: TOTP plus one-time backup codes.

pub mod models;
pub mod totp;

pub use models::TwoFactor;
