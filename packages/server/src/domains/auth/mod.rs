//! Account registration, login, and session tokens.
//!
//! Login is a two-step flow when two-factor is enabled: password
//! verification issues a short-lived pending token, and the two-factor
//! domain exchanges it for a full session token.

pub mod jwt;
pub mod lockout;
pub mod models;
pub mod password;

pub use jwt::{Claims, JwtService};
pub use models::{CreateUser, User};
