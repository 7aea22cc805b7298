pub mod ip_extractor;
pub mod jwt_auth;

pub use ip_extractor::{extract_client_ip, ClientIp};
pub use jwt_auth::jwt_auth_middleware;
