use anyhow::Result;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Token scope - a full session token, or the short-lived token issued
/// between password verification and the two-factor check.
pub const SCOPE_SESSION: &str = "session";
pub const SCOPE_TWO_FACTOR: &str = "2fa";

/// JWT Claims - data stored in the token
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: String,    // Subject (user_id as string)
    pub user_id: Uuid,  // User UUID
    pub email: String,  // Email (for logging/debugging)
    pub is_admin: bool, // Admin flag
    pub scope: String,  // "session" or "2fa"
    pub exp: i64,       // Expiration timestamp
    pub iat: i64,       // Issued at timestamp
    pub iss: String,    // Issuer
    pub jti: String,    // JWT ID (unique token identifier)
}

/// JWT Service - creates and verifies JWT tokens
#[derive(Clone)]
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    issuer: String,
}

impl JwtService {
    /// Create new JWT service with secret and issuer
    pub fn new(secret: &str, issuer: String) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            issuer,
        }
    }

    /// Create a session token for a user. Expires after 24 hours.
    pub fn create_token(&self, user_id: Uuid, email: String, is_admin: bool) -> Result<String> {
        self.create_scoped(user_id, email, is_admin, SCOPE_SESSION, chrono::Duration::hours(24))
    }

    /// Create a pending two-factor token. Expires after 5 minutes and is
    /// only accepted by the two-factor verification endpoint.
    pub fn create_pending_token(&self, user_id: Uuid, email: String) -> Result<String> {
        self.create_scoped(
            user_id,
            email,
            false,
            SCOPE_TWO_FACTOR,
            chrono::Duration::minutes(5),
        )
    }

    fn create_scoped(
        &self,
        user_id: Uuid,
        email: String,
        is_admin: bool,
        scope: &str,
        ttl: chrono::Duration,
    ) -> Result<String> {
        let now = chrono::Utc::now();
        let exp = now + ttl;

        let claims = Claims {
            sub: user_id.to_string(),
            user_id,
            email,
            is_admin,
            scope: scope.to_string(),
            exp: exp.timestamp(),
            iat: now.timestamp(),
            iss: self.issuer.clone(),
            jti: Uuid::new_v4().to_string(),
        };

        encode(&Header::default(), &claims, &self.encoding_key).map_err(Into::into)
    }

    /// Verify and decode a token of any scope.
    ///
    /// Returns claims if the token is valid and not expired.
    pub fn verify_token(&self, token: &str) -> Result<Claims> {
        let mut validation = Validation::default();
        validation.set_issuer(&[&self.issuer]);

        decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(Into::into)
    }

    /// Verify a token and require the session scope.
    pub fn verify_session_token(&self, token: &str) -> Result<Claims> {
        let claims = self.verify_token(token)?;
        if claims.scope != SCOPE_SESSION {
            anyhow::bail!("Token is not a session token");
        }
        Ok(claims)
    }

    /// Verify a token and require the pending two-factor scope.
    pub fn verify_pending_token(&self, token: &str) -> Result<Claims> {
        let claims = self.verify_token(token)?;
        if claims.scope != SCOPE_TWO_FACTOR {
            anyhow::bail!("Token is not a pending two-factor token");
        }
        Ok(claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> JwtService {
        JwtService::new("test_secret_key", "test_issuer".to_string())
    }

    #[test]
    fn test_create_and_verify_token() {
        let service = service();
        let user_id = Uuid::new_v4();

        let token = service
            .create_token(user_id, "artist@example.com".to_string(), true)
            .unwrap();

        let claims = service.verify_session_token(&token).unwrap();
        assert_eq!(claims.user_id, user_id);
        assert_eq!(claims.email, "artist@example.com");
        assert!(claims.is_admin);
        assert_eq!(claims.iss, "test_issuer");
    }

    #[test]
    fn test_invalid_token() {
        assert!(service().verify_token("invalid_token").is_err());
    }

    #[test]
    fn test_wrong_secret() {
        let service1 = JwtService::new("secret1", "test_issuer".to_string());
        let service2 = JwtService::new("secret2", "test_issuer".to_string());

        let token = service1
            .create_token(Uuid::new_v4(), "artist@example.com".to_string(), false)
            .unwrap();

        assert!(service2.verify_token(&token).is_err());
    }

    #[test]
    fn test_pending_token_is_not_a_session_token() {
        let service = service();
        let token = service
            .create_pending_token(Uuid::new_v4(), "artist@example.com".to_string())
            .unwrap();

        assert!(service.verify_session_token(&token).is_err());
        let claims = service.verify_pending_token(&token).unwrap();
        assert_eq!(claims.scope, SCOPE_TWO_FACTOR);
        assert!(!claims.is_admin);
    }

    #[test]
    fn test_session_token_is_not_a_pending_token() {
        let service = service();
        let token = service
            .create_token(Uuid::new_v4(), "artist@example.com".to_string(), false)
            .unwrap();
        assert!(service.verify_pending_token(&token).is_err());
    }

    #[test]
    fn test_token_expiry_window() {
        let service = service();
        let token = service
            .create_token(Uuid::new_v4(), "artist@example.com".to_string(), false)
            .unwrap();

        let claims = service.verify_token(&token).unwrap();
        let expires_in = claims.exp - chrono::Utc::now().timestamp();
        assert!(expires_in > 23 * 3600);
        assert!(expires_in <= 24 * 3600);
    }
}
