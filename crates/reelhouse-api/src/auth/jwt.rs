//! HS256 token verification

use jsonwebtoken::{decode, errors::ErrorKind, Algorithm, DecodingKey, Validation};
use reelhouse_core::AppError;

use super::models::JwtClaims;

#[derive(Clone)]
pub struct JwtVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl JwtVerifier {
    pub fn new(secret: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Self {
            key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }

    /// Validate and decode a bearer token
    pub fn verify(&self, token: &str) -> Result<JwtClaims, AppError> {
        let token_data = decode::<JwtClaims>(token, &self.key, &self.validation).map_err(|e| {
            tracing::debug!(error = %e, "JWT validation failed");
            match e.kind() {
                ErrorKind::ExpiredSignature => {
                    AppError::Unauthorized("Token has expired".to_string())
                }
                ErrorKind::InvalidSignature => {
                    AppError::Unauthorized("Invalid token signature".to_string())
                }
                _ => AppError::Unauthorized("Invalid or expired token".to_string()),
            }
        })?;

        Ok(token_data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use jsonwebtoken::{encode, EncodingKey, Header};
    use uuid::Uuid;

    const SECRET: &str = "test-secret-that-is-at-least-32-characters";

    fn token(secret: &str, sub: Uuid, exp_offset: i64) -> String {
        let now = Utc::now().timestamp();
        let claims = JwtClaims {
            sub,
            iat: now,
            exp: now + exp_offset,
        };
        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    #[test]
    fn test_valid_token() {
        let user = Uuid::new_v4();
        let claims = JwtVerifier::new(SECRET)
            .verify(&token(SECRET, user, 3600))
            .unwrap();
        assert_eq!(claims.sub, user);
    }

    #[test]
    fn test_expired_token() {
        let result = JwtVerifier::new(SECRET).verify(&token(SECRET, Uuid::new_v4(), -60));
        match result {
            Err(AppError::Unauthorized(msg)) => assert_eq!(msg, "Token has expired"),
            other => panic!("Expected Unauthorized, got {:?}", other.map(|c| c.sub)),
        }
    }

    #[test]
    fn test_wrong_secret() {
        let other = "another-secret-that-is-at-least-32-chars";
        let result = JwtVerifier::new(SECRET).verify(&token(other, Uuid::new_v4(), 3600));
        assert!(matches!(result, Err(AppError::Unauthorized(_))));
    }

    #[test]
    fn test_garbage_token() {
        let result = JwtVerifier::new(SECRET).verify("not-a-jwt");
        assert!(matches!(result, Err(AppError::Unauthorized(_))));
    }
}
