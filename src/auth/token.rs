use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::SecurityConfig;

/// The only algorithm tokens are signed with or accepted under
const SIGNING_ALGORITHM: Algorithm = Algorithm::HS256;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Claims {
    pub user_id: Uuid,
    pub organization_id: Uuid,
    pub iat: i64,
    pub exp: i64,
}

/// A freshly signed token; placement (cookie, body, header) is up to the caller
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, thiserror::Error)]
pub enum JwtError {
    #[error("JWT generation error: {0}")]
    TokenGeneration(String),

    #[error("Invalid JWT secret")]
    InvalidSecret,
}

/// Why a request could not be tied to a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    #[error("missing session token")]
    Missing,

    #[error("malformed authorization header")]
    Malformed,

    #[error("invalid session token")]
    Invalid,

    #[error("session token expired")]
    Expired,

    #[error("invalid email or password")]
    BadCredentials,
}

/// Issues and verifies session tokens with a server-held symmetric secret
#[derive(Clone)]
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl TokenService {
    pub fn new(secret: &str, ttl: Duration) -> Result<Self, JwtError> {
        if secret.is_empty() {
            return Err(JwtError::InvalidSecret);
        }

        let mut validation = Validation::new(SIGNING_ALGORITHM);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "iat"]);

        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            ttl,
        })
    }

    pub fn from_config(security: &SecurityConfig) -> Result<Self, JwtError> {
        Self::new(&security.jwt_secret, Duration::hours(security.jwt_expiry_hours as i64))
    }

    /// Validity window of issued tokens
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn issue(&self, user_id: Uuid, organization_id: Uuid) -> Result<IssuedToken, JwtError> {
        self.issue_at(user_id, organization_id, Utc::now())
    }

    /// Issue a token as if it had been signed at `issued_at`
    pub fn issue_at(
        &self,
        user_id: Uuid,
        organization_id: Uuid,
        issued_at: DateTime<Utc>,
    ) -> Result<IssuedToken, JwtError> {
        let expires_at = issued_at + self.ttl;
        let claims = Claims {
            user_id,
            organization_id,
            iat: issued_at.timestamp(),
            exp: expires_at.timestamp(),
        };

        let token = encode(&Header::new(SIGNING_ALGORITHM), &claims, &self.encoding_key)
            .map_err(|e| JwtError::TokenGeneration(e.to_string()))?;

        Ok(IssuedToken { token, expires_at })
    }

    pub fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => AuthError::Expired,
                _ => AuthError::Invalid,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret-with-enough-entropy-0123456789";

    fn service() -> TokenService {
        TokenService::new(SECRET, Duration::hours(5)).unwrap()
    }

    #[test]
    fn round_trip_returns_identity() {
        let tokens = service();
        let (user_id, org_id) = (Uuid::new_v4(), Uuid::new_v4());

        let issued = tokens.issue(user_id, org_id).unwrap();
        let claims = tokens.verify(&issued.token).unwrap();

        assert_eq!(claims.user_id, user_id);
        assert_eq!(claims.organization_id, org_id);
        assert_eq!(claims.exp - claims.iat, 5 * 3600);
    }

    #[test]
    fn expired_after_window() {
        let tokens = service();
        let issued_at = Utc::now() - Duration::hours(5) - Duration::seconds(1);

        let issued = tokens.issue_at(Uuid::new_v4(), Uuid::new_v4(), issued_at).unwrap();

        assert_eq!(tokens.verify(&issued.token).unwrap_err(), AuthError::Expired);
    }

    #[test]
    fn still_valid_just_inside_window() {
        let tokens = service();
        let issued_at = Utc::now() - Duration::hours(5) + Duration::minutes(1);

        let issued = tokens.issue_at(Uuid::new_v4(), Uuid::new_v4(), issued_at).unwrap();

        assert!(tokens.verify(&issued.token).is_ok());
    }

    #[test]
    fn other_secret_is_invalid() {
        let other = TokenService::new("a-completely-different-secret-value", Duration::hours(5)).unwrap();
        let issued = other.issue(Uuid::new_v4(), Uuid::new_v4()).unwrap();

        assert_eq!(service().verify(&issued.token).unwrap_err(), AuthError::Invalid);
    }

    #[test]
    fn other_algorithm_is_invalid() {
        let now = Utc::now();
        let claims = Claims {
            user_id: Uuid::new_v4(),
            organization_id: Uuid::new_v4(),
            iat: now.timestamp(),
            exp: (now + Duration::hours(1)).timestamp(),
        };
        let token = encode(
            &Header::new(Algorithm::HS512),
            &claims,
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap();

        assert_eq!(service().verify(&token).unwrap_err(), AuthError::Invalid);
    }

    #[test]
    fn garbage_is_invalid() {
        assert_eq!(service().verify("not.a.token").unwrap_err(), AuthError::Invalid);
        assert_eq!(service().verify("").unwrap_err(), AuthError::Invalid);
    }

    #[test]
    fn empty_secret_rejected() {
        assert!(matches!(
            TokenService::new("", Duration::hours(1)),
            Err(JwtError::InvalidSecret)
        ));
    }
}
