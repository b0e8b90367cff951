use chrono::{DateTime, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use std::sync::Arc;
use uuid::Uuid;

use crate::core::clock::Clock;
use crate::core::config::AuthConfig;
use crate::core::error::{AppError, Result};
use crate::features::accounts::models::AccountRole;
use crate::features::auth::model::TokenClaims;

/// Token issued at login
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub access_token: String,
    pub expires_at: DateTime<Utc>,
    pub expires_in: i64,
}

/// Signs and verifies HS256 access tokens.
///
/// Expiry is checked against the injected clock rather than the library's
/// wall-clock check.
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    issuer: String,
    ttl: chrono::Duration,
    leeway_secs: i64,
    clock: Arc<dyn Clock>,
}

impl TokenService {
    pub fn new(config: &AuthConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(config.jwt_secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            issuer: config.issuer.clone(),
            ttl: chrono::Duration::seconds(config.token_ttl.as_secs() as i64),
            leeway_secs: config.jwt_leeway.as_secs() as i64,
            clock,
        }
    }

    /// Lifetime of issued tokens
    pub fn ttl(&self) -> chrono::Duration {
        self.ttl
    }

    /// Sign a token bound to `session_id`
    pub fn issue(
        &self,
        account_id: Uuid,
        role: AccountRole,
        session_id: Uuid,
        issued_at: DateTime<Utc>,
    ) -> Result<IssuedToken> {
        let expires_at = issued_at + self.ttl;
        let claims = TokenClaims {
            sub: account_id.to_string(),
            jti: session_id.to_string(),
            iss: self.issuer.clone(),
            iat: issued_at.timestamp(),
            exp: expires_at.timestamp(),
            role,
        };

        let access_token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AppError::Internal(format!("Failed to sign access token: {}", e)))?;

        Ok(IssuedToken {
            access_token,
            expires_at,
            expires_in: self.ttl.num_seconds(),
        })
    }

    /// Verify signature, issuer and expiry; returns the claims
    pub fn verify(&self, token: &str) -> Result<TokenClaims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[&self.issuer]);
        validation.validate_exp = false;
        validation.validate_aud = false;

        let claims = decode::<TokenClaims>(token, &self.decoding_key, &validation)
            .map_err(|e| AppError::Auth(format!("Invalid token: {}", e)))?
            .claims;

        if claims.exp + self.leeway_secs < self.clock.now().timestamp() {
            return Err(AppError::Auth("Token has expired".to_string()));
        }

        Ok(claims)
    }

    /// Session id and account id carried by verified claims
    pub fn subject_ids(claims: &TokenClaims) -> Result<(Uuid, Uuid)> {
        let account_id = Uuid::parse_str(&claims.sub)
            .map_err(|_| AppError::Auth("Malformed token subject".to_string()))?;
        let session_id = Uuid::parse_str(&claims.jti)
            .map_err(|_| AppError::Auth("Malformed token id".to_string()))?;
        Ok((account_id, session_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::clock::FixedClock;
    use chrono::TimeZone;
    use std::time::Duration;

    fn config(secret: &str) -> AuthConfig {
        AuthConfig {
            jwt_secret: secret.to_string(),
            issuer: "incident-desk-test".to_string(),
            token_ttl: Duration::from_secs(3600),
            jwt_leeway: Duration::from_secs(30),
        }
    }

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 8, 0, 0).unwrap()
    }

    #[test]
    fn test_issued_token_verifies_and_carries_ids() {
        let clock = FixedClock::new(start());
        let service = TokenService::new(&config("a-very-long-test-secret-0123456789"), Arc::new(clock));
        let account_id = Uuid::now_v7();
        let session_id = Uuid::now_v7();

        let issued = service
            .issue(account_id, AccountRole::Worker, session_id, start())
            .unwrap();
        assert_eq!(issued.expires_in, 3600);
        assert_eq!(issued.expires_at, start() + chrono::Duration::hours(1));

        let claims = service.verify(&issued.access_token).unwrap();
        assert_eq!(
            TokenService::subject_ids(&claims).unwrap(),
            (account_id, session_id)
        );
        assert_eq!(claims.role, AccountRole::Worker);
    }

    #[test]
    fn test_expired_token_rejected_past_leeway() {
        let clock = FixedClock::new(start());
        let service = TokenService::new(
            &config("a-very-long-test-secret-0123456789"),
            Arc::new(clock.clone()),
        );
        let issued = service
            .issue(Uuid::now_v7(), AccountRole::Administrator, Uuid::now_v7(), start())
            .unwrap();

        // Inside the leeway window the token is still accepted
        clock.advance(chrono::Duration::seconds(3600 + 20));
        assert!(service.verify(&issued.access_token).is_ok());

        clock.advance(chrono::Duration::seconds(20));
        assert!(matches!(
            service.verify(&issued.access_token),
            Err(AppError::Auth(_))
        ));
    }

    #[test]
    fn test_token_signed_with_other_secret_rejected() {
        let clock: Arc<dyn Clock> = Arc::new(FixedClock::new(start()));
        let issuer = TokenService::new(&config("first-secret-first-secret-first-secret"), clock.clone());
        let verifier = TokenService::new(&config("second-secret-second-secret-second"), clock);

        let issued = issuer
            .issue(Uuid::now_v7(), AccountRole::Worker, Uuid::now_v7(), start())
            .unwrap();
        assert!(matches!(
            verifier.verify(&issued.access_token),
            Err(AppError::Auth(_))
        ));
        assert!(verifier.verify("not-a-jwt").is_err());
    }
}
