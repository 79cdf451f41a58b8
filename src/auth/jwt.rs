//! JWT token management
//!
//! Issues and verifies the signed, time-limited identity tokens handed out
//! at signin/signup. Tokens are never stored server-side.

use chrono::Utc;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// JWT claims
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: i32,
    /// Display name at issuance
    pub name: String,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("token signing secret is empty")]
    MissingSecret,

    #[error("failed to sign token: {0}")]
    Encoding(String),

    #[error("token signature does not match")]
    BadSignature,

    #[error("token could not be decoded")]
    Malformed,

    #[error("token expired")]
    Expired,
}

/// Signs and verifies identity tokens with a secret injected at startup.
#[derive(Clone)]
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl_secs: i64,
}

impl TokenService {
    pub fn new(secret: &str, ttl_secs: i64) -> Result<Self, TokenError> {
        if secret.is_empty() {
            return Err(TokenError::MissingSecret);
        }

        // Expiry is checked by `verify_at` so the clock can be injected.
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp"]);

        Ok(Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            ttl_secs,
        })
    }

    pub fn ttl_secs(&self) -> i64 {
        self.ttl_secs
    }

    /// Issue a token for a user, valid from now for the configured lifetime
    pub fn issue(&self, user_id: i32, name: &str) -> Result<String, TokenError> {
        self.issue_at(user_id, name, Utc::now().timestamp())
    }

    pub fn issue_at(&self, user_id: i32, name: &str, now: i64) -> Result<String, TokenError> {
        let exp = now
            .checked_add(self.ttl_secs)
            .ok_or_else(|| TokenError::Encoding("token lifetime overflows expiry".to_string()))?;

        let claims = Claims {
            sub: user_id,
            name: name.to_string(),
            iat: now,
            exp,
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| TokenError::Encoding(e.to_string()))
    }

    /// Decode and validate a token against the current time
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        self.verify_at(token, Utc::now().timestamp())
    }

    /// Decode and validate a token against an explicit clock reading.
    ///
    /// A token is expired from the second `exp` is reached onwards.
    pub fn verify_at(&self, token: &str, now: i64) -> Result<Claims, TokenError> {
        let data = decode::<Claims>(token, &self.decoding, &self.validation).map_err(|e| {
            match e.kind() {
                ErrorKind::InvalidSignature => TokenError::BadSignature,
                ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Malformed,
            }
        })?;

        if now >= data.claims.exp {
            return Err(TokenError::Expired);
        }

        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const HOUR: i64 = 3600;
    const NOW: i64 = 1_700_000_000;

    fn service() -> TokenService {
        TokenService::new("test-secret", HOUR).unwrap()
    }

    #[test]
    fn empty_secret_is_rejected() {
        assert_eq!(
            TokenService::new("", HOUR).err(),
            Some(TokenError::MissingSecret)
        );
    }

    #[test]
    fn issued_token_verifies_to_same_subject() {
        let tokens = service();
        let token = tokens.issue_at(7, "Laith", NOW).unwrap();

        let claims = tokens.verify_at(&token, NOW).unwrap();
        assert_eq!(
            claims,
            Claims {
                sub: 7,
                name: "Laith".to_string(),
                iat: NOW,
                exp: NOW + HOUR,
            }
        );
    }

    #[test]
    fn fresh_token_verifies_against_wall_clock() {
        let tokens = service();
        let token = tokens.issue(7, "Laith").unwrap();
        assert_eq!(tokens.verify(&token).unwrap().sub, 7);
    }

    #[test]
    fn verification_is_repeatable() {
        let tokens = service();
        let token = tokens.issue_at(42, "Ana", NOW).unwrap();

        let first = tokens.verify_at(&token, NOW + 10).unwrap();
        let second = tokens.verify_at(&token, NOW + 10).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn token_expires_at_exp() {
        let tokens = service();
        let token = tokens.issue_at(7, "Laith", NOW).unwrap();

        assert!(tokens.verify_at(&token, NOW + HOUR - 1).is_ok());
        assert_eq!(
            tokens.verify_at(&token, NOW + HOUR),
            Err(TokenError::Expired)
        );
        assert_eq!(
            tokens.verify_at(&token, NOW + HOUR + 86_400),
            Err(TokenError::Expired)
        );
    }

    #[test]
    fn token_from_other_secret_is_rejected() {
        let forged = TokenService::new("attacker-secret", HOUR)
            .unwrap()
            .issue_at(1, "Admin", NOW)
            .unwrap();

        assert_eq!(
            service().verify_at(&forged, NOW),
            Err(TokenError::BadSignature)
        );
    }

    #[test]
    fn any_payload_mutation_is_detected() {
        let tokens = service();
        let token = tokens.issue_at(7, "Laith", NOW).unwrap();

        let parts: Vec<&str> = token.split('.').collect();
        assert_eq!(parts.len(), 3);
        let payload = parts[1];

        // Skip the final character: its trailing bits may be padding.
        for i in 0..payload.len() - 1 {
            let mut chars: Vec<char> = payload.chars().collect();
            chars[i] = if chars[i] == 'A' { 'B' } else { 'A' };
            let mutated: String = chars.into_iter().collect();
            let tampered = format!("{}.{}.{}", parts[0], mutated, parts[2]);

            assert!(
                tokens.verify_at(&tampered, NOW).is_err(),
                "mutation at {} was accepted",
                i
            );
        }
    }

    #[test]
    fn overflowing_lifetime_is_an_error() {
        let tokens = TokenService::new("test-secret", i64::MAX).unwrap();
        assert!(matches!(
            tokens.issue_at(1, "x", NOW),
            Err(TokenError::Encoding(_))
        ));
        assert!(matches!(tokens.issue(1, "x"), Err(TokenError::Encoding(_))));
    }

    #[test]
    fn garbage_is_malformed() {
        let tokens = service();
        assert_eq!(tokens.verify_at("", NOW), Err(TokenError::Malformed));
        assert_eq!(
            tokens.verify_at("not.a.token", NOW),
            Err(TokenError::Malformed)
        );
    }
}
