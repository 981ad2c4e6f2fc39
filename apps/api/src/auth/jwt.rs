use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Tokens stay valid for a week; a fresh one is issued on every login.
const TOKEN_TTL_DAYS: i64 = 7;

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("Token expired")]
    Expired,

    #[error("Invalid token")]
    Invalid,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// The user id the token was issued for.
    pub sub: Uuid,
    pub iat: i64,
    pub exp: i64,
}

/// Issues a signed bearer token for a user id.
pub fn generate_token(user_id: Uuid, secret: &str) -> anyhow::Result<String> {
    let now = Utc::now();
    let claims = Claims {
        sub: user_id,
        iat: now.timestamp(),
        exp: (now + Duration::days(TOKEN_TTL_DAYS)).timestamp(),
    };
    Ok(encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?)
}

/// Verifies a bearer token and returns its claims.
pub fn verify_token(token: &str, secret: &str) -> Result<Claims, TokenError> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|e| match e.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => TokenError::Expired,
        _ => TokenError::Invalid,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret";

    #[test]
    fn test_token_round_trip() {
        let user_id = Uuid::new_v4();
        let token = generate_token(user_id, SECRET).unwrap();
        let claims = verify_token(&token, SECRET).unwrap();
        assert_eq!(claims.sub, user_id);
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let token = generate_token(Uuid::new_v4(), SECRET).unwrap();
        assert!(matches!(
            verify_token(&token, "other-secret"),
            Err(TokenError::Invalid)
        ));
    }

    #[test]
    fn test_garbage_token_rejected() {
        assert!(verify_token("not.a.token", SECRET).is_err());
    }
}
