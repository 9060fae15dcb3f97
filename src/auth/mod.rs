pub mod password;

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::database::models::TenantUser;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User id
    pub sub: Uuid,
    pub tenant_id: Uuid,
    pub email: String,
    pub role: String,
    /// Platform operator access to the tenant registry
    #[serde(default)]
    pub root: bool,
    pub exp: i64,
    pub iat: i64,
}

impl Claims {
    pub fn new(user: &TenantUser, root: bool, expiry_hours: u64) -> Self {
        let now = Utc::now();
        let exp = (now + Duration::hours(expiry_hours as i64)).timestamp();

        Self {
            sub: user.user_id,
            tenant_id: user.tenant_id,
            email: user.email.clone(),
            role: user.role.clone(),
            root,
            exp,
            iat: now.timestamp(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum JwtError {
    #[error("JWT generation error: {0}")]
    TokenGeneration(String),

    #[error("Invalid JWT token: {0}")]
    InvalidToken(String),

    #[error("Invalid JWT secret")]
    InvalidSecret,
}

pub fn generate_jwt(claims: &Claims, secret: &str) -> Result<String, JwtError> {
    if secret.is_empty() {
        return Err(JwtError::InvalidSecret);
    }

    let encoding_key = EncodingKey::from_secret(secret.as_bytes());
    encode(&Header::default(), claims, &encoding_key).map_err(|e| JwtError::TokenGeneration(e.to_string()))
}

pub fn validate_jwt(token: &str, secret: &str) -> Result<Claims, JwtError> {
    if secret.is_empty() {
        return Err(JwtError::InvalidSecret);
    }

    let decoding_key = DecodingKey::from_secret(secret.as_bytes());
    decode::<Claims>(token, &decoding_key, &Validation::default())
        .map(|data| data.claims)
        .map_err(|e| JwtError::InvalidToken(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user() -> TenantUser {
        TenantUser {
            user_id: Uuid::new_v4(),
            email: "owner@clinic.test".to_string(),
            first_name: "Olive".to_string(),
            last_name: "Owner".to_string(),
            role: "owner".to_string(),
            tenant_id: Uuid::new_v4(),
            has_password: true,
        }
    }

    #[test]
    fn token_round_trips_claims() {
        let user = user();
        let token = generate_jwt(&Claims::new(&user, false, 1), "secret").unwrap();
        let claims = validate_jwt(&token, "secret").unwrap();

        assert_eq!(claims.sub, user.user_id);
        assert_eq!(claims.tenant_id, user.tenant_id);
        assert_eq!(claims.role, "owner");
        assert!(!claims.root);
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let token = generate_jwt(&Claims::new(&user(), false, 1), "secret").unwrap();
        assert!(matches!(validate_jwt(&token, "other"), Err(JwtError::InvalidToken(_))));
    }

    #[test]
    fn empty_secret_is_refused() {
        assert!(matches!(
            generate_jwt(&Claims::new(&user(), false, 1), ""),
            Err(JwtError::InvalidSecret)
        ));
    }
}
