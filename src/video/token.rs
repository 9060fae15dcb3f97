use chrono::Utc;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};

use super::VideoError;
use crate::config::VideoConfig;

/// Content type marking a Twilio access token
const TOKEN_CONTENT_TYPE: &str = "twilio-fpa;v=1";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomGrant {
    pub room: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Grants {
    pub identity: String,
    pub video: RoomGrant,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoGrantClaims {
    pub jti: String,
    /// API key sid
    pub iss: String,
    /// Account sid
    pub sub: String,
    pub iat: i64,
    pub exp: i64,
    pub grants: Grants,
}

/// Signs an access token granting `identity` entry to `room`
pub fn mint_access_token(config: &VideoConfig, identity: &str, room: &str) -> Result<(String, i64), VideoError> {
    if config.api_key_sid.is_empty() || config.api_key_secret.is_empty() {
        return Err(VideoError::NotConfigured);
    }

    let now = Utc::now().timestamp();
    let exp = now + config.token_ttl_secs as i64;
    let claims = VideoGrantClaims {
        jti: format!("{}-{}", config.api_key_sid, now),
        iss: config.api_key_sid.clone(),
        sub: config.account_sid.clone(),
        iat: now,
        exp,
        grants: Grants {
            identity: identity.to_string(),
            video: RoomGrant { room: room.to_string() },
        },
    };

    let mut header = Header::new(Algorithm::HS256);
    header.cty = Some(TOKEN_CONTENT_TYPE.to_string());

    let token = encode(&header, &claims, &EncodingKey::from_secret(config.api_key_secret.as_bytes()))?;
    Ok((token, exp))
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{decode, decode_header, DecodingKey, Validation};

    fn config() -> VideoConfig {
        VideoConfig {
            account_sid: "AC123".into(),
            api_key_sid: "SK456".into(),
            api_key_secret: "video-secret".into(),
            api_base_url: "https://video.twilio.com".into(),
            token_ttl_secs: 3600,
        }
    }

    #[test]
    fn token_carries_identity_room_and_ttl() {
        let (token, exp) = mint_access_token(&config(), "practitioner-42", "session-7").unwrap();

        let header = decode_header(&token).unwrap();
        assert_eq!(header.cty.as_deref(), Some("twilio-fpa;v=1"));

        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        let claims = decode::<VideoGrantClaims>(&token, &DecodingKey::from_secret(b"video-secret"), &validation)
            .unwrap()
            .claims;

        assert_eq!(claims.grants.identity, "practitioner-42");
        assert_eq!(claims.grants.video.room, "session-7");
        assert_eq!(claims.exp - claims.iat, 3600);
        assert_eq!(claims.exp, exp);
        assert_eq!(claims.iss, "SK456");
        assert_eq!(claims.sub, "AC123");
    }

    #[test]
    fn missing_credentials_are_reported() {
        let mut cfg = config();
        cfg.api_key_secret.clear();
        assert!(matches!(mint_access_token(&cfg, "a", "b"), Err(VideoError::NotConfigured)));
    }
}
