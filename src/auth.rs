//! 인증
//!
//! 로그인 자체는 외부 인증 제공자가 담당한다. 이 서비스는 제공자가 발급한
//! HS256 Bearer 토큰만 검증하고, `sub`를 소유자 id로 사용한다.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::error::TransdocError;
use crate::state::AppState;

/// 토큰 기본 수명 (분)
const DEFAULT_TOKEN_TTL_MINS: i64 = 60;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// 소유자 id
    pub sub: String,
    pub exp: i64,
    pub iat: i64,
}

#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub secret: String,
    pub token_ttl_mins: i64,
}

impl AuthConfig {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            token_ttl_mins: DEFAULT_TOKEN_TTL_MINS,
        }
    }
}

/// 토큰 발급 (운영 도구/테스트용)
pub fn issue_token(user_id: &str, config: &AuthConfig) -> Result<String, jsonwebtoken::errors::Error> {
    let now = chrono::Utc::now().timestamp();
    let claims = Claims {
        sub: user_id.to_string(),
        exp: now + config.token_ttl_mins * 60,
        iat: now,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.secret.as_bytes()),
    )
}

pub fn validate_token(token: &str, config: &AuthConfig) -> Result<Claims, jsonwebtoken::errors::Error> {
    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.secret.as_bytes()),
        &Validation::default(),
    )?;
    Ok(data.claims)
}

/// `Authorization: Bearer <token>`에서 추출한 호출자
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: String,
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = TransdocError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .ok_or(TransdocError::NotAuthenticated)?;

        let claims = validate_token(token.trim(), &state.config.auth).map_err(|e| {
            tracing::debug!(error = %e, "rejected bearer token");
            TransdocError::NotAuthenticated
        })?;

        if claims.sub.trim().is_empty() {
            return Err(TransdocError::NotAuthenticated);
        }

        Ok(AuthUser { user_id: claims.sub })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issued_token_round_trips_subject() {
        let config = AuthConfig::new("test-secret");
        let token = issue_token("alice", &config).unwrap();
        let claims = validate_token(&token, &config).unwrap();
        assert_eq!(claims.sub, "alice");
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let token = issue_token("alice", &AuthConfig::new("one")).unwrap();
        assert!(validate_token(&token, &AuthConfig::new("two")).is_err());
    }

    #[test]
    fn expired_token_is_rejected() {
        let config = AuthConfig {
            secret: "test-secret".into(),
            token_ttl_mins: -10,
        };
        let token = issue_token("alice", &config).unwrap();
        assert!(validate_token(&token, &config).is_err());
    }
}
