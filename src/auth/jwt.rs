//! 访问令牌校验
//! 令牌由单点登录服务签发，本服务与其共享 HS256 密钥；签发方法只给桥接脚本和测试用

use crate::{config::AppConfig, error::AppError, models::User};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 时钟偏差容忍（秒）
const LEEWAY_SECS: u64 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

/// 令牌载荷
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TokenClaims {
    /// 用户 ID
    pub sub: String,
    pub email: String,
    pub token_type: TokenKind,
    pub iat: i64,
    pub exp: i64,
    pub jti: String,
}

impl TokenClaims {
    pub fn user_id(&self) -> Result<Uuid, AppError> {
        Uuid::parse_str(&self.sub).map_err(|_| AppError::Unauthorized)
    }
}

pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    access_ttl: Duration,
}

impl JwtService {
    pub fn from_config(config: &AppConfig) -> Result<Self, AppError> {
        let secret = config.security.jwt_secret.expose_secret();
        if secret.len() < 32 {
            return Err(AppError::Config("JWT secret too short (min 32 chars)".to_string()));
        }

        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = LEEWAY_SECS;

        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            access_ttl: Duration::seconds(config.security.access_token_exp_secs as i64),
        })
    }

    pub fn issue_access_token(&self, user: &User) -> Result<String, AppError> {
        let now = Utc::now();
        let claims = TokenClaims {
            sub: user.id.to_string(),
            email: user.email.clone(),
            token_type: TokenKind::Access,
            iat: now.timestamp(),
            exp: (now + self.access_ttl).timestamp(),
            jti: Uuid::new_v4().to_string(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AppError::Internal(format!("Failed to encode access token: {}", e)))
    }

    /// 只接受访问令牌；刷新令牌由单点登录服务自己消费
    pub fn validate_access_token(&self, token: &str) -> Result<TokenClaims, AppError> {
        let claims = decode::<TokenClaims>(token, &self.decoding_key, &self.validation)
            .map_err(|e| {
                tracing::debug!(error = ?e.kind(), "Token rejected");
                AppError::Unauthorized
            })?
            .claims;

        if claims.token_type != TokenKind::Access {
            tracing::debug!(kind = ?claims.token_type, "Non-access token presented");
            return Err(AppError::Unauthorized);
        }

        Ok(claims)
    }
}
