//! 统一错误模型
//! 定义所有错误类型和错误响应格式

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::Serialize;
use thiserror::Error;

/// 结果类型别名
pub type Result<T> = std::result::Result<T, AppError>;

/// 单点登录入口，未认证时返回给客户端
pub const LOGIN_PATH: &str = "/auth/login";

/// 机器可读的错误键
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ErrorKey {
    ErrorNotAuthenticated,
    ErrorNotAuthorized,
    ErrorNotFound,
    ErrorInvalidTransition,
    ErrorMalformedResourceId,
    ErrorValidation,
    ErrorConflict,
    ErrorDatabase,
    ErrorConfig,
    ErrorInternal,
}

impl ErrorKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKey::ErrorNotAuthenticated => "ErrorNotAuthenticated",
            ErrorKey::ErrorNotAuthorized => "ErrorNotAuthorized",
            ErrorKey::ErrorNotFound => "ErrorNotFound",
            ErrorKey::ErrorInvalidTransition => "ErrorInvalidTransition",
            ErrorKey::ErrorMalformedResourceId => "ErrorMalformedResourceId",
            ErrorKey::ErrorValidation => "ErrorValidation",
            ErrorKey::ErrorConflict => "ErrorConflict",
            ErrorKey::ErrorDatabase => "ErrorDatabase",
            ErrorKey::ErrorConfig => "ErrorConfig",
            ErrorKey::ErrorInternal => "ErrorInternal",
        }
    }
}

/// 应用错误类型
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Authentication failed")]
    Unauthorized,

    /// 权限不足或资源不存在，对调用方不做区分
    #[error("Not authorized: {0}")]
    NotAuthorized(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Invalid {entity} status transition: {from} -> {to}")]
    InvalidTransition {
        entity: &'static str,
        from: String,
        to: String,
    },

    #[error("Malformed resource id: {0}")]
    MalformedResourceId(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl AppError {
    /// 获取 HTTP 状态码
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::NotAuthorized(_) | AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::InvalidTransition { .. }
            | AppError::MalformedResourceId(_)
            | AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Database(_) | AppError::Config(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// 获取错误键
    pub fn key(&self) -> ErrorKey {
        match self {
            AppError::Unauthorized => ErrorKey::ErrorNotAuthenticated,
            AppError::NotAuthorized(_) => ErrorKey::ErrorNotAuthorized,
            AppError::NotFound(_) => ErrorKey::ErrorNotFound,
            AppError::InvalidTransition { .. } => ErrorKey::ErrorInvalidTransition,
            AppError::MalformedResourceId(_) => ErrorKey::ErrorMalformedResourceId,
            AppError::Validation(_) => ErrorKey::ErrorValidation,
            AppError::Conflict(_) => ErrorKey::ErrorConflict,
            AppError::Database(_) => ErrorKey::ErrorDatabase,
            AppError::Config(_) => ErrorKey::ErrorConfig,
            AppError::Internal(_) => ErrorKey::ErrorInternal,
        }
    }

    /// 获取用户友好的错误消息（不包含敏感信息）
    pub fn user_message(&self) -> String {
        match self {
            AppError::Unauthorized => "Authentication failed".to_string(),
            // 不暴露资源是否存在
            AppError::NotAuthorized(_) | AppError::NotFound(_) => "Resource not found".to_string(),
            AppError::InvalidTransition { entity, from, to } => {
                format!("Invalid {} status transition: {} -> {}", entity, from, to)
            }
            AppError::MalformedResourceId(segment) => {
                format!("Malformed resource id: {}", segment)
            }
            AppError::Validation(msg) => msg.clone(),
            AppError::Conflict(msg) => msg.clone(),
            AppError::Database(_) => "Database error occurred".to_string(),
            AppError::Config(_) => "Configuration error".to_string(),
            AppError::Internal(_) => "Internal server error".to_string(),
        }
    }

    /// 需要客户端跳转时的目标地址
    pub fn redirect_url(&self) -> Option<String> {
        match self {
            AppError::Unauthorized => Some(LOGIN_PATH.to_string()),
            _ => None,
        }
    }

    /// 获取错误码
    pub fn code(&self) -> u16 {
        self.status_code().as_u16()
    }

    // 便捷方法
    pub fn not_authorized(msg: &str) -> Self {
        AppError::NotAuthorized(msg.to_string())
    }

    pub fn not_found(msg: &str) -> Self {
        AppError::NotFound(msg.to_string())
    }

    pub fn validation(msg: &str) -> Self {
        AppError::Validation(msg.to_string())
    }

    pub fn conflict(msg: &str) -> Self {
        AppError::Conflict(msg.to_string())
    }

    pub fn internal_error(msg: &str) -> Self {
        AppError::Internal(msg.to_string())
    }

    pub fn invalid_transition(
        entity: &'static str,
        from: impl std::fmt::Display,
        to: impl std::fmt::Display,
    ) -> Self {
        AppError::InvalidTransition {
            entity,
            from: from.to_string(),
            to: to.to_string(),
        }
    }
}

/// 错误响应 DTO
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Serialize)]
pub struct ErrorDetail {
    pub code: u16,
    pub key: ErrorKey,
    pub message: String,
    pub request_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect_url: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let request_id = uuid::Uuid::new_v4().to_string();

        let error_response = ErrorResponse {
            error: ErrorDetail {
                code: self.code(),
                key: self.key(),
                message: self.user_message(),
                request_id,
                redirect_url: self.redirect_url(),
            },
        };

        // 服务端错误记录完整信息，客户端错误仅记录摘要
        if status.is_server_error() {
            tracing::error!(
                code = self.code(),
                key = self.key().as_str(),
                message = %self,
                request_id = %error_response.error.request_id,
                "Application error"
            );
        } else {
            tracing::debug!(
                code = self.code(),
                key = self.key().as_str(),
                message = %self,
                request_id = %error_response.error.request_id,
                "Request rejected"
            );
        }

        (status, Json(error_response)).into_response()
    }
}

/// 从 config::ConfigError 转换
impl From<config::ConfigError> for AppError {
    fn from(e: config::ConfigError) -> Self {
        AppError::Config(e.to_string())
    }
}

/// 从 validator::ValidationErrors 转换
impl From<validator::ValidationErrors> for AppError {
    fn from(e: validator::ValidationErrors) -> Self {
        AppError::Validation(e.to_string())
    }
}
