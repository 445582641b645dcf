//! HTTP 接口错误类型定义

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use loyalty_core::LoyaltyError;
use serde_json::json;

/// HTTP 接口错误类型
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    // 认证错误
    #[error("未授权: {0}")]
    Unauthorized(String),
    #[error("禁止访问: {0}")]
    Forbidden(String),
    #[error("登录名或密码错误")]
    InvalidCredentials,
    #[error("登录名已被占用: {0}")]
    LoginTaken(String),

    // 验证错误
    #[error("参数验证失败: {0}")]
    Validation(String),
    #[error("订单号格式无效: {0}")]
    InvalidOrderNumber(String),

    // 业务错误
    #[error("订单已被其他用户上传: {0}")]
    OrderConflict(String),
    #[error("积分余额不足")]
    InsufficientFunds,
    #[error("订单状态不允许此变更: {0}")]
    InvalidTransition(String),
    #[error("资源不存在: {0}")]
    NotFound(String),

    // 系统错误
    #[error("请求处理超时")]
    Timeout,
    #[error("数据库错误: {0}")]
    Database(#[from] sqlx::Error),
    #[error("内部错误: {0}")]
    Internal(String),
}

impl ApiError {
    /// 返回对应的 HTTP 状态码
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Unauthorized(_) | Self::InvalidCredentials => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::LoginTaken(_) | Self::OrderConflict(_) | Self::InvalidTransition(_) => {
                StatusCode::CONFLICT
            }
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::InvalidOrderNumber(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::InsufficientFunds => StatusCode::PAYMENT_REQUIRED,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Timeout => StatusCode::SERVICE_UNAVAILABLE,
            Self::Database(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// 返回错误码（用于 API 响应）
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Unauthorized(_) => "UNAUTHORIZED",
            Self::Forbidden(_) => "FORBIDDEN",
            Self::InvalidCredentials => "INVALID_CREDENTIALS",
            Self::LoginTaken(_) => "LOGIN_TAKEN",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::InvalidOrderNumber(_) => "INVALID_ORDER_NUMBER",
            Self::OrderConflict(_) => "ORDER_CONFLICT",
            Self::InsufficientFunds => "INSUFFICIENT_FUNDS",
            Self::InvalidTransition(_) => "INVALID_ORDER_TRANSITION",
            Self::NotFound(_) => "NOT_FOUND",
            Self::Timeout => "TIMEOUT",
            Self::Database(_) => "DATABASE_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        // 系统级错误只返回通用提示，详细信息仅记录日志
        let message = match &self {
            Self::Database(e) => {
                tracing::error!(error = %e, "数据库操作失败");
                "服务内部错误，请稍后重试".to_string()
            }
            Self::Internal(e) => {
                tracing::error!(error = %e, "内部错误");
                "服务内部错误，请稍后重试".to_string()
            }
            other => other.to_string(),
        };

        let body = json!({
            "success": false,
            "code": self.error_code(),
            "message": message,
            "data": serde_json::Value::Null
        });

        (status, axum::Json(body)).into_response()
    }
}

/// 从 validator 错误转换
impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        Self::Validation(errors.to_string())
    }
}

/// 从积分核心的错误转换
impl From<LoyaltyError> for ApiError {
    fn from(err: LoyaltyError) -> Self {
        match err {
            LoyaltyError::InvalidIdentifier(number) => Self::InvalidOrderNumber(number),
            LoyaltyError::Conflict { number } | LoyaltyError::AlreadyExists { number } => {
                Self::OrderConflict(number)
            }
            LoyaltyError::OrderNotFound(number) => Self::NotFound(format!("订单 {}", number)),
            LoyaltyError::UserNotFound(id) => Self::NotFound(format!("用户 {}", id)),
            LoyaltyError::InsufficientFunds { .. } => Self::InsufficientFunds,
            LoyaltyError::LoginTaken(login) => Self::LoginTaken(login),
            LoyaltyError::Validation(msg) => Self::Validation(msg),
            e @ LoyaltyError::InvalidTransition { .. } => Self::InvalidTransition(e.to_string()),
            LoyaltyError::DeadlineExceeded => Self::Timeout,
            LoyaltyError::Database(e) => Self::Database(e),
            LoyaltyError::Internal(msg) => Self::Internal(msg),
        }
    }
}

/// HTTP 接口 Result 类型别名
pub type Result<T> = std::result::Result<T, ApiError>;
