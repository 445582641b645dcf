//! 积分回报入口访问控制
//!
//! 积分计算系统通过 `X-Accrual-Token` 头携带预先配置的令牌

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::warn;

use crate::error::ApiError;
use crate::state::AppState;

pub const ACCRUAL_TOKEN_HEADER: &str = "x-accrual-token";

/// 积分回报令牌校验中间件
pub async fn accrual_token_middleware(
    State(state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let Some(expected) = state.accrual_token.as_deref() else {
        return ApiError::Forbidden("积分回报入口未启用".to_string()).into_response();
    };

    let provided = request
        .headers()
        .get(ACCRUAL_TOKEN_HEADER)
        .and_then(|h| h.to_str().ok());

    if provided != Some(expected) {
        warn!(uri = %request.uri(), "积分回报令牌校验失败");
        return ApiError::Unauthorized("积分回报令牌无效".to_string()).into_response();
    }

    next.run(request).await
}
