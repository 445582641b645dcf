//! 注册与登录
//!
//! 成功时同时在 Authorization 响应头和响应体中返回 Token

use axum::{
    Json,
    extract::State,
    http::{HeaderValue, header},
    response::{IntoResponse, Response},
};
use tracing::{info, instrument};
use validator::Validate;

use crate::auth::{hash_password, verify_password};
use crate::dto::{ApiResponse, CredentialsRequest, TokenResponse};
use crate::error::{ApiError, Result};
use crate::state::AppState;

/// 注册
///
/// POST /api/user/register
#[instrument(skip(state, req), fields(login = %req.login))]
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<CredentialsRequest>,
) -> Result<Response> {
    req.validate()?;

    let password_hash = hash_password(&req.password, state.bcrypt_cost).await?;
    let user = state
        .users
        .register(&req.login, &password_hash, state.deadline())
        .await?;

    info!(user_id = user.id, "用户注册成功");
    token_response(&state, user.id, &user.login)
}

/// 登录
///
/// POST /api/user/login
#[instrument(skip(state, req), fields(login = %req.login))]
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<CredentialsRequest>,
) -> Result<Response> {
    req.validate()?;

    let user = state
        .users
        .authenticate(&req.login)
        .await?
        .ok_or(ApiError::InvalidCredentials)?;

    if !verify_password(&req.password, &user.password_hash).await? {
        return Err(ApiError::InvalidCredentials);
    }

    token_response(&state, user.id, &user.login)
}

fn token_response(state: &AppState, user_id: i64, login: &str) -> Result<Response> {
    let (token, expires_at) = state.jwt_manager.generate_token(user_id, login)?;
    let bearer = HeaderValue::from_str(&format!("Bearer {}", token))
        .map_err(|e| ApiError::Internal(format!("Token 无法写入响应头: {}", e)))?;

    let mut response =
        Json(ApiResponse::success(TokenResponse { token, expires_at })).into_response();
    response.headers_mut().insert(header::AUTHORIZATION, bearer);
    Ok(response)
}
