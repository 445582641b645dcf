//! 订单上传与查询

use axum::{
    Extension, Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::Utc;
use loyalty_core::LoyaltyError;
use tracing::instrument;

use crate::auth::Claims;
use crate::dto::{ApiResponse, OrderDto};
use crate::error::{ApiError, Result};
use crate::state::AppState;

/// 上传订单号
///
/// POST /api/user/orders，请求体为纯文本订单号。
/// 新受理返回 202，本人重复上传返回 200
#[instrument(skip(state, claims, body), fields(user_id = %claims.sub))]
pub async fn upload_order(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    body: String,
) -> Result<Response> {
    let user_id = claims.user_id()?;
    // 请求体原样校验，首尾空白同样视为无效订单号
    if body.is_empty() {
        return Err(ApiError::Validation("订单号不能为空".to_string()));
    }

    match state
        .ledger
        .admit(user_id, &body, Utc::now(), state.deadline())
        .await
    {
        Ok(order) => Ok((
            StatusCode::ACCEPTED,
            Json(ApiResponse::success_with_message(
                OrderDto::from(order),
                "订单已受理",
            )),
        )
            .into_response()),
        Err(LoyaltyError::AlreadyExists { number }) => Ok((
            StatusCode::OK,
            Json(ApiResponse::success_with_message(number, "订单已上传")),
        )
            .into_response()),
        Err(e) => Err(e.into()),
    }
}

/// 订单列表
///
/// GET /api/user/orders，最新上传的在前；没有订单时返回 204
pub async fn list_orders(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Response> {
    let user_id = claims.user_id()?;
    let orders = state.ledger.list_by_user(user_id).await?;

    if orders.is_empty() {
        return Ok(StatusCode::NO_CONTENT.into_response());
    }

    let items: Vec<OrderDto> = orders.into_iter().map(OrderDto::from).collect();
    Ok(Json(ApiResponse::success(items)).into_response())
}
