//! 余额、提现与提现流水

use axum::{
    Extension, Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use tracing::instrument;
use validator::Validate;

use crate::auth::Claims;
use crate::dto::{ApiResponse, BalanceDto, WithdrawRequest, WithdrawalDto};
use crate::error::Result;
use crate::state::AppState;

/// 当前余额
///
/// GET /api/user/balance
pub async fn get_balance(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<ApiResponse<BalanceDto>>> {
    let balance = state.account.get(claims.user_id()?).await?;
    Ok(Json(ApiResponse::success(balance.into())))
}

/// 使用积分抵扣订单
///
/// POST /api/user/balance/withdraw
#[instrument(skip(state, claims, req), fields(user_id = %claims.sub, sum = req.sum))]
pub async fn withdraw(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<WithdrawRequest>,
) -> Result<Json<ApiResponse<WithdrawalDto>>> {
    let user_id = claims.user_id()?;
    req.validate()?;

    let withdrawal = state
        .payments
        .spend(&req.order, user_id, req.sum, state.deadline())
        .await?;

    Ok(Json(ApiResponse::success_with_message(
        withdrawal.into(),
        "提现成功",
    )))
}

/// 提现流水
///
/// GET /api/user/withdrawals，最新的在前；没有流水时返回 204
pub async fn list_withdrawals(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Response> {
    let withdrawals = state.payments.list_withdrawals(claims.user_id()?).await?;

    if withdrawals.is_empty() {
        return Ok(StatusCode::NO_CONTENT.into_response());
    }

    let items: Vec<WithdrawalDto> = withdrawals.into_iter().map(WithdrawalDto::from).collect();
    Ok(Json(ApiResponse::success(items)).into_response())
}
