//! 积分回报入口
//!
//! 积分计算系统拉取待处理订单，并回报每个订单的处理结果

use std::str::FromStr;

use axum::{
    Json,
    extract::{Query, State},
};
use loyalty_core::{AccrualOutcome, OrderStatus};
use tracing::instrument;

use crate::dto::{AccrualReportRequest, AccrualResultDto, ApiResponse, PendingOrderDto, PendingQuery};
use crate::error::{ApiError, Result};
use crate::state::AppState;

const MAX_PENDING_LIMIT: i64 = 1000;

/// 回报订单处理结果
///
/// POST /api/internal/accrual
#[instrument(skip(state, req), fields(order_number = %req.order, status = %req.status))]
pub async fn report_accrual(
    State(state): State<AppState>,
    Json(req): Json<AccrualReportRequest>,
) -> Result<Json<ApiResponse<AccrualResultDto>>> {
    let status = OrderStatus::from_str(&req.status)
        .map_err(|_| ApiError::Validation(format!("未知的订单状态: {}", req.status)))?;

    let outcome = state
        .ledger
        .report_accrual(&req.order, status, req.accrual, state.deadline())
        .await?;

    let result = match outcome {
        AccrualOutcome::Applied { status, credited } => AccrualResultDto {
            order: req.order,
            status,
            applied: true,
            credited,
        },
        AccrualOutcome::Unchanged { status } => AccrualResultDto {
            order: req.order,
            status,
            applied: false,
            credited: 0,
        },
    };

    Ok(Json(ApiResponse::success(result)))
}

/// 待回报订单
///
/// GET /api/internal/accrual/pending?limit=N，最早上传的在前
pub async fn list_pending(
    State(state): State<AppState>,
    Query(query): Query<PendingQuery>,
) -> Result<Json<ApiResponse<Vec<PendingOrderDto>>>> {
    let limit = query.limit.clamp(1, MAX_PENDING_LIMIT);
    let orders = state.ledger.list_unsettled(limit).await?;
    Ok(Json(ApiResponse::success(
        orders.into_iter().map(PendingOrderDto::from).collect(),
    )))
}
