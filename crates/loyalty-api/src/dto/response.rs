//! 响应体定义

use chrono::{DateTime, Utc};
use loyalty_core::{Balance, Order, OrderStatus, Withdrawal};
use serde::Serialize;

/// API 统一响应
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    /// 创建成功响应
    pub fn success(data: T) -> Self {
        Self::success_with_message(data, "操作成功")
    }

    /// 创建成功响应（自定义消息）
    pub fn success_with_message(data: T, message: impl Into<String>) -> Self {
        Self {
            success: true,
            code: "SUCCESS".to_string(),
            message: message.into(),
            data: Some(data),
        }
    }
}

/// 会话 Token
#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub token: String,
    pub expires_at: i64,
}

/// 订单
#[derive(Debug, Serialize)]
pub struct OrderDto {
    pub number: String,
    pub status: OrderStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accrual: Option<i64>,
    pub uploaded_at: DateTime<Utc>,
}

impl From<Order> for OrderDto {
    fn from(order: Order) -> Self {
        Self {
            number: order.number,
            status: order.status,
            accrual: order.accrual,
            uploaded_at: order.uploaded_at,
        }
    }
}

/// 余额
#[derive(Debug, Serialize)]
pub struct BalanceDto {
    pub current: i64,
    pub withdrawn: i64,
}

impl From<Balance> for BalanceDto {
    fn from(balance: Balance) -> Self {
        Self {
            current: balance.current,
            withdrawn: balance.withdrawn,
        }
    }
}

/// 提现流水
#[derive(Debug, Serialize)]
pub struct WithdrawalDto {
    pub order: String,
    pub sum: i64,
    pub processed_at: DateTime<Utc>,
}

impl From<Withdrawal> for WithdrawalDto {
    fn from(withdrawal: Withdrawal) -> Self {
        Self {
            order: withdrawal.order_number,
            sum: withdrawal.sum,
            processed_at: withdrawal.processed_at,
        }
    }
}

/// 积分回报处理结果
#[derive(Debug, Serialize)]
pub struct AccrualResultDto {
    pub order: String,
    pub status: OrderStatus,
    /// 是否引起了状态变更
    pub applied: bool,
    /// 本次入账积分
    pub credited: i64,
}

/// 待回报订单
#[derive(Debug, Serialize)]
pub struct PendingOrderDto {
    pub number: String,
    pub status: OrderStatus,
    pub uploaded_at: DateTime<Utc>,
}

impl From<Order> for PendingOrderDto {
    fn from(order: Order) -> Self {
        Self {
            number: order.number,
            status: order.status,
            uploaded_at: order.uploaded_at,
        }
    }
}
