//! 订单实体定义

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::enums::OrderStatus;

/// 订单
///
/// 订单号为主键，全局唯一；上传时间受理时写入，之后不变
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub number: String,
    pub user_id: i64,
    pub status: OrderStatus,
    /// 积分数量，仅在 PROCESSED 后有值
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accrual: Option<i64>,
    pub uploaded_at: DateTime<Utc>,
}

impl Order {
    /// 新受理的订单
    pub fn new(number: impl Into<String>, user_id: i64, uploaded_at: DateTime<Utc>) -> Self {
        Self {
            number: number.into(),
            user_id,
            status: OrderStatus::New,
            accrual: None,
            uploaded_at,
        }
    }
}
