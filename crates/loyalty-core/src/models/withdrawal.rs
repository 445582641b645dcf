//! 提现流水实体定义

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 提现流水
///
/// 只在扣减成功提交时产生，之后不再修改。
/// 订单号按值引用，不要求对应已受理的订单
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Withdrawal {
    pub id: i64,
    pub order_number: String,
    pub user_id: i64,
    pub sum: i64,
    pub processed_at: DateTime<Utc>,
}

/// 待写入的提现流水
#[derive(Debug, Clone)]
pub struct NewWithdrawal {
    pub order_number: String,
    pub user_id: i64,
    pub sum: i64,
    pub processed_at: DateTime<Utc>,
}

impl NewWithdrawal {
    pub(crate) fn into_withdrawal(self, id: i64) -> Withdrawal {
        Withdrawal {
            id,
            order_number: self.order_number,
            user_id: self.user_id,
            sum: self.sum,
            processed_at: self.processed_at,
        }
    }
}
