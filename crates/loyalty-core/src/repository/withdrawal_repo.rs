//! 提现流水仓储

use sqlx::{PgConnection, PgPool};

use crate::error::{LoyaltyError, Result, is_foreign_key_violation};
use crate::models::{NewWithdrawal, Withdrawal};

/// 提现流水仓储
///
/// 流水只追加，不提供更新与删除
pub struct WithdrawalRepository {
    pool: PgPool,
}

impl WithdrawalRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// 用户的提现流水，最新的在前
    pub async fn list_by_user(&self, user_id: i64) -> Result<Vec<Withdrawal>> {
        let withdrawals = sqlx::query_as::<_, Withdrawal>(
            r#"
            SELECT id, order_number, user_id, sum, processed_at
            FROM withdrawals
            WHERE user_id = $1
            ORDER BY processed_at DESC, id DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(withdrawals)
    }

    /// 在事务中写入提现流水
    pub async fn create_in_tx(
        tx: &mut PgConnection,
        withdrawal: &NewWithdrawal,
    ) -> Result<Withdrawal> {
        sqlx::query_as::<_, Withdrawal>(
            r#"
            INSERT INTO withdrawals (order_number, user_id, sum, processed_at)
            VALUES ($1, $2, $3, $4)
            RETURNING id, order_number, user_id, sum, processed_at
            "#,
        )
        .bind(&withdrawal.order_number)
        .bind(withdrawal.user_id)
        .bind(withdrawal.sum)
        .bind(withdrawal.processed_at)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            if is_foreign_key_violation(&e) {
                LoyaltyError::UserNotFound(withdrawal.user_id)
            } else {
                LoyaltyError::Database(e)
            }
        })
    }
}
