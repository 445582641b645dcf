//! 订单仓储
//!
//! 订单号为主键。受理时依赖 ON CONFLICT 保证同一订单号只落库一次。

use sqlx::{PgConnection, PgPool};

use super::traits::InsertOrderOutcome;
use crate::error::{LoyaltyError, Result, is_foreign_key_violation};
use crate::models::{Order, OrderStatus};

const ORDER_COLUMNS: &str = "number, user_id, status, accrual, uploaded_at";

/// 订单仓储
pub struct OrderRepository {
    pool: PgPool,
}

impl OrderRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // ==================== 查询操作 ====================

    pub async fn get_order(&self, number: &str) -> Result<Option<Order>> {
        let order = sqlx::query_as::<_, Order>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE number = $1"
        ))
        .bind(number)
        .fetch_optional(&self.pool)
        .await?;

        Ok(order)
    }

    /// 用户的订单，最新上传的在前
    pub async fn list_by_user(&self, user_id: i64) -> Result<Vec<Order>> {
        let orders = sqlx::query_as::<_, Order>(&format!(
            r#"
            SELECT {ORDER_COLUMNS}
            FROM orders
            WHERE user_id = $1
            ORDER BY uploaded_at DESC, number DESC
            "#
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(orders)
    }

    /// 尚未得到最终结果的订单，最早上传的在前
    pub async fn list_unsettled(&self, limit: i64) -> Result<Vec<Order>> {
        let orders = sqlx::query_as::<_, Order>(&format!(
            r#"
            SELECT {ORDER_COLUMNS}
            FROM orders
            WHERE status IN ('NEW', 'PROCESSING')
            ORDER BY uploaded_at ASC
            LIMIT $1
            "#
        ))
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(orders)
    }

    // ==================== 事务操作 ====================

    /// 在事务中插入订单
    ///
    /// 并发插入同一订单号时，后到者等待先到者事务结束；
    /// 先到者提交则返回已有订单的所属用户
    pub async fn insert_in_tx(tx: &mut PgConnection, order: &Order) -> Result<InsertOrderOutcome> {
        let inserted = sqlx::query_scalar::<_, String>(
            r#"
            INSERT INTO orders (number, user_id, status, accrual, uploaded_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $5)
            ON CONFLICT (number) DO NOTHING
            RETURNING number
            "#,
        )
        .bind(&order.number)
        .bind(order.user_id)
        .bind(order.status)
        .bind(order.accrual)
        .bind(order.uploaded_at)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| {
            if is_foreign_key_violation(&e) {
                LoyaltyError::UserNotFound(order.user_id)
            } else {
                LoyaltyError::Database(e)
            }
        })?;

        if inserted.is_some() {
            return Ok(InsertOrderOutcome::Inserted);
        }

        let owner =
            sqlx::query_scalar::<_, i64>("SELECT user_id FROM orders WHERE number = $1")
                .bind(&order.number)
                .fetch_optional(&mut *tx)
                .await?
                .ok_or_else(|| {
                    LoyaltyError::Internal(format!("订单冲突后未找到已有订单: {}", order.number))
                })?;

        Ok(InsertOrderOutcome::Existing { owner })
    }

    /// 在事务中锁定订单行（SELECT ... FOR UPDATE）
    pub async fn lock_in_tx(tx: &mut PgConnection, number: &str) -> Result<Option<Order>> {
        let order = sqlx::query_as::<_, Order>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE number = $1 FOR UPDATE"
        ))
        .bind(number)
        .fetch_optional(&mut *tx)
        .await?;

        Ok(order)
    }

    /// 在事务中更新订单状态与积分
    pub async fn update_status_in_tx(
        tx: &mut PgConnection,
        number: &str,
        status: OrderStatus,
        accrual: Option<i64>,
    ) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE orders
            SET status = $2, accrual = $3, updated_at = NOW()
            WHERE number = $1
            "#,
        )
        .bind(number)
        .bind(status)
        .bind(accrual)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(LoyaltyError::OrderNotFound(number.to_string()));
        }
        Ok(())
    }
}
