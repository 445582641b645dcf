//! 用户仓储
//!
//! 提供用户与余额的数据访问，余额更新只在事务内通过行级锁进行

use sqlx::{PgConnection, PgPool};

use crate::error::{LoyaltyError, Result, is_unique_violation};
use crate::models::{Balance, NewUser, User};

const USER_COLUMNS: &str =
    "id, login, password_hash, balance_current, balance_withdrawn, created_at";

/// 用户仓储
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // ==================== 查询操作 ====================

    pub async fn get_user(&self, user_id: i64) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    pub async fn get_user_by_login(&self, login: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE login = $1"
        ))
        .bind(login)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    // ==================== 事务操作 ====================

    /// 在事务中创建用户
    pub async fn create_user_in_tx(tx: &mut PgConnection, user: &NewUser) -> Result<User> {
        sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (login, password_hash, balance_current, balance_withdrawn, created_at)
            VALUES ($1, $2, 0, 0, $3)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(&user.login)
        .bind(&user.password_hash)
        .bind(user.created_at)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                LoyaltyError::LoginTaken(user.login.clone())
            } else {
                LoyaltyError::Database(e)
            }
        })
    }

    /// 在事务中锁定余额行（SELECT ... FOR UPDATE）
    pub async fn lock_balance_in_tx(tx: &mut PgConnection, user_id: i64) -> Result<Balance> {
        sqlx::query_as::<_, Balance>(
            r#"
            SELECT balance_current AS current, balance_withdrawn AS withdrawn
            FROM users
            WHERE id = $1
            FOR UPDATE
            "#,
        )
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(LoyaltyError::UserNotFound(user_id))
    }

    /// 在事务中写回余额
    pub async fn update_balance_in_tx(
        tx: &mut PgConnection,
        user_id: i64,
        balance: Balance,
    ) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET balance_current = $2, balance_withdrawn = $3
            WHERE id = $1
            "#,
        )
        .bind(user_id)
        .bind(balance.current)
        .bind(balance.withdrawn)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(LoyaltyError::UserNotFound(user_id));
        }
        Ok(())
    }
}
