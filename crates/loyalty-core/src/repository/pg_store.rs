//! PostgreSQL 账本存储
//!
//! 事务默认 READ COMMITTED，互斥依赖行级锁（余额行、订单行）与订单号主键约束

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Transaction};
use tracing::warn;

use super::order_repo::OrderRepository;
use super::traits::{InsertOrderOutcome, LedgerStore, LedgerTx};
use super::user_repo::UserRepository;
use super::withdrawal_repo::WithdrawalRepository;
use crate::error::{LoyaltyError, Result, is_certain_rollback};
use crate::models::{Balance, NewUser, NewWithdrawal, Order, OrderStatus, User, Withdrawal};

/// PostgreSQL 账本存储
pub struct PgLedgerStore {
    pool: PgPool,
    users: UserRepository,
    orders: OrderRepository,
    withdrawals: WithdrawalRepository,
}

impl PgLedgerStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            users: UserRepository::new(pool.clone()),
            orders: OrderRepository::new(pool.clone()),
            withdrawals: WithdrawalRepository::new(pool.clone()),
            pool,
        }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl LedgerStore for PgLedgerStore {
    async fn begin(&self) -> Result<Box<dyn LedgerTx>> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PgLedgerTx { tx }))
    }

    async fn find_user(&self, user_id: i64) -> Result<Option<User>> {
        self.users.get_user(user_id).await
    }

    async fn find_user_by_login(&self, login: &str) -> Result<Option<User>> {
        self.users.get_user_by_login(login).await
    }

    async fn find_order(&self, number: &str) -> Result<Option<Order>> {
        self.orders.get_order(number).await
    }

    async fn list_orders_by_user(&self, user_id: i64) -> Result<Vec<Order>> {
        self.orders.list_by_user(user_id).await
    }

    async fn list_unsettled_orders(&self, limit: i64) -> Result<Vec<Order>> {
        self.orders.list_unsettled(limit).await
    }

    async fn list_withdrawals_by_user(&self, user_id: i64) -> Result<Vec<Withdrawal>> {
        self.withdrawals.list_by_user(user_id).await
    }
}

/// PostgreSQL 事务
///
/// 持有的 `Transaction` 在 drop 时自动回滚
struct PgLedgerTx {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl LedgerTx for PgLedgerTx {
    async fn insert_user(&mut self, user: &NewUser) -> Result<User> {
        UserRepository::create_user_in_tx(&mut self.tx, user).await
    }

    async fn lock_balance(&mut self, user_id: i64) -> Result<Balance> {
        UserRepository::lock_balance_in_tx(&mut self.tx, user_id).await
    }

    async fn update_balance(&mut self, user_id: i64, balance: Balance) -> Result<()> {
        UserRepository::update_balance_in_tx(&mut self.tx, user_id, balance).await
    }

    async fn insert_order(&mut self, order: &Order) -> Result<InsertOrderOutcome> {
        OrderRepository::insert_in_tx(&mut self.tx, order).await
    }

    async fn lock_order(&mut self, number: &str) -> Result<Option<Order>> {
        OrderRepository::lock_in_tx(&mut self.tx, number).await
    }

    async fn update_order(
        &mut self,
        number: &str,
        status: OrderStatus,
        accrual: Option<i64>,
    ) -> Result<()> {
        OrderRepository::update_status_in_tx(&mut self.tx, number, status, accrual).await
    }

    async fn insert_withdrawal(&mut self, withdrawal: &NewWithdrawal) -> Result<Withdrawal> {
        WithdrawalRepository::create_in_tx(&mut self.tx, withdrawal).await
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        self.tx.commit().await.map_err(|e| {
            if is_certain_rollback(&e) {
                LoyaltyError::Database(e)
            } else {
                // 连接在提交途中中断时无法得知事务是否生效，不能整体重放
                warn!(error = %e, "事务提交结果未知");
                LoyaltyError::Internal(format!("事务提交结果未知: {}", e))
            }
        })
    }
}
