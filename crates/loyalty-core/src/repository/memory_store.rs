//! 内存账本存储
//!
//! 整库一把互斥锁，事务在锁内操作工作副本，提交时整体写回，drop 时丢弃。
//! 事务之间完全串行，可作为 PostgreSQL 实现的行为基准。
//! 支持注入开启事务与提交时的故障，用于验证重试与原子性。

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{Mutex, OwnedMutexGuard};

use super::traits::{InsertOrderOutcome, LedgerStore, LedgerTx};
use crate::error::{LoyaltyError, Result};
use crate::models::{
    Balance, NewUser, NewWithdrawal, Order, OrderStatus, User, Withdrawal,
};

/// 注入的故障
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreFault {
    /// 开启事务时连接池超时，可重试
    BeginTimeout,
    /// 提交失败，事务内的写入全部丢弃
    CommitFailure,
}

#[derive(Debug, Clone, Default)]
struct MemoryData {
    users: HashMap<i64, User>,
    logins: HashMap<String, i64>,
    orders: HashMap<String, Order>,
    withdrawals: Vec<Withdrawal>,
    next_user_id: i64,
    next_withdrawal_id: i64,
}

#[derive(Debug, Default)]
struct MemoryInner {
    data: MemoryData,
    faults: VecDeque<StoreFault>,
}

/// 内存账本存储
#[derive(Clone, Default)]
pub struct MemoryLedgerStore {
    inner: Arc<Mutex<MemoryInner>>,
}

impl MemoryLedgerStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 追加一个待触发的故障，按注入顺序依次触发
    pub async fn inject_fault(&self, fault: StoreFault) {
        self.inner.lock().await.faults.push_back(fault);
    }

    /// 尚未触发的故障数
    pub async fn pending_faults(&self) -> usize {
        self.inner.lock().await.faults.len()
    }

    /// 直接设置余额，仅用于准备测试数据
    pub async fn set_balance(&self, user_id: i64, balance: Balance) -> Result<()> {
        let mut inner = self.inner.lock().await;
        let user = inner
            .data
            .users
            .get_mut(&user_id)
            .ok_or(LoyaltyError::UserNotFound(user_id))?;
        user.balance_current = balance.current;
        user.balance_withdrawn = balance.withdrawn;
        Ok(())
    }
}

fn take_fault(inner: &mut MemoryInner, expected: StoreFault) -> bool {
    if inner.faults.front() == Some(&expected) {
        inner.faults.pop_front();
        true
    } else {
        false
    }
}

#[async_trait]
impl LedgerStore for MemoryLedgerStore {
    async fn begin(&self) -> Result<Box<dyn LedgerTx>> {
        let mut guard = self.inner.clone().lock_owned().await;
        if take_fault(&mut guard, StoreFault::BeginTimeout) {
            return Err(LoyaltyError::Database(sqlx::Error::PoolTimedOut));
        }
        let working = guard.data.clone();
        Ok(Box::new(MemoryLedgerTx { guard, working }))
    }

    async fn find_user(&self, user_id: i64) -> Result<Option<User>> {
        Ok(self.inner.lock().await.data.users.get(&user_id).cloned())
    }

    async fn find_user_by_login(&self, login: &str) -> Result<Option<User>> {
        let inner = self.inner.lock().await;
        Ok(inner
            .data
            .logins
            .get(login)
            .and_then(|id| inner.data.users.get(id))
            .cloned())
    }

    async fn find_order(&self, number: &str) -> Result<Option<Order>> {
        Ok(self.inner.lock().await.data.orders.get(number).cloned())
    }

    async fn list_orders_by_user(&self, user_id: i64) -> Result<Vec<Order>> {
        let inner = self.inner.lock().await;
        let mut orders: Vec<Order> = inner
            .data
            .orders
            .values()
            .filter(|o| o.user_id == user_id)
            .cloned()
            .collect();
        orders.sort_by(|a, b| {
            b.uploaded_at
                .cmp(&a.uploaded_at)
                .then_with(|| b.number.cmp(&a.number))
        });
        Ok(orders)
    }

    async fn list_unsettled_orders(&self, limit: i64) -> Result<Vec<Order>> {
        let inner = self.inner.lock().await;
        let mut orders: Vec<Order> = inner
            .data
            .orders
            .values()
            .filter(|o| !o.status.is_terminal())
            .cloned()
            .collect();
        orders.sort_by(|a, b| a.uploaded_at.cmp(&b.uploaded_at));
        orders.truncate(usize::try_from(limit).unwrap_or(0));
        Ok(orders)
    }

    async fn list_withdrawals_by_user(&self, user_id: i64) -> Result<Vec<Withdrawal>> {
        let inner = self.inner.lock().await;
        let mut withdrawals: Vec<Withdrawal> = inner
            .data
            .withdrawals
            .iter()
            .filter(|w| w.user_id == user_id)
            .cloned()
            .collect();
        withdrawals.sort_by(|a, b| {
            b.processed_at
                .cmp(&a.processed_at)
                .then_with(|| b.id.cmp(&a.id))
        });
        Ok(withdrawals)
    }
}

/// 内存事务
struct MemoryLedgerTx {
    guard: OwnedMutexGuard<MemoryInner>,
    working: MemoryData,
}

#[async_trait]
impl LedgerTx for MemoryLedgerTx {
    async fn insert_user(&mut self, user: &NewUser) -> Result<User> {
        if self.working.logins.contains_key(&user.login) {
            return Err(LoyaltyError::LoginTaken(user.login.clone()));
        }
        self.working.next_user_id += 1;
        let created = User {
            id: self.working.next_user_id,
            login: user.login.clone(),
            password_hash: user.password_hash.clone(),
            balance_current: 0,
            balance_withdrawn: 0,
            created_at: user.created_at,
        };
        self.working.logins.insert(created.login.clone(), created.id);
        self.working.users.insert(created.id, created.clone());
        Ok(created)
    }

    async fn lock_balance(&mut self, user_id: i64) -> Result<Balance> {
        self.working
            .users
            .get(&user_id)
            .map(User::balance)
            .ok_or(LoyaltyError::UserNotFound(user_id))
    }

    async fn update_balance(&mut self, user_id: i64, balance: Balance) -> Result<()> {
        if balance.current < 0 || balance.withdrawn < 0 {
            return Err(LoyaltyError::Internal(format!(
                "余额不能为负: user_id={}, {:?}",
                user_id, balance
            )));
        }
        let user = self
            .working
            .users
            .get_mut(&user_id)
            .ok_or(LoyaltyError::UserNotFound(user_id))?;
        user.balance_current = balance.current;
        user.balance_withdrawn = balance.withdrawn;
        Ok(())
    }

    async fn insert_order(&mut self, order: &Order) -> Result<InsertOrderOutcome> {
        if let Some(existing) = self.working.orders.get(&order.number) {
            return Ok(InsertOrderOutcome::Existing {
                owner: existing.user_id,
            });
        }
        if !self.working.users.contains_key(&order.user_id) {
            return Err(LoyaltyError::UserNotFound(order.user_id));
        }
        self.working
            .orders
            .insert(order.number.clone(), order.clone());
        Ok(InsertOrderOutcome::Inserted)
    }

    async fn lock_order(&mut self, number: &str) -> Result<Option<Order>> {
        Ok(self.working.orders.get(number).cloned())
    }

    async fn update_order(
        &mut self,
        number: &str,
        status: OrderStatus,
        accrual: Option<i64>,
    ) -> Result<()> {
        let order = self
            .working
            .orders
            .get_mut(number)
            .ok_or_else(|| LoyaltyError::OrderNotFound(number.to_string()))?;
        order.status = status;
        order.accrual = accrual;
        Ok(())
    }

    async fn insert_withdrawal(&mut self, withdrawal: &NewWithdrawal) -> Result<Withdrawal> {
        if withdrawal.sum <= 0 {
            return Err(LoyaltyError::Internal(format!(
                "提现金额必须为正: {}",
                withdrawal.sum
            )));
        }
        if !self.working.users.contains_key(&withdrawal.user_id) {
            return Err(LoyaltyError::UserNotFound(withdrawal.user_id));
        }
        self.working.next_withdrawal_id += 1;
        let created = withdrawal
            .clone()
            .into_withdrawal(self.working.next_withdrawal_id);
        self.working.withdrawals.push(created.clone());
        Ok(created)
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        let MemoryLedgerTx { mut guard, working } = *self;
        if take_fault(&mut guard, StoreFault::CommitFailure) {
            return Err(LoyaltyError::Internal("提交失败（注入故障）".to_string()));
        }
        guard.data = working;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    async fn create_user(store: &MemoryLedgerStore, login: &str) -> User {
        let mut tx = store.begin().await.unwrap();
        let user = tx
            .insert_user(&NewUser {
                login: login.to_string(),
                password_hash: "hash".to_string(),
                created_at: Utc::now(),
            })
            .await
            .unwrap();
        tx.commit().await.unwrap();
        user
    }

    #[tokio::test]
    async fn test_drop_without_commit_discards_writes() {
        let store = MemoryLedgerStore::new();
        let user = create_user(&store, "alice").await;

        {
            let mut tx = store.begin().await.unwrap();
            tx.update_balance(user.id, Balance { current: 100, withdrawn: 0 })
                .await
                .unwrap();
        }

        let stored = store.find_user(user.id).await.unwrap().unwrap();
        assert_eq!(stored.balance(), Balance::default());
    }

    #[tokio::test]
    async fn test_commit_fault_discards_writes() {
        let store = MemoryLedgerStore::new();
        let user = create_user(&store, "alice").await;
        store.inject_fault(StoreFault::CommitFailure).await;

        let mut tx = store.begin().await.unwrap();
        tx.update_balance(user.id, Balance { current: 100, withdrawn: 0 })
            .await
            .unwrap();
        assert!(tx.commit().await.is_err());

        let stored = store.find_user(user.id).await.unwrap().unwrap();
        assert_eq!(stored.balance_current, 0);
        assert_eq!(store.pending_faults().await, 0);
    }

    #[tokio::test]
    async fn test_begin_fault_is_retryable() {
        let store = MemoryLedgerStore::new();
        store.inject_fault(StoreFault::BeginTimeout).await;

        let err = store.begin().await.err().unwrap();
        assert!(err.is_retryable());
        assert!(store.begin().await.is_ok());
    }

    #[tokio::test]
    async fn test_duplicate_login() {
        let store = MemoryLedgerStore::new();
        create_user(&store, "alice").await;

        let mut tx = store.begin().await.unwrap();
        let err = tx
            .insert_user(&NewUser {
                login: "alice".to_string(),
                password_hash: "other".to_string(),
                created_at: Utc::now(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, LoyaltyError::LoginTaken(login) if login == "alice"));
    }

    #[tokio::test]
    async fn test_insert_order_reports_existing_owner() {
        let store = MemoryLedgerStore::new();
        let alice = create_user(&store, "alice").await;

        let mut tx = store.begin().await.unwrap();
        let order = Order::new("79927398713", alice.id, Utc::now());
        assert_eq!(
            tx.insert_order(&order).await.unwrap(),
            InsertOrderOutcome::Inserted
        );
        assert_eq!(
            tx.insert_order(&Order::new("79927398713", 99, Utc::now()))
                .await
                .unwrap(),
            InsertOrderOutcome::Existing { owner: alice.id }
        );
    }
}
