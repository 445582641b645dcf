//! 仓储 Trait 定义
//!
//! 服务层只依赖这里的抽象。`LedgerStore` 提供只读查询与开启事务，
//! `LedgerTx` 内的所有写入要么随 `commit` 一起生效，要么在 drop 时全部回滚。

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{Balance, NewUser, NewWithdrawal, Order, OrderStatus, User, Withdrawal};

/// 订单写入结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOrderOutcome {
    /// 新插入
    Inserted,
    /// 订单号已存在，附带已有订单的所属用户
    Existing { owner: i64 },
}

/// 账本存储
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// 开启一个原子单元
    async fn begin(&self) -> Result<Box<dyn LedgerTx>>;

    // 用户
    async fn find_user(&self, user_id: i64) -> Result<Option<User>>;
    async fn find_user_by_login(&self, login: &str) -> Result<Option<User>>;

    // 订单
    async fn find_order(&self, number: &str) -> Result<Option<Order>>;
    /// 按上传时间倒序
    async fn list_orders_by_user(&self, user_id: i64) -> Result<Vec<Order>>;
    /// 未结算订单（NEW / PROCESSING），按上传时间正序
    async fn list_unsettled_orders(&self, limit: i64) -> Result<Vec<Order>>;

    // 提现
    /// 按处理时间倒序
    async fn list_withdrawals_by_user(&self, user_id: i64) -> Result<Vec<Withdrawal>>;
}

/// 账本事务
///
/// drop 而未 commit 即回滚
#[async_trait]
pub trait LedgerTx: Send {
    /// 创建用户，登录名重复时返回 `LoginTaken`
    async fn insert_user(&mut self, user: &NewUser) -> Result<User>;

    /// 锁定用户余额行直到事务结束，用户不存在时返回 `UserNotFound`
    async fn lock_balance(&mut self, user_id: i64) -> Result<Balance>;

    async fn update_balance(&mut self, user_id: i64, balance: Balance) -> Result<()>;

    /// 插入订单，订单号已存在时不修改已有订单
    async fn insert_order(&mut self, order: &Order) -> Result<InsertOrderOutcome>;

    /// 锁定订单行直到事务结束
    async fn lock_order(&mut self, number: &str) -> Result<Option<Order>>;

    async fn update_order(
        &mut self,
        number: &str,
        status: OrderStatus,
        accrual: Option<i64>,
    ) -> Result<()>;

    async fn insert_withdrawal(&mut self, withdrawal: &NewWithdrawal) -> Result<Withdrawal>;

    /// 提交事务
    async fn commit(self: Box<Self>) -> Result<()>;
}
