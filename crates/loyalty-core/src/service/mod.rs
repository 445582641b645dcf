//! 服务层
//!
//! 实现积分业务逻辑。每个写操作都是一个原子单元：在截止时间内执行事务体，
//! 成功后提交；瞬时存储故障时整体从头重试。
//!
//! ## 模块结构
//!
//! - `unit_of_work`: 原子单元执行器（截止时间 + 重试 + 提交）
//! - `balance_account`: 积分账户（入账、扣减、查询）
//! - `order_ledger`: 订单账本（受理、积分回报、查询）
//! - `payment_processor`: 积分提现
//! - `user_service`: 用户注册与查询

pub mod balance_account;
pub mod order_ledger;
pub mod payment_processor;
pub mod unit_of_work;
pub mod user_service;

pub use balance_account::BalanceAccount;
pub use order_ledger::{AccrualOutcome, OrderLedger};
pub use payment_processor::PaymentProcessor;
pub use unit_of_work::UnitOfWork;
pub use user_service::UserService;
