//! 积分账务核心
//!
//! 负责订单号校验、订单受理与状态流转、用户积分余额的原子扣减与入账。
//!
//! ## 核心功能
//!
//! - **订单号校验**：Luhn 校验，订单受理与积分提现共用同一规则
//! - **订单账本**：订单号全局唯一，重复提交区分本人重复与他人冲突
//! - **积分账户**：当前可用积分与累计已提现积分，任何并发下都不会透支
//! - **支付处理**：扣减积分与写入提现流水在同一事务中完成，要么都生效要么都不生效
//! - **积分回报**：外部积分计算系统通过回报入口推进订单状态并入账，重复回报不重复入账
//!
//! ## 模块结构
//!
//! - `models`: 领域模型定义
//! - `error`: 错误类型定义
//! - `order_number`: 订单号校验
//! - `deadline`: 调用方传入的截止时间
//! - `repository`: 存储抽象（PostgreSQL 实现与内存实现）
//! - `service`: 业务服务层

pub mod deadline;
pub mod error;
pub mod models;
pub mod order_number;
pub mod repository;
pub mod service;

pub use deadline::Deadline;
pub use error::{LoyaltyError, Result};
pub use models::*;
pub use order_number::{OrderNumber, is_valid};
pub use repository::{LedgerStore, LedgerTx, MemoryLedgerStore, PgLedgerStore, StoreFault};
pub use service::{
    AccrualOutcome, BalanceAccount, OrderLedger, PaymentProcessor, UnitOfWork, UserService,
};
