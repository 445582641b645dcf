//! 数据库仓储层
//!
//! 提供用户、订单、提现流水的数据访问接口，封装 SQL 操作细节。
//!
//! ## 设计原则
//!
//! - 仓储只负责数据持久化，不包含业务逻辑
//! - 使用 SQLx 进行类型安全的数据库操作
//! - 事务控制由调用方（服务层）决定，`LedgerTx` 即一个原子单元
//! - 定义 trait 接口，服务层可在内存实现上测试

mod memory_store;
mod order_repo;
mod pg_store;
mod traits;
mod user_repo;
mod withdrawal_repo;

pub use memory_store::{MemoryLedgerStore, StoreFault};
pub use order_repo::OrderRepository;
pub use pg_store::PgLedgerStore;
pub use traits::*;
pub use user_repo::UserRepository;
pub use withdrawal_repo::WithdrawalRepository;
