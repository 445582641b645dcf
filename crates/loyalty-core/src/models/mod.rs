//! 积分服务领域模型
//!
//! 包含用户账户、订单与提现流水的实体定义

pub mod enums;
pub mod order;
pub mod user;
pub mod withdrawal;

pub use enums::OrderStatus;
pub use order::Order;
pub use user::{Balance, NewUser, User};
pub use withdrawal::{NewWithdrawal, Withdrawal};
