//! HTTP 请求处理器

pub mod accrual;
pub mod auth;
pub mod balance;
pub mod health;
pub mod orders;
