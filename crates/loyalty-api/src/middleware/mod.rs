//! 中间件模块
//!
//! 提供用户认证与积分回报入口的访问控制

mod accrual_token;
mod auth;

pub use accrual_token::accrual_token_middleware;
pub use auth::auth_middleware;
