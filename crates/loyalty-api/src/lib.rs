//! 积分服务 HTTP 接口
//!
//! 提供用户注册登录、订单上传、余额查询、积分提现等 REST API，
//! 以及供积分计算系统回报结果的内部入口。
//!
//! ## 模块结构
//!
//! - `auth`: JWT 签发校验与密码哈希
//! - `dto`: 请求和响应的数据传输对象
//! - `error`: 错误类型与 HTTP 状态码映射
//! - `handlers`: HTTP 请求处理器
//! - `middleware`: 认证中间件
//! - `routes`: 路由配置
//! - `state`: 应用状态
//!
//! ## 技术栈
//!
//! - Web 框架：Axum
//! - 数据验证：validator
//! - 会话：jsonwebtoken + bcrypt

pub mod auth;
pub mod dto;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod state;

pub use error::{ApiError, Result};
pub use routes::build_router;
pub use state::AppState;
