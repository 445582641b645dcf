//! 请求体定义

use serde::Deserialize;
use validator::Validate;

/// 注册 / 登录请求
#[derive(Debug, Deserialize, Validate)]
pub struct CredentialsRequest {
    #[validate(length(min = 1, max = 64, message = "登录名长度必须在 1-64 之间"))]
    pub login: String,
    #[validate(length(min = 1, max = 72, message = "密码长度必须在 1-72 之间"))]
    pub password: String,
}

/// 积分提现请求
#[derive(Debug, Deserialize, Validate)]
pub struct WithdrawRequest {
    /// 抵扣的订单号
    pub order: String,
    #[validate(range(min = 1, message = "提现积分必须为正数"))]
    pub sum: i64,
}

/// 积分回报请求
#[derive(Debug, Deserialize)]
pub struct AccrualReportRequest {
    pub order: String,
    /// REGISTERED / PROCESSING / INVALID / PROCESSED
    pub status: String,
    #[serde(default)]
    pub accrual: Option<i64>,
}

/// 待回报订单查询参数
#[derive(Debug, Deserialize)]
pub struct PendingQuery {
    #[serde(default = "default_pending_limit")]
    pub limit: i64,
}

fn default_pending_limit() -> i64 {
    100
}
