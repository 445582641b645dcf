//! 积分服务枚举类型定义
//!
//! 所有枚举都支持数据库（sqlx）和 JSON（serde）序列化

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// 订单状态
///
/// 状态只能前进：NEW -> {PROCESSING, INVALID, PROCESSED}，
/// PROCESSING -> {INVALID, PROCESSED}，INVALID 与 PROCESSED 为终态
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(type_name = "varchar", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    /// 新建 - 已受理，尚未被积分计算系统处理
    #[default]
    New,
    /// 处理中 - 积分计算系统正在计算
    Processing,
    /// 无效 - 不会产生积分
    Invalid,
    /// 已处理 - 积分已计算并入账
    Processed,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::New => "NEW",
            Self::Processing => "PROCESSING",
            Self::Invalid => "INVALID",
            Self::Processed => "PROCESSED",
        }
    }

    /// 是否为终态
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Invalid | Self::Processed)
    }

    /// 是否允许流转到目标状态
    ///
    /// 相同状态不算流转，由调用方按幂等处理
    pub fn can_transition_to(&self, next: OrderStatus) -> bool {
        match self {
            Self::New => matches!(next, Self::Processing | Self::Invalid | Self::Processed),
            Self::Processing => matches!(next, Self::Invalid | Self::Processed),
            Self::Invalid | Self::Processed => false,
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "NEW" => Ok(Self::New),
            "PROCESSING" => Ok(Self::Processing),
            "INVALID" => Ok(Self::Invalid),
            "PROCESSED" => Ok(Self::Processed),
            // 部分积分计算系统使用 REGISTERED 表示已登记未计算
            "REGISTERED" => Ok(Self::New),
            other => Err(format!("未知订单状态: {}", other)),
        }
    }
}
