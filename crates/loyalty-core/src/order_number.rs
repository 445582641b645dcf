//! 订单号校验
//!
//! 订单号为纯数字串，使用 Luhn 校验和。订单受理与积分提现共用同一规则。

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{LoyaltyError, Result};

/// 校验订单号
///
/// 任何非 ASCII 数字字符（包括空白、符号）或空串都判定为无效。
/// 从最右一位开始，每隔一位将数字翻倍，超过 9 则减 9，总和能被 10 整除即有效。
pub fn is_valid(s: &str) -> bool {
    if s.is_empty() {
        return false;
    }

    let mut sum: u32 = 0;
    let mut double = false;

    for b in s.bytes().rev() {
        if !b.is_ascii_digit() {
            return false;
        }

        let mut n = u32::from(b - b'0');
        if double {
            n *= 2;
            if n > 9 {
                n -= 9;
            }
        }
        sum += n;
        double = !double;
    }

    sum % 10 == 0
}

/// 经过校验的订单号
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct OrderNumber(String);

impl OrderNumber {
    /// 解析并校验订单号
    pub fn parse(s: impl Into<String>) -> Result<Self> {
        let s = s.into();
        if is_valid(&s) {
            Ok(Self(s))
        } else {
            Err(LoyaltyError::InvalidIdentifier(s))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl TryFrom<String> for OrderNumber {
    type Error = LoyaltyError;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(value)
    }
}

impl From<OrderNumber> for String {
    fn from(value: OrderNumber) -> Self {
        value.0
    }
}

impl AsRef<str> for OrderNumber {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OrderNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
