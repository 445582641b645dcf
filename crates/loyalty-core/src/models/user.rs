//! 用户账户实体定义
//!
//! 积分以整数计，不支持小数积分

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{LoyaltyError, Result};

/// 用户
///
/// 登录名全局唯一；余额字段只能经由积分账户的入账/扣减修改
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i64,
    pub login: String,
    /// 凭证材料，对核心不透明
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// 当前可用积分
    pub balance_current: i64,
    /// 累计已提现积分
    pub balance_withdrawn: i64,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn balance(&self) -> Balance {
        Balance {
            current: self.balance_current,
            withdrawn: self.balance_withdrawn,
        }
    }
}

/// 新用户
#[derive(Debug, Clone)]
pub struct NewUser {
    pub login: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

/// 积分余额
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Balance {
    pub current: i64,
    pub withdrawn: i64,
}

impl Balance {
    /// 入账后的余额
    pub fn credit(&self, amount: i64) -> Result<Balance> {
        ensure_positive(amount)?;
        let current = self
            .current
            .checked_add(amount)
            .ok_or_else(|| LoyaltyError::Internal("积分余额溢出".to_string()))?;

        Ok(Balance {
            current,
            withdrawn: self.withdrawn,
        })
    }

    /// 扣减后的余额
    ///
    /// 当前积分不足时返回 `InsufficientFunds`，原余额不变
    pub fn debit(&self, amount: i64) -> Result<Balance> {
        ensure_positive(amount)?;
        if self.current < amount {
            return Err(LoyaltyError::InsufficientFunds {
                required: amount,
                available: self.current,
            });
        }
        let withdrawn = self
            .withdrawn
            .checked_add(amount)
            .ok_or_else(|| LoyaltyError::Internal("累计提现积分溢出".to_string()))?;

        Ok(Balance {
            current: self.current - amount,
            withdrawn,
        })
    }
}

fn ensure_positive(amount: i64) -> Result<()> {
    if amount <= 0 {
        return Err(LoyaltyError::Validation(format!(
            "积分数量必须为正数: {}",
            amount
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credit() {
        let balance = Balance {
            current: 100,
            withdrawn: 20,
        };
        let after = balance.credit(50).unwrap();
        assert_eq!(after.current, 150);
        assert_eq!(after.withdrawn, 20);
    }

    #[test]
    fn test_debit_moves_value_to_withdrawn() {
        let balance = Balance {
            current: 500,
            withdrawn: 0,
        };
        let after = balance.debit(300).unwrap();
        assert_eq!(after, Balance { current: 200, withdrawn: 300 });

        // 恰好扣完
        let empty = after.debit(200).unwrap();
        assert_eq!(empty, Balance { current: 0, withdrawn: 500 });
    }

    #[test]
    fn test_debit_insufficient() {
        let balance = Balance {
            current: 200,
            withdrawn: 300,
        };
        let err = balance.debit(300).unwrap_err();
        assert!(matches!(
            err,
            LoyaltyError::InsufficientFunds {
                required: 300,
                available: 200
            }
        ));
    }

    #[test]
    fn test_non_positive_amount_rejected() {
        let balance = Balance::default();
        assert!(matches!(balance.credit(0), Err(LoyaltyError::Validation(_))));
        assert!(matches!(balance.debit(-5), Err(LoyaltyError::Validation(_))));
    }

    #[test]
    fn test_credit_overflow() {
        let balance = Balance {
            current: i64::MAX,
            withdrawn: 0,
        };
        assert!(matches!(balance.credit(1), Err(LoyaltyError::Internal(_))));
    }

    #[test]
    fn test_user_serialization_hides_password() {
        let user = User {
            id: 1,
            login: "alice".to_string(),
            password_hash: "$2b$12$hash".to_string(),
            balance_current: 10,
            balance_withdrawn: 0,
            created_at: Utc::now(),
        };
        let json = serde_json::to_value(&user).unwrap();
        assert!(json.get("passwordHash").is_none());
        assert_eq!(json["balanceCurrent"], 10);
        assert_eq!(user.balance().current, 10);
    }
}
