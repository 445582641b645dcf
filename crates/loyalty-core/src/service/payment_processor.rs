//! 积分提现
//!
//! ## 提现流程
//!
//! 1. 订单号校验 -> 2. 开启事务 -> 3. 锁定余额行 -> 4. 余额检查
//!    -> 5. 扣减并写入提现流水 -> 6. 提交
//!
//! 扣减与流水在同一事务中，提交失败时二者都不可见。
//! 提现所用的订单号只做格式校验，不要求对应已受理的订单。

use std::time::Instant;

use chrono::Utc;
use loyalty_shared::observability::metrics;
use tracing::{info, instrument, warn};

use crate::deadline::Deadline;
use crate::error::{LoyaltyError, Result};
use crate::models::{NewWithdrawal, Withdrawal};
use crate::order_number::OrderNumber;
use crate::service::{BalanceAccount, UnitOfWork};

/// 积分提现服务
#[derive(Clone)]
pub struct PaymentProcessor {
    uow: UnitOfWork,
}

impl PaymentProcessor {
    pub fn new(uow: UnitOfWork) -> Self {
        Self { uow }
    }

    /// 使用积分抵扣订单
    #[instrument(skip(self, deadline), fields(order_number = %order_number))]
    pub async fn spend(
        &self,
        order_number: &str,
        user_id: i64,
        amount: i64,
        deadline: Deadline,
    ) -> Result<Withdrawal> {
        let start = Instant::now();
        let result = self.spend_inner(order_number, user_id, amount, deadline).await;
        let elapsed = start.elapsed().as_secs_f64();

        match &result {
            Ok(withdrawal) => {
                metrics::record_withdrawal("accepted", elapsed);
                info!(withdrawal_id = withdrawal.id, "积分提现成功");
            }
            Err(e) => {
                let outcome = match e {
                    LoyaltyError::InvalidIdentifier(_) => "bad_order",
                    LoyaltyError::InsufficientFunds { .. } => "insufficient_funds",
                    LoyaltyError::Validation(_) => "bad_amount",
                    _ => "error",
                };
                metrics::record_withdrawal(outcome, elapsed);
                if !e.is_business_error() {
                    warn!(error = %e, "积分提现失败");
                }
            }
        }

        result
    }

    async fn spend_inner(
        &self,
        order_number: &str,
        user_id: i64,
        amount: i64,
        deadline: Deadline,
    ) -> Result<Withdrawal> {
        let number = OrderNumber::parse(order_number)?;
        if amount <= 0 {
            return Err(LoyaltyError::Validation(format!(
                "提现积分必须为正数: {}",
                amount
            )));
        }

        self.uow
            .run("payment_spend", deadline, |mut tx| {
                let number = number.clone();
                async move {
                    BalanceAccount::debit_in_tx(tx.as_mut(), user_id, amount).await?;
                    let withdrawal = tx
                        .insert_withdrawal(&NewWithdrawal {
                            order_number: number.into_inner(),
                            user_id,
                            sum: amount,
                            processed_at: Utc::now(),
                        })
                        .await?;
                    Ok((tx, withdrawal))
                }
            })
            .await
    }

    /// 用户的提现流水，最新的在前
    pub async fn list_withdrawals(&self, user_id: i64) -> Result<Vec<Withdrawal>> {
        self.uow.store().list_withdrawals_by_user(user_id).await
    }
}
