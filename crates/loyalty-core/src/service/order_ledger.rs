//! 订单账本
//!
//! 负责订单受理、积分回报与查询：
//! - 受理：订单号全局唯一，由存储层唯一约束保证，不依赖先查后写
//! - 回报：推进订单状态，到达 PROCESSED 时在同一事务内为订单所属用户入账
//! - 终态（INVALID / PROCESSED）不再变更，重复回报不重复入账
//!
//! ## 状态机
//!
//! NEW -> {PROCESSING, INVALID, PROCESSED}；PROCESSING -> {INVALID, PROCESSED}

use chrono::{DateTime, Utc};
use loyalty_shared::observability::metrics;
use tracing::{info, instrument, warn};

use crate::deadline::Deadline;
use crate::error::{LoyaltyError, Result};
use crate::models::{Order, OrderStatus};
use crate::order_number::OrderNumber;
use crate::repository::InsertOrderOutcome;
use crate::service::{BalanceAccount, UnitOfWork};

/// 积分回报的处理结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccrualOutcome {
    /// 状态已推进，`credited` 为本次入账积分
    Applied { status: OrderStatus, credited: i64 },
    /// 订单已处于该状态或已是终态，未做任何变更
    Unchanged { status: OrderStatus },
}

/// 订单账本服务
#[derive(Clone)]
pub struct OrderLedger {
    uow: UnitOfWork,
}

impl OrderLedger {
    pub fn new(uow: UnitOfWork) -> Self {
        Self { uow }
    }

    /// 受理订单
    ///
    /// 订单号已被本人上传返回 `AlreadyExists`，已被他人上传返回 `Conflict`
    #[instrument(skip(self, at, deadline), fields(order_number = %number))]
    pub async fn admit(
        &self,
        user_id: i64,
        number: &str,
        at: DateTime<Utc>,
        deadline: Deadline,
    ) -> Result<Order> {
        let number = match OrderNumber::parse(number) {
            Ok(number) => number,
            Err(e) => {
                metrics::record_order_admission("invalid");
                return Err(e);
            }
        };
        let order = Order::new(number.into_inner(), user_id, at);

        let result = self
            .uow
            .run("order_admit", deadline, |mut tx| {
                let order = order.clone();
                async move {
                    let outcome = tx.insert_order(&order).await?;
                    Ok((tx, outcome))
                }
            })
            .await
            .and_then(|outcome| match outcome {
                InsertOrderOutcome::Inserted => Ok(()),
                InsertOrderOutcome::Existing { owner } if owner == user_id => {
                    Err(LoyaltyError::AlreadyExists {
                        number: order.number.clone(),
                    })
                }
                InsertOrderOutcome::Existing { .. } => Err(LoyaltyError::Conflict {
                    number: order.number.clone(),
                }),
            });

        match result {
            Ok(()) => {
                metrics::record_order_admission("created");
                info!("订单受理成功");
                Ok(order)
            }
            Err(e) => {
                metrics::record_order_admission(match &e {
                    LoyaltyError::AlreadyExists { .. } => "already_exists",
                    LoyaltyError::Conflict { .. } => "conflict",
                    _ => "error",
                });
                Err(e)
            }
        }
    }

    /// 处理积分回报
    ///
    /// 非 PROCESSED 状态忽略 `accrual`；PROCESSED 未带积分视为 0
    #[instrument(skip(self, deadline), fields(order_number = %number))]
    pub async fn report_accrual(
        &self,
        number: &str,
        status: OrderStatus,
        accrual: Option<i64>,
        deadline: Deadline,
    ) -> Result<AccrualOutcome> {
        let accrual = match (status, accrual) {
            (_, Some(value)) if value < 0 => {
                return Err(LoyaltyError::Validation(format!(
                    "积分不能为负: {}",
                    value
                )));
            }
            (OrderStatus::Processed, value) => Some(value.unwrap_or(0)),
            _ => None,
        };

        let outcome = self
            .uow
            .run("order_report_accrual", deadline, |mut tx| async move {
                let order = tx
                    .lock_order(number)
                    .await?
                    .ok_or_else(|| LoyaltyError::OrderNotFound(number.to_string()))?;

                if order.status == status || order.status.is_terminal() {
                    if order.status.is_terminal() && order.status != status {
                        warn!(current = %order.status, reported = %status, "终态订单收到不同的回报，已忽略");
                    }
                    return Ok((tx, AccrualOutcome::Unchanged { status: order.status }));
                }

                if !order.status.can_transition_to(status) {
                    return Err(LoyaltyError::InvalidTransition {
                        number: order.number,
                        from: order.status,
                        to: status,
                    });
                }

                tx.update_order(&order.number, status, accrual).await?;

                let credited = accrual.unwrap_or(0);
                if credited > 0 {
                    BalanceAccount::credit_in_tx(tx.as_mut(), order.user_id, credited).await?;
                }

                Ok((tx, AccrualOutcome::Applied { status, credited }))
            })
            .await?;

        match outcome {
            AccrualOutcome::Applied { status, credited } => {
                metrics::record_accrual(status.as_str());
                info!(status = %status, credited, "积分回报已处理");
            }
            AccrualOutcome::Unchanged { status } => {
                info!(status = %status, "积分回报未引起变更");
            }
        }

        Ok(outcome)
    }

    /// 用户的订单，最新上传的在前
    pub async fn list_by_user(&self, user_id: i64) -> Result<Vec<Order>> {
        self.uow.store().list_orders_by_user(user_id).await
    }

    /// 等待积分回报的订单，最早上传的在前
    pub async fn list_unsettled(&self, limit: i64) -> Result<Vec<Order>> {
        self.uow.store().list_unsettled_orders(limit).await
    }

    pub async fn get(&self, number: &str) -> Result<Order> {
        self.uow
            .store()
            .find_order(number)
            .await?
            .ok_or_else(|| LoyaltyError::OrderNotFound(number.to_string()))
    }
}
