//! 积分账户
//!
//! 每个用户一组计数器：当前可用积分与累计已提现积分，二者均不为负。
//! 入账与扣减都在事务内先锁定余额行，再计算并写回，同一用户的变更因此串行化。

use tracing::{info, instrument};

use crate::deadline::Deadline;
use crate::error::{LoyaltyError, Result};
use crate::models::Balance;
use crate::repository::LedgerTx;
use crate::service::UnitOfWork;

/// 积分账户服务
#[derive(Clone)]
pub struct BalanceAccount {
    uow: UnitOfWork,
}

impl BalanceAccount {
    pub fn new(uow: UnitOfWork) -> Self {
        Self { uow }
    }

    /// 查询余额
    pub async fn get(&self, user_id: i64) -> Result<Balance> {
        self.uow
            .store()
            .find_user(user_id)
            .await?
            .map(|user| user.balance())
            .ok_or(LoyaltyError::UserNotFound(user_id))
    }

    /// 入账
    #[instrument(skip(self, deadline))]
    pub async fn credit(&self, user_id: i64, amount: i64, deadline: Deadline) -> Result<Balance> {
        let balance = self
            .uow
            .run("balance_credit", deadline, |mut tx| async move {
                let balance = Self::credit_in_tx(tx.as_mut(), user_id, amount).await?;
                Ok((tx, balance))
            })
            .await?;

        info!(current = balance.current, "积分入账成功");
        Ok(balance)
    }

    /// 扣减
    ///
    /// 可用积分不足时返回 `InsufficientFunds`，不做任何变更
    #[instrument(skip(self, deadline))]
    pub async fn debit(&self, user_id: i64, amount: i64, deadline: Deadline) -> Result<Balance> {
        let balance = self
            .uow
            .run("balance_debit", deadline, |mut tx| async move {
                let balance = Self::debit_in_tx(tx.as_mut(), user_id, amount).await?;
                Ok((tx, balance))
            })
            .await?;

        info!(current = balance.current, "积分扣减成功");
        Ok(balance)
    }

    /// 在事务中入账
    pub(crate) async fn credit_in_tx(
        tx: &mut dyn LedgerTx,
        user_id: i64,
        amount: i64,
    ) -> Result<Balance> {
        let current = tx.lock_balance(user_id).await?;
        let next = current.credit(amount)?;
        tx.update_balance(user_id, next).await?;
        Ok(next)
    }

    /// 在事务中扣减
    pub(crate) async fn debit_in_tx(
        tx: &mut dyn LedgerTx,
        user_id: i64,
        amount: i64,
    ) -> Result<Balance> {
        let current = tx.lock_balance(user_id).await?;
        let next = current.debit(amount)?;
        tx.update_balance(user_id, next).await?;
        Ok(next)
    }
}
