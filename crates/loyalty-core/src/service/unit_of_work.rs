//! 原子单元执行器

use std::future::Future;
use std::sync::Arc;

use loyalty_shared::retry::{RetryPolicy, retry_with_policy};

use crate::deadline::Deadline;
use crate::error::{LoyaltyError, Result};
use crate::repository::{LedgerStore, LedgerTx};

/// 原子单元执行器
///
/// 事务体接管事务并在成功时交还，出错时事务随 drop 回滚。
/// 开启事务与事务体受截止时间约束，提交不受约束。
#[derive(Clone)]
pub struct UnitOfWork {
    store: Arc<dyn LedgerStore>,
    policy: RetryPolicy,
}

impl UnitOfWork {
    pub fn new(store: Arc<dyn LedgerStore>, policy: RetryPolicy) -> Self {
        Self { store, policy }
    }

    pub fn store(&self) -> &dyn LedgerStore {
        self.store.as_ref()
    }

    /// 执行一个原子单元
    ///
    /// 瞬时故障按重试策略从头重放整个事务体；截止时间已过则不再发起新的尝试
    pub async fn run<T, F, Fut>(&self, operation: &str, deadline: Deadline, body: F) -> Result<T>
    where
        F: Fn(Box<dyn LedgerTx>) -> Fut,
        Fut: Future<Output = Result<(Box<dyn LedgerTx>, T)>>,
    {
        let store = self.store.as_ref();
        let body = &body;

        retry_with_policy(&self.policy, operation, LoyaltyError::is_retryable, move || async move {
            if deadline.is_expired() {
                return Err(LoyaltyError::DeadlineExceeded);
            }

            let (tx, value) = deadline
                .run(async {
                    let tx = store.begin().await?;
                    body(tx).await
                })
                .await?;

            tx.commit().await?;
            Ok(value)
        })
        .await
    }
}
