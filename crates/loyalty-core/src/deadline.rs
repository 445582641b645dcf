//! 调用方截止时间
//!
//! 每个业务操作都接受一个截止时间。事务体在截止时间内执行，超时则丢弃事务体
//! （事务随之回滚）并返回 `DeadlineExceeded`；事务体完成后的提交不受截止时间打断。

use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;

use crate::error::{LoyaltyError, Result};

/// 截止时间
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Deadline(Option<Instant>);

impl Deadline {
    /// 不限时
    pub fn none() -> Self {
        Self(None)
    }

    /// 指定时刻截止
    pub fn at(instant: Instant) -> Self {
        Self(Some(instant))
    }

    /// 从现在起经过指定时长后截止
    pub fn after(timeout: Duration) -> Self {
        Self(Some(Instant::now() + timeout))
    }

    /// 可选时长，None 表示不限时
    pub fn from_timeout(timeout: Option<Duration>) -> Self {
        timeout.map(Self::after).unwrap_or_default()
    }

    pub fn instant(&self) -> Option<Instant> {
        self.0
    }

    /// 是否已过期
    pub fn is_expired(&self) -> bool {
        self.0.is_some_and(|at| Instant::now() >= at)
    }

    /// 在截止时间内执行
    ///
    /// 超时时 future 被丢弃，其持有的事务随 drop 回滚
    pub async fn run<T, F>(&self, fut: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        match self.0 {
            None => fut.await,
            Some(at) => tokio::time::timeout_at(at, fut)
                .await
                .map_err(|_| LoyaltyError::DeadlineExceeded)?,
        }
    }
}
