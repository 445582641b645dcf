//! 原子单元重试
//!
//! 账务写操作遇到瞬时存储故障（连接池等待超时、死锁、序列化冲突）时，
//! 整个原子单元从头重放。哪些错误可重放由调用方判定，余额不足这类业务结果
//! 永远不会被重放。

use std::future::Future;
use std::time::Duration;

use tracing::{debug, info, warn};

/// 重试策略
///
/// 第 n 次重放前等待 `initial_delay * multiplier^n`，不超过 `max_delay`。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    /// 首次执行之外最多再重放几次
    pub max_retries: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
    pub multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay: Duration::from_millis(20),
            max_delay: Duration::from_millis(500),
            multiplier: 2.0,
        }
    }
}

impl RetryPolicy {
    /// 只执行一次，不重放
    pub fn no_retry() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    /// 总执行次数上限（含首次）
    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// 第 `retry` 次重放前的等待时间，`retry` 从 0 计
    pub fn backoff(&self, retry: u32) -> Duration {
        let exponent = i32::try_from(retry).unwrap_or(i32::MAX);
        let factor = self.multiplier.max(1.0).powi(exponent);
        let millis = self.initial_delay.as_millis() as f64 * factor;
        let cap = self.max_delay.as_millis() as f64;
        Duration::from_millis(millis.min(cap) as u64)
    }
}

/// 按策略执行异步操作
///
/// `operation` 每次调用都必须重新构造完整的原子单元；
/// `is_retryable` 返回 false 的错误立即返回，不再重放。
pub async fn retry_with_policy<F, Fut, T, E>(
    policy: &RetryPolicy,
    operation_name: &str,
    is_retryable: impl Fn(&E) -> bool,
    mut operation: F,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    let mut retry: u32 = 0;

    loop {
        let err = match operation().await {
            Ok(value) => {
                if retry > 0 {
                    info!(operation = operation_name, retries = retry, "重放后成功");
                }
                return Ok(value);
            }
            Err(err) => err,
        };

        if !is_retryable(&err) {
            debug!(operation = operation_name, error = %err, "不可重放的错误");
            return Err(err);
        }

        if retry >= policy.max_retries {
            warn!(
                operation = operation_name,
                attempts = policy.max_attempts(),
                error = %err,
                "重放次数已用尽"
            );
            return Err(err);
        }

        let delay = policy.backoff(retry);
        warn!(
            operation = operation_name,
            retry,
            delay_ms = delay.as_millis() as u64,
            error = %err,
            "瞬时故障，退避后重放"
        );
        tokio::time::sleep(delay).await;
        retry += 1;
    }
}
