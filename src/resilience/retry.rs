//! 带指数退避的重试
//!
//! 所有对远程文档存储的读写都经过 [`with_retry`]，调用方无需关心重试细节。
//! 被包装的操作必须是幂等的，本层不会对副作用去重。

use rand::Rng;
use std::future::Future;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::classify::Cancelled;
use crate::config::ResilienceConfig;

/// 重试策略
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// 最多调用操作的次数（包含第一次）
    pub max_attempts: u32,
    /// 第一次重试前的等待时间
    pub base_delay: Duration,
    /// 单次等待的上限
    pub max_delay: Duration,
    /// 抖动比例 (0.0 ~ 1.0)，0 表示不加抖动
    pub jitter_factor: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(300),
            max_delay: Duration::from_secs(10),
            jitter_factor: 0.0,
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
            ..Self::default()
        }
    }

    pub fn from_config(config: &ResilienceConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            base_delay: Duration::from_millis(config.base_delay_ms),
            max_delay: Duration::from_millis(config.max_delay_ms.max(config.base_delay_ms)),
            jitter_factor: sanitize_jitter(config.jitter_factor),
        }
    }

    pub fn max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    pub fn jitter_factor(mut self, factor: f64) -> Self {
        self.jitter_factor = sanitize_jitter(factor);
        self
    }

    /// 第 `attempt_index` 次失败（从 0 开始）之后的等待时间：`base_delay × 2^attempt_index`
    pub fn delay_for(&self, attempt_index: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt_index);
        let delay = self
            .base_delay
            .checked_mul(factor)
            .unwrap_or(self.max_delay)
            .min(self.max_delay);

        if self.jitter_factor <= 0.0 || delay.is_zero() {
            return delay;
        }

        let spread = delay.as_secs_f64() * self.jitter_factor;
        let offset = rand::rng().random_range(-spread..=spread);
        Duration::from_secs_f64((delay.as_secs_f64() + offset).max(0.0))
    }
}

/// 非有限值按不抖动处理
fn sanitize_jitter(factor: f64) -> f64 {
    if factor.is_finite() {
        factor.clamp(0.0, 1.0)
    } else {
        warn!("Ignoring non-finite jitter factor {}", factor);
        0.0
    }
}

/// 等待取消信号；没有提供令牌时永远不会完成
pub(crate) async fn cancelled(cancel: Option<&CancellationToken>) {
    match cancel {
        Some(token) => token.cancelled().await,
        None => std::future::pending::<()>().await,
    }
}

/// 执行操作，失败时按策略退避重试
///
/// - 成功立即返回
/// - 次数耗尽时原样返回最后一次的错误
/// - `cancel` 被触发时立即停止，返回 `E::from(Cancelled)`
pub async fn with_retry<T, E, F, Fut>(
    policy: &RetryPolicy,
    cancel: Option<&CancellationToken>,
    mut operation: F,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: From<Cancelled> + std::fmt::Display,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt: u32 = 0;

    loop {
        if cancel.is_some_and(|token| token.is_cancelled()) {
            debug!("Retry sequence cancelled before attempt {}", attempt + 1);
            return Err(E::from(Cancelled));
        }

        match operation().await {
            Ok(value) => {
                if attempt > 0 {
                    debug!("Operation succeeded after {} retries", attempt);
                }
                return Ok(value);
            }
            Err(error) => {
                if attempt + 1 >= max_attempts {
                    warn!(
                        "Operation failed after {} attempts, giving up: {}",
                        max_attempts, error
                    );
                    return Err(error);
                }

                let delay = policy.delay_for(attempt);
                warn!(
                    "Operation failed (attempt {}/{}), retrying in {:?}: {}",
                    attempt + 1,
                    max_attempts,
                    delay,
                    error
                );

                tokio::select! {
                    _ = tokio::time::sleep(delay) => {}
                    _ = cancelled(cancel) => {
                        debug!("Retry backoff cancelled after attempt {}", attempt + 1);
                        return Err(E::from(Cancelled));
                    }
                }

                attempt += 1;
            }
        }
    }
}
