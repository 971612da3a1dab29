//! 请求节流
//!
//! 翻页之间、章节之间的礼貌等待。

use std::time::Duration;

use rand::Rng;
use tokio_util::sync::CancellationToken;

use crate::core::config::{DelayConfig, DelayMode};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Throttle {
    min: Duration,
    max: Duration,
}

impl Throttle {
    pub fn from_config(config: &DelayConfig) -> Self {
        match config.mode {
            DelayMode::Random => Self {
                min: Duration::from_millis(config.min_ms),
                max: Duration::from_millis(config.max_ms.max(config.min_ms)),
            },
            DelayMode::Fixed => {
                let fixed = Duration::from_millis(config.fixed_ms);
                Self { min: fixed, max: fixed }
            }
        }
    }

    /// 不等待 (仅测试)
    #[cfg(test)]
    pub fn immediate() -> Self {
        Self {
            min: Duration::ZERO,
            max: Duration::ZERO,
        }
    }

    /// 固定间隔 (仅测试)
    #[cfg(test)]
    pub fn fixed(delay: Duration) -> Self {
        Self {
            min: delay,
            max: delay,
        }
    }

    pub fn next_delay(&self) -> Duration {
        if self.min >= self.max {
            return self.min;
        }
        let (low, high) = (self.min.as_millis() as u64, self.max.as_millis() as u64);
        Duration::from_millis(rand::rng().random_range(low..=high))
    }

    /// 等待一个随机间隔；期间收到取消信号时提前返回 `false`
    pub async fn pause(&self, cancel: &CancellationToken) -> bool {
        let delay = self.next_delay();
        if delay.is_zero() {
            return !cancel.is_cancelled();
        }
        tokio::select! {
            _ = cancel.cancelled() => false,
            _ = tokio::time::sleep(delay) => true,
        }
    }
}
