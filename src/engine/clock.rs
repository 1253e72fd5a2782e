//! 时钟抽象：单调时间用于节拍，墙上时间用于报文时间戳。

use std::time::{Instant, SystemTime, UNIX_EPOCH};

pub trait Clock {
    fn now(&self) -> Instant;
    fn unix_millis(&self) -> u64;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn unix_millis(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0)
    }
}
