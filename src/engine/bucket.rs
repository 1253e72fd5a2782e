//! 令牌桶
//!
//! 每个承诺间隔 Tc 把桶重新装到 Bc = Tc × rate 个包。未用完的整令牌作废（计入"未发送"），
//! 小数部分结转到下一个间隔，因此非整数的 Bc 长期平均下来仍然准确。

use std::time::Duration;

#[derive(Debug, Clone, PartialEq)]
pub struct TokenBucket {
    burst: f64,
    credit: f64,
}

impl TokenBucket {
    /// `rate_per_ms`：每毫秒包数
    pub fn new(rate_per_ms: f64, commit_interval: Duration) -> Self {
        let burst = (rate_per_ms * commit_interval.as_secs_f64() * 1_000.0).max(0.0);
        Self { burst, credit: 0.0 }
    }

    /// Bc
    pub fn burst(&self) -> f64 {
        self.burst
    }

    /// 重新装桶，返回作废的整令牌数
    pub fn refill(&mut self) -> u64 {
        let unused = self.credit.floor();
        self.credit = self.burst + (self.credit - unused);
        unused as u64
    }

    pub fn tokens(&self) -> u64 {
        self.credit.floor() as u64
    }

    pub fn has_token(&self) -> bool {
        self.credit >= 1.0
    }

    /// 取出一个令牌
    pub fn take(&mut self) -> bool {
        if !self.has_token() {
            return false;
        }
        self.credit -= 1.0;
        true
    }
}
