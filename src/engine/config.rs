//! 发送引擎配置

use std::net::Ipv4Addr;
use std::time::Duration;

use super::wire::HEADER_LEN;

/// 默认承诺间隔 Tc
pub const DEFAULT_COMMIT_INTERVAL: Duration = Duration::from_millis(100);
pub const MIN_COMMIT_INTERVAL: Duration = Duration::from_millis(1);
pub const MAX_COMMIT_INTERVAL: Duration = Duration::from_millis(1000);
/// 统计上报周期
pub const STATS_INTERVAL: Duration = Duration::from_millis(1000);
/// 回显端有这么久的时间应答，超过即计为丢失
pub const LOSS_TIMEOUT: Duration = Duration::from_millis(2000);
/// 目的端口默认值（echo）
pub const DEFAULT_PORT: u16 = 7;
/// 不分片时 UDP 载荷的上限：1500 - IP 头 - UDP 头
pub const MAX_DATAGRAM_LEN: usize = 1500 - 20 - 8;

/// 回程报文的合理性过滤
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReturnFilter {
    pub enabled: bool,
    /// 时延不小于此值的回程报文被丢弃
    pub max_latency: Duration,
}

impl Default for ReturnFilter {
    fn default() -> Self {
        Self {
            enabled: false,
            max_latency: LOSS_TIMEOUT,
        }
    }
}

/// 引擎线程启动时一次性读取的参数
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    /// 每毫秒发送的包数
    pub rate_per_ms: f64,
    /// UDP 载荷长度（不含 UDP 头）
    pub datagram_length: usize,
    pub destination: Ipv4Addr,
    pub port: u16,
    pub tos: u8,
    pub commit_interval: Duration,
    pub filter: ReturnFilter,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            rate_per_ms: 0.0,
            datagram_length: 500,
            destination: Ipv4Addr::LOCALHOST,
            port: DEFAULT_PORT,
            tos: 0,
            commit_interval: DEFAULT_COMMIT_INTERVAL,
            filter: ReturnFilter::default(),
        }
    }
}

impl EngineConfig {
    /// 实际使用的数据报长度：至少容纳报头，且不超过不分片上限
    pub fn effective_datagram_length(&self) -> usize {
        self.datagram_length.clamp(HEADER_LEN, MAX_DATAGRAM_LEN)
    }
}
