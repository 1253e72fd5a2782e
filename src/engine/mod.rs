//! 实时发送引擎
//!
//! 令牌桶限速的 UDP 发送循环、回程序号跟踪与周期统计。

// 子模块声明
mod bucket;
mod clock;
mod config;
mod handle;
mod pacing;
mod report;
mod socket;
mod tracker;
mod wire;

// 重新导出公共接口
pub use bucket::TokenBucket;
pub use clock::{Clock, SystemClock};
pub use config::{
    DEFAULT_COMMIT_INTERVAL, DEFAULT_PORT, EngineConfig, LOSS_TIMEOUT, MAX_COMMIT_INTERVAL,
    MAX_DATAGRAM_LEN, MIN_COMMIT_INTERVAL, ReturnFilter, STATS_INTERVAL,
};
pub use handle::PacingEngine;
#[cfg(test)]
pub(crate) use pacing::PacingLoop;
pub use report::{EngineReport, EngineStatus};
pub use socket::{DatagramSocket, SocketOpener, UdpEndpoint, WaitFor, udp_opener};
pub use tracker::{LossTracker, ReturnVerdict};
pub use wire::{DatagramHeader, HEADER_LEN};
