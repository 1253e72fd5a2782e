//! 引擎上报给所有者的统计与状态

use std::time::Duration;

/// 一次统计上报。计数均为本次运行开始以来的累计值。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EngineReport {
    pub lost: u64,
    pub sent: u64,
    pub received: u64,
    /// 因套接字暂不可写而作废的令牌数
    pub not_sent: u64,
    /// 距上一次上报（或启动）的时间
    pub interval: Duration,
}

impl EngineReport {
    /// 线程退出时发出的全零报告
    pub fn is_final(&self) -> bool {
        *self == Self::default()
    }
}

/// 引擎状态
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum EngineStatus {
    #[default]
    Stopped,
    Running,
    /// 套接字无法打开/配置，线程已退出
    Failed(String),
}
