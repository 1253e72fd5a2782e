//! 流统计快照

use crate::engine::EngineReport;
use crate::layer::LayerKind;

/// 由引擎累计计数推导出的一次快照
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FlowStats {
    pub lost: u64,
    pub sent_packets: u64,
    pub received_packets: u64,
    pub not_sent_packets: u64,
    pub sent_pps: f64,
    pub received_pps: f64,
}

impl FlowStats {
    /// 用上一份快照与新报告的计数差算出速率
    pub(crate) fn advance(&self, report: &EngineReport) -> Self {
        let secs = report.interval.as_secs_f64();
        let rate = |now: u64, before: u64| {
            if secs > 0.0 {
                now.saturating_sub(before) as f64 / secs
            } else {
                0.0
            }
        };
        Self {
            lost: report.lost,
            sent_packets: report.sent,
            received_packets: report.received,
            not_sent_packets: report.not_sent,
            sent_pps: rate(report.sent, self.sent_packets),
            received_pps: rate(report.received, self.received_packets),
        }
    }
}

/// 某一参考层上的流量
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LayerStats {
    pub lost: u64,
    pub sent_bps: f64,
    pub received_bps: f64,
}

impl std::ops::AddAssign for LayerStats {
    fn add_assign(&mut self, rhs: Self) {
        self.lost += rhs.lost;
        self.sent_bps += rhs.sent_bps;
        self.received_bps += rhs.received_bps;
    }
}

/// WAN 链上一层的投影
#[derive(Debug, Clone, PartialEq)]
pub struct WanLayerStats {
    pub kind: LayerKind,
    pub pdu_size: u32,
    pub sent_bps: f64,
    pub received_bps: f64,
}
