//! 单条 UDP 流
//!
//! 把"某层上的包长 + 某层上的带宽"经 [`FlowRateModel`] 换算成引擎需要的
//! (每毫秒包数, 载荷长度)，并把引擎的累计计数整理成带宽与丢包统计。

use std::net::Ipv4Addr;
use std::sync::mpsc::Receiver;
use std::time::Duration;

use tracing::{debug, info};

use super::id::FlowId;
use super::stats::{FlowStats, LayerStats};
use crate::engine::{
    EngineConfig, EngineReport, EngineStatus, PacingEngine, ReturnFilter, SocketOpener,
};
use crate::error::{Error, Result};
use crate::model::{FlowRateModel, LanLayer, UDP_HEADER};

/// 新流的默认带宽（bit/s，UDP 层）
pub const DEFAULT_BANDWIDTH: u64 = 10_000;
/// 新流的默认包长（UDP 层）
pub const DEFAULT_PDU_SIZE: u32 = 500;
pub const MAX_DSCP: u8 = 63;

pub struct Flow {
    id: FlowId,
    name: String,
    dscp: u8,
    model: FlowRateModel,
    engine: PacingEngine,
    reports: Receiver<EngineReport>,
    stats: FlowStats,
}

impl Flow {
    pub fn new(id: FlowId) -> Self {
        let (engine, reports) = PacingEngine::with_channel();
        let mut flow = Self {
            id,
            name: id.to_string(),
            dscp: 0,
            model: FlowRateModel::new(),
            engine,
            reports,
            stats: FlowStats::default(),
        };
        flow.model.set_bandwidth(DEFAULT_BANDWIDTH, LanLayer::Udp);
        flow.model.set_pdu_size(DEFAULT_PDU_SIZE, LanLayer::Udp);
        // 引擎尚未运行，推送不会失败
        if let Err(e) = flow.push_to_engine() {
            debug!(flow = %id, error = %e, "初始参数推送失败");
        }
        flow
    }

    pub fn id(&self) -> FlowId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn model(&self) -> &FlowRateModel {
        &self.model
    }

    /// 引擎当前配置的副本
    pub fn engine_config(&self) -> EngineConfig {
        self.engine.config()
    }

    /// 以 `layer` 上的带宽（bit/s）指定速率
    pub fn set_bandwidth(&mut self, bits_per_sec: u64, layer: LanLayer) -> Result<()> {
        self.model.set_bandwidth(bits_per_sec, layer);
        self.push_to_engine()
    }

    /// 以 `layer` 上的 PDU 大小指定包长
    pub fn set_pdu_size(&mut self, size: u32, layer: LanLayer) -> Result<()> {
        self.model.set_pdu_size(size, layer);
        self.push_to_engine()
    }

    fn push_to_engine(&mut self) -> Result<()> {
        let rate_per_ms = self.model.pps() / 1_000.0;
        let datagram_length = (self.model.udp_size() - UDP_HEADER) as usize;
        debug!(flow = %self.id, rate_per_ms, datagram_length, "更新引擎参数");
        self.engine.set_rate_and_length(rate_per_ms, datagram_length)
    }

    pub fn dscp(&self) -> u8 {
        self.dscp
    }

    /// DSCP 占 ToS 字节的高 6 位
    pub fn set_dscp(&mut self, dscp: u8) -> Result<()> {
        if dscp > MAX_DSCP {
            return Err(Error::Dscp(dscp));
        }
        self.engine.set_tos(dscp << 2)?;
        self.dscp = dscp;
        Ok(())
    }

    pub fn tos(&self) -> u8 {
        self.dscp << 2
    }

    pub fn port(&self) -> u16 {
        self.engine.config().port
    }

    pub fn set_port(&mut self, port: u16) -> Result<()> {
        self.engine.set_port(port)
    }

    pub fn set_destination(&mut self, destination: Ipv4Addr) -> Result<()> {
        self.engine.set_destination(destination)
    }

    pub fn commit_interval(&self) -> Duration {
        self.engine.config().commit_interval
    }

    pub fn set_commit_interval(&mut self, interval: Duration) -> Result<()> {
        self.engine.set_commit_interval(interval)
    }

    pub fn set_socket_opener(&mut self, opener: SocketOpener) -> Result<()> {
        self.engine.set_socket_opener(opener)
    }

    pub fn set_return_filter(&mut self, filter: ReturnFilter) -> Result<()> {
        self.engine.set_return_filter(filter)
    }

    pub fn start(&mut self) -> Result<()> {
        info!(
            flow = %self.id,
            name = %self.name,
            pps = self.model.pps(),
            udp_size = self.model.udp_size(),
            "▶️  启动流"
        );
        self.engine.start()
    }

    pub fn stop(&mut self) {
        self.engine.stop();
    }

    pub fn is_running(&self) -> bool {
        self.engine.is_running()
    }

    pub fn status(&self) -> EngineStatus {
        self.engine.status()
    }

    /// 取出引擎积压的报告并更新快照。有新报告时返回 true。
    pub fn poll_stats(&mut self) -> bool {
        let mut updated = false;
        while let Ok(report) = self.reports.try_recv() {
            self.apply_report(&report);
            updated = true;
        }
        updated
    }

    pub(crate) fn apply_report(&mut self, report: &EngineReport) {
        self.stats = if report.is_final() {
            FlowStats::default()
        } else {
            self.stats.advance(report)
        };
    }

    pub fn stats_snapshot(&self) -> FlowStats {
        self.stats
    }

    /// 实测速率在 `layer` 上对应的带宽
    pub fn stats(&self, layer: LanLayer) -> LayerStats {
        LayerStats {
            lost: self.stats.lost,
            sent_bps: self.model.pps_to_bandwidth(self.stats.sent_pps, layer),
            received_bps: self.model.pps_to_bandwidth(self.stats.received_pps, layer),
        }
    }
}

impl std::fmt::Debug for Flow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Flow")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("dscp", &self.dscp)
            .field("model", &self.model)
            .field("stats", &self.stats)
            .finish_non_exhaustive()
    }
}
