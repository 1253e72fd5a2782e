//! 单条流的速率模型
//!
//! 在包长、带宽与每秒包数之间换算。包长与带宽可以在不同的参考层上给出，
//! 内部统一以 UDP PDU 大小保存。

use tracing::trace;

use super::lan::{L2_OVERHEAD, L3_OVERHEAD, LanLayer};

/// 最小 UDP PDU：最短以太网帧去掉 L2 与 IP 开销
pub const MIN_UDP_SIZE: u32 = 64 - L2_OVERHEAD - L3_OVERHEAD;
/// 最大 UDP PDU：IP MTU 去掉 IP 头
pub const MAX_UDP_SIZE: u32 = 1500 - L3_OVERHEAD;

/// 包长/带宽/pps 换算表
#[derive(Debug, Clone, PartialEq)]
pub struct FlowRateModel {
    udp_size: u32,
    bandwidth: u64,
    bandwidth_layer: LanLayer,
    pps: f64,
}

impl Default for FlowRateModel {
    fn default() -> Self {
        let mut model = Self {
            udp_size: 1000,
            bandwidth: 100,
            bandwidth_layer: LanLayer::EthernetL2,
            pps: 0.0,
        };
        model.recompute_pps();
        model
    }
}

impl FlowRateModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// 以 `layer` 上的 PDU 大小设置包长，带宽保持不变
    pub fn set_pdu_size(&mut self, size: u32, layer: LanLayer) {
        let udp = size.saturating_sub(layer.overhead_above_udp());
        self.udp_size = udp.clamp(MIN_UDP_SIZE, MAX_UDP_SIZE);
        self.recompute_pps();
        trace!(size, %layer, udp_size = self.udp_size, pps = self.pps, "包长已更新");
    }

    /// 以 `layer` 上的带宽（bit/s）设置速率，包长保持不变
    pub fn set_bandwidth(&mut self, bits_per_sec: u64, layer: LanLayer) {
        self.bandwidth = bits_per_sec;
        self.bandwidth_layer = layer;
        self.recompute_pps();
        trace!(bits_per_sec, %layer, pps = self.pps, "带宽已更新");
    }

    fn recompute_pps(&mut self) {
        let bits_per_packet = self.pdu_size_at(self.bandwidth_layer) as f64 * 8.0;
        self.pps = self.bandwidth as f64 / bits_per_packet;
    }

    /// `layer` 上的 PDU 大小
    pub fn pdu_size_at(&self, layer: LanLayer) -> u32 {
        self.udp_size + layer.overhead_above_udp()
    }

    /// 当前速率在 `layer` 上对应的带宽，四舍五入到整数
    pub fn bandwidth_at(&self, layer: LanLayer) -> u64 {
        self.pps_to_bandwidth(self.pps, layer).round() as u64
    }

    /// 把任意 pps（例如实测值）换算成 `layer` 上的带宽
    pub fn pps_to_bandwidth(&self, pps: f64, layer: LanLayer) -> f64 {
        pps * self.pdu_size_at(layer) as f64 * 8.0
    }

    pub fn pps(&self) -> f64 {
        self.pps
    }

    /// UDP PDU 大小（含 8 字节 UDP 头）
    pub fn udp_size(&self) -> u32 {
        self.udp_size
    }

    /// 用户指定的带宽（bit/s），在 [`Self::bandwidth_layer`] 上
    pub fn specified_bandwidth(&self) -> u64 {
        self.bandwidth
    }

    pub fn bandwidth_layer(&self) -> LanLayer {
        self.bandwidth_layer
    }
}
