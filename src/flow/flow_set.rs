//! 流集合
//!
//! 同一目的地址、同一 WAN 封装链下的一组流。负责批量启停、统一参考层、
//! 统计汇总以及把实测速率投影到 WAN 链的每一层。

use std::collections::BTreeSet;
use std::net::Ipv4Addr;

use tracing::{debug, info, instrument, warn};

use super::id::FlowId;
use super::stats::{LayerStats, WanLayerStats};
use super::udp_flow::Flow;
use crate::control::ControlMessage;
use crate::engine::{EngineStatus, SocketOpener};
use crate::error::{Error, Result};
use crate::layer::LayerChain;
use crate::model::{BandwidthUnit, LanLayer};

pub struct FlowSet {
    flows: Vec<Flow>,
    next_id: u64,
    destination: Ipv4Addr,
    wan: LayerChain,
    bandwidth_layer: LanLayer,
    pdu_size_layer: LanLayer,
    unit: BandwidthUnit,
    running: bool,
    /// 替换后对新旧流都生效
    opener: Option<SocketOpener>,
    /// 已请求、但回显端尚未确认的流
    pending_echo: BTreeSet<FlowId>,
}

impl Default for FlowSet {
    fn default() -> Self {
        Self::new()
    }
}

impl FlowSet {
    pub fn new() -> Self {
        Self {
            flows: Vec::new(),
            next_id: 0,
            destination: Ipv4Addr::LOCALHOST,
            wan: LayerChain::udp(),
            bandwidth_layer: LanLayer::EthernetL2,
            pdu_size_layer: LanLayer::EthernetL2,
            unit: BandwidthUnit::default(),
            running: false,
            opener: None,
            pending_echo: BTreeSet::new(),
        }
    }

    fn new_flow(&mut self) -> Result<Flow> {
        let id = FlowId(self.next_id);
        self.next_id += 1;
        let mut flow = Flow::new(id);
        flow.set_destination(self.destination)?;
        if let Some(opener) = &self.opener {
            flow.set_socket_opener(opener.clone())?;
        }
        Ok(flow)
    }

    /// 在末尾追加一条默认参数的流
    pub fn add_flow(&mut self) -> Result<FlowId> {
        let index = self.flows.len();
        self.insert_flow(index)
    }

    /// 在 `index` 处插入一条默认参数的流
    pub fn insert_flow(&mut self, index: usize) -> Result<FlowId> {
        let len = self.flows.len();
        if index > len {
            return Err(Error::FlowIndex { index, len });
        }
        let flow = self.new_flow()?;
        let id = flow.id();
        self.flows.insert(index, flow);
        debug!(flow = %id, index, "添加流");
        Ok(id)
    }

    /// 移除并停止 `index` 处的流
    pub fn remove_flow(&mut self, index: usize) -> Result<Flow> {
        let len = self.flows.len();
        if index >= len {
            return Err(Error::FlowIndex { index, len });
        }
        let mut flow = self.flows.remove(index);
        flow.stop();
        self.pending_echo.remove(&flow.id());
        debug!(flow = %flow.id(), index, "移除流");
        Ok(flow)
    }

    /// 移除全部流
    pub fn clear(&mut self) {
        self.stop();
        self.flows.clear();
    }

    pub fn flows(&self) -> &[Flow] {
        &self.flows
    }

    pub fn len(&self) -> usize {
        self.flows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flows.is_empty()
    }

    pub fn flow(&self, id: FlowId) -> Option<&Flow> {
        self.flows.iter().find(|f| f.id() == id)
    }

    pub fn flow_mut(&mut self, id: FlowId) -> Option<&mut Flow> {
        self.flows.iter_mut().find(|f| f.id() == id)
    }

    fn index_of(&self, id: FlowId) -> Result<usize> {
        self.flows
            .iter()
            .position(|f| f.id() == id)
            .ok_or(Error::UnknownFlow(id))
    }

    pub fn destination(&self) -> Ipv4Addr {
        self.destination
    }

    /// 统一修改所有流的目的地址；发送中不允许
    pub fn set_destination(&mut self, destination: Ipv4Addr) -> Result<()> {
        if self.any_running() {
            return Err(Error::Running("destination"));
        }
        if destination.is_unspecified() || destination.is_broadcast() {
            return Err(Error::InvalidDestination(destination.to_string()));
        }
        for flow in &mut self.flows {
            flow.set_destination(destination)?;
        }
        self.destination = destination;
        Ok(())
    }

    pub fn bandwidth_layer(&self) -> LanLayer {
        self.bandwidth_layer
    }

    /// 切换带宽参考层。先把每条流的带宽换算到新层上重新指定，实际速率不变。
    pub fn set_bandwidth_layer(&mut self, layer: LanLayer) -> Result<()> {
        for flow in &mut self.flows {
            let bandwidth = flow.model().bandwidth_at(layer);
            flow.set_bandwidth(bandwidth, layer)?;
        }
        self.bandwidth_layer = layer;
        Ok(())
    }

    pub fn pdu_size_layer(&self) -> LanLayer {
        self.pdu_size_layer
    }

    pub fn set_pdu_size_layer(&mut self, layer: LanLayer) {
        self.pdu_size_layer = layer;
    }

    pub fn bandwidth_unit(&self) -> BandwidthUnit {
        self.unit
    }

    pub fn set_bandwidth_unit(&mut self, unit: BandwidthUnit) {
        self.unit = unit;
    }

    pub fn wan_chain(&self) -> &LayerChain {
        &self.wan
    }

    pub fn wan_chain_mut(&mut self) -> &mut LayerChain {
        &mut self.wan
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// 整体已启动，或有单独启动的流
    fn any_running(&self) -> bool {
        self.running || self.flows.iter().any(Flow::is_running)
    }

    /// 替换所有流打开套接字的方式；有流在发送时不允许
    pub fn set_socket_opener(&mut self, opener: SocketOpener) -> Result<()> {
        if self.any_running() {
            return Err(Error::Running("socket"));
        }
        for flow in &mut self.flows {
            flow.set_socket_opener(opener.clone())?;
        }
        self.opener = Some(opener);
        Ok(())
    }

    /// 引擎已失败退出的流及原因
    pub fn failed_flows(&self) -> Vec<(FlowId, String)> {
        self.flows
            .iter()
            .filter_map(|flow| match flow.status() {
                EngineStatus::Failed(reason) => Some((flow.id(), reason)),
                _ => None,
            })
            .collect()
    }

    /// 启动全部流。任何一条失败时已启动的流全部停止。
    #[instrument(skip(self), fields(flows = self.flows.len()))]
    pub fn start(&mut self) -> Result<()> {
        if self.running {
            return Ok(());
        }
        for index in 0..self.flows.len() {
            if let Err(e) = self.flows[index].start() {
                warn!(flow = %self.flows[index].id(), error = %e, "启动失败，停止全部流");
                self.stop();
                return Err(e);
            }
        }
        self.running = true;
        info!("🚀 全部流已启动");
        Ok(())
    }

    pub fn stop(&mut self) {
        for flow in &mut self.flows {
            flow.stop();
        }
        self.pending_echo.clear();
        if self.running {
            info!("⏹️  全部流已停止");
        }
        self.running = false;
    }

    /// 拉取每条流的引擎报告
    pub fn poll_stats(&mut self) -> bool {
        let mut updated = false;
        for flow in &mut self.flows {
            updated |= flow.poll_stats();
        }
        updated
    }

    /// 所有流在 `layer` 上的实测合计
    pub fn totals(&self, layer: LanLayer) -> LayerStats {
        let mut total = LayerStats::default();
        for flow in &self.flows {
            total += flow.stats(layer);
        }
        total
    }

    /// 所有流在 `layer` 上的指定带宽合计
    pub fn total_specified_bandwidth(&self, layer: LanLayer) -> u64 {
        self.flows.iter().map(|f| f.model().bandwidth_at(layer)).sum()
    }

    /// 把第 `index` 条流的实测速率投影到 WAN 链的每一层
    pub fn wan_projection(&self, index: usize) -> Result<Vec<WanLayerStats>> {
        let len = self.flows.len();
        let flow = self.flows.get(index).ok_or(Error::FlowIndex { index, len })?;
        self.project_flow(flow)
    }

    fn project_flow(&self, flow: &Flow) -> Result<Vec<WanLayerStats>> {
        let mut chain = self.wan.clone();
        chain.set_pdu_size_at(0, flow.model().udp_size())?;
        let stats = flow.stats_snapshot();
        Ok(chain
            .layers()
            .iter()
            .map(|layer| {
                let bits = f64::from(layer.pdu_size()) * 8.0;
                WanLayerStats {
                    kind: layer.kind(),
                    pdu_size: layer.pdu_size(),
                    sent_bps: stats.sent_pps * bits,
                    received_bps: stats.received_pps * bits,
                }
            })
            .collect())
    }

    /// 各 WAN 层（仅 `show_stats` 打开的层）上所有流的合计
    pub fn wan_totals(&self) -> Result<Vec<WanLayerStats>> {
        let mut totals: Vec<WanLayerStats> = self
            .wan
            .layers()
            .iter()
            .map(|layer| WanLayerStats {
                kind: layer.kind(),
                pdu_size: layer.pdu_size(),
                sent_bps: 0.0,
                received_bps: 0.0,
            })
            .collect();

        for flow in &self.flows {
            for (total, layer) in totals.iter_mut().zip(self.project_flow(flow)?) {
                total.sent_bps += layer.sent_bps;
                total.received_bps += layer.received_bps;
            }
        }

        Ok(totals
            .into_iter()
            .zip(self.wan.layers())
            .filter(|(_, layer)| layer.show_stats)
            .map(|(total, _)| total)
            .collect())
    }

    /// 开始远端配置：为每条流生成一条 `newUdpEcho` 请求。
    /// 全部确认后由 [`Self::on_echo_connected`] 启动发送。
    pub fn begin_provisioning(&mut self) -> Vec<ControlMessage> {
        self.pending_echo = self.flows.iter().map(Flow::id).collect();
        info!(flows = self.pending_echo.len(), "请求远端回显");
        self.flows
            .iter()
            .map(|flow| ControlMessage::NewUdpEcho {
                id: flow.id().to_string(),
                port: flow.port(),
                tos: flow.tos(),
            })
            .collect()
    }

    /// 远端确认一条流的回显已就绪。最后一条确认后启动全部流并返回 true。
    pub fn on_echo_connected(&mut self, id: FlowId) -> Result<bool> {
        self.index_of(id)?;
        if !self.pending_echo.remove(&id) {
            debug!(flow = %id, "重复的回显确认");
            return Ok(false);
        }
        debug!(flow = %id, remaining = self.pending_echo.len(), "回显已就绪");
        if !self.pending_echo.is_empty() {
            return Ok(false);
        }
        self.start()?;
        Ok(true)
    }

    /// 还在等待确认的流
    pub fn pending_echo(&self) -> impl Iterator<Item = FlowId> + '_ {
        self.pending_echo.iter().copied()
    }
}
