//! 工程文件
//!
//! 以 JSON 保存一组流的参数、参考层与 WAN 封装链，下次加载时原样恢复。

use std::fs;
use std::net::Ipv4Addr;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::engine::DEFAULT_PORT;
use crate::error::Result;
use crate::flow::FlowSet;
use crate::layer::{LayerChain, LayerKind};
use crate::model::{BandwidthUnit, LanLayer};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectFile {
    pub destination: Ipv4Addr,
    pub bandwidth_layer: LanLayer,
    pub pdu_size_layer: LanLayer,
    #[serde(default)]
    pub bandwidth_unit: BandwidthUnit,
    #[serde(default)]
    pub flows: Vec<FlowEntry>,
    #[serde(default)]
    pub wan_layers: Vec<WanLayerEntry>,
}

/// 一条流。带宽与包长分别在工程的两个参考层上给出。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowEntry {
    pub name: String,
    pub bandwidth: u64,
    pub dscp: u8,
    pub size: u32,
    /// 承诺间隔，毫秒
    pub tc: u32,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

/// WAN 链的一层，按短名称保存
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WanLayerEntry {
    pub name: String,
    #[serde(default = "default_stats")]
    pub stats: bool,
}

fn default_stats() -> bool {
    true
}

impl ProjectFile {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)?;
        let project: Self = serde_json::from_str(&text)?;
        info!(
            path = %path.display(),
            flows = project.flows.len(),
            wan_layers = project.wan_layers.len(),
            "📂 已读取工程文件"
        );
        Ok(project)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let text = serde_json::to_string_pretty(self)?;
        fs::write(path, text)?;
        info!(path = %path.display(), "💾 已保存工程文件");
        Ok(())
    }

    /// 按保存的短名称重建 WAN 链。遇到未知名称或不合法的封装关系即停止，
    /// 结果为空时退回只含 UDP 的链。
    pub fn wan_chain(&self) -> LayerChain {
        let mut chain = LayerChain::new();
        for entry in &self.wan_layers {
            let Some(kind) = LayerKind::from_short_name(&entry.name) else {
                warn!(name = %entry.name, "未知的封装层名称，忽略其后的层");
                break;
            };
            if let Err(e) = chain.append(kind) {
                warn!(error = %e, "封装层顺序不合法，忽略其后的层");
                break;
            }
            chain.set_outermost_show_stats(entry.stats);
        }
        if chain.is_empty() {
            debug!("工程中没有可用的封装层，使用 UDP");
            return LayerChain::udp();
        }
        chain
    }
}

impl FlowSet {
    /// 当前参数的快照
    pub fn to_project(&self) -> ProjectFile {
        ProjectFile {
            destination: self.destination(),
            bandwidth_layer: self.bandwidth_layer(),
            pdu_size_layer: self.pdu_size_layer(),
            bandwidth_unit: self.bandwidth_unit(),
            flows: self
                .flows()
                .iter()
                .map(|flow| FlowEntry {
                    name: flow.name().to_string(),
                    bandwidth: flow.model().bandwidth_at(self.bandwidth_layer()),
                    dscp: flow.dscp(),
                    size: flow.model().pdu_size_at(self.pdu_size_layer()),
                    tc: flow.commit_interval().as_millis() as u32,
                    port: flow.port(),
                })
                .collect(),
            wan_layers: self
                .wan_chain()
                .layers()
                .iter()
                .map(|layer| WanLayerEntry {
                    name: layer.kind().short_name().to_string(),
                    stats: layer.show_stats,
                })
                .collect(),
        }
    }

    /// 用工程内容替换全部流与设置。任何参数非法时保持原状。
    pub fn apply_project(&mut self, project: &ProjectFile) -> Result<()> {
        let mut next = FlowSet::new();
        next.set_destination(project.destination)?;
        next.set_bandwidth_unit(project.bandwidth_unit);
        next.set_bandwidth_layer(project.bandwidth_layer)?;
        next.set_pdu_size_layer(project.pdu_size_layer);

        for entry in &project.flows {
            let id = next.add_flow()?;
            if let Some(flow) = next.flow_mut(id) {
                flow.set_name(entry.name.clone());
                flow.set_dscp(entry.dscp)?;
                flow.set_commit_interval(Duration::from_millis(u64::from(entry.tc)))?;
                flow.set_port(entry.port)?;
                flow.set_pdu_size(entry.size, project.pdu_size_layer)?;
                flow.set_bandwidth(entry.bandwidth, project.bandwidth_layer)?;
            }
        }
        *next.wan_chain_mut() = project.wan_chain();

        self.stop();
        *self = next;
        debug!(flows = self.len(), wan = ?self.wan_chain().kinds(), "工程已应用");
        Ok(())
    }
}
