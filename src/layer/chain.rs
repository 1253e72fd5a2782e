//! 封装层链
//!
//! 下标 0 为 UDP（最内层），最后一个元素为最外层的物理层。相邻关系即下标 ±1。

use tracing::{debug, trace};

use super::kind::LayerKind;
use super::single::Layer;
use crate::error::{Error, Result};

/// 有序的封装层序列
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayerChain {
    layers: Vec<Layer>,
}

impl Default for LayerChain {
    fn default() -> Self {
        Self::udp()
    }
}

impl LayerChain {
    /// 空链
    pub fn new() -> Self {
        Self { layers: Vec::new() }
    }

    /// 只含 UDP 的链
    pub fn udp() -> Self {
        Self {
            layers: vec![Layer::new(LayerKind::Udp)],
        }
    }

    /// 依次追加 `kinds` 构造一条链
    pub fn from_kinds(kinds: &[LayerKind]) -> Result<Self> {
        let mut chain = Self::new();
        chain.replace_all(kinds)?;
        Ok(chain)
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    pub fn kinds(&self) -> Vec<LayerKind> {
        self.layers.iter().map(Layer::kind).collect()
    }

    pub fn pdu_sizes(&self) -> Vec<u32> {
        self.layers.iter().map(Layer::pdu_size).collect()
    }

    pub fn outermost(&self) -> Option<&Layer> {
        self.layers.last()
    }

    pub fn set_show_stats(&mut self, index: usize, show: bool) -> Result<()> {
        let len = self.layers.len();
        let layer = self
            .layers
            .get_mut(index)
            .ok_or(Error::LayerIndex { index, len })?;
        layer.show_stats = show;
        Ok(())
    }

    /// 设置最外层（最近追加的一层）是否显示统计
    pub fn set_outermost_show_stats(&mut self, show: bool) {
        if let Some(layer) = self.layers.last_mut() {
            layer.show_stats = show;
        }
    }

    /// 检查 `kind` 能否追加在当前最外层之外
    fn check_append(outermost: Option<LayerKind>, kind: LayerKind) -> Result<()> {
        match outermost {
            None if kind == LayerKind::Udp => Ok(()),
            None => Err(Error::ChainMustStartWithUdp(kind)),
            Some(inner) if inner.accepts_sub_layer(kind) => Ok(()),
            Some(inner) => Err(Error::InvalidChain { inner, outer: kind }),
        }
    }

    /// 在最外侧追加一层
    pub fn append(&mut self, kind: LayerKind) -> Result<()> {
        Self::check_append(self.outermost().map(Layer::kind), kind)?;

        let mut layer = Layer::new(kind);
        if let Some(inner) = self.layers.last() {
            layer.set_sdu_size(inner.pdu_size());
        }
        self.layers.push(layer);
        debug!(layer = %kind, len = self.layers.len(), "追加封装层");

        // 外层的最小帧长可能反过来撑大内层
        let udp_pdu = self.layers[0].pdu_size();
        self.propagate(0, udp_pdu);
        Ok(())
    }

    /// 移除最外层；UDP 层永远保留
    pub fn remove_outermost(&mut self) {
        if self.layers.len() <= 1 {
            return;
        }
        if let Some(layer) = self.layers.pop() {
            debug!(layer = %layer.kind(), len = self.layers.len(), "移除封装层");
        }
    }

    /// 整体替换。先校验整条链，失败时保持原状。
    pub fn replace_all(&mut self, kinds: &[LayerKind]) -> Result<()> {
        if kinds.is_empty() {
            return Err(Error::EmptyChain);
        }
        let mut outermost = None;
        for &kind in kinds {
            Self::check_append(outermost, kind)?;
            outermost = Some(kind);
        }

        let udp_pdu = self.layers.first().map(Layer::pdu_size);
        self.layers.clear();
        for &kind in kinds {
            self.append(kind)?;
        }
        if let Some(size) = udp_pdu.filter(|_| !self.layers.is_empty()) {
            self.propagate(0, size);
        }
        Ok(())
    }

    /// 设置第 `index` 层的 PDU 并把变化传播到整条链，返回每层最终的 PDU。
    ///
    /// 截断与 ESP 填充都是非线性的，结果可能与请求值不同，但整条链保持自洽。
    pub fn set_pdu_size_at(&mut self, index: usize, size: u32) -> Result<Vec<u32>> {
        let len = self.layers.len();
        if index >= len {
            return Err(Error::LayerIndex { index, len });
        }
        self.propagate(index, size);
        Ok(self.pdu_sizes())
    }

    fn propagate(&mut self, index: usize, size: u32) {
        let n = self.layers.len();
        trace!(index, size, layers = n, "传播 PDU 大小");

        // 1. 从被修改的层向内：本层 SDU 即内层请求的 PDU
        let mut requested = size;
        for layer in self.layers[..=index].iter_mut().rev() {
            layer.set_pdu_size(requested);
            requested = layer.sdu_size();
        }

        // 2. 从 UDP 向外：内层 PDU 即本层 SDU
        for i in 1..n {
            let inner_pdu = self.layers[i - 1].pdu_size();
            self.layers[i].set_sdu_size(inner_pdu);
        }

        // 3. 外层可能被截断，再从最外层的 SDU 向内修正一次
        for i in (0..n.saturating_sub(1)).rev() {
            let outer_sdu = self.layers[i + 1].sdu_size();
            self.layers[i].set_pdu_size(outer_sdu);
        }

        // 4. ESP 对齐可能让内层 PDU 比外层 SDU 小，向外补齐
        for i in 1..n {
            let inner_pdu = self.layers[i - 1].pdu_size();
            if self.layers[i].sdu_size() != inner_pdu {
                self.layers[i].set_sdu_size(inner_pdu);
            }
        }

        debug!(pdu_sizes = ?self.pdu_sizes(), "封装链已更新");
    }
}
