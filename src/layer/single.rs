//! 单个封装层
//!
//! 维护一层的 PDU/SDU 大小。除 ESP 外 SDU = PDU - 开销；ESP 的 PDU 需要按 16 字节对齐填充。

use super::kind::{ESP_BASE_OVERHEAD, ESP_BLOCK, ESP_TRAILER, LayerKind};

/// ESP 为 `sdu` 追加的填充字节数
pub fn esp_padding(sdu: u32) -> u32 {
    let rem = (sdu + ESP_TRAILER) % ESP_BLOCK;
    if rem == 0 { 0 } else { ESP_BLOCK - rem }
}

/// 不超过 `cap` 的最大对齐载荷（形如 16k - 2），至少一个块。
fn esp_aligned_capacity(cap: u32) -> u32 {
    ((cap.saturating_add(ESP_TRAILER) / ESP_BLOCK) * ESP_BLOCK).max(ESP_BLOCK) - ESP_TRAILER
}

/// 封装链中的一层
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layer {
    kind: LayerKind,
    pdu_size: u32,
    sdu_size: u32,
    /// ESP 填充是有损的：记住用户给出的 SDU，在 PDU 驱动的调整后尽量恢复它
    original_sdu_size: u32,
    /// 是否在 WAN 统计中显示这一层
    pub show_stats: bool,
}

impl Layer {
    pub fn new(kind: LayerKind) -> Self {
        let mut layer = Self {
            kind,
            pdu_size: 0,
            sdu_size: 0,
            original_sdu_size: 0,
            show_stats: true,
        };
        layer.set_pdu_size(kind.min_pdu());
        layer
    }

    pub fn kind(&self) -> LayerKind {
        self.kind
    }

    pub fn pdu_size(&self) -> u32 {
        self.pdu_size
    }

    pub fn sdu_size(&self) -> u32 {
        self.sdu_size
    }

    /// 设置 PDU 大小（先按协议上下限截断），返回实际生效的 PDU
    pub fn set_pdu_size(&mut self, size: u32) -> u32 {
        let pdu = size.clamp(self.kind.min_pdu(), self.kind.max_pdu());
        match self.kind {
            LayerKind::EspAes256ShaTunnel => {
                let aligned = esp_aligned_capacity(pdu - ESP_BASE_OVERHEAD);
                let original = self.original_sdu_size;
                self.sdu_size = if original <= aligned && aligned - original < ESP_BLOCK {
                    original
                } else {
                    aligned
                };
                self.pdu_size = aligned + ESP_BASE_OVERHEAD;
            }
            kind => {
                self.pdu_size = pdu;
                self.sdu_size = pdu - kind.overhead();
            }
        }
        self.pdu_size
    }

    /// 以 SDU 为输入计算 PDU（同样受上下限约束），返回实际生效的 PDU
    pub fn set_sdu_size(&mut self, size: u32) -> u32 {
        match self.kind {
            LayerKind::EspAes256ShaTunnel => {
                self.original_sdu_size = size;
                let pdu = size
                    .saturating_add(esp_padding(size))
                    .saturating_add(ESP_BASE_OVERHEAD);
                if pdu > self.kind.max_pdu() {
                    return self.set_pdu_size(self.kind.max_pdu());
                }
                self.sdu_size = size;
                self.pdu_size = pdu;
            }
            kind => {
                let pdu = size
                    .saturating_add(kind.overhead())
                    .clamp(kind.min_pdu(), kind.max_pdu());
                self.pdu_size = pdu;
                self.sdu_size = pdu - kind.overhead();
            }
        }
        self.pdu_size
    }
}
