//! 封装层模型
//!
//! 描述一个 UDP 数据报在 WAN 上经过的封装层（IP、GRE、IPSec ESP、以太网……），
//! 并在各层之间换算 PDU 大小。纯计算，不做任何 I/O。

// 子模块声明
mod chain;
mod kind;
mod single;

// 重新导出公共接口
pub use chain::LayerChain;
pub use kind::{ESP_BASE_OVERHEAD, ESP_BLOCK, LayerKind};
pub use single::{Layer, esp_padding};
