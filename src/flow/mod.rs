//! 流与流集合
//!
//! [`Flow`] 把速率模型与发送引擎绑在一起；[`FlowSet`] 管理共享目的地址与 WAN 链的一组流。

// 子模块声明
mod flow_set;
mod id;
mod stats;
mod udp_flow;

// 重新导出公共接口
pub use flow_set::FlowSet;
pub use id::FlowId;
pub use stats::{FlowStats, LayerStats, WanLayerStats};
pub use udp_flow::{DEFAULT_BANDWIDTH, DEFAULT_PDU_SIZE, Flow, MAX_DSCP};
