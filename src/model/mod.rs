//! LAN 速率模型
//!
//! 固定五层的包长/带宽/pps 换算，每条流各持有一份。

// 子模块声明
mod lan;
mod rate;
mod unit;

// 重新导出公共接口
pub use lan::{L1_OVERHEAD, L2_NO_CRC_OVERHEAD, L2_OVERHEAD, L3_OVERHEAD, LanLayer, UDP_HEADER};
pub use rate::{FlowRateModel, MAX_UDP_SIZE, MIN_UDP_SIZE};
pub use unit::BandwidthUnit;
