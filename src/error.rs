//! 错误类型
//!
//! 配置错误在调用处同步返回，调用前的有效状态保持不变。

use std::io;

use crate::flow::FlowId;
use crate::layer::LayerKind;

/// crate 统一错误
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("{outer} cannot directly encapsulate {inner}")]
    InvalidChain { inner: LayerKind, outer: LayerKind },
    #[error("a layer chain must start with UDP, got {0}")]
    ChainMustStartWithUdp(LayerKind),
    #[error("a layer chain needs at least the UDP layer")]
    EmptyChain,
    #[error("layer index {index} out of range (chain has {len} layers)")]
    LayerIndex { index: usize, len: usize },
    #[error("unknown layer name {0:?}")]
    UnknownLayer(String),
    #[error("unknown bandwidth unit {0:?}")]
    UnknownUnit(String),
    #[error("cannot change {0} while traffic is running")]
    Running(&'static str),
    #[error("commit interval {0} ms out of range [1, 1000]")]
    CommitInterval(u32),
    #[error("DSCP value {0} out of range [0, 63]")]
    Dscp(u8),
    #[error("invalid destination {0}")]
    InvalidDestination(String),
    #[error("flow index {index} out of range (set has {len} flows)")]
    FlowIndex { index: usize, len: usize },
    #[error("{flow} stopped: {reason}")]
    EngineFailed { flow: FlowId, reason: String },
    #[error("{flows} flows starting at port {first} do not fit in 1..=65535")]
    PortRange { first: u16, flows: usize },
    #[error("unknown flow {0}")]
    UnknownFlow(FlowId),
    #[error("control protocol: {0}")]
    Protocol(String),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
