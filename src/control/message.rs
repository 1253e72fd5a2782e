//! 远端配置协议的消息
//!
//! 每条消息是一个 JSON 对象，由 `messageType` 区分类型，字段名为 camelCase。

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// 连接时上报的协议版本
pub const PROTOCOL_VERSION: &str = "wanperf 0.2";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    tag = "messageType",
    rename_all = "camelCase",
    rename_all_fields = "camelCase"
)]
pub enum ControlMessage {
    /// 客户端 → 远端：开始一次配置会话
    Connect { version: String },
    /// 远端 → 客户端：会话已建立
    Connected,
    /// 远端 → 客户端：请求失败
    Error {
        error_type: String,
        #[serde(default)]
        message: String,
    },
    /// 客户端 → 远端：为一条流创建回显端
    NewUdpEcho { id: String, port: u16, tos: u8 },
    /// 远端 → 客户端：回显端已就绪
    UdpEchoConnected { id: String },
    /// 客户端 → 远端：删除回显端，没有应答
    DeleteUdpEcho { id: String },
}

impl ControlMessage {
    pub fn connect() -> Self {
        ControlMessage::Connect {
            version: PROTOCOL_VERSION.to_string(),
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// `messageType` 字段的值
    pub fn message_type(&self) -> &'static str {
        match self {
            ControlMessage::Connect { .. } => "connect",
            ControlMessage::Connected => "connected",
            ControlMessage::Error { .. } => "error",
            ControlMessage::NewUdpEcho { .. } => "newUdpEcho",
            ControlMessage::UdpEchoConnected { .. } => "udpEchoConnected",
            ControlMessage::DeleteUdpEcho { .. } => "deleteUdpEcho",
        }
    }
}
