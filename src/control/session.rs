//! 远端配置会话状态机
//!
//! 不做任何 I/O：调用者负责 WebSocket 的打开、收发与关闭，把事件喂给
//! [`ControlSession`]，并发送它返回的消息。
//!
//! 配置流程：
//! `connect_for_setup` → 传输层打开 → 发送 `connect` → 收到 `connected`
//! → 为每条流发送 `newUdpEcho` → 逐条收到 `udpEchoConnected`
//! → `all_echo_connected`（开始发送，关闭传输层）。
//!
//! 清理流程：`connect_for_close` → 传输层打开即关闭，远端据此删除全部回显端。

use std::fmt;

use tracing::{debug, info, warn};

use super::message::ControlMessage;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ControlStatus {
    #[default]
    Disconnected,
    ConnectingForSetUp,
    ConnectedForSetUp,
    GeneratingTraffic,
    ConnectingForClose,
    Error,
}

impl fmt::Display for ControlStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ControlStatus::Disconnected => "disconnected",
            ControlStatus::ConnectingForSetUp => "connecting for set-up",
            ControlStatus::ConnectedForSetUp => "connected for set-up",
            ControlStatus::GeneratingTraffic => "generating traffic",
            ControlStatus::ConnectingForClose => "connecting for close",
            ControlStatus::Error => "error",
        };
        f.write_str(s)
    }
}

/// 传输层打开后调用者要做的事
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OpenAction {
    Send(ControlMessage),
    /// 清理会话只需建立连接，随即关闭
    Close,
    Nothing,
}

/// 收到远端消息后需要调用者处理的事件
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControlEvent {
    /// 可以开始发送 `newUdpEcho`
    ConnectedForSetUp,
    /// 一条流的回显端已就绪
    EchoConnected(String),
    RemoteError { error_type: String, message: String },
}

#[derive(Debug, Clone)]
pub struct ControlSession {
    status: ControlStatus,
    status_string: String,
}

impl Default for ControlSession {
    fn default() -> Self {
        Self::new()
    }
}

impl ControlSession {
    pub fn new() -> Self {
        Self {
            status: ControlStatus::Disconnected,
            status_string: "Not connected".to_string(),
        }
    }

    pub fn status(&self) -> ControlStatus {
        self.status
    }

    pub fn status_string(&self) -> &str {
        &self.status_string
    }

    fn change_status(&mut self, status: ControlStatus, text: impl Into<String>) {
        self.status = status;
        self.status_string = text.into();
        debug!(%status, text = %self.status_string, "会话状态变化");
    }

    /// 准备一次配置会话；调用者随后打开传输层
    pub fn connect_for_setup(&mut self) {
        self.change_status(ControlStatus::ConnectingForSetUp, "Connecting to satellite");
    }

    /// 准备一次清理会话；调用者随后打开传输层
    pub fn connect_for_close(&mut self) {
        self.change_status(ControlStatus::ConnectingForClose, "Closing satellite");
    }

    /// 传输层已打开
    pub fn on_open(&mut self) -> OpenAction {
        match self.status {
            ControlStatus::ConnectingForClose => {
                self.change_status(ControlStatus::Disconnected, "Not connected");
                OpenAction::Close
            }
            ControlStatus::ConnectingForSetUp => OpenAction::Send(ControlMessage::connect()),
            status => {
                warn!(%status, "意外的连接");
                self.change_status(ControlStatus::Error, "Error: unexpected connection");
                OpenAction::Nothing
            }
        }
    }

    /// 处理一条远端文本消息
    pub fn handle_text(&mut self, text: &str) -> Option<ControlEvent> {
        let message = match ControlMessage::from_json(text) {
            Ok(message) => message,
            Err(e) => {
                debug!(error = %e, text, "无法解析的消息，忽略");
                return None;
            }
        };

        match message {
            ControlMessage::Connected if self.status == ControlStatus::ConnectingForSetUp => {
                self.change_status(
                    ControlStatus::ConnectedForSetUp,
                    "Connected. Setting the satellite up",
                );
                Some(ControlEvent::ConnectedForSetUp)
            }
            ControlMessage::Connected => {
                warn!(status = %self.status, "意外的 connected 消息");
                self.change_status(ControlStatus::Error, "Unexpected connection");
                None
            }
            ControlMessage::Error {
                error_type,
                message,
            } => {
                warn!(%error_type, %message, "远端报告错误");
                self.change_status(
                    ControlStatus::Error,
                    format!("Remote error ({error_type}): {message}"),
                );
                Some(ControlEvent::RemoteError {
                    error_type,
                    message,
                })
            }
            ControlMessage::UdpEchoConnected { id } => Some(ControlEvent::EchoConnected(id)),
            other => {
                debug!(message_type = other.message_type(), "未预期的消息类型，忽略");
                None
            }
        }
    }

    pub fn new_udp_echo(&self, id: impl Into<String>, port: u16, tos: u8) -> ControlMessage {
        ControlMessage::NewUdpEcho {
            id: id.into(),
            port,
            tos,
        }
    }

    pub fn delete_udp_echo(&self, id: impl Into<String>) -> ControlMessage {
        ControlMessage::DeleteUdpEcho { id: id.into() }
    }

    /// 所有回显端已确认，调用者随后关闭传输层
    pub fn all_echo_connected(&mut self) {
        info!("远端配置完成");
        self.change_status(ControlStatus::GeneratingTraffic, "Generating traffic");
    }

    /// 传输层关闭或出错
    pub fn on_disconnect(&mut self, reason: &str) {
        match self.status {
            ControlStatus::ConnectingForSetUp | ControlStatus::ConnectingForClose => {
                self.change_status(
                    ControlStatus::Error,
                    format!("Error while connecting: {reason}"),
                );
            }
            // 这两种状态下是我们自己关闭的
            ControlStatus::GeneratingTraffic | ControlStatus::Disconnected => {}
            _ => {
                self.change_status(ControlStatus::Error, format!("Unexpected error: {reason}"));
            }
        }
    }
}
