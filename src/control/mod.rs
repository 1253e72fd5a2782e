//! 远端回显端的配置协议
//!
//! 消息编解码与会话状态机；传输层由调用者提供。

// 子模块声明
mod message;
mod session;

// 重新导出公共接口
pub use message::{ControlMessage, PROTOCOL_VERSION};
pub use session::{ControlEvent, ControlSession, ControlStatus, OpenAction};
