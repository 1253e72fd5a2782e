//! 数据报头
//!
//! ```text
//! offset 0   u64 BE  发送时间戳（Unix 毫秒）
//! offset 8   u64 BE  发送序号
//! offset 16  ...     填充
//! ```
//! 回显端原样反射数据报，只交换源/目的地址与端口。

/// 时间戳 + 序号占用的字节数
pub const HEADER_LEN: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DatagramHeader {
    pub timestamp_ms: u64,
    pub counter: u64,
}

impl DatagramHeader {
    /// 写入 `buf` 的前 16 字节；`buf` 过短时返回 false 且不做修改
    pub fn write_to(&self, buf: &mut [u8]) -> bool {
        let Some(head) = buf.get_mut(..HEADER_LEN) else {
            return false;
        };
        head[..8].copy_from_slice(&self.timestamp_ms.to_be_bytes());
        head[8..].copy_from_slice(&self.counter.to_be_bytes());
        true
    }

    pub fn parse(buf: &[u8]) -> Option<Self> {
        let timestamp_ms = u64::from_be_bytes(buf.get(..8)?.try_into().ok()?);
        let counter = u64::from_be_bytes(buf.get(8..HEADER_LEN)?.try_into().ok()?);
        Some(Self {
            timestamp_ms,
            counter,
        })
    }
}
