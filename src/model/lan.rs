//! LAN 侧参考层
//!
//! 每条流只需要固定的五层（Ethernet L1/L2/L2 无 CRC、IP、UDP）来换算带宽与包长。

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// 以太网前导码 + SFD + 帧间隔
pub const L1_OVERHEAD: u32 = 20;
/// 以太网头 + CRC
pub const L2_OVERHEAD: u32 = 18;
/// 以太网头（不含 CRC）
pub const L2_NO_CRC_OVERHEAD: u32 = 14;
/// IPv4 头
pub const L3_OVERHEAD: u32 = 20;
/// UDP 头
pub const UDP_HEADER: u32 = 8;

/// 带宽/包长的参考层
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LanLayer {
    EthernetL1,
    EthernetL2,
    EthernetL2NoCrc,
    Ip,
    Udp,
}

impl LanLayer {
    pub const ALL: [LanLayer; 5] = [
        LanLayer::EthernetL1,
        LanLayer::EthernetL2,
        LanLayer::EthernetL2NoCrc,
        LanLayer::Ip,
        LanLayer::Udp,
    ];

    /// UDP PDU 与本层 PDU 之间的累计开销
    pub fn overhead_above_udp(self) -> u32 {
        match self {
            LanLayer::EthernetL1 => L1_OVERHEAD + L2_OVERHEAD + L3_OVERHEAD,
            LanLayer::EthernetL2 => L2_OVERHEAD + L3_OVERHEAD,
            LanLayer::EthernetL2NoCrc => L2_NO_CRC_OVERHEAD + L3_OVERHEAD,
            LanLayer::Ip => L3_OVERHEAD,
            LanLayer::Udp => 0,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            LanLayer::EthernetL1 => "Ethernet Physical Layer (L1)",
            LanLayer::EthernetL2 => "Ethernet Data Link Layer (L2)",
            LanLayer::EthernetL2NoCrc => "Ethernet Data Link Layer without CRC Field (L2)",
            LanLayer::Ip => "IP Network Layer (L3)",
            LanLayer::Udp => "UDP Transport Layer (L4)",
        }
    }

    pub fn short_name(self) -> &'static str {
        match self {
            LanLayer::EthernetL1 => "L1",
            LanLayer::EthernetL2 => "L2",
            LanLayer::EthernetL2NoCrc => "L2noCRC",
            LanLayer::Ip => "IP",
            LanLayer::Udp => "UDP",
        }
    }
}

impl fmt::Display for LanLayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.short_name())
    }
}

impl FromStr for LanLayer {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "l1" | "eth-l1" | "ethernet_l1" => Ok(LanLayer::EthernetL1),
            "l2" | "eth-l2" | "ethernet_l2" => Ok(LanLayer::EthernetL2),
            "l2nocrc" | "eth-l2-nocrc" | "ethernet_l2_no_crc" => Ok(LanLayer::EthernetL2NoCrc),
            "l3" | "ip" => Ok(LanLayer::Ip),
            "l4" | "udp" => Ok(LanLayer::Udp),
            _ => Err(Error::UnknownLayer(s.to_string())),
        }
    }
}
