//! 封装层类型
//!
//! 每种封装层的固定开销、PDU 上下限与名称，以及"可作为下层"的静态关系表。

use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// ESP 在不计填充时的固定开销（字节）
pub const ESP_BASE_OVERHEAD: u32 = 38;
/// ESP 的填充块大小
pub const ESP_BLOCK: u32 = 16;
/// ESP 尾部（pad length + next header）计入对齐的字节数
pub const ESP_TRAILER: u32 = 2;

/// 封装层种类
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LayerKind {
    EthernetL1,
    EthernetL2,
    EthernetL2NoCrc,
    EthernetCrc,
    Ip,
    Udp,
    Gre,
    GreWithKey,
    EspAes256ShaTunnel,
}

impl LayerKind {
    pub const ALL: [LayerKind; 9] = [
        LayerKind::EthernetL1,
        LayerKind::EthernetL2,
        LayerKind::EthernetL2NoCrc,
        LayerKind::EthernetCrc,
        LayerKind::Ip,
        LayerKind::Udp,
        LayerKind::Gre,
        LayerKind::GreWithKey,
        LayerKind::EspAes256ShaTunnel,
    ];

    /// 固定开销（字节）。ESP 另有按 16 字节对齐的填充，不在此值中。
    pub fn overhead(self) -> u32 {
        match self {
            LayerKind::EthernetL1 => 20,
            LayerKind::EthernetL2 => 18,
            LayerKind::EthernetL2NoCrc => 14,
            LayerKind::EthernetCrc => 4,
            LayerKind::Ip => 20,
            LayerKind::Udp => 8,
            LayerKind::Gre => 4,
            LayerKind::GreWithKey => 8,
            LayerKind::EspAes256ShaTunnel => ESP_BASE_OVERHEAD,
        }
    }

    /// 协议允许的最小 PDU；协议没有规定时取头部大小
    pub fn min_pdu(self) -> u32 {
        match self {
            // L2 最小帧 + 前导码/帧间隔
            LayerKind::EthernetL1 => 84,
            // IEEE 802.3 的 512 bit slot time
            LayerKind::EthernetL2 => 64,
            LayerKind::EthernetL2NoCrc => 60,
            LayerKind::EthernetCrc => 64,
            LayerKind::Ip => 20,
            // UDP 头 + 时间戳 + 序号
            LayerKind::Udp => 24,
            LayerKind::Gre => 4,
            LayerKind::GreWithKey => 8,
            LayerKind::EspAes256ShaTunnel => ESP_BASE_OVERHEAD,
        }
    }

    /// 不分片时的最大 PDU
    pub fn max_pdu(self) -> u32 {
        match self {
            // 无法得知具体的 L2 变体（802.1q、TrustSec 等），留出余量
            LayerKind::EthernetL1 => 1600,
            LayerKind::EthernetL2 => 1518,
            LayerKind::EthernetL2NoCrc => 1514,
            LayerKind::EthernetCrc => 1518,
            LayerKind::Ip => 1500,
            LayerKind::Udp
            | LayerKind::Gre
            | LayerKind::GreWithKey
            | LayerKind::EspAes256ShaTunnel => 1500,
        }
    }

    pub fn short_name(self) -> &'static str {
        match self {
            LayerKind::EthernetL1 => "Eth L1",
            LayerKind::EthernetL2 => "Eth L2",
            LayerKind::EthernetL2NoCrc => "Eth L2 w/o CRC",
            LayerKind::EthernetCrc => "Eth L2 (CRC)",
            LayerKind::Ip => "IP",
            LayerKind::Udp => "UDP",
            LayerKind::Gre => "GRE",
            LayerKind::GreWithKey => "GRE+key",
            LayerKind::EspAes256ShaTunnel => "ESP AES256+SHA Tun.",
        }
    }

    pub fn long_name(self) -> &'static str {
        match self {
            LayerKind::EthernetL1 => "Ethernet Layer1",
            LayerKind::EthernetL2 => "Ethernet Layer2",
            LayerKind::EthernetL2NoCrc => "Ethernet Layer2 without CRC field",
            LayerKind::EthernetCrc => "Ethernet Layer2 with CRC field",
            LayerKind::Ip => "IP",
            LayerKind::Udp => "UDP",
            LayerKind::Gre => "GRE",
            LayerKind::GreWithKey => "GRE with tunnel key",
            LayerKind::EspAes256ShaTunnel => "IPSec ESP Tunnel Mode AES256 & SHA-HMAC",
        }
    }

    /// 可以直接封装 `self` 的层
    pub fn possible_sub_layers(self) -> &'static [LayerKind] {
        match self {
            LayerKind::Udp => &[LayerKind::Ip],
            LayerKind::Ip => &[
                LayerKind::EthernetL2,
                LayerKind::EthernetL2NoCrc,
                LayerKind::Gre,
                LayerKind::GreWithKey,
                LayerKind::EspAes256ShaTunnel,
            ],
            LayerKind::EthernetL2NoCrc => &[LayerKind::EthernetCrc],
            LayerKind::EthernetL2 | LayerKind::EthernetCrc => &[LayerKind::EthernetL1],
            LayerKind::EthernetL1 => &[],
            LayerKind::Gre | LayerKind::GreWithKey | LayerKind::EspAes256ShaTunnel => {
                &[LayerKind::Ip]
            }
        }
    }

    /// `outer` 能否直接封装 `self`
    pub fn accepts_sub_layer(self, outer: LayerKind) -> bool {
        self.possible_sub_layers().contains(&outer)
    }

    pub fn from_short_name(name: &str) -> Option<LayerKind> {
        LayerKind::ALL.into_iter().find(|k| k.short_name() == name)
    }
}

impl fmt::Display for LayerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.short_name())
    }
}

/// 除了短名称，也接受命令行里更好输入的别名（大小写不敏感）。
impl FromStr for LayerKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some(kind) = LayerKind::from_short_name(s) {
            return Ok(kind);
        }
        let kind = match s.to_ascii_lowercase().as_str() {
            "eth-l1" | "l1" => LayerKind::EthernetL1,
            "eth-l2" | "l2" => LayerKind::EthernetL2,
            "eth-l2-nocrc" | "l2nocrc" => LayerKind::EthernetL2NoCrc,
            "eth-crc" | "crc" => LayerKind::EthernetCrc,
            "ip" => LayerKind::Ip,
            "udp" => LayerKind::Udp,
            "gre" => LayerKind::Gre,
            "gre-key" | "gre+key" => LayerKind::GreWithKey,
            "esp" => LayerKind::EspAes256ShaTunnel,
            _ => return Err(Error::UnknownLayer(s.to_string())),
        };
        Ok(kind)
    }
}
