//! 带宽显示单位

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// 显示带宽时使用的单位
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BandwidthUnit {
    Bps,
    Kbps,
    #[default]
    Mbps,
}

impl BandwidthUnit {
    /// 1 个单位对应多少 bit/s
    pub fn scale(self) -> f64 {
        match self {
            BandwidthUnit::Bps => 1.0,
            BandwidthUnit::Kbps => 1_000.0,
            BandwidthUnit::Mbps => 1_000_000.0,
        }
    }

    pub fn to_unit(self, bits_per_sec: f64) -> f64 {
        bits_per_sec / self.scale()
    }

    pub fn from_unit(self, value: f64) -> f64 {
        value * self.scale()
    }

    pub fn label(self) -> &'static str {
        match self {
            BandwidthUnit::Bps => "bit/s",
            BandwidthUnit::Kbps => "kbit/s",
            BandwidthUnit::Mbps => "Mbit/s",
        }
    }
}

impl FromStr for BandwidthUnit {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "bps" | "bit/s" => Ok(BandwidthUnit::Bps),
            "kbps" | "kbit/s" => Ok(BandwidthUnit::Kbps),
            "mbps" | "mbit/s" => Ok(BandwidthUnit::Mbps),
            _ => Err(Error::UnknownUnit(s.to_string())),
        }
    }
}

impl fmt::Display for BandwidthUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            BandwidthUnit::Bps => "bps",
            BandwidthUnit::Kbps => "kbps",
            BandwidthUnit::Mbps => "mbps",
        })
    }
}
