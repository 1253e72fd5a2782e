use std::fmt;
use std::str::FromStr;

/// 流标识，在所属 [`super::FlowSet`] 内唯一
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FlowId(pub u64);

impl fmt::Display for FlowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "flow-{}", self.0)
    }
}

impl FromStr for FlowId {
    type Err = std::num::ParseIntError;

    /// 接受 `flow-7` 或 `7`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.strip_prefix("flow-").unwrap_or(s).parse().map(FlowId)
    }
}
