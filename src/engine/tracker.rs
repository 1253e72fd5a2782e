//! 回程序号跟踪
//!
//! 按序号判断回显报文是按序到达、出现缺口还是重复/乱序，并用超时窗口
//! 把始终没有回来的报文计为丢失。

use std::collections::VecDeque;
use std::time::Duration;

use super::config::LOSS_TIMEOUT;

/// 单个回程报文的判定结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReturnVerdict {
    /// 正是期待的序号
    InOrder,
    /// 序号跳跃，中间 `lost` 个报文计为丢失
    Gap { lost: u64 },
    /// 重复或乱序到达，忽略
    Stale,
}

#[derive(Debug, Clone)]
pub struct LossTracker {
    awaited: u64,
    received: u64,
    lost: u64,
    /// 每次装桶时的发送序号快照
    history: VecDeque<u64>,
    window: usize,
}

impl LossTracker {
    /// `window`：快照保留的装桶次数
    pub fn new(window: usize) -> Self {
        let window = window.max(1);
        Self {
            awaited: 0,
            received: 0,
            lost: 0,
            history: VecDeque::with_capacity(window + 1),
            window,
        }
    }

    /// 窗口长度覆盖 [`LOSS_TIMEOUT`]
    pub fn for_commit_interval(commit_interval: Duration) -> Self {
        let tc_ms = commit_interval.as_millis().max(1);
        Self::new((LOSS_TIMEOUT.as_millis() / tc_ms) as usize)
    }

    pub fn on_return(&mut self, counter: u64) -> ReturnVerdict {
        if counter == self.awaited {
            self.awaited += 1;
            self.received += 1;
            ReturnVerdict::InOrder
        } else if counter > self.awaited {
            let lost = counter - self.awaited;
            self.lost += lost;
            self.awaited = counter + 1;
            self.received += 1;
            ReturnVerdict::Gap { lost }
        } else {
            ReturnVerdict::Stale
        }
    }

    /// 记录装桶时的发送序号。最旧的快照移出窗口时，低于它且仍未返回的报文
    /// 计为丢失。返回本次新增的丢失数。
    pub fn on_refill(&mut self, send_counter: u64) -> u64 {
        self.history.push_back(send_counter);
        if self.history.len() <= self.window {
            return 0;
        }
        let Some(oldest) = self.history.pop_front() else {
            return 0;
        };
        if self.awaited >= oldest {
            return 0;
        }
        let timed_out = oldest - self.awaited;
        self.lost += timed_out;
        self.awaited = oldest;
        timed_out
    }

    pub fn awaited(&self) -> u64 {
        self.awaited
    }

    pub fn received(&self) -> u64 {
        self.received
    }

    pub fn lost(&self) -> u64 {
        self.lost
    }

    pub fn window(&self) -> usize {
        self.window
    }
}
