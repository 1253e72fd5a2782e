//! 发送/接收循环
//!
//! 每轮依次：统计节拍、读空回程报文、按 Tc 装桶并发送、等待下一个事件。
//! 序号与计数只在引擎线程内使用，对外只发送不可变的 [`EngineReport`]。

use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Sender;
use std::time::{Duration, Instant};

use tracing::{debug, info, trace, warn};

use super::bucket::TokenBucket;
use super::clock::Clock;
use super::config::{EngineConfig, STATS_INTERVAL};
use super::report::EngineReport;
use super::socket::{DatagramSocket, WaitFor};
use super::tracker::{LossTracker, ReturnVerdict};
use super::wire::DatagramHeader;

/// 足够接收任意 UDP 数据报，长度过滤需要真实长度
const RECV_BUF_LEN: usize = 64 * 1024;

pub(crate) struct PacingLoop<S, C> {
    socket: S,
    clock: C,
    config: EngineConfig,
    reports: Sender<EngineReport>,

    bucket: TokenBucket,
    tracker: LossTracker,
    send_counter: u64,
    not_sent: u64,

    datagram: Vec<u8>,
    recv_buf: Vec<u8>,

    next_refill: Instant,
    stats_deadline: Instant,
    last_report: Instant,
}

impl<S: DatagramSocket, C: Clock> PacingLoop<S, C> {
    pub(crate) fn new(socket: S, clock: C, config: EngineConfig, reports: Sender<EngineReport>) -> Self {
        let now = clock.now();
        Self {
            bucket: TokenBucket::new(config.rate_per_ms, config.commit_interval),
            tracker: LossTracker::for_commit_interval(config.commit_interval),
            datagram: vec![0u8; config.effective_datagram_length()],
            recv_buf: vec![0u8; RECV_BUF_LEN],
            socket,
            clock,
            config,
            reports,
            send_counter: 0,
            not_sent: 0,
            next_refill: now,
            stats_deadline: now + STATS_INTERVAL,
            last_report: now,
        }
    }

    /// 运行直到 `stop` 被置位。退出前发出一份全零报告。
    pub(crate) fn run(&mut self, stop: &AtomicBool) -> io::Result<()> {
        info!(
            rate_per_ms = self.config.rate_per_ms,
            datagram_length = self.datagram.len(),
            burst = self.bucket.burst(),
            "▶️  开始发送"
        );

        let mut result = Ok(());
        while !stop.load(Ordering::Acquire) {
            if let Err(e) = self.step() {
                result = Err(e);
                break;
            }
        }

        info!(
            sent = self.send_counter,
            received = self.tracker.received(),
            lost = self.tracker.lost(),
            not_sent = self.not_sent,
            "⏹️  停止发送"
        );
        self.publish(EngineReport::default());
        result
    }

    /// 循环体的一轮
    pub(crate) fn step(&mut self) -> io::Result<()> {
        let now = self.clock.now();

        if now >= self.stats_deadline {
            self.report(now);
            // 从上一个截止时间递增，避免漂移
            self.stats_deadline += STATS_INTERVAL;
        }

        self.drain_returns();

        if now >= self.next_refill {
            self.refill();
            self.advance_refill_deadline(now);
        }
        self.send_burst();

        let now = self.clock.now();
        let deadline = self.next_refill.min(self.stats_deadline);
        let timeout = deadline.saturating_duration_since(now);
        let interest = if self.bucket.has_token() {
            WaitFor::ReadableOrWritable
        } else {
            WaitFor::Readable
        };
        self.socket.wait(interest, timeout)
    }

    fn advance_refill_deadline(&mut self, now: Instant) {
        let tc = self.config.commit_interval;
        self.next_refill += tc;
        if self.next_refill <= now {
            // 错过了整个间隔（线程被挂起等），跳到当前时间之后的下一个节拍
            let behind = now.duration_since(self.next_refill);
            let skipped = (behind.as_nanos() / tc.as_nanos().max(1) + 1) as u32;
            self.next_refill += tc * skipped;
            debug!(skipped, "错过装桶节拍");
        }
    }

    fn refill(&mut self) {
        self.not_sent += self.bucket.refill();
        let timed_out = self.tracker.on_refill(self.send_counter);
        if timed_out > 0 {
            debug!(timed_out, awaited = self.tracker.awaited(), "超时未返回，计为丢失");
        }
    }

    fn send_burst(&mut self) {
        while self.bucket.has_token() {
            let header = DatagramHeader {
                timestamp_ms: self.clock.unix_millis(),
                counter: self.send_counter,
            };
            header.write_to(&mut self.datagram);

            match self.socket.send(&self.datagram) {
                Ok(_) => {
                    self.send_counter += 1;
                    self.bucket.take();
                }
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => {
                    trace!(tokens = self.bucket.tokens(), "套接字暂不可写");
                    break;
                }
                // 上一个报文触发的 ICMP 不可达，错误已被取走，直接重试
                Err(e)
                    if matches!(
                        e.kind(),
                        io::ErrorKind::ConnectionRefused | io::ErrorKind::Interrupted
                    ) =>
                {
                    continue;
                }
                Err(e) => {
                    warn!(error = %e, "发送失败");
                    break;
                }
            }
        }
    }

    fn drain_returns(&mut self) {
        loop {
            match self.socket.recv(&mut self.recv_buf) {
                Ok(len) => self.on_datagram(len),
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => return,
                Err(e)
                    if matches!(
                        e.kind(),
                        io::ErrorKind::ConnectionRefused | io::ErrorKind::Interrupted
                    ) =>
                {
                    trace!(error = %e, "接收时的瞬时错误");
                }
                Err(e) => {
                    warn!(error = %e, "接收失败");
                    return;
                }
            }
        }
    }

    fn on_datagram(&mut self, len: usize) {
        let Some(header) = DatagramHeader::parse(&self.recv_buf[..len]) else {
            trace!(len, "回程报文过短，忽略");
            return;
        };
        if self.config.filter.enabled && !self.plausible(&header, len) {
            trace!(counter = header.counter, len, "回程报文未通过过滤");
            return;
        }

        match self.tracker.on_return(header.counter) {
            ReturnVerdict::Gap { lost } => debug!(
                returned = header.counter,
                lost,
                sending = self.send_counter,
                "序号缺口"
            ),
            ReturnVerdict::InOrder | ReturnVerdict::Stale => {}
        }
    }

    /// 时延在合理范围内、长度与发送一致、序号确实已发送
    fn plausible(&self, header: &DatagramHeader, len: usize) -> bool {
        let now_ms = self.clock.unix_millis();
        let Some(latency) = now_ms.checked_sub(header.timestamp_ms) else {
            return false;
        };
        Duration::from_millis(latency) < self.config.filter.max_latency
            && len == self.datagram.len()
            && header.counter < self.send_counter
    }

    fn report(&mut self, now: Instant) {
        let report = EngineReport {
            lost: self.tracker.lost(),
            sent: self.send_counter,
            received: self.tracker.received(),
            not_sent: self.not_sent,
            interval: now.duration_since(self.last_report),
        };
        self.last_report = now;
        trace!(?report, "统计上报");
        self.publish(report);
    }

    fn publish(&self, report: EngineReport) {
        if self.reports.send(report).is_err() {
            trace!("统计接收端已关闭");
        }
    }

    #[cfg(test)]
    pub(crate) fn sent(&self) -> u64 {
        self.send_counter
    }

    #[cfg(test)]
    pub(crate) fn tracker(&self) -> &LossTracker {
        &self.tracker
    }

    #[cfg(test)]
    pub(crate) fn not_sent(&self) -> u64 {
        self.not_sent
    }
}
