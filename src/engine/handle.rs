//! 发送引擎句柄
//!
//! 每个运行中的引擎独占一个 OS 线程。所有者通过停止标志取消，`stop()` 会等待线程退出；
//! 配置只在停止状态下修改，线程启动时一次性读取。

use std::net::{Ipv4Addr, SocketAddrV4};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use parking_lot::Mutex;
use tracing::{debug, error, info, warn};

use super::clock::SystemClock;
use super::config::{EngineConfig, MAX_COMMIT_INTERVAL, MIN_COMMIT_INTERVAL, ReturnFilter};
use super::pacing::PacingLoop;
use super::report::{EngineReport, EngineStatus};
use super::socket::{SocketOpener, udp_opener};
use crate::error::{Error, Result};

struct RunHandle {
    stop: Arc<AtomicBool>,
    thread: JoinHandle<()>,
}

/// 一条流的实时发送引擎
pub struct PacingEngine {
    config: Arc<Mutex<EngineConfig>>,
    status: Arc<Mutex<EngineStatus>>,
    reports: Sender<EngineReport>,
    opener: SocketOpener,
    run: Option<RunHandle>,
}

impl PacingEngine {
    /// 统计报告发往 `reports`
    pub fn new(reports: Sender<EngineReport>) -> Self {
        Self {
            config: Arc::new(Mutex::new(EngineConfig::default())),
            status: Arc::new(Mutex::new(EngineStatus::Stopped)),
            reports,
            opener: udp_opener(),
            run: None,
        }
    }

    /// 创建引擎以及接收其报告的一端
    pub fn with_channel() -> (Self, Receiver<EngineReport>) {
        let (tx, rx) = mpsc::channel();
        (Self::new(tx), rx)
    }

    pub fn is_running(&self) -> bool {
        self.run
            .as_ref()
            .is_some_and(|run| !run.thread.is_finished())
    }

    pub fn status(&self) -> EngineStatus {
        self.status.lock().clone()
    }

    /// 当前配置的副本
    pub fn config(&self) -> EngineConfig {
        self.config.lock().clone()
    }

    /// 启动发送线程；已在运行时不做任何事
    pub fn start(&mut self) -> Result<()> {
        if self.is_running() {
            return Ok(());
        }
        // 上一次运行可能因失败自行退出，先回收
        self.join_finished();

        let stop = Arc::new(AtomicBool::new(false));
        let config = Arc::clone(&self.config);
        let status = Arc::clone(&self.status);
        let reports = self.reports.clone();
        let opener = Arc::clone(&self.opener);
        let thread_stop = Arc::clone(&stop);

        *self.status.lock() = EngineStatus::Running;
        let spawned = thread::Builder::new()
            .name("pacing-engine".to_string())
            .spawn(move || run_engine(config, status, reports, opener, thread_stop));
        let thread = match spawned {
            Ok(thread) => thread,
            Err(e) => {
                *self.status.lock() = EngineStatus::Failed(e.to_string());
                return Err(e.into());
            }
        };

        self.run = Some(RunHandle { stop, thread });
        Ok(())
    }

    /// 停止发送线程并等待其退出。可重复调用。
    pub fn stop(&mut self) {
        let Some(run) = self.run.take() else {
            return;
        };
        run.stop.store(true, Ordering::Release);
        if run.thread.join().is_err() {
            error!("发送线程异常退出");
            *self.status.lock() = EngineStatus::Failed("engine thread panicked".to_string());
        }
    }

    fn join_finished(&mut self) {
        if let Some(run) = self.run.take() {
            if run.thread.join().is_err() {
                warn!("上一次运行的发送线程异常退出");
            }
        }
    }

    /// 停止 → 修改 → 按原状态重启。配置没有变化时什么也不做。
    fn reconfigure(&mut self, mutate: impl FnOnce(&mut EngineConfig)) -> Result<()> {
        let mut next = self.config();
        mutate(&mut next);
        if next == *self.config.lock() {
            return Ok(());
        }

        let was_running = self.is_running();
        self.stop();
        *self.config.lock() = next;
        if was_running {
            debug!("配置变更，重启发送线程");
            self.start()?;
        }
        Ok(())
    }

    /// 每毫秒包数
    pub fn set_rate(&mut self, rate_per_ms: f64) -> Result<()> {
        let rate = sanitize_rate(rate_per_ms);
        self.reconfigure(|c| c.rate_per_ms = rate)
    }

    /// UDP 载荷长度（不含 UDP 头）
    pub fn set_datagram_length(&mut self, length: usize) -> Result<()> {
        self.reconfigure(|c| c.datagram_length = length)
    }

    /// 同时修改速率与载荷长度，运行中只重启一次
    pub fn set_rate_and_length(&mut self, rate_per_ms: f64, length: usize) -> Result<()> {
        let rate = sanitize_rate(rate_per_ms);
        self.reconfigure(|c| {
            c.rate_per_ms = rate;
            c.datagram_length = length;
        })
    }

    pub fn set_tos(&mut self, tos: u8) -> Result<()> {
        self.reconfigure(|c| c.tos = tos)
    }

    /// 承诺间隔 Tc，范围 [1, 1000] ms
    pub fn set_commit_interval(&mut self, interval: Duration) -> Result<()> {
        if !(MIN_COMMIT_INTERVAL..=MAX_COMMIT_INTERVAL).contains(&interval) {
            return Err(Error::CommitInterval(
                interval.as_millis().min(u128::from(u32::MAX)) as u32,
            ));
        }
        self.reconfigure(|c| c.commit_interval = interval)
    }

    pub fn set_return_filter(&mut self, filter: ReturnFilter) -> Result<()> {
        self.reconfigure(|c| c.filter = filter)
    }

    pub fn set_port(&mut self, port: u16) -> Result<()> {
        if self.is_running() {
            return Err(Error::Running("port"));
        }
        self.config.lock().port = port;
        Ok(())
    }

    /// 替换打开套接字的方式；运行中不允许
    pub fn set_socket_opener(&mut self, opener: SocketOpener) -> Result<()> {
        if self.is_running() {
            return Err(Error::Running("socket"));
        }
        self.opener = opener;
        Ok(())
    }

    pub fn set_destination(&mut self, destination: Ipv4Addr) -> Result<()> {
        if self.is_running() {
            return Err(Error::Running("destination"));
        }
        if destination.is_unspecified() || destination.is_broadcast() {
            return Err(Error::InvalidDestination(destination.to_string()));
        }
        self.config.lock().destination = destination;
        Ok(())
    }
}

fn sanitize_rate(rate_per_ms: f64) -> f64 {
    if rate_per_ms.is_finite() { rate_per_ms.max(0.0) } else { 0.0 }
}

impl Drop for PacingEngine {
    fn drop(&mut self) {
        self.stop();
    }
}

/// 发送线程主体
fn run_engine(
    config: Arc<Mutex<EngineConfig>>,
    status: Arc<Mutex<EngineStatus>>,
    reports: Sender<EngineReport>,
    opener: SocketOpener,
    stop: Arc<AtomicBool>,
) {
    let config = config.lock().clone();
    let destination = SocketAddrV4::new(config.destination, config.port);

    let socket = match opener(destination, config.tos) {
        Ok(socket) => socket,
        Err(e) => {
            error!(%destination, error = %e, "❌ 无法打开 UDP 套接字");
            *status.lock() = EngineStatus::Failed(e.to_string());
            return;
        }
    };
    info!(%destination, tos = config.tos, "🚀 发送线程启动");

    let mut pacing = PacingLoop::new(socket, SystemClock, config, reports);
    match pacing.run(&stop) {
        Ok(()) => *status.lock() = EngineStatus::Stopped,
        Err(e) => {
            error!(%destination, error = %e, "❌ 发送循环失败");
            *status.lock() = EngineStatus::Failed(e.to_string());
        }
    }
}
