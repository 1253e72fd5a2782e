//! 测试用的套接字打开方式

use std::io;
use std::net::SocketAddrV4;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use crate::engine::{DatagramSocket, SocketOpener, WaitFor};

/// 发送总是成功、从不收到回程报文的套接字
pub(crate) struct SinkSocket;

impl DatagramSocket for SinkSocket {
    fn send(&mut self, datagram: &[u8]) -> io::Result<usize> {
        Ok(datagram.len())
    }

    fn recv(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
        Err(io::ErrorKind::WouldBlock.into())
    }

    fn wait(&mut self, _interest: WaitFor, timeout: Duration) -> io::Result<()> {
        thread::sleep(timeout.min(Duration::from_millis(5)));
        Ok(())
    }
}

/// 每次打开返回一个 [`SinkSocket`]，并计数
pub(crate) fn counting_opener() -> (SocketOpener, Arc<AtomicUsize>) {
    let opened = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&opened);
    let opener: SocketOpener = Arc::new(
        move |_: SocketAddrV4, _: u8| -> io::Result<Box<dyn DatagramSocket + Send>> {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(Box::new(SinkSocket))
        },
    );
    (opener, opened)
}

/// 打开总是失败
pub(crate) fn failing_opener() -> SocketOpener {
    Arc::new(
        |_: SocketAddrV4, _: u8| -> io::Result<Box<dyn DatagramSocket + Send>> {
            Err(io::Error::new(io::ErrorKind::PermissionDenied, "no sockets here"))
        },
    )
}

/// 轮询 `done` 直到为真或超时
pub(crate) fn wait_until(timeout: Duration, mut done: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if done() {
            return true;
        }
        thread::sleep(Duration::from_millis(5));
    }
    done()
}
