//! 数据报套接字抽象
//!
//! 发送循环只依赖 [`DatagramSocket`]：非阻塞收发，加上一个有超时的就绪等待。
//! 真实实现用 socket2 创建并配置 IPv4 UDP 套接字（ToS、缓冲区、connect），
//! 再交给 mio 做就绪通知。

use std::io;
use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};
use std::sync::Arc;
use std::time::Duration;

use mio::{Events, Interest, Poll, Token};
use socket2::{Domain, Protocol, Socket, Type};
use tracing::{debug, warn};

const SOCKET: Token = Token(0);
/// Linux 默认的接收缓冲区很小，高速率下回程报文容易溢出
const RECV_BUFFER_SIZE: usize = 4 * 1024 * 1024;

/// 等待的就绪事件
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitFor {
    Readable,
    ReadableOrWritable,
}

impl WaitFor {
    fn interest(self) -> Interest {
        match self {
            WaitFor::Readable => Interest::READABLE,
            WaitFor::ReadableOrWritable => Interest::READABLE | Interest::WRITABLE,
        }
    }
}

/// 非阻塞数据报套接字
pub trait DatagramSocket {
    /// 发送一个数据报；不可写时返回 `WouldBlock`
    fn send(&mut self, datagram: &[u8]) -> io::Result<usize>;
    /// 接收一个数据报；没有数据时返回 `WouldBlock`
    fn recv(&mut self, buf: &mut [u8]) -> io::Result<usize>;
    /// 最多等待 `timeout`，直到出现 `interest` 所述的就绪事件
    fn wait(&mut self, interest: WaitFor, timeout: Duration) -> io::Result<()>;
}

impl<S: DatagramSocket + ?Sized> DatagramSocket for Box<S> {
    fn send(&mut self, datagram: &[u8]) -> io::Result<usize> {
        (**self).send(datagram)
    }

    fn recv(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        (**self).recv(buf)
    }

    fn wait(&mut self, interest: WaitFor, timeout: Duration) -> io::Result<()> {
        (**self).wait(interest, timeout)
    }
}

/// 每次启动时为 (目的地址, ToS) 打开一个套接字
pub type SocketOpener =
    Arc<dyn Fn(SocketAddrV4, u8) -> io::Result<Box<dyn DatagramSocket + Send>> + Send + Sync>;

/// 默认的打开方式：[`UdpEndpoint::open`]
pub fn udp_opener() -> SocketOpener {
    Arc::new(
        |destination: SocketAddrV4, tos: u8| -> io::Result<Box<dyn DatagramSocket + Send>> {
            Ok(Box::new(UdpEndpoint::open(destination, tos)?))
        },
    )
}

/// 已 connect 到目的地址的 UDP 套接字
#[derive(Debug)]
pub struct UdpEndpoint {
    socket: mio::net::UdpSocket,
    poll: Poll,
    events: Events,
    registered: WaitFor,
}

impl UdpEndpoint {
    /// 打开、配置并 connect 一个 IPv4 UDP 套接字。
    ///
    /// 只用 IPv4：DSCP 需要 IP_TOS 选项。
    pub fn open(destination: SocketAddrV4, tos: u8) -> io::Result<Self> {
        let socket = Socket::new(Domain::IPV4, Type::DGRAM, Some(Protocol::UDP))?;
        socket.set_tos(u32::from(tos))?;
        if let Err(e) = socket.set_recv_buffer_size(RECV_BUFFER_SIZE) {
            warn!(error = %e, "无法调整接收缓冲区");
        }
        let local = SocketAddr::from((Ipv4Addr::UNSPECIFIED, 0));
        socket.bind(&local.into())?;
        socket.connect(&SocketAddr::V4(destination).into())?;
        socket.set_nonblocking(true)?;

        let mut socket = mio::net::UdpSocket::from_std(socket.into());
        let poll = Poll::new()?;
        poll.registry()
            .register(&mut socket, SOCKET, WaitFor::Readable.interest())?;

        debug!(local = ?socket.local_addr().ok(), %destination, tos, "UDP 套接字已就绪");
        Ok(Self {
            socket,
            poll,
            events: Events::with_capacity(8),
            registered: WaitFor::Readable,
        })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.socket.local_addr()
    }
}

impl DatagramSocket for UdpEndpoint {
    fn send(&mut self, datagram: &[u8]) -> io::Result<usize> {
        self.socket.send(datagram)
    }

    fn recv(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.socket.recv(buf)
    }

    fn wait(&mut self, interest: WaitFor, timeout: Duration) -> io::Result<()> {
        if interest != self.registered {
            self.poll
                .registry()
                .reregister(&mut self.socket, SOCKET, interest.interest())?;
            self.registered = interest;
        }
        match self.poll.poll(&mut self.events, Some(timeout)) {
            Err(e) if e.kind() == io::ErrorKind::Interrupted => Ok(()),
            other => other,
        }
    }
}
