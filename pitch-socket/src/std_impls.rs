use std::io;
use std::net::{SocketAddr, ToSocketAddrs, UdpSocket};

use crate::BoundSocket;

/// A real `std::net::UdpSocket` in non-blocking mode.
pub struct StdUdpSocket {
    inner: UdpSocket,
}

impl StdUdpSocket {
    pub fn bind(addr: impl ToSocketAddrs) -> io::Result<Self> {
        let inner = UdpSocket::bind(addr)?;
        inner.set_nonblocking(true)?;
        Ok(Self { inner })
    }
}

impl BoundSocket<SocketAddr> for StdUdpSocket {
    fn local_addr(&self) -> SocketAddr {
        self.inner.local_addr().expect("bound socket has a local address")
    }

    fn send_to(&self, buf: &[u8], addr: SocketAddr) -> io::Result<()> {
        self.inner.send_to(buf, addr).map(|_| ())
    }

    fn recv_from(&self, buf: &mut [u8]) -> io::Result<(usize, SocketAddr)> {
        self.inner.recv_from(buf)
    }
}
