use std::collections::HashMap;
use std::io;
use std::sync::mpsc::{channel, Receiver, Sender, TryRecvError};
use std::sync::{Arc, Mutex, Weak};

use crate::{AddrBound, BoundSocket};

/// An in-process registry of bound addresses routing datagrams through
/// channels, so actor tests don't need to bind real ports.
#[derive(Clone)]
pub struct FakeNetwork<Addr> {
    inner: Arc<Mutex<Inner<Addr>>>,
}

struct Inner<Addr> {
    bindings: HashMap<Addr, Sender<(Vec<u8>, Addr)>>,
}

impl<Addr: AddrBound> Default for FakeNetwork<Addr> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Addr: AddrBound> FakeNetwork<Addr> {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner { bindings: HashMap::new() })),
        }
    }

    pub fn bind(&self, addr: Addr) -> FakeSocket<Addr> {
        let mut inner = self.inner.lock().unwrap();
        assert!(!inner.bindings.contains_key(&addr), "address already bound: {addr:?}");

        let (tx, rx) = channel();
        inner.bindings.insert(addr, tx);

        FakeSocket {
            network: Arc::downgrade(&self.inner),
            local_addr: addr,
            rx: Mutex::new(rx),
        }
    }
}

pub struct FakeSocket<Addr> {
    network: Weak<Mutex<Inner<Addr>>>,
    local_addr: Addr,
    rx: Mutex<Receiver<(Vec<u8>, Addr)>>,
}

impl<Addr: AddrBound> BoundSocket<Addr> for FakeSocket<Addr> {
    fn local_addr(&self) -> Addr {
        self.local_addr
    }

    fn send_to(&self, buf: &[u8], addr: Addr) -> io::Result<()> {
        let network = match self.network.upgrade() {
            Some(network) => network,
            None => return Ok(()),
        };
        let tx = network.lock().unwrap().bindings.get(&addr).cloned();
        let Some(tx) = tx else {
            return Ok(());
        };
        let _ = tx.send((buf.to_vec(), self.local_addr));
        Ok(())
    }

    fn recv_from(&self, buf: &mut [u8]) -> io::Result<(usize, Addr)> {
        match self.rx.lock().unwrap().try_recv() {
            Ok((data, addr)) => {
                buf[..data.len()].copy_from_slice(&data);
                Ok((data.len(), addr))
            }
            Err(TryRecvError::Empty) => Err(io::Error::from(io::ErrorKind::WouldBlock)),
            Err(TryRecvError::Disconnected) => Err(io::Error::from(io::ErrorKind::BrokenPipe)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn send_then_recv_round_trip() {
        let network = FakeNetwork::new();
        let a = network.bind(1);
        let b = network.bind(2);

        a.send_to(b"hello", 2).unwrap();
        let mut buf = [0u8; 16];
        let (n, from) = b.recv_from(&mut buf).unwrap();
        assert_eq!(&buf[..n], b"hello");
        assert_eq!(from, 1);
    }

    #[test]
    fn recv_with_nothing_pending_would_block() {
        let network = FakeNetwork::new();
        let a = network.bind(1);
        let mut buf = [0u8; 16];
        let err = a.recv_from(&mut buf).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::WouldBlock);
    }

    #[test]
    fn send_to_unbound_address_is_silently_dropped() {
        let network = FakeNetwork::new();
        let a = network.bind(1);
        a.send_to(b"hello", 99).unwrap();
    }
}
