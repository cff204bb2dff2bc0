//! A non-blocking datagram socket trait generalized over address type, plus
//! a `listen` loop driver shared by every actor (metaserver, lobby server,
//! lobby client, soccer server). One thread per actor calls `listen`
//! directly; no async runtime is involved (§5: "No async runtime is
//! required").

use std::fmt::Debug;
use std::hash::Hash;
use std::io;
use std::thread::sleep;
use std::time::Duration;

pub mod std_impls;
pub mod testing;

pub use std_impls::StdUdpSocket;
pub use testing::{FakeNetwork, FakeSocket};

/// Bounds required of an actor's address type: hashable for use as a map
/// key, `Send` so a listener thread can own it.
pub trait AddrBound: Copy + Eq + Hash + Debug + Send + 'static {}

impl<T: Copy + Eq + Hash + Debug + Send + 'static> AddrBound for T {}

/// A socket bound to a local address, generalized over the address type so
/// the same trait covers real UDP sockets and the in-process fake.
pub trait BoundSocket<Addr: AddrBound>: Send + Sync {
    fn local_addr(&self) -> Addr;

    /// Issues exactly one `sendto`.
    fn send_to(&self, buf: &[u8], addr: Addr) -> io::Result<()>;

    /// Returns one datagram and its source, or `Err(WouldBlock)` if none is
    /// ready.
    fn recv_from(&self, buf: &mut [u8]) -> io::Result<(usize, Addr)>;
}

/// How long `listen` sleeps after draining all pending datagrams, so the
/// loop doesn't spin a core while idle.
const IDLE_SLEEP: Duration = Duration::from_millis(10);

/// Drives a socket's receive loop: call `on_idle()`, then drain every
/// datagram currently available, invoking `on_packet(data, from)` for each.
/// Both callbacks return `false` to stop the loop.
pub fn listen<Addr: AddrBound>(
    socket: &dyn BoundSocket<Addr>,
    mut on_idle: impl FnMut() -> bool,
    mut on_packet: impl FnMut(&[u8], Addr) -> bool,
) {
    let mut buf = [0u8; 256];
    loop {
        if !on_idle() {
            return;
        }

        loop {
            match socket.recv_from(&mut buf) {
                Ok((n, addr)) => {
                    if !on_packet(&buf[..n], addr) {
                        return;
                    }
                }
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => break,
                Err(e) => {
                    log::warn!("socket recv_from failed: {e}");
                    break;
                }
            }
        }

        sleep(IDLE_SLEEP);
    }
}
