//! The metaserver actor (spec §4.8): a registry of advertised games,
//! broadcasting `HostGame`/`UnhostGame` to subscribed clients.

use std::collections::{HashMap, HashSet};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;

use pitch_socket::BoundSocket;
use pitch_wire::{Addr, MSAction, MetaserverHello, MetaserverResponse, StreamCodec};
use pitch_wire_codec::FixedAsciiString;

#[cfg(test)]
mod tests;

fn to_wire_addr(addr: SocketAddr) -> Addr {
    match addr {
        SocketAddr::V4(v4) => Addr::from(v4),
        SocketAddr::V6(_) => unreachable!("metaserver only serves IPv4 peers"),
    }
}

struct State {
    games: HashMap<SocketAddr, FixedAsciiString<30>>,
    subscribers: HashSet<SocketAddr>,
}

impl State {
    fn new() -> Self {
        Self { games: HashMap::new(), subscribers: HashSet::new() }
    }

    fn handle_packet(
        &mut self,
        socket: &dyn BoundSocket<SocketAddr>,
        from: SocketAddr,
        data: &[u8],
    ) {
        let mut r = data;
        let hello = match MetaserverHello::read_from(&mut r) {
            Ok(hello) => hello,
            Err(e) => {
                log::debug!("{from}: dropping invalid metaserver_hello: {e}");
                return;
            }
        };
        match hello.action {
            MSAction::Hello => {
                if self.subscribers.insert(from) {
                    log::info!("{from}: new metaserver subscriber");
                }
            }
            MSAction::HostGame => {
                log::info!("{from}: hosting {:?}", hello.name.as_str());
                self.games.insert(from, hello.name.clone());
                self.broadcast(socket, MSAction::HostGame, from, hello.name);
            }
            MSAction::UnhostGame => {
                log::info!("{from}: unhosting");
                self.games.remove(&from);
                self.broadcast(
                    socket,
                    MSAction::UnhostGame,
                    from,
                    FixedAsciiString::new("").unwrap(),
                );
            }
        }
    }

    fn broadcast(
        &self,
        socket: &dyn BoundSocket<SocketAddr>,
        action: MSAction,
        host: SocketAddr,
        name: FixedAsciiString<30>,
    ) {
        let response = MetaserverResponse { action, host: to_wire_addr(host), name };
        let mut buf = Vec::new();
        let Ok(()) = response.write_to(&mut buf);
        for &subscriber in &self.subscribers {
            log::debug!("broadcasting {action:?} for {host} to {subscriber}");
            if let Err(e) = socket.send_to(&buf, subscriber) {
                log::warn!("failed to send to subscriber {subscriber}: {e}");
            }
        }
    }
}

/// Runs the metaserver actor on its own thread until `stop()` is called.
pub struct Metaserver {
    cancel: pitch_cancel::Guard,
    thread: Option<JoinHandle<()>>,
}

impl Metaserver {
    pub fn spawn(socket: Arc<dyn BoundSocket<SocketAddr>>) -> Self {
        let cancel_token = pitch_cancel::Token::new();
        let thread_token = cancel_token.clone();
        let thread = std::thread::spawn(move || Self::run(socket, thread_token));
        Self { cancel: cancel_token.guard(), thread: Some(thread) }
    }

    fn run(socket: Arc<dyn BoundSocket<SocketAddr>>, cancel_token: pitch_cancel::Token) {
        let state = Mutex::new(State::new());
        pitch_socket::listen(
            &*socket,
            || !cancel_token.is_cancelled(),
            |data, from| {
                state.lock().unwrap().handle_packet(&*socket, from, data);
                !cancel_token.is_cancelled()
            },
        );
    }

    pub fn stop(&mut self) {
        self.cancel.cancel();
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

impl Drop for Metaserver {
    fn drop(&mut self) {
        self.stop();
    }
}
