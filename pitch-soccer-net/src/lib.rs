//! Networked `Intelligence` adapters (spec §4.11): `SoccerServer` dispatches
//! inbound `game_action` datagrams into an authoritative [`Soccer`], and
//! `SoccerRemote` packages a client's local input as outbound datagrams.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

use nalgebra::Vector3;
use pitch_sim::{Intelligence, Soccer};
use pitch_socket::BoundSocket;
use pitch_wire::{GameAction, GameActionKind, StreamCodec};

#[cfg(test)]
mod tests;

fn send_action(
    socket: &dyn BoundSocket<SocketAddr>,
    server_addr: SocketAddr,
    kind: GameActionKind,
    id: i32,
    dir: f32,
    dest: Vector3<f32>,
) {
    let action = GameAction { kind, id, dir, dest };
    let mut buf = Vec::new();
    let Ok(()) = action.write_to(&mut buf);
    if let Err(e) = socket.send_to(&buf, server_addr) {
        log::warn!("failed to send {kind:?} to {server_addr}: {e}");
    }
}

/// The authoritative server's inbound adapter. Owns a listener thread that
/// reads `game_action` packets and dispatches each, by the `id` it carries,
/// into `Soccer::<kind>_action(...)` under the soccer mutex. Local UI input
/// on the host enters `Soccer` directly and never goes through this type.
///
/// Also satisfies [`Intelligence`] so it can stand alongside
/// [`pitch_sim::LocalIntelligence`]/[`SoccerRemote`] in a uniform
/// participant list; since dispatch here is keyed by the packet's own `id`
/// rather than bound to one player, its per-action methods are no-ops --
/// the listener thread is the only path that drives `Soccer` on this side.
pub struct SoccerServer {
    cancel: pitch_cancel::Guard,
    thread: Option<JoinHandle<()>>,
}

impl SoccerServer {
    pub fn spawn(socket: Arc<dyn BoundSocket<SocketAddr>>, soccer: Arc<Soccer>) -> Self {
        let cancel_token = pitch_cancel::Token::new();
        let thread_token = cancel_token.clone();
        let thread = std::thread::spawn(move || Self::run(socket, soccer, thread_token));
        Self { cancel: cancel_token.guard(), thread: Some(thread) }
    }

    fn run(socket: Arc<dyn BoundSocket<SocketAddr>>, soccer: Arc<Soccer>, cancel_token: pitch_cancel::Token) {
        pitch_socket::listen(
            &*socket,
            || !cancel_token.is_cancelled(),
            |data, from| {
                dispatch(&soccer, from, data);
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

impl Drop for SoccerServer {
    fn drop(&mut self) {
        self.stop();
    }
}

impl Intelligence for SoccerServer {
    fn z_action(&self) {}
    fn x_action(&self, _dir: f32) {}
    fn c_action(&self, _dest: Vector3<f32>) {}
    fn v_action(&self) {}
    fn f_action(&self, _dir: f32) {}
    fn s_action(&self) {}
    fn m_action(&self, _dest: Vector3<f32>) {}
    fn leave(&self) {}
    fn idle(&self, _t: f32) {}
    fn has_quit(&self) -> bool {
        false
    }
}

fn dispatch(soccer: &Soccer, from: SocketAddr, data: &[u8]) {
    let mut r = data;
    let action = match GameAction::read_from(&mut r) {
        Ok(action) => action,
        Err(e) => {
            log::debug!("{from}: dropping malformed game_action: {e}");
            return;
        }
    };
    match action.kind {
        GameActionKind::Z => soccer.z_action(action.id),
        GameActionKind::X => soccer.x_action(action.id, action.dir),
        GameActionKind::C => soccer.c_action(action.id, action.dest),
        GameActionKind::V => soccer.v_action(action.id),
        GameActionKind::F => soccer.f_action(action.id, action.dir),
        GameActionKind::S => soccer.s_action(action.id),
        GameActionKind::M => soccer.m_action(action.id, action.dest),
    }
}

/// The client-side adapter: packages each local UI action as a
/// `game_action{kind, id=self, ...}` datagram addressed to the host.
pub struct SoccerRemote {
    socket: Arc<dyn BoundSocket<SocketAddr>>,
    server_addr: SocketAddr,
    id: i32,
    quit: AtomicBool,
}

impl SoccerRemote {
    pub fn new(socket: Arc<dyn BoundSocket<SocketAddr>>, server_addr: SocketAddr, id: i32) -> Self {
        Self { socket, server_addr, id, quit: AtomicBool::new(false) }
    }

    fn send(&self, kind: GameActionKind, dir: f32, dest: Vector3<f32>) {
        send_action(&*self.socket, self.server_addr, kind, self.id, dir, dest);
    }
}

impl Intelligence for SoccerRemote {
    fn z_action(&self) {
        self.send(GameActionKind::Z, 0.0, Vector3::zeros());
    }

    fn x_action(&self, dir: f32) {
        self.send(GameActionKind::X, dir, Vector3::zeros());
    }

    fn c_action(&self, dest: Vector3<f32>) {
        self.send(GameActionKind::C, 0.0, dest);
    }

    fn v_action(&self) {
        self.send(GameActionKind::V, 0.0, Vector3::zeros());
    }

    fn f_action(&self, dir: f32) {
        self.send(GameActionKind::F, dir, Vector3::zeros());
    }

    fn s_action(&self) {
        self.send(GameActionKind::S, 0.0, Vector3::zeros());
    }

    fn m_action(&self, dest: Vector3<f32>) {
        self.send(GameActionKind::M, 0.0, dest);
    }

    fn leave(&self) {
        self.quit.store(true, Ordering::SeqCst);
    }

    fn idle(&self, _t: f32) {}

    fn has_quit(&self) -> bool {
        self.quit.load(Ordering::SeqCst)
    }
}
