//! The per-host lobby actor (spec §4.9): membership, team balancing,
//! heartbeats, kick on timeout, and the `DEFAULT -> STARTED | QUIT` start
//! transition.

use std::net::SocketAddr;
use std::sync::mpsc::{channel, Sender};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::Instant;

use pitch_lobby_shared::{IntelligenceKind, Lobby, LobbyState, Member};
use pitch_socket::BoundSocket;
use pitch_wire::{
    Addr, LobbyAction, LobbyHello, LobbyMemberInfo, LobbyQuery, LobbyQueryResponse, LobbyStart,
    MSAction, MetaserverHello, StreamCodec,
};
use pitch_wire_codec::FixedAsciiString;

#[cfg(test)]
mod tests;

const SEND_HELLO_MSERVERS_PERIOD: f32 = 1.0;
const SEND_HELLO_USERS_PERIOD: f32 = 1.0;
const CHECK_STATUSES_PERIOD: f32 = 3.0;
const USER_ACTIVITY_TIMEOUT: f32 = 3.0;
/// With-probability-1/3 heartbeat echo, matching the teacher's use of
/// `rand` in `dungeon-vr-socket/src/fakelag.rs` for its own jitter model.
const HELLO_ECHO_PROBABILITY: f64 = 1.0 / 3.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
enum Key {
    CurrentTime,
    SendHelloMservers,
    SendHelloUsers,
    CheckStatuses,
    UserActivity(u32),
}

impl pitch_timer::TimerKey for Key {
    const CURRENT_TIME: Self = Key::CurrentTime;
}

fn to_wire_addr(addr: SocketAddr) -> Addr {
    match addr {
        SocketAddr::V4(v4) => Addr::from(v4),
        SocketAddr::V6(_) => unreachable!("lobby server only serves IPv4 peers"),
    }
}

fn member_info(member: Member) -> LobbyMemberInfo {
    LobbyMemberInfo {
        index: member.index,
        intelligence_kind: member.intelligence_kind as i8,
        team: member.team as i8,
    }
}

enum Request {
    Start,
    Leave,
}

struct State {
    lobby: Lobby,
    state: LobbyState,
    metaservers: Vec<SocketAddr>,
    name: FixedAsciiString<30>,
    timer: pitch_timer::Timer<Key>,
    started_at: Instant,
}

impl State {
    fn new(metaservers: Vec<SocketAddr>, name: FixedAsciiString<30>) -> Self {
        let mut lobby = Lobby::new();
        lobby.add(Lobby::host_addr(), IntelligenceKind::Server);
        let mut timer = pitch_timer::Timer::new();
        timer.set_timeout(Key::SendHelloMservers, SEND_HELLO_MSERVERS_PERIOD);
        timer.set_timeout(Key::SendHelloUsers, SEND_HELLO_USERS_PERIOD);
        timer.set_timeout(Key::CheckStatuses, CHECK_STATUSES_PERIOD);
        Self {
            lobby,
            state: LobbyState::Default,
            metaservers,
            name,
            timer,
            started_at: Instant::now(),
        }
    }

    fn tick(&mut self, socket: &dyn BoundSocket<SocketAddr>) {
        self.timer.set_time(self.started_at.elapsed().as_secs_f32());

        if self.timer.timed_out(Key::SendHelloMservers) {
            self.timer.set_event(Key::SendHelloMservers);
            self.send_hello_mservers(socket);
        }

        if self.timer.timed_out(Key::SendHelloUsers) {
            self.timer.set_event(Key::SendHelloUsers);
            self.send_hello_users(socket);
        }

        if self.timer.timed_out(Key::CheckStatuses) {
            self.timer.set_event(Key::CheckStatuses);
            self.check_statuses(socket);
        }
    }

    /// One-shot registration sent when the lobby comes up, symmetric with
    /// `action_leave`'s `UnhostGame`. Not itself a periodic timer (spec
    /// §4.9 only arms `SEND_HELLO_MSERVERS{HELLO}` as recurring), but
    /// `metaserver_hello{HOST_GAME}` is the only message that makes this
    /// host appear in the metaserver's game list at all.
    fn register_with_mservers(&self, socket: &dyn BoundSocket<SocketAddr>) {
        let hello = MetaserverHello { action: MSAction::HostGame, name: self.name.clone() };
        let mut buf = Vec::new();
        let Ok(()) = hello.write_to(&mut buf);
        for &mserver in &self.metaservers {
            let _ = socket.send_to(&buf, mserver);
        }
    }

    fn send_hello_mservers(&self, socket: &dyn BoundSocket<SocketAddr>) {
        let hello = MetaserverHello { action: MSAction::Hello, name: self.name.clone() };
        let mut buf = Vec::new();
        let Ok(()) = hello.write_to(&mut buf);
        for &mserver in &self.metaservers {
            let _ = socket.send_to(&buf, mserver);
        }
    }

    fn send_hello_users(&self, socket: &dyn BoundSocket<SocketAddr>) {
        let members: Vec<(Addr, Member)> = self.lobby.iter().map(|(a, m)| (*a, *m)).collect();
        if members.is_empty() {
            return;
        }
        if rand::random::<f64>() < HELLO_ECHO_PROBABILITY {
            let (target, member) = members[rand::random::<usize>() % members.len()];
            let response = LobbyQueryResponse { target, active: true, info: member_info(member) };
            let mut buf = Vec::new();
            let Ok(()) = response.write_to(&mut buf);
            self.broadcast(socket, &buf);
        } else {
            let hello = LobbyHello { action: LobbyAction::Nothing };
            let mut buf = Vec::new();
            let Ok(()) = hello.write_to(&mut buf);
            self.broadcast(socket, &buf);
        }
    }

    fn check_statuses(&mut self, socket: &dyn BoundSocket<SocketAddr>) {
        let stale: Vec<Addr> = self
            .lobby
            .iter()
            .filter(|(addr, _)| **addr != Lobby::host_addr())
            .filter(|(addr, _)| self.timer.timed_out(Key::UserActivity(addr.ip)))
            .map(|(addr, _)| *addr)
            .collect();
        for addr in stale {
            log::info!("{addr:?}: kicking (no activity for {USER_ACTIVITY_TIMEOUT}s)");
            self.action_kick(socket, addr);
        }
    }

    fn broadcast(&self, socket: &dyn BoundSocket<SocketAddr>, buf: &[u8]) {
        for (addr, _) in self.lobby.iter() {
            if *addr == Lobby::host_addr() {
                continue;
            }
            let _ = socket.send_to(buf, socket_addr_of(*addr));
        }
    }

    fn handle_packet(&mut self, socket: &dyn BoundSocket<SocketAddr>, from: SocketAddr, data: &[u8]) {
        let wire_from = to_wire_addr(from);
        self.timer.set_timeout(Key::UserActivity(wire_from.ip), USER_ACTIVITY_TIMEOUT);
        self.timer.set_event(Key::UserActivity(wire_from.ip));

        let action = match LobbyAction::read_from(&mut &data[..]) {
            Ok(action) => action,
            Err(e) => {
                log::debug!("{from}: dropping malformed lobby packet: {e}");
                return;
            }
        };
        match action {
            LobbyAction::Connect | LobbyAction::Disconnect | LobbyAction::Nothing | LobbyAction::Unhost => {
                let Ok(hello) = LobbyHello::read_from(&mut &data[..]) else {
                    return;
                };
                match hello.action {
                    LobbyAction::Connect => self.action_join(socket, wire_from),
                    LobbyAction::Disconnect => self.action_kick(socket, wire_from),
                    _ => {}
                }
            }
            LobbyAction::Query => {
                let Ok(query) = LobbyQuery::read_from(&mut &data[..]) else {
                    return;
                };
                let response = match self.lobby.get(&query.target) {
                    Some(&member) => {
                        LobbyQueryResponse { target: query.target, active: true, info: member_info(member) }
                    }
                    None => LobbyQueryResponse {
                        target: query.target,
                        active: false,
                        info: LobbyMemberInfo { index: 0, intelligence_kind: 0, team: 0 },
                    },
                };
                let mut buf = Vec::new();
                let Ok(()) = response.write_to(&mut buf);
                let _ = socket.send_to(&buf, from);
            }
            LobbyAction::QueryResponse | LobbyAction::Start => {
                log::debug!("{from}: dropping unexpected {action:?} at lobby server");
            }
        }
    }

    fn action_join(&mut self, socket: &dyn BoundSocket<SocketAddr>, addr: Addr) {
        let member = self.lobby.add(addr, IntelligenceKind::Remote);
        log::info!("{addr:?}: joined lobby as {member:?}");
        let response = LobbyQueryResponse { target: addr, active: true, info: member_info(member) };
        let mut buf = Vec::new();
        let Ok(()) = response.write_to(&mut buf);
        self.broadcast(socket, &buf);
    }

    fn action_kick(&mut self, socket: &dyn BoundSocket<SocketAddr>, addr: Addr) {
        let Some(member) = self.lobby.remove(&addr) else {
            return;
        };
        log::info!("{addr:?}: left lobby");
        let response = LobbyQueryResponse { target: addr, active: false, info: member_info(member) };
        let mut buf = Vec::new();
        let Ok(()) = response.write_to(&mut buf);
        self.broadcast(socket, &buf);
    }

    /// Unicasts each non-host member their own seat, then transitions to
    /// `Started`. A no-op if already terminal.
    fn action_start(&mut self, socket: &dyn BoundSocket<SocketAddr>) {
        if self.state != LobbyState::Default {
            return;
        }
        let (team1, team2) = {
            let mut red = 0;
            let mut blue = 0;
            for (_, member) in self.lobby.iter() {
                match member.team {
                    pitch_lobby_shared::Team::Red => red += 1,
                    pitch_lobby_shared::Team::Blue => blue += 1,
                }
            }
            (red as i8, blue as i8)
        };
        let members: Vec<(Addr, Member)> = self.lobby.iter().map(|(a, m)| (*a, *m)).collect();
        for (addr, member) in members {
            if addr == Lobby::host_addr() {
                continue;
            }
            let start = LobbyStart { index: member.index, team1, team2 };
            let mut buf = Vec::new();
            let Ok(()) = start.write_to(&mut buf);
            let _ = socket.send_to(&buf, socket_addr_of(addr));
        }
        self.state = LobbyState::Started;
        log::info!("lobby started: team1={team1} team2={team2}");
    }

    /// Unicasts `UNHOST` to every member and every metaserver, then
    /// transitions to `Quit`. A no-op if already terminal.
    fn action_leave(&mut self, socket: &dyn BoundSocket<SocketAddr>) {
        if self.state != LobbyState::Default {
            return;
        }
        let hello = LobbyHello { action: LobbyAction::Unhost };
        let mut buf = Vec::new();
        let Ok(()) = hello.write_to(&mut buf);
        self.broadcast(socket, &buf);

        let unhost = MetaserverHello {
            action: MSAction::UnhostGame,
            name: FixedAsciiString::new("").unwrap(),
        };
        let mut mbuf = Vec::new();
        let Ok(()) = unhost.write_to(&mut mbuf);
        for &mserver in &self.metaservers {
            let _ = socket.send_to(&mbuf, mserver);
        }

        self.state = LobbyState::Quit;
        log::info!("lobby left (unhosted)");
    }
}

/// Converts a member's `Addr` key back to the socket address used to reach
/// them. The reserved host key never round-trips through here (callers
/// skip it explicitly).
fn socket_addr_of(addr: Addr) -> SocketAddr {
    SocketAddr::V4(addr.into())
}

/// Runs the lobby server actor on its own thread until `stop()` is called.
pub struct LobbyServer {
    cancel: pitch_cancel::Guard,
    thread: Option<JoinHandle<()>>,
    requests: Sender<Request>,
}

impl LobbyServer {
    pub fn spawn(
        socket: Arc<dyn BoundSocket<SocketAddr>>,
        metaservers: Vec<SocketAddr>,
        name: FixedAsciiString<30>,
    ) -> Self {
        let cancel_token = pitch_cancel::Token::new();
        let (request_tx, request_rx) = channel();
        let thread_token = cancel_token.clone();
        let thread = std::thread::spawn(move || Self::run(socket, metaservers, name, request_rx, thread_token));
        Self { cancel: cancel_token.guard(), thread: Some(thread), requests: request_tx }
    }

    fn run(
        socket: Arc<dyn BoundSocket<SocketAddr>>,
        metaservers: Vec<SocketAddr>,
        name: FixedAsciiString<30>,
        requests: std::sync::mpsc::Receiver<Request>,
        cancel_token: pitch_cancel::Token,
    ) {
        let state = Mutex::new(State::new(metaservers, name));
        state.lock().unwrap().register_with_mservers(&*socket);
        pitch_socket::listen(
            &*socket,
            || {
                let mut state = state.lock().unwrap();
                state.tick(&*socket);
                while let Ok(request) = requests.try_recv() {
                    match request {
                        Request::Start => state.action_start(&*socket),
                        Request::Leave => state.action_leave(&*socket),
                    }
                }
                !cancel_token.is_cancelled()
            },
            |data, from| {
                state.lock().unwrap().handle_packet(&*socket, from, data);
                !cancel_token.is_cancelled()
            },
        );
    }

    pub fn start(&self) {
        let _ = self.requests.send(Request::Start);
    }

    pub fn leave(&self) {
        let _ = self.requests.send(Request::Leave);
    }

    pub fn stop(&mut self) {
        self.cancel.cancel();
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

impl Drop for LobbyServer {
    fn drop(&mut self) {
        self.stop();
    }
}
