//! The lobby client actor (spec §4.10): joins a single host, tracks its
//! heartbeat deadline, and mirrors the host's membership broadcasts.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::Instant;

use pitch_lobby_shared::{GameMaker, IntelligenceKind, LobbyState, Member, Team};
use pitch_socket::BoundSocket;
use pitch_wire::{Addr, LobbyAction, LobbyHello, LobbyQuery, LobbyQueryResponse, LobbyStart, StreamCodec};

#[cfg(test)]
mod tests;

const SEND_HELLO_PERIOD: f32 = 1.0;
const HOST_ACTIVITY_TIMEOUT: f32 = 3.0;
const QUERY_PROBABILITY: f64 = 1.0 / 3.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
enum Key {
    CurrentTime,
    SendHello,
    HostActivity,
}

impl pitch_timer::TimerKey for Key {
    const CURRENT_TIME: Self = Key::CurrentTime;
}

fn member_from_info(info: pitch_wire::LobbyMemberInfo) -> Member {
    Member {
        index: info.index,
        intelligence_kind: match info.intelligence_kind {
            0 => IntelligenceKind::Server,
            1 => IntelligenceKind::Remote,
            _ => IntelligenceKind::LocalAi,
        },
        team: if info.team == 0 { Team::Red } else { Team::Blue },
    }
}

/// A read-only copy of the client's membership view, for the game loop or
/// lobby UI to poll.
#[derive(Clone, Debug, Default)]
pub struct Snapshot {
    pub state: LobbyState,
    pub members: HashMap<Addr, Member>,
    pub game_maker: Option<GameMaker>,
}

struct State {
    host: SocketAddr,
    members: HashMap<Addr, Member>,
    lobby_state: LobbyState,
    game_maker: Option<GameMaker>,
    timer: pitch_timer::Timer<Key>,
    started_at: Instant,
}

impl State {
    fn new(host: SocketAddr) -> Self {
        let mut timer = pitch_timer::Timer::new();
        timer.set_timeout(Key::SendHello, SEND_HELLO_PERIOD);
        timer.set_timeout(Key::HostActivity, HOST_ACTIVITY_TIMEOUT);
        Self {
            host,
            members: HashMap::new(),
            lobby_state: LobbyState::Default,
            game_maker: None,
            timer,
            started_at: Instant::now(),
        }
    }

    fn snapshot(&self) -> Snapshot {
        Snapshot {
            state: self.lobby_state,
            members: self.members.clone(),
            game_maker: self.game_maker,
        }
    }

    fn tick(&mut self, socket: &dyn BoundSocket<SocketAddr>) {
        self.timer.set_time(self.started_at.elapsed().as_secs_f32());

        if self.timer.timed_out(Key::SendHello) {
            self.timer.set_event(Key::SendHello);
            self.send_hello(socket);
        }

        if self.lobby_state != LobbyState::Quit && self.timer.timed_out(Key::HostActivity) {
            log::info!("host activity timed out, leaving lobby");
            self.lobby_state = LobbyState::Quit;
        }
    }

    fn send_hello(&self, socket: &dyn BoundSocket<SocketAddr>) {
        let mut buf = Vec::new();
        if rand::random::<f64>() < QUERY_PROBABILITY && !self.members.is_empty() {
            let targets: Vec<Addr> = self.members.keys().copied().collect();
            let target = targets[rand::random::<usize>() % targets.len()];
            let Ok(()) = LobbyQuery { target }.write_to(&mut buf);
        } else {
            let Ok(()) = LobbyHello { action: LobbyAction::Nothing }.write_to(&mut buf);
        }
        let _ = socket.send_to(&buf, self.host);
    }

    fn handle_packet(&mut self, from: SocketAddr, data: &[u8]) {
        if from != self.host {
            log::debug!("{from}: dropping packet from non-host address");
            return;
        }
        self.timer.set_timeout(Key::HostActivity, HOST_ACTIVITY_TIMEOUT);
        self.timer.set_event(Key::HostActivity);

        let action = match LobbyAction::read_from(&mut &data[..]) {
            Ok(action) => action,
            Err(e) => {
                log::debug!("{from}: dropping malformed lobby packet: {e}");
                return;
            }
        };
        match action {
            LobbyAction::Unhost => {
                log::info!("host unhosted, leaving lobby");
                self.lobby_state = LobbyState::Quit;
            }
            LobbyAction::Nothing => {}
            LobbyAction::QueryResponse => {
                let Ok(response) = LobbyQueryResponse::read_from(&mut &data[..]) else {
                    return;
                };
                if response.active {
                    self.members.insert(response.target, member_from_info(response.info));
                } else {
                    self.members.remove(&response.target);
                }
            }
            LobbyAction::Start => {
                let Ok(start) = LobbyStart::read_from(&mut &data[..]) else {
                    return;
                };
                self.game_maker = Some(GameMaker { index: start.index, team1: start.team1, team2: start.team2 });
                self.lobby_state = LobbyState::Started;
                log::info!("lobby started: {:?}", self.game_maker);
            }
            LobbyAction::Connect | LobbyAction::Disconnect | LobbyAction::Query => {
                log::debug!("{from}: dropping unexpected {action:?} at lobby client");
            }
        }
    }
}

/// Runs the lobby client actor on its own thread until `stop()` is called.
pub struct LobbyClient {
    cancel: pitch_cancel::Guard,
    thread: Option<JoinHandle<()>>,
    shared: Arc<Mutex<State>>,
}

impl LobbyClient {
    pub fn spawn(socket: Arc<dyn BoundSocket<SocketAddr>>, host: SocketAddr) -> Self {
        let cancel_token = pitch_cancel::Token::new();
        let shared = Arc::new(Mutex::new(State::new(host)));
        let thread_shared = Arc::clone(&shared);
        let thread_token = cancel_token.clone();
        let thread = std::thread::spawn(move || Self::run(socket, thread_shared, thread_token));
        Self { cancel: cancel_token.guard(), thread: Some(thread), shared }
    }

    fn run(socket: Arc<dyn BoundSocket<SocketAddr>>, shared: Arc<Mutex<State>>, cancel_token: pitch_cancel::Token) {
        pitch_socket::listen(
            &*socket,
            || {
                shared.lock().unwrap().tick(&*socket);
                !cancel_token.is_cancelled()
            },
            |data, from| {
                shared.lock().unwrap().handle_packet(from, data);
                !cancel_token.is_cancelled()
            },
        );
    }

    pub fn snapshot(&self) -> Snapshot {
        self.shared.lock().unwrap().snapshot()
    }

    pub fn stop(&mut self) {
        self.cancel.cancel();
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

impl Drop for LobbyClient {
    fn drop(&mut self) {
        self.stop();
    }
}
