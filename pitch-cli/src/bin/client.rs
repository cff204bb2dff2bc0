use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};
use std::str::FromStr;
use std::sync::Arc;
use std::thread::sleep;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use pitch_lobby_client::LobbyClient;
use pitch_lobby_shared::LobbyState;
use pitch_sim::Intelligence;
use pitch_socket::{BoundSocket, StdUdpSocket};
use pitch_soccer_net::SoccerRemote;
use pitch_wire::{LobbyAction, LobbyHello, StreamCodec};

const POLL_PERIOD: Duration = Duration::from_millis(100);

/// Headless reference client: joins a host's lobby, waits for the match to
/// start, then hands off to a `SoccerRemote` for in-match action packets.
/// There is no renderer or input device here -- the game loop that would
/// call `SoccerRemote`'s `Intelligence` methods is external (spec §1).
#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct Args {
    /// The lobby host to connect to, as `ip:port`.
    connect: String,

    /// The host's match port, where `game_action` packets are exchanged
    /// once the lobby starts. Defaults to `connect`'s port + 1, matching
    /// `host`'s own `--lobby-port`/`--game-port` defaults.
    #[clap(long)]
    game_port: Option<u16>,
}

fn main() -> Result<()> {
    env_logger::builder()
        .filter_level(log::LevelFilter::Debug)
        .format_target(false)
        .format_timestamp_micros()
        .init();
    let args = Args::parse();

    let host = SocketAddr::from_str(&args.connect)?;
    let game_port = args.game_port.unwrap_or(host.port() + 1);
    let game_host = SocketAddr::new(host.ip(), game_port);

    let socket = StdUdpSocket::bind(SocketAddr::V4(SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, 0)))?;
    log::info!("bound {}", socket.local_addr());
    let socket: Arc<dyn BoundSocket<SocketAddr>> = Arc::new(socket);

    let mut buf = Vec::new();
    let Ok(()) = LobbyHello { action: LobbyAction::Connect }.write_to(&mut buf);
    socket.send_to(&buf, host)?;

    let cancel_token = set_ctrlc_handler();
    let mut lobby_client = LobbyClient::spawn(socket.clone(), host);

    let game_maker = loop {
        if cancel_token.is_cancelled() {
            lobby_client.stop();
            return Ok(());
        }
        let snapshot = lobby_client.snapshot();
        match snapshot.state {
            LobbyState::Started => break snapshot.game_maker.expect("started lobby always records a seat"),
            LobbyState::Quit => {
                log::info!("host unhosted before the match started");
                return Ok(());
            }
            LobbyState::Default => sleep(POLL_PERIOD),
        }
    };
    log::info!("match started, seat index {}", game_maker.index);

    let remote = SoccerRemote::new(socket, game_host, game_maker.index as i32);
    while !cancel_token.is_cancelled() && !remote.has_quit() {
        sleep(POLL_PERIOD);
    }
    remote.leave();
    lobby_client.stop();
    Ok(())
}

fn set_ctrlc_handler() -> pitch_cancel::Token {
    let cancel_token = pitch_cancel::Token::new();
    ctrlc::set_handler({
        let cancel_token = cancel_token.clone();
        move || {
            log::info!("caught Ctrl+C; shutting down");
            cancel_token.cancel();
        }
    })
    .unwrap();
    cancel_token
}
