use std::io::BufRead;
use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};
use std::str::FromStr;
use std::sync::Arc;
use std::thread::sleep;
use std::time::{Duration, Instant};

use anyhow::Result;
use clap::Parser;
use pitch_lobby_server::LobbyServer;
use pitch_sim::{MatchConfig, Soccer};
use pitch_socket::{BoundSocket, StdUdpSocket};
use pitch_soccer_net::SoccerServer;
use pitch_wire_codec::FixedAsciiString;

const TICK_PERIOD: Duration = Duration::from_millis(16);

/// Hosts a lobby and, once started, the authoritative match it advertises.
#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct Args {
    /// Bind IPv4 address, for both the lobby and match sockets.
    #[clap(long)]
    ip: Option<String>,

    /// Lobby UDP port.
    #[clap(long, default_value = "7777")]
    lobby_port: u16,

    /// Match UDP port, where `game_action` packets are exchanged.
    #[clap(long, default_value = "7778")]
    game_port: u16,

    /// Display name advertised to metaservers.
    #[clap(long, default_value = "pitch")]
    name: String,

    /// A metaserver address to register with (`ip:port`); may be repeated.
    #[clap(long = "metaserver")]
    metaservers: Vec<String>,

    /// Number of red-team players.
    #[clap(long, default_value = "1")]
    team1_size: usize,

    /// Number of blue-team players.
    #[clap(long, default_value = "1")]
    team2_size: usize,
}

fn main() -> Result<()> {
    env_logger::builder()
        .filter_level(log::LevelFilter::Debug)
        .format_target(false)
        .format_timestamp_micros()
        .init();
    let args = Args::parse();

    let ip = match &args.ip {
        Some(addr) => Ipv4Addr::from_str(addr)?,
        None => Ipv4Addr::UNSPECIFIED,
    };
    let metaservers = args
        .metaservers
        .iter()
        .map(|addr| SocketAddr::from_str(addr))
        .collect::<Result<Vec<_>, _>>()?;
    let name = FixedAsciiString::new(&args.name)?;

    let lobby_socket = StdUdpSocket::bind(SocketAddr::V4(SocketAddrV4::new(ip, args.lobby_port)))?;
    log::info!("lobby listening on {}", lobby_socket.local_addr());
    let lobby_socket: Arc<dyn BoundSocket<SocketAddr>> = Arc::new(lobby_socket);
    let lobby_server = Arc::new(LobbyServer::spawn(lobby_socket, metaservers, name));

    let game_socket = StdUdpSocket::bind(SocketAddr::V4(SocketAddrV4::new(ip, args.game_port)))?;
    log::info!("match listening on {}", game_socket.local_addr());
    let game_socket: Arc<dyn BoundSocket<SocketAddr>> = Arc::new(game_socket);
    let soccer = Arc::new(Soccer::new(args.team1_size, args.team2_size, MatchConfig::default()));
    let mut soccer_server = SoccerServer::spawn(game_socket, soccer.clone());

    let cancel_token = set_ctrlc_handler();
    spawn_console(lobby_server.clone(), cancel_token.clone());

    let start = Instant::now();
    while !cancel_token.is_cancelled() {
        soccer.idle(start.elapsed().as_secs_f32());
        sleep(TICK_PERIOD);
    }

    lobby_server.leave();
    sleep(Duration::from_millis(100)); // let the UNHOST broadcast land before the socket closes
    soccer_server.stop();
    Ok(())
}

/// Reads `start`/`quit` lines from stdin on a background thread so an
/// operator can kick the match off without a GUI.
fn spawn_console(lobby_server: Arc<LobbyServer>, cancel_token: pitch_cancel::Token) {
    std::thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else { break };
            match line.trim() {
                "start" => lobby_server.start(),
                "quit" => {
                    cancel_token.cancel();
                    break;
                }
                other => log::info!("unrecognized console command: {other:?}"),
            }
        }
    });
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
