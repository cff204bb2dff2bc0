use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};
use std::str::FromStr;
use std::sync::Arc;
use std::thread::sleep;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use pitch_metaserver::Metaserver;
use pitch_socket::{BoundSocket, StdUdpSocket};

/// Standalone game-discovery registry: hosts advertise, clients subscribe.
#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct Args {
    /// Bind IPv4 address.
    #[clap(long)]
    ip: Option<String>,

    /// Bind UDP port.
    #[clap(long, default_value = "5678")]
    port: u16,
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
    let socket = StdUdpSocket::bind(SocketAddr::V4(SocketAddrV4::new(ip, args.port)))?;
    log::info!("listening on {}", socket.local_addr());
    let socket: Arc<dyn BoundSocket<SocketAddr>> = Arc::new(socket);
    let mut metaserver = Metaserver::spawn(socket);

    let cancel_token = set_ctrlc_handler();
    while !cancel_token.is_cancelled() {
        sleep(Duration::from_millis(100));
    }

    metaserver.stop();
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
