use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};
use std::sync::Arc;
use std::thread::sleep;
use std::time::Duration;

use pitch_socket::FakeNetwork;
use pitch_wire::StreamCodec;

use super::*;

fn addr(port: u16) -> SocketAddr {
    SocketAddr::V4(SocketAddrV4::new(Ipv4Addr::LOCALHOST, port))
}

fn recv(socket: &dyn BoundSocket<SocketAddr>) -> MetaserverResponse {
    let mut buf = [0u8; 256];
    for _ in 0..50 {
        match socket.recv_from(&mut buf) {
            Ok((n, _)) => {
                let mut r = &buf[..n];
                return MetaserverResponse::read_from(&mut r).unwrap();
            }
            Err(_) => sleep(Duration::from_millis(5)),
        }
    }
    panic!("no response arrived");
}

#[test]
fn host_game_is_broadcast_to_subscribers() {
    let network: FakeNetwork<SocketAddr> = FakeNetwork::new();
    let server_socket: Arc<dyn BoundSocket<SocketAddr>> = Arc::new(network.bind(addr(5678)));
    let mut server = Metaserver::spawn(server_socket);

    let subscriber = network.bind(addr(40000));
    let hello = MetaserverHello { action: MSAction::Hello, name: FixedAsciiString::new("").unwrap() };
    let mut buf = Vec::new();
    hello.write_to(&mut buf).unwrap();
    subscriber.send_to(&buf, addr(5678)).unwrap();

    sleep(Duration::from_millis(30));

    let host = network.bind(addr(50000));
    let hello = MetaserverHello {
        action: MSAction::HostGame,
        name: FixedAsciiString::new("arena").unwrap(),
    };
    let mut buf = Vec::new();
    hello.write_to(&mut buf).unwrap();
    host.send_to(&buf, addr(5678)).unwrap();

    let response = recv(&subscriber);
    assert_eq!(response.action, MSAction::HostGame);
    assert_eq!(response.name.as_str(), "arena");
    assert_eq!(response.host, to_wire_addr(addr(50000)));

    server.stop();
}

#[test]
fn unhost_game_clears_the_game_list_entry() {
    let mut state = State::new();
    let network: FakeNetwork<SocketAddr> = FakeNetwork::new();
    let socket = network.bind(addr(5678));

    let host = addr(50000);
    state.games.insert(host, FixedAsciiString::new("arena").unwrap());

    let mut buf = Vec::new();
    MetaserverHello { action: MSAction::UnhostGame, name: FixedAsciiString::new("").unwrap() }
        .write_to(&mut buf)
        .unwrap();
    state.handle_packet(&socket, host, &buf);

    assert!(!state.games.contains_key(&host));
}
