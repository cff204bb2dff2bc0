use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};
use std::thread::sleep;
use std::time::Duration;

use pitch_socket::FakeNetwork;
use pitch_wire::StreamCodec;

use super::*;

fn addr(port: u16) -> SocketAddr {
    SocketAddr::V4(SocketAddrV4::new(Ipv4Addr::LOCALHOST, port))
}

fn recv_query_response(socket: &dyn BoundSocket<SocketAddr>) -> LobbyQueryResponse {
    let mut buf = [0u8; 256];
    for _ in 0..50 {
        match socket.recv_from(&mut buf) {
            Ok((n, _)) => {
                let mut r = &buf[..n];
                if let Ok(response) = LobbyQueryResponse::read_from(&mut r) {
                    return response;
                }
            }
            Err(_) => sleep(Duration::from_millis(5)),
        }
    }
    panic!("no lobby_query_response arrived");
}

fn send(socket: &dyn BoundSocket<SocketAddr>, to: SocketAddr, packet: impl StreamCodec<WriteError = std::convert::Infallible>) {
    let mut buf = Vec::new();
    let Ok(()) = packet.write_to(&mut buf);
    socket.send_to(&buf, to).unwrap();
}

#[test]
fn joining_broadcasts_an_active_query_response() {
    let network: FakeNetwork<SocketAddr> = FakeNetwork::new();
    let server_socket: Arc<dyn BoundSocket<SocketAddr>> = Arc::new(network.bind(addr(6000)));
    let mut server = LobbyServer::spawn(server_socket, vec![], FixedAsciiString::new("arena").unwrap());

    let a = network.bind(addr(7000));
    send(&a, addr(6000), LobbyHello { action: LobbyAction::Connect });

    let response = recv_query_response(&a);
    assert!(response.active);
    assert_eq!(response.info.index, 0);
    assert_eq!(response.info.intelligence_kind, IntelligenceKind::Remote as i8);

    server.stop();
}

#[test]
fn query_for_unknown_target_reports_inactive() {
    let network: FakeNetwork<SocketAddr> = FakeNetwork::new();
    let server_socket: Arc<dyn BoundSocket<SocketAddr>> = Arc::new(network.bind(addr(6001)));
    let mut server = LobbyServer::spawn(server_socket, vec![], FixedAsciiString::new("arena").unwrap());

    let a = network.bind(addr(7001));
    let unknown = to_wire_addr(addr(9999));
    send(&a, addr(6001), LobbyQuery { target: unknown });

    let response = recv_query_response(&a);
    assert_eq!(response.target, unknown);
    assert!(!response.active);

    server.stop();
}

#[test]
fn action_join_then_kick_updates_membership() {
    let mut state = State::new(vec![], FixedAsciiString::new("arena").unwrap());
    let network: FakeNetwork<SocketAddr> = FakeNetwork::new();
    let socket = network.bind(addr(6002));

    let member_addr = to_wire_addr(addr(8000));
    state.action_join(&socket, member_addr);
    assert!(state.lobby.contains(&member_addr));

    state.action_kick(&socket, member_addr);
    assert!(!state.lobby.contains(&member_addr));
}

#[test]
fn start_transitions_state_and_is_idempotent() {
    let mut state = State::new(vec![], FixedAsciiString::new("arena").unwrap());
    let network: FakeNetwork<SocketAddr> = FakeNetwork::new();
    let socket = network.bind(addr(6003));

    state.action_start(&socket);
    assert_eq!(state.state, LobbyState::Started);

    // A second call is a no-op; no panic, state unchanged.
    state.action_start(&socket);
    assert_eq!(state.state, LobbyState::Started);
}
