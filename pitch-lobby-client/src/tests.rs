use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};

use pitch_socket::FakeNetwork;
use pitch_wire::StreamCodec;

use super::*;

fn addr(port: u16) -> SocketAddr {
    SocketAddr::V4(SocketAddrV4::new(Ipv4Addr::LOCALHOST, port))
}

#[test]
fn unhost_from_host_transitions_to_quit() {
    let mut state = State::new(addr(6100));
    let mut buf = Vec::new();
    let Ok(()) = LobbyHello { action: LobbyAction::Unhost }.write_to(&mut buf);
    state.handle_packet(addr(6100), &buf);
    assert_eq!(state.lobby_state, LobbyState::Quit);
}

#[test]
fn packets_from_non_host_are_ignored() {
    let mut state = State::new(addr(6101));
    let mut buf = Vec::new();
    let Ok(()) = LobbyHello { action: LobbyAction::Unhost }.write_to(&mut buf);
    state.handle_packet(addr(9999), &buf);
    assert_eq!(state.lobby_state, LobbyState::Default);
}

#[test]
fn query_response_updates_and_removes_members() {
    let mut state = State::new(addr(6102));
    let target = Addr { ip: 1, port: 42 };

    let mut buf = Vec::new();
    let Ok(()) = LobbyQueryResponse {
        target,
        active: true,
        info: pitch_wire::LobbyMemberInfo { index: 3, intelligence_kind: 1, team: 0 },
    }
    .write_to(&mut buf);
    state.handle_packet(addr(6102), &buf);
    assert!(state.members.contains_key(&target));

    let mut buf = Vec::new();
    let Ok(()) = LobbyQueryResponse {
        target,
        active: false,
        info: pitch_wire::LobbyMemberInfo { index: 3, intelligence_kind: 1, team: 0 },
    }
    .write_to(&mut buf);
    state.handle_packet(addr(6102), &buf);
    assert!(!state.members.contains_key(&target));
}

#[test]
fn start_records_game_maker_and_transitions() {
    let mut state = State::new(addr(6103));
    let mut buf = Vec::new();
    let Ok(()) = LobbyStart { index: 1, team1: 2, team2: 3 }.write_to(&mut buf);
    state.handle_packet(addr(6103), &buf);
    assert_eq!(state.lobby_state, LobbyState::Started);
    assert_eq!(state.game_maker, Some(GameMaker { index: 1, team1: 2, team2: 3 }));
}

#[test]
fn send_hello_reaches_host_over_a_fake_network() {
    let network: FakeNetwork<SocketAddr> = FakeNetwork::new();
    let host_socket = network.bind(addr(6104));
    let client_socket: Arc<dyn BoundSocket<SocketAddr>> = Arc::new(network.bind(addr(7104)));

    let mut client = LobbyClient::spawn(client_socket, addr(6104));

    let mut buf = [0u8; 256];
    let mut received = false;
    for _ in 0..50 {
        if let Ok((n, _)) = host_socket.recv_from(&mut buf) {
            let mut r = &buf[..n];
            if LobbyAction::read_from(&mut r).is_ok() {
                received = true;
                break;
            }
        }
        std::thread::sleep(std::time::Duration::from_millis(20));
    }
    assert!(received, "client never sent a hello/query to its host");

    client.stop();
}
