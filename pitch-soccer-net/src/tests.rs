use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};
use std::thread::sleep;
use std::time::Duration;

use pitch_sim::soccer::{GameState, MatchConfig};
use pitch_socket::FakeNetwork;

use super::*;

fn addr(port: u16) -> SocketAddr {
    SocketAddr::V4(SocketAddrV4::new(Ipv4Addr::LOCALHOST, port))
}

#[test]
fn server_dispatches_inbound_z_action_to_soccer() {
    let network: FakeNetwork<SocketAddr> = FakeNetwork::new();
    let server_socket: Arc<dyn BoundSocket<SocketAddr>> = Arc::new(network.bind(addr(6200)));
    let soccer = Arc::new(Soccer::new(1, 1, MatchConfig::default()));
    soccer.c_action(0, Vector3::zeros()); // no-op pre-kickoff; just exercises the mutex path
    let mut server = SoccerServer::spawn(server_socket, soccer.clone());

    let client = network.bind(addr(7200));
    let action = GameAction { kind: GameActionKind::F, id: 0, dir: 1.25, dest: Vector3::zeros() };
    let mut buf = Vec::new();
    let Ok(()) = action.write_to(&mut buf);
    client.send_to(&buf, addr(6200)).unwrap();

    let mut facing = 0.0;
    for _ in 0..50 {
        let snap = soccer.snapshot();
        facing = snap.players[0].facing;
        if (facing - 1.25).abs() < 1e-3 {
            break;
        }
        sleep(Duration::from_millis(10));
    }
    assert!((facing - 1.25).abs() < 1e-3, "f_action was never dispatched, facing={facing}");

    server.stop();
}

#[test]
fn malformed_packet_is_dropped_without_dispatch() {
    let soccer = Soccer::new(1, 1, MatchConfig::default());
    dispatch(&soccer, addr(1), &[0xff]);
    assert_eq!(soccer.state(), GameState::RedStart);
}

#[test]
fn remote_z_action_sends_a_game_action_with_own_id() {
    let network: FakeNetwork<SocketAddr> = FakeNetwork::new();
    let server = network.bind(addr(6201));
    let client_socket: Arc<dyn BoundSocket<SocketAddr>> = Arc::new(network.bind(addr(7201)));
    let remote = SoccerRemote::new(client_socket, addr(6201), 7);

    remote.z_action();

    let mut buf = [0u8; 256];
    let (n, _) = server.recv_from(&mut buf).unwrap();
    let mut r = &buf[..n];
    let action = GameAction::read_from(&mut r).unwrap();
    assert_eq!(action.kind, GameActionKind::Z);
    assert_eq!(action.id, 7);
}

#[test]
fn remote_leave_marks_quit_without_sending() {
    let network: FakeNetwork<SocketAddr> = FakeNetwork::new();
    let server = network.bind(addr(6202));
    let client_socket: Arc<dyn BoundSocket<SocketAddr>> = Arc::new(network.bind(addr(7202)));
    let remote = SoccerRemote::new(client_socket, addr(6202), 1);

    remote.leave();
    assert!(remote.has_quit());

    let mut buf = [0u8; 256];
    assert!(server.recv_from(&mut buf).is_err());
}
