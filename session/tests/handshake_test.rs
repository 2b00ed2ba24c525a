mod common;

use common::*;
use proto::HandshakeKind;
use session::*;
use std::cell::Cell;
use std::rc::Rc;

#[test]
fn test_both_peers_initialize_over_memory_link() {
    let (mut host, mut client, clock) = linked_pair(quick_game(3));
    host.session.start();
    client.session.start();

    for _ in 0..20 {
        tick(&mut host, &mut client, &clock);
    }

    assert!(host.session.is_initialized());
    assert!(client.session.is_initialized());
    assert_eq!(host.session.state(), SessionState::Running);
    assert_eq!(client.session.state(), SessionState::Running);
    assert_eq!(host.session.peer_name(), Some("bob"));
    assert_eq!(client.session.peer_name(), Some("alice"));
    assert!(clock.get() < 5_000, "Well within the timeout");

    for side in [&host, &client] {
        let handshake = side.session.handshake().unwrap();
        for kind in [HandshakeKind::Pseudo, HandshakeKind::Ready] {
            let item = handshake.item(kind).unwrap();
            assert!(item.sent && item.received, "{kind} exchanged");
        }
    }
}

#[test]
fn test_handshake_survives_a_late_peer() {
    let (mut host, mut client, clock) = linked_pair(quick_game(3));
    host.session.start();
    for _ in 0..50 {
        clock.set(clock.get() + TICK_MS);
        host.session.update(DT);
    }
    assert_eq!(host.session.state(), SessionState::Handshaking);

    client.session.start();
    for _ in 0..50 {
        tick(&mut host, &mut client, &clock);
    }
    assert_eq!(host.session.state(), SessionState::Running);
    assert_eq!(client.session.state(), SessionState::Running);
}

#[test]
fn test_silent_peer_times_out() {
    let (mut host, _client, clock) = linked_pair(quick_game(3));
    host.session.start();

    while clock.get() <= 6_000 {
        clock.set(clock.get() + TICK_MS);
        host.session.update(DT);
    }

    assert_eq!(host.session.state(), SessionState::Closed);
    assert!(!host.session.is_initialized());
    assert!(matches!(
        host.session.last_error(),
        Some(SessionError::HandshakeTimeout { .. })
    ));
    assert_eq!(host.log.notified.borrow().len(), 1);
}

#[test]
fn test_blocking_negotiation_times_out() {
    let clock = Rc::new(Cell::new(0));
    let env = TestEnv {
        clock: Rc::clone(&clock),
        log: Rc::new(EnvLog::default()),
    };
    let (mut host_link, _client_link) = MemoryTransport::pair();
    let mut negotiator = Negotiator::new(Authority::Host, "alice", 1_000, 250);

    let status = negotiator.run(&mut host_link, &env);

    assert_eq!(status, HandshakeStatus::TimedOut);
    assert!(clock.get() >= 1_000);
    assert!(clock.get() < 1_100, "Stops soon after the deadline");
}
