mod common;

use common::*;
use game_core::{PaddleController, Side, Tracker};
use session::*;

fn started_pair(score_limit: u8) -> (Peer, Peer, std::rc::Rc<std::cell::Cell<u64>>) {
    let (mut host, mut client, clock) = linked_pair(quick_game(score_limit));
    host.session.start();
    client.session.start();
    for _ in 0..5 {
        tick(&mut host, &mut client, &clock);
    }
    assert_eq!(host.session.state(), SessionState::Running);
    assert_eq!(client.session.state(), SessionState::Running);
    (host, client, clock)
}

#[test]
fn test_client_mirrors_the_ball() {
    let (mut host, mut client, clock) = started_pair(3);
    for _ in 0..45 {
        tick(&mut host, &mut client, &clock);
    }
    let host_ball = host.session.kinematics().ball().unwrap();
    let client_ball = client.session.kinematics().ball().unwrap();
    assert_eq!(host_ball.pos, client_ball.pos);
    assert_eq!(host_ball.speed, client_ball.speed);
}

#[test]
fn test_client_paddle_reaches_host() {
    let (mut host, mut client, clock) = started_pair(3);
    assert_eq!(client.session.local_side(), Side::Right);

    for _ in 0..30 {
        client.session.set_input(1, 1);
        tick(&mut host, &mut client, &clock);
    }
    let on_client = client.session.kinematics().paddle(Side::Right).unwrap().y;
    let on_host = host.session.kinematics().paddle(Side::Right).unwrap().y;
    assert!(on_client > 540.0);
    assert!((on_client - on_host).abs() < 10.0, "Host sees the client's paddle");
}

#[test]
fn test_both_paddles_recentre_after_a_goal() {
    let (mut host, mut client, clock) = started_pair(3);

    let mut ticks = 0;
    let scored = |peer: &Peer| {
        let score = peer.session.round().round().score;
        score.left + score.right > 0
    };
    while !scored(&host) && ticks < 60 * 60 {
        client.session.set_input(1, 1);
        tick(&mut host, &mut client, &clock);
        ticks += 1;
    }
    assert!(scored(&host), "Someone scored within a minute");
    assert!(client.session.kinematics().paddle(Side::Right).unwrap().y > 900.0);

    for _ in 0..3 {
        tick(&mut host, &mut client, &clock);
    }

    assert_eq!(client.session.kinematics().paddle(Side::Right).unwrap().y, 540.0);
    assert_eq!(host.session.kinematics().paddle(Side::Right).unwrap().y, 540.0);
    assert!(client.session.round().is_simulating());
}

#[test]
fn test_networked_match_reaches_the_same_result() {
    let (mut host, mut client, clock) = started_pair(3);
    let mut tracker = Tracker::new();

    let mut ticks = 0;
    while ticks < 60 * 600
        && !(host.session.round().round().ended && client.session.round().round().ended)
    {
        let side = host.session.local_side();
        if let Some(view) = host.session.kinematics().view(side) {
            let dir = tracker.decide(&view).dir();
            host.session.set_input(1, dir);
        }
        tick(&mut host, &mut client, &clock);
        ticks += 1;
    }

    assert!(host.session.round().round().ended, "Match over after {ticks} ticks");
    assert!(client.session.round().round().ended, "Client saw the end");

    let on_host = host.session.take_result().expect("host result");
    let on_client = client.session.take_result().expect("client result");
    assert_eq!(on_host.winner_side, on_client.winner_side);
    assert_eq!(on_host.score, on_client.score);
    // Each peer is player 1 on its own machine
    assert_eq!(on_host.winner == 1, on_client.winner == 2);
    assert_eq!(host.session.take_result(), None);

    assert!(host.log.notified.borrow().is_empty());
    assert!(client.log.notified.borrow().is_empty());
}
