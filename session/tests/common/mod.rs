#![allow(dead_code)]

use game_core::{Config, Params};
use session::*;
use std::cell::{Cell, RefCell};
use std::rc::Rc;

pub const DT: f32 = Params::FIXED_DT;
pub const TICK_MS: u64 = 16;

/// Shared test clock plus a record of what the session told its surroundings
#[derive(Default)]
pub struct EnvLog {
    pub notified: RefCell<Vec<SessionError>>,
    pub menu_requests: Cell<u32>,
}

pub struct TestEnv {
    pub clock: Rc<Cell<u64>>,
    pub log: Rc<EnvLog>,
}

impl Environment for TestEnv {
    fn now(&self) -> u64 {
        self.clock.get()
    }

    fn notify(&self, error: &SessionError) {
        self.log.notified.borrow_mut().push(error.clone());
    }

    fn request_menu(&self) {
        self.log.menu_requests.set(self.log.menu_requests.get() + 1);
    }

    fn wait(&self, ms: u64) {
        self.clock.set(self.clock.get() + ms);
    }
}

pub fn quick_game(score_limit: u8) -> Config {
    Config::new()
        .with_score_limit(score_limit)
        .with_countdown(Vec::new(), 1.0)
}

pub struct Peer {
    pub session: SyncSession,
    pub log: Rc<EnvLog>,
}

pub fn peer(
    authority: Authority,
    name: &str,
    game: Config,
    transport: MemoryTransport,
    clock: &Rc<Cell<u64>>,
) -> Peer {
    let log = Rc::new(EnvLog::default());
    let env = TestEnv {
        clock: Rc::clone(clock),
        log: Rc::clone(&log),
    };
    let session = SyncSession::for_role(
        Role::Networked(authority),
        game,
        2024,
        Box::new(transport),
        Box::new(env),
        SessionConfig::new().with_name(name),
    );
    Peer { session, log }
}

/// Host and client sessions joined by an in-memory link
pub fn linked_pair(game: Config) -> (Peer, Peer, Rc<Cell<u64>>) {
    let clock = Rc::new(Cell::new(0));
    let (host_link, client_link) = MemoryTransport::pair();
    let host = peer(Authority::Host, "alice", game.clone(), host_link, &clock);
    let client = peer(Authority::Client, "bob", game, client_link, &clock);
    (host, client, clock)
}

/// One frame for both peers
pub fn tick(host: &mut Peer, client: &mut Peer, clock: &Rc<Cell<u64>>) {
    clock.set(clock.get() + TICK_MS);
    host.session.update(DT);
    client.session.update(DT);
}
