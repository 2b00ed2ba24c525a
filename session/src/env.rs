use std::cell::Cell;
use std::time::{Duration, Instant};

use crate::SessionError;

/// Collaborators a session needs from its surroundings (clock, messaging,
/// menus). Abstracted so tests can drive time by hand.
pub trait Environment {
    /// Monotonic milliseconds
    fn now(&self) -> u64;

    /// Show a user-facing error
    fn notify(&self, error: &SessionError);

    /// Leave the match for a menu context
    fn request_menu(&self);

    /// Block for a short while; only used by the bounded handshake
    fn wait(&self, ms: u64) {
        std::thread::sleep(Duration::from_millis(ms));
    }
}

/// Real clock, errors and menu requests go to the log
pub struct SystemEnv {
    started: Instant,
    menu_requested: Cell<bool>,
}

impl SystemEnv {
    pub fn new() -> Self {
        Self {
            started: Instant::now(),
            menu_requested: Cell::new(false),
        }
    }

    pub fn menu_requested(&self) -> bool {
        self.menu_requested.get()
    }
}

impl Default for SystemEnv {
    fn default() -> Self {
        Self::new()
    }
}

impl Environment for SystemEnv {
    fn now(&self) -> u64 {
        self.started.elapsed().as_millis() as u64
    }

    fn notify(&self, error: &SessionError) {
        log::error!("{error}");
    }

    fn request_menu(&self) {
        log::info!("session: returning to menu");
        self.menu_requested.set(true);
    }
}
