//! Handshake negotiator.
//!
//! Items are exchanged one at a time, in order: `pseudo` then `ready`. The
//! first item we have not yet received from the peer is the pending one; we
//! send our copy of it and resend on an interval until the peer's copy
//! arrives. Only a fully typed message for the pending item advances the
//! sequence, so duplicates and reordering are harmless.
//!
//! Once every item is received the host sends `start` and is done; the
//! client keeps resending `ready` until `start` arrives.

use proto::{HandshakeKind, Message, Value, PSEUDO_KEY};

use crate::{Authority, Environment, Transport};

/// Poll interval used by [`Negotiator::run`]
pub const POLL_INTERVAL_MS: u64 = 10;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ItemState {
    pub sent: bool,
    pub received: bool,
    last_sent_at: Option<u64>,
}

impl ItemState {
    fn due(&self, now: u64, interval: u64) -> bool {
        match self.last_sent_at {
            None => true,
            Some(at) => now.saturating_sub(at) >= interval,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandshakeStatus {
    Pending,
    Complete,
    TimedOut,
}

pub struct Negotiator {
    authority: Authority,
    name: String,
    items: Vec<(HandshakeKind, ItemState)>,
    start: ItemState,
    timeout_ms: u64,
    resend_ms: u64,
    started_at: Option<u64>,
    peer_name: Option<String>,
    status: HandshakeStatus,
}

impl Negotiator {
    pub fn new(authority: Authority, name: &str, timeout_ms: u64, resend_ms: u64) -> Self {
        Self {
            authority,
            name: name.to_string(),
            items: vec![
                (HandshakeKind::Pseudo, ItemState::default()),
                (HandshakeKind::Ready, ItemState::default()),
            ],
            start: ItemState::default(),
            timeout_ms,
            resend_ms,
            started_at: None,
            peer_name: None,
            status: HandshakeStatus::Pending,
        }
    }

    pub fn status(&self) -> HandshakeStatus {
        self.status
    }

    pub fn peer_name(&self) -> Option<&str> {
        self.peer_name.as_deref()
    }

    pub fn item(&self, kind: HandshakeKind) -> Option<&ItemState> {
        if kind == HandshakeKind::Start {
            return Some(&self.start);
        }
        self.items
            .iter()
            .find(|(k, _)| *k == kind)
            .map(|(_, state)| state)
    }

    /// Milliseconds since the first poll
    pub fn elapsed(&self, now: u64) -> u64 {
        self.started_at
            .map(|at| now.saturating_sub(at))
            .unwrap_or(0)
    }

    fn pending(&self) -> Option<usize> {
        self.items.iter().position(|(_, state)| !state.received)
    }

    fn all_received(&self) -> bool {
        self.pending().is_none()
    }

    /// Our own copy of a handshake item
    fn own_copy(&self, kind: HandshakeKind) -> Message {
        match kind {
            HandshakeKind::Pseudo => Message::pseudo(&self.name),
            HandshakeKind::Ready => Message::ready(),
            HandshakeKind::Start => Message::start(),
        }
    }

    fn send(&self, transport: &mut dyn Transport, kind: HandshakeKind) -> bool {
        match transport.send(&self.own_copy(kind)) {
            Ok(()) => {
                log::debug!("handshake: sent {kind}");
                true
            }
            Err(err) => {
                log::warn!("handshake: failed to send {kind}: {err}");
                false
            }
        }
    }

    fn send_item(&mut self, transport: &mut dyn Transport, index: usize, now: u64) {
        let (kind, state) = self.items[index];
        if state.sent && !state.due(now, self.resend_ms) {
            return;
        }
        if self.send(transport, kind) {
            let state = &mut self.items[index].1;
            state.sent = true;
            state.last_sent_at = Some(now);
        }
    }

    fn send_start(&mut self, transport: &mut dyn Transport, now: u64) {
        if self.send(transport, HandshakeKind::Start) {
            self.start.sent = true;
            self.start.last_sent_at = Some(now);
        }
    }

    fn send_outstanding(&mut self, transport: &mut dyn Transport, now: u64) {
        match self.pending() {
            Some(index) => self.send_item(transport, index, now),
            None => match self.authority {
                Authority::Host => {
                    self.send_start(transport, now);
                    self.status = HandshakeStatus::Complete;
                    log::info!(
                        "handshake: complete with {}",
                        self.peer_name().unwrap_or("?")
                    );
                }
                // The host may have missed our ready
                Authority::Client => {
                    let last = self.items.len() - 1;
                    self.send_item(transport, last, now);
                }
            },
        }
    }

    /// One non-blocking step of the negotiation
    pub fn poll(&mut self, transport: &mut dyn Transport, now: u64) -> HandshakeStatus {
        if self.status != HandshakeStatus::Pending {
            return self.status;
        }
        if self.started_at.is_none() {
            self.started_at = Some(now);
        }

        self.send_outstanding(transport, now);

        while self.status == HandshakeStatus::Pending {
            let Some(message) = transport.receive() else {
                break;
            };
            self.handle(transport, &message, now);
            if self.status == HandshakeStatus::Pending {
                self.send_outstanding(transport, now);
            }
        }

        if self.status == HandshakeStatus::Pending && self.elapsed(now) >= self.timeout_ms {
            log::warn!("handshake: timed out after {} ms", self.elapsed(now));
            self.status = HandshakeStatus::TimedOut;
        }
        self.status
    }

    fn handle(&mut self, transport: &mut dyn Transport, message: &Message, now: u64) {
        let Some(kind) = message.kind() else {
            log::debug!("handshake: ignoring untyped message");
            return;
        };

        if kind == HandshakeKind::Start {
            if self.authority == Authority::Client && self.all_received() {
                self.start.received = true;
                self.status = HandshakeStatus::Complete;
                log::info!(
                    "handshake: complete with {}",
                    self.peer_name().unwrap_or("?")
                );
            }
            return;
        }

        let Some(index) = self.items.iter().position(|(k, _)| *k == kind) else {
            return;
        };

        if self.items[index].1.received {
            // The peer is resending, so it never got our copy
            self.send_item(transport, index, now);
            return;
        }
        if Some(index) != self.pending() {
            log::debug!("handshake: {kind} arrived out of order");
            return;
        }

        if kind == HandshakeKind::Pseudo {
            match message.get(PSEUDO_KEY).and_then(Value::as_str) {
                Some(name) => self.peer_name = Some(name.to_string()),
                None => {
                    log::debug!("handshake: pseudo without a name");
                    return;
                }
            }
        }
        self.items[index].1.received = true;
        log::debug!("handshake: received {kind}");
    }

    /// Reply to handshake traffic that arrives after completion: the peer is
    /// still waiting for our copies and, after `ready`, for `start`.
    pub fn answer_late(&mut self, transport: &mut dyn Transport, message: &Message, now: u64) {
        if self.status != HandshakeStatus::Complete || self.authority != Authority::Host {
            return;
        }
        match message.kind() {
            Some(HandshakeKind::Pseudo) => {
                self.send(transport, HandshakeKind::Pseudo);
            }
            Some(HandshakeKind::Ready) => {
                self.send(transport, HandshakeKind::Ready);
                self.send_start(transport, now);
            }
            _ => {}
        }
    }

    /// Block until the negotiation completes or times out
    pub fn run(&mut self, transport: &mut dyn Transport, env: &dyn Environment) -> HandshakeStatus {
        loop {
            let status = self.poll(transport, env.now());
            if status != HandshakeStatus::Pending {
                return status;
            }
            env.wait(POLL_INTERVAL_MS);
        }
    }
}
