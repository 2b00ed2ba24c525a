use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use proto::Message;

use crate::TransportError;

/// Connection to the other peer.
///
/// `receive` never blocks: it returns `None` when nothing is waiting.
/// Failures are reported through `last_error` and `is_connection_lost`
/// rather than through control flow.
pub trait Transport {
    fn send(&mut self, message: &Message) -> Result<(), TransportError>;
    fn receive(&mut self) -> Option<Message>;
    fn is_connected(&self) -> bool;
    fn is_hosting(&self) -> bool;
    fn disconnect(&mut self);
    fn is_connection_lost(&self) -> bool;
    fn last_error(&self) -> Option<TransportError>;
}

/// Transport for solo and local play: sends go nowhere, nothing arrives
#[derive(Debug, Default, Clone, Copy)]
pub struct Offline;

impl Transport for Offline {
    fn send(&mut self, _message: &Message) -> Result<(), TransportError> {
        Ok(())
    }

    fn receive(&mut self) -> Option<Message> {
        None
    }

    fn is_connected(&self) -> bool {
        false
    }

    fn is_hosting(&self) -> bool {
        false
    }

    fn disconnect(&mut self) {}

    fn is_connection_lost(&self) -> bool {
        false
    }

    fn last_error(&self) -> Option<TransportError> {
        None
    }
}

#[derive(Debug, Default)]
struct Link {
    inboxes: [VecDeque<Vec<u8>>; 2],
    severed: bool,
}

/// In-process transport. Messages still go through the byte encoding so
/// both ends see exactly what a socket would carry.
#[derive(Debug)]
pub struct MemoryTransport {
    link: Rc<RefCell<Link>>,
    end: usize,
    connected: bool,
    last_error: Option<TransportError>,
}

impl MemoryTransport {
    /// Connected (host, client) ends
    pub fn pair() -> (Self, Self) {
        let link = Rc::new(RefCell::new(Link::default()));
        let end = |end| Self {
            link: Rc::clone(&link),
            end,
            connected: true,
            last_error: None,
        };
        (end(0), end(1))
    }

    /// Cut the link as if the network went away; both ends see it lost
    pub fn sever(&self) {
        self.link.borrow_mut().severed = true;
    }

    /// Handle on the shared link, usable after the transport was handed off
    pub fn handle(&self) -> LinkHandle {
        LinkHandle {
            link: Rc::clone(&self.link),
        }
    }

    /// Deliver raw bytes to this end, bypassing the encoder
    pub fn inject_raw(&self, bytes: Vec<u8>) {
        self.link.borrow_mut().inboxes[self.end].push_back(bytes);
    }

    /// Messages waiting to be received by this end
    pub fn pending(&self) -> usize {
        self.link.borrow().inboxes[self.end].len()
    }
}

/// Lets a test cut a link whose ends are owned by sessions
#[derive(Debug, Clone)]
pub struct LinkHandle {
    link: Rc<RefCell<Link>>,
}

impl LinkHandle {
    pub fn sever(&self) {
        self.link.borrow_mut().severed = true;
    }

    pub fn is_severed(&self) -> bool {
        self.link.borrow().severed
    }
}

impl Transport for MemoryTransport {
    fn send(&mut self, message: &Message) -> Result<(), TransportError> {
        if !self.connected || self.link.borrow().severed {
            self.last_error = Some(TransportError::Lost);
            return Err(TransportError::Lost);
        }
        let bytes = message.to_bytes()?;
        self.link.borrow_mut().inboxes[1 - self.end].push_back(bytes);
        Ok(())
    }

    fn receive(&mut self) -> Option<Message> {
        if !self.connected {
            return None;
        }
        loop {
            let bytes = self.link.borrow_mut().inboxes[self.end].pop_front()?;
            match Message::from_bytes(&bytes) {
                Ok(message) => return Some(message),
                Err(err) => {
                    log::debug!("transport: dropping malformed datagram: {err}");
                    self.last_error = Some(err.into());
                }
            }
        }
    }

    fn is_connected(&self) -> bool {
        self.connected && !self.link.borrow().severed
    }

    fn is_hosting(&self) -> bool {
        self.end == 0
    }

    fn disconnect(&mut self) {
        if self.connected {
            self.connected = false;
            let mut link = self.link.borrow_mut();
            link.severed = true;
            link.inboxes[self.end].clear();
        }
    }

    fn is_connection_lost(&self) -> bool {
        self.connected && self.link.borrow().severed
    }

    fn last_error(&self) -> Option<TransportError> {
        if self.is_connection_lost() {
            return Some(TransportError::Lost);
        }
        self.last_error.clone()
    }
}
