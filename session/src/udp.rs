//! Non-blocking UDP transport.
//!
//! One message per datagram. The host binds and adopts the first peer that
//! writes to it; the client connects its socket to the host address.
//! Liveness is passive: once the first datagram arrived, the link counts as
//! lost when nothing else arrives within the silence window.

use std::io::ErrorKind;
use std::net::{SocketAddr, ToSocketAddrs, UdpSocket};
use std::time::{Duration, Instant};

use proto::Message;

use crate::{Transport, TransportError};

const MAX_DATAGRAM: usize = 2048;

pub struct UdpTransport {
    socket: UdpSocket,
    peer: Option<SocketAddr>,
    hosting: bool,
    open: bool,
    silence: Duration,
    last_heard: Option<Instant>,
    last_error: Option<TransportError>,
    buf: Vec<u8>,
}

impl UdpTransport {
    /// Bind and wait for a peer to show up
    pub fn host(bind: impl ToSocketAddrs, silence: Duration) -> Result<Self, TransportError> {
        let socket = UdpSocket::bind(bind)?;
        socket.set_nonblocking(true)?;
        log::info!("transport: hosting on {}", socket.local_addr()?);
        Ok(Self::with_socket(socket, None, true, silence))
    }

    /// Bind locally and talk to the host at `peer`
    pub fn join(
        bind: impl ToSocketAddrs,
        peer: SocketAddr,
        silence: Duration,
    ) -> Result<Self, TransportError> {
        let socket = UdpSocket::bind(bind)?;
        socket.set_nonblocking(true)?;
        socket.connect(peer)?;
        log::info!("transport: joining {peer} from {}", socket.local_addr()?);
        Ok(Self::with_socket(socket, Some(peer), false, silence))
    }

    fn with_socket(
        socket: UdpSocket,
        peer: Option<SocketAddr>,
        hosting: bool,
        silence: Duration,
    ) -> Self {
        Self {
            socket,
            peer,
            hosting,
            open: true,
            silence,
            last_heard: None,
            last_error: None,
            buf: vec![0; MAX_DATAGRAM],
        }
    }

    pub fn local_addr(&self) -> Result<SocketAddr, TransportError> {
        Ok(self.socket.local_addr()?)
    }

    pub fn peer_addr(&self) -> Option<SocketAddr> {
        self.peer
    }

    fn silent_too_long(&self) -> bool {
        self.last_heard
            .map(|heard| heard.elapsed() > self.silence)
            .unwrap_or(false)
    }
}

impl Transport for UdpTransport {
    fn send(&mut self, message: &Message) -> Result<(), TransportError> {
        if !self.open {
            return Err(TransportError::Lost);
        }
        // Nobody to talk to yet
        let Some(peer) = self.peer else {
            return Ok(());
        };

        let bytes = message.to_bytes()?;
        let sent = if self.hosting {
            self.socket.send_to(&bytes, peer)
        } else {
            self.socket.send(&bytes)
        };
        match sent {
            Ok(_) => Ok(()),
            Err(err) if err.kind() == ErrorKind::WouldBlock => Ok(()),
            Err(err) => {
                let err = TransportError::from(err);
                self.last_error = Some(err.clone());
                Err(err)
            }
        }
    }

    fn receive(&mut self) -> Option<Message> {
        if !self.open {
            return None;
        }
        loop {
            let (len, from) = match self.socket.recv_from(&mut self.buf) {
                Ok(received) => received,
                Err(err) if err.kind() == ErrorKind::WouldBlock => return None,
                Err(err) => {
                    // ICMP errors surface here on connected sockets
                    self.last_error = Some(TransportError::from(err));
                    return None;
                }
            };

            match self.peer {
                None if self.hosting => {
                    log::info!("transport: peer {from} connected");
                    self.peer = Some(from);
                }
                Some(peer) if peer != from => {
                    log::debug!("transport: ignoring datagram from stranger {from}");
                    continue;
                }
                _ => {}
            }

            self.last_heard = Some(Instant::now());
            match Message::from_bytes(&self.buf[..len]) {
                Ok(message) => return Some(message),
                Err(err) => {
                    log::debug!("transport: dropping malformed datagram: {err}");
                    self.last_error = Some(err.into());
                }
            }
        }
    }

    fn is_connected(&self) -> bool {
        self.open && self.peer.is_some() && !self.silent_too_long()
    }

    fn is_hosting(&self) -> bool {
        self.hosting
    }

    fn disconnect(&mut self) {
        if self.open {
            log::info!("transport: closed");
        }
        self.open = false;
    }

    fn is_connection_lost(&self) -> bool {
        if !self.open || self.last_heard.is_none() {
            return false;
        }
        self.silent_too_long() || matches!(self.last_error, Some(TransportError::Refused(_)))
    }

    fn last_error(&self) -> Option<TransportError> {
        if self.open && self.last_heard.is_some() && self.silent_too_long() {
            return Some(TransportError::Lost);
        }
        self.last_error.clone()
    }
}
