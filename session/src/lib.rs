//! Two-peer synchronization: transports, handshake and the per-tick session.

pub mod config;
pub mod env;
pub mod error;
pub mod handshake;
pub mod sync;
pub mod transport;
pub mod udp;

pub use config::*;
pub use env::*;
pub use error::*;
pub use handshake::*;
pub use sync::*;
pub use transport::*;
pub use udp::*;
