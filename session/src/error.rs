use game_core::CodecError;

/// Failures reported by a transport. Never fatal; surfaced through
/// `last_error()` queries.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TransportError {
    #[error("connection refused: {0}")]
    Refused(String),
    #[error("connection lost")]
    Lost,
    #[error("malformed payload: {0}")]
    Malformed(String),
    #[error("i/o error: {0}")]
    Io(String),
}

impl From<std::io::Error> for TransportError {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::ConnectionRefused => TransportError::Refused(err.to_string()),
            _ => TransportError::Io(err.to_string()),
        }
    }
}

impl From<proto::ProtoError> for TransportError {
    fn from(err: proto::ProtoError) -> Self {
        TransportError::Malformed(err.to_string())
    }
}

/// Errors a session records and hands to the environment
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SessionError {
    #[error("connection lost: {reason}")]
    ConnectionLost { reason: String },
    #[error("handshake timed out after {waited_ms} ms")]
    HandshakeTimeout { waited_ms: u64 },
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error("bad state message: {0}")]
    Codec(#[from] CodecError),
}
