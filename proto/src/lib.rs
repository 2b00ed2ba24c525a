//! Network protocol for Pong peers
//!
//! Every message on the wire is a flat key-value map of primitive scalars.
//! Handshake messages carry a `type` key; steady-state messages carry only
//! the filtered state fields. Uses postcard for compact binary serialization.

use postcard::{from_bytes, to_allocvec};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Key naming the handshake item a message belongs to
pub const TYPE_KEY: &str = "type";

/// Key carrying the display name in a `pseudo` message
pub const PSEUDO_KEY: &str = "pseudo";

/// Protocol version advertised in lobby entries
pub const PROTOCOL_VERSION: &str = "0.1.0";

#[derive(Debug, thiserror::Error)]
pub enum ProtoError {
    #[error("serialization failed: {0}")]
    Serialize(postcard::Error),
    #[error("deserialization failed: {0}")]
    Deserialize(postcard::Error),
}

// ============================================================================
// Scalar values
// ============================================================================

/// A primitive scalar carried by a message field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Nil,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

impl Value {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Integers are accepted where a float is expected, not the other way round
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            Value::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn is_nil(&self) -> bool {
        matches!(self, Value::Nil)
    }

    /// Short type name used in error reports
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Nil => "nil",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Str(_) => "str",
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::Float(v as f64)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<u8> for Value {
    fn from(v: u8) -> Self {
        Value::Int(v as i64)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Str(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Str(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Nil)
    }
}

// ============================================================================
// Messages
// ============================================================================

/// Flat field name -> scalar map exchanged between peers
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Message {
    fields: BTreeMap<String, Value>,
}

impl Message {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.fields.insert(key.into(), value.into());
    }

    /// Builder-style insert
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Declared handshake type, if this is a handshake message
    pub fn kind(&self) -> Option<HandshakeKind> {
        self.get(TYPE_KEY)
            .and_then(Value::as_str)
            .and_then(HandshakeKind::parse)
    }

    pub fn pseudo(name: &str) -> Self {
        Self::new()
            .with(TYPE_KEY, HandshakeKind::Pseudo.as_str())
            .with(PSEUDO_KEY, name)
    }

    pub fn ready() -> Self {
        Self::new().with(TYPE_KEY, HandshakeKind::Ready.as_str())
    }

    pub fn start() -> Self {
        Self::new().with(TYPE_KEY, HandshakeKind::Start.as_str())
    }

    /// Serialize message to bytes
    pub fn to_bytes(&self) -> Result<Vec<u8>, ProtoError> {
        to_allocvec(self).map_err(ProtoError::Serialize)
    }

    /// Deserialize message from bytes
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ProtoError> {
        from_bytes(bytes).map_err(ProtoError::Deserialize)
    }
}

impl FromIterator<(String, Value)> for Message {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self {
            fields: iter.into_iter().collect(),
        }
    }
}

// ============================================================================
// Handshake items
// ============================================================================

/// Declared type of a handshake message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HandshakeKind {
    /// Display name exchange
    Pseudo,
    /// Peer is ready to play
    Ready,
    /// Host releases the client into gameplay
    Start,
}

impl HandshakeKind {
    pub fn as_str(self) -> &'static str {
        match self {
            HandshakeKind::Pseudo => "pseudo",
            HandshakeKind::Ready => "ready",
            HandshakeKind::Start => "start",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pseudo" => Some(HandshakeKind::Pseudo),
            "ready" => Some(HandshakeKind::Ready),
            "start" => Some(HandshakeKind::Start),
            _ => None,
        }
    }
}

impl fmt::Display for HandshakeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Lobby directory
// ============================================================================

/// Entry advertised by a hosting peer to the lobby directory
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LobbyEntry {
    pub name: String,
    pub mode: String,
    /// Side taken by the host (0 = left, 1 = right)
    pub host_side: u8,
    pub max_players: u8,
    pub max_spectators: u8,
    /// Creation time, seconds since the Unix epoch
    pub time: u64,
    pub version: String,
}

impl LobbyEntry {
    pub fn new(name: impl Into<String>, mode: impl Into<String>, host_side: u8, time: u64) -> Self {
        Self {
            name: name.into(),
            mode: mode.into(),
            host_side,
            max_players: 2,
            max_spectators: 0,
            time,
            version: PROTOCOL_VERSION.to_string(),
        }
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, ProtoError> {
        to_allocvec(self).map_err(ProtoError::Serialize)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ProtoError> {
        from_bytes(bytes).map_err(ProtoError::Deserialize)
    }
}
