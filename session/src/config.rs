use game_core::Side;

/// Session settings
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Display name sent in the `pseudo` handshake item
    pub name: String,
    pub handshake_timeout_ms: u64,
    /// Delay before a handshake item is sent again
    pub resend_interval_ms: u64,
    /// Side the hosting peer plays on; the client takes the other one
    pub host_side: Side,
    /// Send state every N ticks
    pub send_every: u32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            name: "player".to_string(),
            handshake_timeout_ms: 5_000,
            resend_interval_ms: 250,
            host_side: Side::Left,
            send_every: 1,
        }
    }
}

impl SessionConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_handshake_timeout(mut self, timeout_ms: u64) -> Self {
        self.handshake_timeout_ms = timeout_ms;
        self
    }

    pub fn with_resend_interval(mut self, resend_ms: u64) -> Self {
        self.resend_interval_ms = resend_ms;
        self
    }

    pub fn with_host_side(mut self, side: Side) -> Self {
        self.host_side = side;
        self
    }

    pub fn with_send_every(mut self, ticks: u32) -> Self {
        self.send_every = ticks.max(1);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SessionConfig::new();
        assert_eq!(config.handshake_timeout_ms, 5_000);
        assert_eq!(config.resend_interval_ms, 250);
        assert_eq!(config.host_side, Side::Left);
    }

    #[test]
    fn test_send_every_is_at_least_one() {
        assert_eq!(SessionConfig::new().with_send_every(0).send_every, 1);
    }
}
