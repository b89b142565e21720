use std::time::{Duration, Instant};

/// Tokens are treated as expired this long before their actual expiry, so a
/// token never reaches the server after it stopped being accepted.
pub const EXPIRY_MARGIN: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessToken {
    pub token: String,
    pub expires_at: Instant,
}

impl AccessToken {
    pub fn new(token: impl Into<String>, expires_at: Instant) -> Self {
        Self {
            token: token.into(),
            expires_at,
        }
    }

    pub fn expiring_in(token: impl Into<String>, ttl: Duration) -> Self {
        Self::new(token, Instant::now() + ttl)
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Instant::now())
    }

    pub fn is_expired_at(&self, now: Instant) -> bool {
        now + EXPIRY_MARGIN >= self.expires_at
    }

    /// Value for the `Authorization` header.
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.token)
    }
}
