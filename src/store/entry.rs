use crate::types::RedisValue;
use std::time::{SystemTime, UNIX_EPOCH};

/// An entry in the keyspace: the value plus its optional deadline.
#[derive(Debug, Clone, PartialEq)]
pub struct Entry {
    pub value: RedisValue,
    /// Expiry time as milliseconds since UNIX epoch. None = no expiry.
    pub expires_at: Option<u64>,
}

impl Entry {
    pub fn new(value: RedisValue) -> Self {
        Entry {
            value,
            expires_at: None,
        }
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(now_millis())
    }

    pub fn is_expired_at(&self, now: u64) -> bool {
        self.expires_at.is_some_and(|exp| now >= exp)
    }
}

/// Get current time in milliseconds since UNIX epoch.
pub fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
