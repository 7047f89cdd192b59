//! Request tokens: latest-wins guard for dismissed operations.
//!
//! The console cannot cancel an in-flight broker request when a dialog is
//! dismissed. Instead, every operation takes a token from the issuer, and
//! only a response carrying the *current* token may touch state. Issuing a
//! new token invalidates every earlier one, so late arrivals become safe
//! no-ops.

use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RequestToken(u64);

#[derive(Debug, Default)]
pub struct TokenIssuer {
    current: AtomicU64,
}

impl TokenIssuer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take a fresh token for a new operation. Prior tokens go stale.
    pub fn issue(&self) -> RequestToken {
        RequestToken(self.current.fetch_add(1, Ordering::SeqCst) + 1)
    }

    /// Whether a response carrying this token is still welcome.
    pub fn is_current(&self, token: RequestToken) -> bool {
        token.0 == self.current.load(Ordering::SeqCst)
    }

    /// Invalidate whatever is in flight without starting anything new
    /// (dialog dismissed).
    pub fn invalidate(&self) {
        self.current.fetch_add(1, Ordering::SeqCst);
    }
}
