//! Tenant boundary.
//!
//! A [`UserScope`] is proof that the identity layer resolved the caller to a
//! registered user. It can only be minted inside this crate by
//! [`crate::core::user`], and every store and query function takes one, so a
//! query that is not filtered by owner cannot be expressed through the public API.

use std::fmt;

/// Authenticated owner of everything a core operation reads or writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UserScope {
    user_id: i64,
}

impl UserScope {
    pub(crate) const fn new(user_id: i64) -> Self {
        Self { user_id }
    }

    /// Internal id of the owning user.
    #[must_use]
    pub const fn user_id(&self) -> i64 {
        self.user_id
    }

    /// Per-user idempotency key as stored in the event table.
    #[must_use]
    pub fn dedupe_key(&self, token: &str) -> String {
        format!("{}:{}", self.user_id, token)
    }
}

impl fmt::Display for UserScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "user#{}", self.user_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dedupe_key_is_namespaced_by_user() {
        let alice = UserScope::new(1);
        let bob = UserScope::new(2);
        assert_eq!(alice.dedupe_key("abc"), "1:abc");
        assert_ne!(alice.dedupe_key("abc"), bob.dedupe_key("abc"));
    }
}
