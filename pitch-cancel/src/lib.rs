//! A cooperative cancellation flag for actor threads.
//!
//! Actor `listen` loops (§5: "each actor exposes `stop()` which sets a
//! finalise flag and joins the listener thread") poll [`Token::is_cancelled`]
//! on every iteration rather than being forcibly interrupted.

use std::fmt::{self, Debug, Formatter};
use std::ops::Deref;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// A cancellation flag.
///
/// Once set, always cancelled. Clonable; every clone observes the same
/// underlying state.
#[derive(Clone, Default)]
pub struct Token {
    inner: Arc<AtomicBool>,
}

impl Token {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_cancelled(&self) -> bool {
        self.inner.load(Ordering::Acquire)
    }

    pub fn cancel(&self) {
        self.inner.store(true, Ordering::Release);
    }

    /// Wraps this token in a [`Guard`] that cancels it on drop.
    pub fn guard(&self) -> Guard {
        Guard::new(self.clone())
    }
}

impl Debug for Token {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        f.debug_struct("Token")
            .field("is_cancelled", &self.is_cancelled())
            .finish()
    }
}

/// Cancels its token when dropped. Handed to the owner of an actor so that
/// dropping the handle (or calling `stop()` explicitly) tears the actor down.
pub struct Guard {
    token: Token,
}

impl Guard {
    pub fn new(token: Token) -> Self {
        Self { token }
    }
}

impl Deref for Guard {
    type Target = Token;

    fn deref(&self) -> &Token {
        &self.token
    }
}

impl Drop for Guard {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_uncancelled() {
        let token = Token::new();
        assert!(!token.is_cancelled());
    }

    #[test]
    fn cancel_is_visible_on_clones() {
        let token = Token::new();
        let clone = token.clone();
        token.cancel();
        assert!(clone.is_cancelled());
    }

    #[test]
    fn guard_cancels_on_drop() {
        let token = Token::new();
        {
            let _guard = token.guard();
            assert!(!token.is_cancelled());
        }
        assert!(token.is_cancelled());
    }
}
