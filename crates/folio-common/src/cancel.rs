//! Cooperative cancellation.
//!
//! Long-running traversals (tree walks, page-break loops, glyph adjustment)
//! call [`CancelToken::checkpoint`] at the top of each iteration. Once the
//! token is cancelled every later checkpoint fails with [`Cancelled`], which
//! callers propagate with `?` until the traversal has fully unwound.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

/// Returned by a checkpoint once cancellation has been requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("operation cancelled")]
pub struct Cancelled;

/// External poll hook consulted on every checkpoint.
pub type CancelCallback = dyn Fn() -> bool + Send + Sync;

/// Shared cancellation signal.
///
/// Cloning is cheap; all clones observe the same flag. A token may also carry
/// an external callback (for example a deadline check) that is polled on every
/// checkpoint and latches the flag once it returns `true`.
#[derive(Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
    checkpoints: Arc<AtomicU64>,
    callback: Option<Arc<CancelCallback>>,
}

impl CancelToken {
    /// A token that is never cancelled unless [`cancel`](Self::cancel) is called.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A token that additionally polls `callback` on every checkpoint.
    #[must_use]
    pub fn with_callback(callback: Arc<CancelCallback>) -> Self {
        Self {
            callback: Some(callback),
            ..Self::default()
        }
    }

    /// Request cancellation. Idempotent.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    /// Whether cancellation has been requested.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    /// Number of checkpoints polled through this token (all clones included).
    #[must_use]
    pub fn checkpoints(&self) -> u64 {
        self.checkpoints.load(Ordering::Relaxed)
    }

    /// Poll the signal.
    ///
    /// # Errors
    ///
    /// Returns [`Cancelled`] once the token has been cancelled, either
    /// directly or because the callback reported cancellation.
    pub fn checkpoint(&self) -> Result<(), Cancelled> {
        let _ = self.checkpoints.fetch_add(1, Ordering::Relaxed);
        if let Some(callback) = &self.callback
            && callback()
        {
            self.cancel();
        }
        if self.is_cancelled() {
            return Err(Cancelled);
        }
        Ok(())
    }
}

impl fmt::Debug for CancelToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CancelToken")
            .field("cancelled", &self.is_cancelled())
            .field("checkpoints", &self.checkpoints())
            .field("callback", &self.callback.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_token_passes() {
        let token = CancelToken::new();
        assert!(token.checkpoint().is_ok());
        assert_eq!(token.checkpoints(), 1);
    }

    #[test]
    fn test_clones_share_flag() {
        let token = CancelToken::new();
        let other = token.clone();
        other.cancel();
        assert_eq!(token.checkpoint(), Err(Cancelled));
    }

    #[test]
    fn test_callback_latches() {
        let polls = Arc::new(AtomicU64::new(0));
        let seen = Arc::clone(&polls);
        let token = CancelToken::with_callback(Arc::new(move || {
            seen.fetch_add(1, Ordering::SeqCst) >= 2
        }));

        assert!(token.checkpoint().is_ok());
        assert!(token.checkpoint().is_ok());
        assert_eq!(token.checkpoint(), Err(Cancelled));
        assert!(token.is_cancelled());
    }
}
