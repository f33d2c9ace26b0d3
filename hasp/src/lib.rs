//! [![Documentation](https://docs.rs/hasp/badge.svg)](https://docs.rs/hasp)
//! [![Crates](https://img.shields.io/crates/v/hasp.svg)](https://crates.io/crates/hasp)
//! [![Actions Status](https://github.com/udoprog/hasp/workflows/Rust/badge.svg)](https://github.com/udoprog/hasp/actions)
//!
//! A single-owner advisory lock around a shared value.
//!
//! [GuardedCell] holds a value which can always be read, while writes are
//! gated by an owner [Token]. Locking the cell issues a fresh token and a
//! [LockGuard] which hands ownership back when it goes out of scope, whether
//! by normal return or by unwinding.
//!
//! The lock is *advisory*: it restricts writes, not reads, and only for
//! callers that present their token honestly. It is also *fail-fast*:
//! [lock][GuardedCell::lock] never blocks or queues, it either acquires the
//! cell or reports [AlreadyLocked] immediately.
//!
//! ```rust
//! use hasp::GuardedCell;
//!
//! # fn main() -> anyhow::Result<()> {
//! let cell = GuardedCell::new(10u32);
//!
//! let guard = cell.lock()?;
//! guard.set(0)?;
//! guard.set(20)?;
//! assert_eq!(cell.get(), 20);
//! drop(guard);
//!
//! // The cell is unlocked again, so writes presenting no token succeed.
//! cell.set(5, None)?;
//! assert_eq!(cell.get(), 5);
//! # Ok(()) }
//! ```
//!
//! # Tokens are identities
//!
//! Every acquisition issues a token distinct from every token issued before
//! it in the process, so comparing tokens is an identity check. A token that
//! has been released, or displaced through
//! [relock][GuardedCell::relock], never becomes valid again.
//!
//! ```rust
//! # fn main() -> anyhow::Result<()> {
//! let cell = hasp::GuardedCell::new(0u32);
//!
//! let t1 = cell.lock()?.token();
//! let t2 = cell.lock()?.token();
//! assert_ne!(t1, t2);
//! # Ok(()) }
//! ```
//!
//! # What this is not
//!
//! This is not a reader-writer lock and not a wait-queue mutex. There is no
//! timeout and no deadlock detection: a guard that is kept alive forever
//! keeps the cell locked forever. Callers are responsible for bounding the
//! scope of their guards.

#![deny(missing_docs, rustdoc::broken_intra_doc_links)]

use std::fmt;

use parking_lot::Mutex;
use thiserror::Error;

use crate::loom::sync::atomic::{AtomicU64, Ordering};
use crate::loom::sync::Arc;

#[cfg(test)]
mod tests;

mod loom;

mod token;
use self::token::UNLOCKED;
pub use self::token::Token;

mod guard;
pub use self::guard::LockGuard;

/// Error raised when trying to lock a cell which is held by another owner.
///
/// The existing lock is unaffected, the caller decides whether to retry,
/// skip, or propagate.
#[derive(Debug, Error)]
#[error("cell is already locked")]
pub struct AlreadyLocked(());

/// Error raised when a write presents a token which is not the current
/// owner of the cell.
///
/// This is a soft rejection. The value is left untouched and the denial is
/// logged, callers that need strict enforcement check the result.
#[derive(Debug, Error)]
#[error("write denied, token is not the current owner")]
pub struct Denied(());

struct Shared<T> {
    /// Raw value of the owning token, [UNLOCKED] when the cell is free.
    owner: AtomicU64,
    /// The protected payload. The mutex makes reads and writes memory safe,
    /// the owner slot above decides who is allowed to write.
    value: Mutex<T>,
}

/// A shared mutable cell with read-always, write-if-authorized semantics.
///
/// Cloning the cell is cheap and every clone operates on the same underlying
/// state, so a cell can be handed to every participant that needs to
/// coordinate over it.
///
/// # Examples
///
/// ```rust
/// use hasp::GuardedCell;
///
/// # fn main() -> anyhow::Result<()> {
/// let cell = GuardedCell::new(0u32);
/// let other = cell.clone();
///
/// let guard = cell.lock()?;
/// assert!(other.lock().is_err());
///
/// guard.set(42)?;
/// assert_eq!(other.get(), 42);
/// # Ok(()) }
/// ```
pub struct GuardedCell<T> {
    inner: Arc<Shared<T>>,
}

impl<T> GuardedCell<T> {
    /// Construct a new cell in an unlocked state holding `value`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// let cell = hasp::GuardedCell::new(10u32);
    ///
    /// assert_eq!(cell.get(), 10);
    /// assert!(!cell.is_locked());
    /// ```
    pub fn new(value: T) -> Self {
        Self {
            inner: Arc::new(Shared {
                owner: AtomicU64::new(UNLOCKED),
                value: Mutex::new(value),
            }),
        }
    }

    /// Get a copy of the current value.
    ///
    /// Reads are unconditional, they succeed regardless of who holds the
    /// lock.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # fn main() -> anyhow::Result<()> {
    /// let cell = hasp::GuardedCell::new(10u32);
    ///
    /// let _guard = cell.lock()?;
    /// assert_eq!(cell.get(), 10);
    /// # Ok(()) }
    /// ```
    pub fn get(&self) -> T
    where
        T: Clone,
    {
        self.inner.value.lock().clone()
    }

    /// Borrow the current value for the duration of the closure.
    ///
    /// Like [get][GuardedCell::get] this is unconditional, but avoids
    /// cloning the payload.
    ///
    /// # Examples
    ///
    /// ```rust
    /// let cell = hasp::GuardedCell::new(String::from("hello"));
    ///
    /// assert_eq!(cell.with(|s| s.len()), 5);
    /// ```
    pub fn with<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&T) -> R,
    {
        f(&self.inner.value.lock())
    }

    /// Replace the value, presenting `token` as proof of ownership.
    ///
    /// The write succeeds only if `token` equals the current owner of the
    /// cell, where `None` matches the unlocked state. On a mismatch the
    /// value is left untouched and [Denied] is returned. No validation of
    /// the new value is performed.
    ///
    /// Ownership is checked when the call is made. This is an advisory
    /// policy gate, not a synchronization point.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # fn main() -> anyhow::Result<()> {
    /// let cell = hasp::GuardedCell::new(10u32);
    ///
    /// // Unlocked cells accept writes presenting no token.
    /// cell.set(1, None)?;
    ///
    /// let guard = cell.lock()?;
    /// assert!(cell.set(2, None).is_err());
    /// assert_eq!(cell.get(), 1);
    ///
    /// cell.set(3, Some(guard.token()))?;
    /// assert_eq!(cell.get(), 3);
    /// # Ok(()) }
    /// ```
    pub fn set(&self, value: T, token: Option<Token>) -> Result<(), Denied> {
        let presented = token.map_or(UNLOCKED, |token| token.0);

        if self.inner.owner.load(Ordering::Acquire) != presented {
            tracing::debug!(?token, "write denied, token is not the current owner");
            return Err(Denied(()));
        }

        *self.inner.value.lock() = value;
        Ok(())
    }

    /// Acquire the cell, which must currently be unlocked.
    ///
    /// On success a fresh [Token] is installed as the owner and a
    /// [LockGuard] carrying it is returned. The guard releases the cell
    /// when it goes out of scope, on normal return and on unwind alike.
    ///
    /// Acquisition is fail-fast. If the cell is held by anyone the call
    /// returns [AlreadyLocked] immediately and the existing lock is
    /// unaffected.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # fn main() -> anyhow::Result<()> {
    /// let cell = hasp::GuardedCell::new(0u32);
    ///
    /// let guard = cell.lock()?;
    /// assert!(cell.lock().is_err());
    ///
    /// drop(guard);
    /// assert!(cell.lock().is_ok());
    /// # Ok(()) }
    /// ```
    pub fn lock(&self) -> Result<LockGuard<T>, AlreadyLocked> {
        self.acquire(UNLOCKED)
    }

    /// Re-acquire a cell which is currently owned by `prior`.
    ///
    /// This models nested acquisition from a known owner. On success the
    /// prior token is displaced by a fresh one and immediately stops
    /// authorizing writes. The displacement is a replacement, not a stack:
    /// when the new guard releases, the cell becomes unlocked rather than
    /// reverting to `prior`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # fn main() -> anyhow::Result<()> {
    /// let cell = hasp::GuardedCell::new(0u32);
    ///
    /// let first = cell.lock()?;
    /// let stale = first.token();
    ///
    /// let second = cell.relock(stale)?;
    /// assert!(cell.set(1, Some(stale)).is_err());
    /// second.set(2)?;
    /// # Ok(()) }
    /// ```
    pub fn relock(&self, prior: Token) -> Result<LockGuard<T>, AlreadyLocked> {
        self.acquire(prior.0)
    }

    /// Test if the cell is currently locked.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # fn main() -> anyhow::Result<()> {
    /// let cell = hasp::GuardedCell::new(0u32);
    /// assert!(!cell.is_locked());
    ///
    /// let guard = cell.lock()?;
    /// assert!(cell.is_locked());
    ///
    /// guard.release();
    /// assert!(!cell.is_locked());
    /// # Ok(()) }
    /// ```
    pub fn is_locked(&self) -> bool {
        self.inner.owner.load(Ordering::Acquire) != UNLOCKED
    }

    /// Swap the expected owner for a freshly issued token.
    fn acquire(&self, expected: u64) -> Result<LockGuard<T>, AlreadyLocked> {
        // Tokens issued for failed acquisitions are simply discarded.
        let token = Token::issue();

        if self
            .inner
            .owner
            .compare_exchange(expected, token.0, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(AlreadyLocked(()));
        }

        tracing::trace!(?token, "lock acquired");
        Ok(LockGuard::new(self.clone(), token))
    }

    /// Hand ownership back, but only if `token` is still the current owner.
    ///
    /// A stale token, one that has already been released or displaced
    /// through [relock][GuardedCell::relock], fails the exchange and leaves
    /// the cell untouched. That makes releasing idempotent.
    pub(crate) fn release(&self, token: Token) {
        if self
            .inner
            .owner
            .compare_exchange(token.0, UNLOCKED, Ordering::AcqRel, Ordering::Relaxed)
            .is_ok()
        {
            tracing::trace!(?token, "lock released");
        }
    }
}

impl<T> Clone for GuardedCell<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T> Default for GuardedCell<T>
where
    T: Default,
{
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T> From<T> for GuardedCell<T> {
    fn from(value: T) -> Self {
        Self::new(value)
    }
}

impl<T> fmt::Debug for GuardedCell<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GuardedCell")
            .field("locked", &self.is_locked())
            .finish()
    }
}
