use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Raw owner value of a cell that nobody holds. Never issued as a token.
pub(crate) const UNLOCKED: u64 = 0;

/// Issue counter shared by every cell in the process. Stays a plain std
/// atomic under loom, issued values only need to be distinct.
static NEXT_TOKEN: AtomicU64 = AtomicU64::new(1);

/// An opaque identity authorizing writes to a [GuardedCell][crate::GuardedCell].
///
/// Tokens are only ever created by acquiring a cell, and every acquisition
/// in the process issues a distinct one. Comparing two tokens for equality
/// is therefore an identity check, the payload is never inspected for
/// anything else.
///
/// A token is `Copy` and can be stored and presented later, but it stops
/// authorizing writes the moment its acquisition is released or displaced.
///
/// # Examples
///
/// ```rust
/// # fn main() -> anyhow::Result<()> {
/// let cell = hasp::GuardedCell::new(0u32);
///
/// let token = {
///     let guard = cell.lock()?;
///     guard.token()
/// };
///
/// // The guard went out of scope, so the token is stale.
/// assert!(cell.set(1, Some(token)).is_err());
/// # Ok(()) }
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct Token(pub(crate) u64);

impl Token {
    /// Issue a token distinct from every token issued before it in this
    /// process.
    pub(crate) fn issue() -> Self {
        Token(NEXT_TOKEN.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Token")
            .field(&format_args!("{:#x}", self.0))
            .finish()
    }
}
