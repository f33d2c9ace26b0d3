use std::fmt;

use crate::{AlreadyLocked, Denied, GuardedCell, Token};

/// A handle to a held lock on a [GuardedCell].
///
/// As long as the guard is alive its [token][LockGuard::token] is the owner
/// of the cell and authorizes writes. When the guard goes out of scope, by
/// normal return or by unwinding, ownership is handed back and the cell
/// returns to the unlocked state.
///
/// Release only ever clears the guard's own token, so a guard whose token
/// has been displaced through [relock][GuardedCell::relock] releases into a
/// no-op rather than unlocking the new owner.
///
/// # Examples
///
/// ```rust
/// use hasp::GuardedCell;
///
/// # fn main() -> anyhow::Result<()> {
/// let cell = GuardedCell::new(0u32);
///
/// {
///     let guard = cell.lock()?;
///     guard.set(1)?;
/// }
///
/// assert!(!cell.is_locked());
/// # Ok(()) }
/// ```
#[must_use = "the cell is unlocked again as soon as the guard is dropped"]
pub struct LockGuard<T> {
    cell: GuardedCell<T>,
    token: Token,
}

impl<T> LockGuard<T> {
    pub(crate) fn new(cell: GuardedCell<T>, token: Token) -> Self {
        Self { cell, token }
    }

    /// The token identifying this acquisition.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # fn main() -> anyhow::Result<()> {
    /// let cell = hasp::GuardedCell::new(0u32);
    ///
    /// let guard = cell.lock()?;
    /// cell.set(1, Some(guard.token()))?;
    /// # Ok(()) }
    /// ```
    pub fn token(&self) -> Token {
        self.token
    }

    /// Replace the value of the cell, presenting this guard's token.
    ///
    /// Shorthand for [GuardedCell::set] with [token][LockGuard::token].
    /// This can only be denied if the guard has gone stale through
    /// [relock][GuardedCell::relock].
    pub fn set(&self, value: T) -> Result<(), Denied> {
        self.cell.set(value, Some(self.token))
    }

    /// Access the cell this guard locks.
    pub fn cell(&self) -> &GuardedCell<T> {
        &self.cell
    }

    /// Re-acquire the cell, displacing this guard's token with a fresh one.
    ///
    /// Shorthand for [GuardedCell::relock] with this guard's token. The
    /// consumed guard is dropped stale and does not disturb the new
    /// acquisition.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # fn main() -> anyhow::Result<()> {
    /// let cell = hasp::GuardedCell::new(0u32);
    ///
    /// let first = cell.lock()?;
    /// let second = first.relock()?;
    ///
    /// second.set(1)?;
    /// drop(second);
    ///
    /// assert!(!cell.is_locked());
    /// # Ok(()) }
    /// ```
    pub fn relock(self) -> Result<LockGuard<T>, AlreadyLocked> {
        self.cell.relock(self.token)
    }

    /// Release the lock now instead of at the end of the enclosing scope.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # fn main() -> anyhow::Result<()> {
    /// let cell = hasp::GuardedCell::new(0u32);
    ///
    /// let guard = cell.lock()?;
    /// guard.release();
    ///
    /// assert!(!cell.is_locked());
    /// # Ok(()) }
    /// ```
    pub fn release(self) {
        // Dropping the guard performs the release.
    }
}

impl<T> Drop for LockGuard<T> {
    fn drop(&mut self) {
        self.cell.release(self.token);
    }
}

impl<T> fmt::Debug for LockGuard<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LockGuard").field("token", &self.token).finish()
    }
}
