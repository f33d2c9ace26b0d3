use anyhow::Result;

use crate::{GuardedCell, LockGuard};

#[test]
fn bounds() {
    fn check<T: Send + Sync>() {}
    check::<GuardedCell<u32>>();
    check::<LockGuard<u32>>();
}

#[test]
fn set_and_get_unlocked() -> Result<()> {
    let cell = GuardedCell::new(10u32);
    assert_eq!(cell.get(), 10);

    cell.set(42, None)?;
    assert_eq!(cell.get(), 42);
    Ok(())
}

#[test]
fn locked_cell_gates_writes() -> Result<()> {
    let cell = GuardedCell::new(10u32);
    let guard = cell.lock()?;

    assert!(cell.set(1, None).is_err());
    assert_eq!(cell.get(), 10);

    cell.set(2, Some(guard.token()))?;
    assert_eq!(cell.get(), 2);
    Ok(())
}

#[test]
fn wrong_token_is_denied() -> Result<()> {
    let cell = GuardedCell::new(0u32);

    let stale = {
        let guard = cell.lock()?;
        guard.set(1)?;
        guard.token()
    };

    let guard = cell.lock()?;
    assert_ne!(stale, guard.token());

    assert!(cell.set(2, Some(stale)).is_err());
    assert_eq!(cell.get(), 1);

    guard.set(3)?;
    assert_eq!(cell.get(), 3);
    Ok(())
}

#[test]
fn release_reopens_cell() -> Result<()> {
    let cell = GuardedCell::new(0u32);

    let guard = cell.lock()?;
    assert!(cell.set(1, None).is_err());
    drop(guard);

    cell.set(2, None)?;
    assert_eq!(cell.get(), 2);
    Ok(())
}

#[test]
fn contended_lock_fails_fast() -> Result<()> {
    let cell = GuardedCell::new(0u32);
    let guard = cell.lock()?;

    assert!(cell.lock().is_err());
    assert!(cell.relock(crate::Token::issue()).is_err());

    // The held token is unaffected by the failed attempts.
    guard.set(1)?;
    assert_eq!(cell.get(), 1);
    Ok(())
}

#[test]
fn double_release_is_noop() -> Result<()> {
    let cell = GuardedCell::new(0u32);

    let guard = cell.lock()?;
    let token = guard.token();
    guard.release();
    assert!(!cell.is_locked());

    // A second release of the same token must not disturb the unlocked
    // state.
    cell.release(token);
    assert!(!cell.is_locked());

    cell.set(7, None)?;
    assert_eq!(cell.get(), 7);
    Ok(())
}

#[test]
fn stale_release_does_not_unlock_new_owner() -> Result<()> {
    let cell = GuardedCell::new(0u32);

    let stale = {
        let guard = cell.lock()?;
        guard.token()
    };

    let guard = cell.lock()?;
    cell.release(stale);

    assert!(cell.is_locked());
    guard.set(3)?;
    assert_eq!(cell.get(), 3);
    Ok(())
}

#[test]
fn tokens_are_unique() -> Result<()> {
    let cell = GuardedCell::new(0u32);

    let t1 = cell.lock()?.token();
    let t2 = cell.lock()?.token();

    assert_ne!(t1, t2);
    Ok(())
}

#[test]
fn relock_displaces_token() -> Result<()> {
    let cell = GuardedCell::new(0u32);

    let first = cell.lock()?;
    let stale = first.token();

    let second = first.relock()?;
    assert_ne!(stale, second.token());

    // The displaced token stops authorizing writes immediately.
    assert!(cell.set(1, Some(stale)).is_err());
    second.set(2)?;
    assert_eq!(cell.get(), 2);

    // Replacement semantics, releasing the new guard unlocks the cell.
    drop(second);
    assert!(!cell.is_locked());
    Ok(())
}

#[test]
fn stale_guard_drop_keeps_new_lock() -> Result<()> {
    let cell = GuardedCell::new(0u32);

    let first = cell.lock()?;
    let second = cell.relock(first.token())?;

    drop(first);
    assert!(cell.is_locked());

    second.set(1)?;
    drop(second);
    assert!(!cell.is_locked());
    Ok(())
}

#[test]
fn unwind_releases_lock() -> Result<()> {
    use std::panic::{catch_unwind, AssertUnwindSafe};

    let cell = GuardedCell::new(0u32);

    let result = catch_unwind(AssertUnwindSafe(|| {
        let _guard = cell.lock().unwrap();
        panic!("trigger");
    }));

    assert!(result.is_err());
    assert!(!cell.is_locked());

    cell.set(1, None)?;
    assert_eq!(cell.get(), 1);
    Ok(())
}

#[test]
fn lock_write_release_cycle() -> Result<()> {
    let cell = GuardedCell::new(10u32);

    let guard = cell.lock()?;
    let t1 = guard.token();

    cell.set(0, Some(t1))?;
    cell.set(20, Some(t1))?;
    assert_eq!(cell.get(), 20);
    drop(guard);

    cell.set(5, None)?;
    assert_eq!(cell.get(), 5);

    assert!(cell.set(99, Some(t1)).is_err());
    assert_eq!(cell.get(), 5);
    Ok(())
}

#[test]
fn with_borrows_value() {
    let cell = GuardedCell::new(String::from("hello"));
    assert_eq!(cell.with(|s| s.len()), 5);
}

#[test]
fn handles_share_state() -> Result<()> {
    let cell = GuardedCell::new(0u32);
    let other = cell.clone();

    let guard = cell.lock()?;
    assert!(other.lock().is_err());
    assert!(other.is_locked());

    guard.set(9)?;
    assert_eq!(other.get(), 9);
    Ok(())
}

#[test]
fn contention_across_threads() -> Result<()> {
    use std::thread;

    let cell = GuardedCell::new(0u32);
    let mut threads = Vec::new();

    for n in 0..10u32 {
        let cell = cell.clone();

        threads.push(thread::spawn(move || match cell.lock() {
            Ok(guard) => guard.set(n).is_ok(),
            Err(..) => false,
        }));
    }

    let mut winners = 0;

    for t in threads {
        if t.join().unwrap() {
            winners += 1;
        }
    }

    // Guards are released as soon as each thread is done, so anywhere from
    // one to all ten acquisitions can have succeeded.
    assert!(winners >= 1);
    assert!(!cell.is_locked());
    Ok(())
}

#[cfg(loom)]
mod models {
    use crate::GuardedCell;

    #[test]
    fn exclusive_acquisition() {
        ::loom::model(|| {
            let cell = GuardedCell::new(());
            let other = cell.clone();

            let t = ::loom::thread::spawn(move || other.lock().ok());

            let mine = cell.lock().ok();
            let theirs = t.join().unwrap();

            // Both guards are still alive here, so exactly one of the two
            // acquisitions can have won.
            assert!(mine.is_some() != theirs.is_some());
        });
    }

    #[test]
    fn release_hands_over() {
        ::loom::model(|| {
            let cell = GuardedCell::new(0u32);
            let other = cell.clone();

            let guard = cell.lock().unwrap();

            let t = ::loom::thread::spawn(move || match other.lock() {
                Ok(guard) => guard.set(2).is_ok(),
                Err(..) => false,
            });

            guard.set(1).unwrap();
            drop(guard);

            t.join().unwrap();

            assert!(!cell.is_locked());
            let value = cell.get();
            assert!(value == 1 || value == 2);
        });
    }
}
