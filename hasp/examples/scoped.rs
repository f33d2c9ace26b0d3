use anyhow::Result;
use hasp::GuardedCell;

fn main() -> Result<()> {
    let cell = GuardedCell::new(10u32);

    let guard = cell.lock()?;
    let token = guard.token();

    cell.set(0, Some(token))?;
    cell.set(20, Some(token))?;
    assert_eq!(cell.get(), 20);

    guard.release();

    cell.set(5, None)?;
    assert_eq!(cell.get(), 5);

    // The released token no longer authorizes writes.
    assert!(cell.set(99, Some(token)).is_err());
    assert_eq!(cell.get(), 5);

    println!("value: {}", cell.get());
    Ok(())
}
