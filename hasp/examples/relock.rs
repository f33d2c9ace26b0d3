use anyhow::Result;
use hasp::GuardedCell;

fn main() -> Result<()> {
    let cell = GuardedCell::new(String::from("initial"));

    let first = cell.lock()?;
    let stale = first.token();

    let second = first.relock()?;
    assert!(cell.set(String::from("nope"), Some(stale)).is_err());

    second.set(String::from("updated"))?;
    println!("value: {}", cell.get());

    drop(second);
    assert!(!cell.is_locked());
    Ok(())
}
