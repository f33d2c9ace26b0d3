use anyhow::Result;
use hasp::GuardedCell;

fn main() -> Result<()> {
    let cell = GuardedCell::new(0u32);
    let mut threads = Vec::new();

    for n in 0..10u32 {
        let cell = cell.clone();

        threads.push(std::thread::spawn(move || match cell.lock() {
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

    println!("{} out of 10 acquisitions succeeded", winners);
    assert!(winners >= 1);
    assert!(!cell.is_locked());
    Ok(())
}
