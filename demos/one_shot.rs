//! Runs a fixed number of parallel one-shot tasks; no producers, no queue.

use std::time::Duration;

use foreman::Pool;

/* ---------- */

fn main() -> Result<(), foreman::Error> {
    env_logger::init();

    let mut pool = Pool::<()>::new(4, 0)?;
    pool.set_name("one-shot");

    pool.set_task(|id, index| {
        println!("[TASK] {index} ({id}) starting");
        std::thread::sleep(Duration::from_millis(500));
        println!("[TASK] {index} ({id}) done");
    });

    pool.run()
}
