//! Bounded-parallelism task execution: ten jobs, never more than three at a
//! time, no queue protocol involved.

use std::time::Duration;

/* ---------- */

fn main() -> Result<(), foreman::Error> {
    env_logger::init();

    let tasks: Vec<u32> = (0..10).collect();

    foreman::execute(tasks, 3, |n| {
        std::thread::sleep(Duration::from_millis(200));
        println!("[TASK] finished {n}");
    })
}
