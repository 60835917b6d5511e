//! Two producers feed four consumers through the shared queue until both
//! producers draw an unlucky number and retire. `Ctrl+C` winds the pool down
//! early.

use std::time::Duration;

use foreman::{Pool, PoolConfig, Produce};
use rand::Rng;

/* ---------- */

fn main() -> Result<(), foreman::Error> {
    env_logger::init();

    let mut pool = Pool::new(4, 2)?;
    pool.set_config(PoolConfig::new().name("pipeline").queue_capacity(64));

    pool.set_producer_fn(|id, index| {
        std::thread::sleep(Duration::from_millis(100));

        let value: u32 = rand::thread_rng().gen_range(0..1_000);
        if value < 50 {
            println!("[PRODUCER] {index} ({id}) drew {value}, retiring");
            return Produce::Stop;
        }

        println!("[PRODUCER] {index} ({id}) emits {value}");
        Produce::Item(value)
    });

    pool.set_consumer(|id, index, value| {
        println!("[CONSUMER] {index} ({id}) handles {value}");
    });

    pool.run()
}
