//! A consumer crew that chokes on some items; with auto-restart on, the pool
//! replaces every fallen worker and still drains the whole sequence.

use foreman::{Pool, PoolConfig};

/* ---------- */

fn main() -> Result<(), foreman::Error> {
    env_logger::init();

    let mut pool = Pool::new(2, 0)?;
    pool.set_config(PoolConfig::new().name("respawn").restart(true));

    pool.set_producer((0..50u32).collect::<Vec<_>>());

    pool.set_consumer(|id, index, item| {
        if item % 13 == 7 {
            panic!("consumer {index} choked on {item}");
        }

        println!("[CONSUMER] {index} ({id}) handles {item}");
    });

    pool.run()
}
