//! A small crate that supervises pools of producer and consumer workers tied
//! together by a shared bounded queue.
//!
//! # Philosophy
//!
//! This crate sees a parallel job as two crews of long-lived `workers`, each
//! running on its own OS thread: `producers` that generate data items and
//! `consumers` that compete for them over a single queue. A supervisor — the
//! [`Pool`] — owns both crews: it spawns them, watches them terminate, decides
//! whether a failed worker is respawned or retired, and winds the whole thing
//! down in order.
//!
//! Workers are free to block as long as they want, in their callbacks or on
//! the queue, without impacting each other. The supervisor itself never does
//! the data work; it only reacts to two things, worker exits and termination
//! signals, from a single control loop.
//!
//! # Usage
//!
//! The caller supplies two callbacks and calls [`Pool::run`], which blocks
//! until the pool has completely wound down:
//!
//! ```
//! use foreman::{Pool, Produce};
//! use std::sync::atomic::{AtomicU32, Ordering};
//!
//! let tick = AtomicU32::new(0);
//!
//! let mut pool = Pool::new(2, 1)?;
//!
//! pool.set_producer_fn(move |_id, _index| {
//!     match tick.fetch_add(1, Ordering::SeqCst) {
//!         n @ 0..=9 => Produce::Item(n),
//!         _ => Produce::Stop,
//!     }
//! });
//!
//! pool.set_consumer(|id, index, item| {
//!     println!("consumer {index} ({id}) got {item}");
//! });
//!
//! pool.run()?;
//! # Ok::<(), foreman::Error>(())
//! ```
//!
//! A producer hands back a [`Produce`] on every tick: one item, a batch of
//! items enqueued in order, nothing for now, or a stop. A pre-built `Vec` also
//! works as a source; it is drained by a single producer worker:
//!
//! ```
//! # let mut pool = foreman::Pool::new(1, 0)?;
//! pool.set_producer(vec!["a", "b", "c"]);
//! # pool.set_consumer(|_, _, _item: &str| {});
//! # pool.run()?;
//! # Ok::<(), foreman::Error>(())
//! ```
//!
//! ## Delivery semantics
//!
//! The queue is a competing-consumer channel: every item is delivered to at
//! most one consumer, whichever is free first. Items from one producer arrive
//! in the order that producer enqueued them; there is no ordering across
//! producers. Once the last producer retires, the supervisor seals the queue
//! with one end marker per consumer, so each consumer finishes its backlog and
//! winds down exactly once.
//!
//! ## One-shot tasks
//!
//! With no producers at all there is nothing to queue; the pool then runs a
//! fixed number of parallel one-shot tasks, one per consumer slot. This mode
//! is chosen explicitly with [`Pool::set_task`]:
//!
//! ```
//! let mut pool = foreman::Pool::<()>::new(4, 0)?;
//!
//! pool.set_task(|id, index| {
//!     println!("task {index} ({id}) running");
//! });
//!
//! pool.run()?;
//! # Ok::<(), foreman::Error>(())
//! ```
//!
//! ## Respawning workers that failed
//!
//! A worker whose callback panics exits abnormally. By default it retires;
//! with [`Pool::set_auto_restart`] the supervisor respawns it at the same
//! index with a fresh [`WorkerId`] instead:
//!
//! ```
//! use std::sync::atomic::{AtomicBool, Ordering};
//!
//! let flaky = AtomicBool::new(true);
//!
//! let mut pool = foreman::Pool::new(1, 0)?;
//! pool.set_auto_restart();
//! pool.set_producer(vec![1u8, 2, 3]);
//!
//! pool.set_consumer(move |_id, _index, item| {
//!     if flaky.swap(false, Ordering::SeqCst) {
//!         panic!("everyone stumbles once");
//!     }
//!     println!("got {item}");
//! });
//!
//! pool.run()?;
//! # Ok::<(), foreman::Error>(())
//! ```
//!
//! The item a worker was busy with when it died is not redelivered: delivery
//! is at-most-once.
//!
//! ## Bounded task execution
//!
//! For the even simpler "run these N jobs, at most K at a time" case there is
//! [`execute`], which involves no queue protocol and no supervisor:
//!
//! ```
//! foreman::execute((0..20u32).collect(), 4, |n| {
//!     let _ = n.pow(2);
//! })?;
//! # Ok::<(), foreman::Error>(())
//! ```
//!
//! # Graceful shutdown
//!
//! While [`Pool::run`] is blocking, SIGINT and SIGTERM ask the pool to wind
//! down in order: workers finish their current callback, everything is joined
//! and the queue is released before `run` returns. A second signal kills the
//! process for the cases where that unwind has no effect.

#![warn(missing_docs)]

mod channel;
mod config;
mod error;
mod pool;
mod settings;
mod source;
#[cfg(test)]
mod test_utils;
mod utils;
mod worker;

pub use config::*;
pub use error::*;
pub use pool::*;
pub use source::*;
pub use worker::WorkerId;
