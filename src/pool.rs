use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::thread::JoinHandle;
use std::time::Duration;

use crossbeam_channel::{unbounded, Receiver, RecvTimeoutError, Sender};

use crate::channel::{Message, QueueChannel, SendStatus};
use crate::config::PoolConfig;
use crate::error::Error;
use crate::settings::Settings;
use crate::source::{Produce, ProducerSource};
use crate::utils::{Shutdown, SignalGuard};
use crate::worker::{
    self, ConsumerWorker, ExitEvent, Outcome, ProducerWorker, Role, TaskWorker, WorkerId,
};

/* ---------- */

/// How long the supervisor sleeps between control-channel polls.
const SUPERVISOR_TICK: Duration = Duration::from_millis(100);

/* ---------- */

/// How a configured pool runs, resolved once at the start of [`Pool::run`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    /// Producers feed consumers through the queue channel.
    Pipeline,
    /// No producers; every consumer slot runs one task and retires.
    OneShot,
}

/* ---------- */

struct WorkerEntry {
    id: WorkerId,
    handle: JoinHandle<()>,
}

/* ---------- */

/// A supervisor owning one pool of producer workers and one pool of consumer
/// workers tied together by a bounded queue.
///
/// Producers push data items into the queue; consumers compete for them. Once
/// every producer has retired, the supervisor seals the queue with one end
/// marker per consumer so each of them winds down exactly once, and
/// [`Pool::run`] returns when the last consumer is gone.
///
/// # Pipeline mode
///
/// ```
/// use foreman::Pool;
///
/// let mut pool = Pool::new(2, 0)?;
///
/// pool.set_producer(vec!["alpha", "beta", "gamma"]);
/// pool.set_consumer(|id, index, word| {
///     println!("consumer {index} ({id}) received {word}");
/// });
///
/// pool.run()?;
/// # Ok::<(), foreman::Error>(())
/// ```
///
/// # One-shot mode
///
/// With no producers configured, the pool degenerates into a fixed number of
/// parallel one-shot tasks:
///
/// ```
/// use foreman::Pool;
///
/// let mut pool = Pool::<()>::new(4, 0)?;
///
/// pool.set_task(|id, index| {
///     println!("task {index} ({id}) running");
/// });
///
/// pool.run()?;
/// # Ok::<(), foreman::Error>(())
/// ```
///
/// # Restarts
///
/// A worker whose callback panics exits abnormally. With
/// [`Pool::set_auto_restart`], such a worker is respawned at the same index
/// instead of retiring; the item it was processing is not redelivered.
pub struct Pool<T> {
    producer_num: usize,
    consumer_num: usize,

    producer: Option<crate::source::ProducerFn<T>>,
    consumer: Option<crate::worker::ConsumerFn<T>>,
    task: Option<crate::worker::TaskFn>,

    config: PoolConfig,

    producers: HashMap<usize, WorkerEntry>,
    consumers: HashMap<usize, WorkerEntry>,
    queue: Option<QueueChannel<T>>,
    ctrl: Option<Sender<ExitEvent>>,
    sealer: Option<JoinHandle<()>>,
    shutdown: Shutdown,
    next_id: u64,
    quit: bool,
}

impl<T: Send + 'static> Pool<T> {
    /// Returns a pool with `consumer_num` consumer slots and `producer_num`
    /// producer slots.
    ///
    /// Setting a producer source later raises a zero `producer_num` to 1.
    ///
    /// # Errors
    ///
    /// `consumer_num` must be positive; a zero count is rejected before any
    /// thread or queue resource exists.
    pub fn new(consumer_num: usize, producer_num: usize) -> Result<Self, Error> {
        if consumer_num == 0 {
            return Err(Error::config("consumer worker count must be positive"));
        }

        Ok(Self {
            producer_num,
            consumer_num,
            producer: None,
            consumer: None,
            task: None,
            config: PoolConfig::default(),
            producers: HashMap::new(),
            consumers: HashMap::new(),
            queue: None,
            ctrl: None,
            sealer: None,
            shutdown: Shutdown::new(),
            next_id: 0,
            quit: false,
        })
    }

    /// Sets where the pipeline's data items come from.
    ///
    /// A [`ProducerSource::Sequence`] (or a plain `Vec`) is drained by a
    /// single producer worker; the producer count becomes exactly 1. A
    /// [`ProducerSource::Callback`] is shared by every producer worker, each
    /// invoking it with its own identity and index.
    pub fn set_producer(&mut self, source: impl Into<ProducerSource<T>>) {
        let source = source.into();

        if matches!(source, ProducerSource::Sequence(_)) {
            self.producer_num = 1;
        } else if self.producer_num == 0 {
            self.producer_num = 1;
        }

        self.producer = Some(source.resolve());
    }

    /// Shorthand wrapping a plain closure as the producer source.
    pub fn set_producer_fn<F>(&mut self, produce: F)
    where
        F: Fn(WorkerId, usize) -> Produce<T> + Send + Sync + 'static,
    {
        self.set_producer(ProducerSource::callback(produce));
    }

    /// Sets the callback every consumer worker invokes per dequeued item.
    pub fn set_consumer<F>(&mut self, consume: F)
    where
        F: Fn(WorkerId, usize, T) + Send + Sync + 'static,
    {
        self.consumer = Some(std::sync::Arc::new(consume));
    }

    /// Sets the one-shot task run once per consumer slot.
    ///
    /// This selects one-shot mode, which requires a zero producer count.
    pub fn set_task<F>(&mut self, task: F)
    where
        F: Fn(WorkerId, usize) + Send + Sync + 'static,
    {
        self.task = Some(std::sync::Arc::new(task));
    }

    /// Replaces the pool's configuration.
    pub fn set_config(&mut self, config: PoolConfig) {
        self.config = config;
    }

    /// Sets the pool's name, used as the prefix of every worker thread name.
    pub fn set_name<N: ToString>(&mut self, name: N) {
        self.config.name = name.to_string();
    }

    /// Enables respawning workers that exited abnormally.
    pub fn set_auto_restart(&mut self) -> &mut Self {
        self.config.restart = true;
        self
    }

    /// Starts the pool and blocks until it has completely wound down.
    ///
    /// Spawns every producer, then every consumer, then supervises the pool:
    /// reaping exited workers, respawning them when auto-restart applies,
    /// sealing the queue once the last producer retired and quitting once the
    /// last consumer is gone. SIGINT/SIGTERM also wind the pool down; the
    /// observers are registered for the duration of the call only.
    ///
    /// # Errors
    ///
    /// Fails on a configuration mismatch (missing callbacks, one-shot task
    /// alongside producers) or when a worker thread cannot be spawned during
    /// setup; in the latter case every already-spawned worker is stopped and
    /// joined before the error is returned.
    pub fn run(&mut self) -> Result<(), Error> {
        let mode = self.validate()?;

        self.quit = false;
        self.shutdown = Shutdown::new();

        let (ctrl_tx, ctrl_rx) = unbounded();
        self.ctrl = Some(ctrl_tx);

        let _signals = SignalGuard::register(&self.shutdown);

        if mode == Mode::Pipeline {
            self.queue = Some(QueueChannel::bounded(self.config.queue_capacity));
        }

        log::debug!(
            "pool '{}' starting with {} producers and {} consumers",
            self.config.name,
            self.producer_num,
            self.consumer_num
        );

        if let Err(err) = self.spawn_all() {
            self.wind_down();
            return Err(err);
        }

        self.supervise(&ctrl_rx);
        self.wind_down();

        log::debug!("pool '{}' wound down", self.config.name);
        Ok(())
    }

    fn validate(&self) -> Result<Mode, Error> {
        if self.producer_num > 0 {
            if self.producer.is_none() {
                return Err(Error::config("producers configured but no producer source set"));
            }
            if self.task.is_some() {
                return Err(Error::config("one-shot tasks cannot run alongside producers"));
            }
            if self.consumer.is_none() {
                return Err(Error::config("pipeline mode needs a consumer callback"));
            }

            Ok(Mode::Pipeline)
        } else {
            if self.consumer.is_some() {
                return Err(Error::config("a consumer callback needs a producer source"));
            }
            if self.task.is_none() {
                return Err(Error::config("one-shot mode needs a task callback"));
            }

            Ok(Mode::OneShot)
        }
    }

    fn spawn_all(&mut self) -> Result<(), Error> {
        for index in 0..self.producer_num {
            self.spawn_producer(index)?;
        }

        for index in 0..self.consumer_num {
            self.spawn_consumer(index)?;
        }

        Ok(())
    }

    fn spawn_producer(&mut self, index: usize) -> Result<(), Error> {
        let id = self.next_worker_id();
        let produce = self
            .producer
            .clone()
            .ok_or_else(|| Error::config("no producer source set"))?;
        let queue = self
            .queue
            .as_ref()
            .map(QueueChannel::sender)
            .ok_or_else(|| Error::config("no queue channel to produce into"))?;

        let worker = ProducerWorker {
            id,
            index,
            produce,
            queue,
            shutdown: self.shutdown.clone(),
        };

        let handle = worker::spawn(
            Role::Producer,
            index,
            id,
            self.settings(Role::Producer, index),
            self.ctrl_sender()?,
            move || worker.run(),
        )?;

        self.producers.insert(index, WorkerEntry { id, handle });
        log::debug!("spawned producer {index} ({id})");

        Ok(())
    }

    fn spawn_consumer(&mut self, index: usize) -> Result<(), Error> {
        let id = self.next_worker_id();
        let ctrl = self.ctrl_sender()?;
        let settings = self.settings(Role::Consumer, index);

        let handle = match &self.queue {
            Some(queue) => {
                let consume = self
                    .consumer
                    .clone()
                    .ok_or_else(|| Error::config("no consumer callback set"))?;

                let worker = ConsumerWorker {
                    id,
                    index,
                    consume,
                    queue: queue.receiver(),
                    shutdown: self.shutdown.clone(),
                };

                worker::spawn(Role::Consumer, index, id, settings, ctrl, move || {
                    worker.run()
                })?
            }
            None => {
                let task = self
                    .task
                    .clone()
                    .ok_or_else(|| Error::config("no task callback set"))?;

                let worker = TaskWorker { id, index, task };

                worker::spawn(Role::Consumer, index, id, settings, ctrl, move || {
                    worker.run()
                })?
            }
        };

        self.consumers.insert(index, WorkerEntry { id, handle });
        log::debug!("spawned consumer {index} ({id})");

        Ok(())
    }

    fn supervise(&mut self, ctrl_rx: &Receiver<ExitEvent>) {
        while !self.quit {
            if !self.shutdown.is_running() {
                log::debug!("termination signal observed, quitting");
                self.quit = true;
                break;
            }

            match ctrl_rx.recv_timeout(SUPERVISOR_TICK) {
                Ok(event) => {
                    self.reap(event);

                    // Everything that terminated while we slept.
                    while let Ok(event) = ctrl_rx.try_recv() {
                        self.reap(event);
                    }
                }
                Err(RecvTimeoutError::Timeout) => continue,
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }
    }

    fn reap(&mut self, event: ExitEvent) {
        if let Outcome::Panicked(msg) = &event.outcome {
            log::warn!(
                "{} {} ({}) exited abnormally: {}",
                event.role,
                event.index,
                event.id,
                msg
            );
        }

        match event.role {
            Role::Producer => self.reap_producer(event),
            Role::Consumer => self.reap_consumer(event),
        }
    }

    fn reap_consumer(&mut self, event: ExitEvent) {
        let Some(entry) = self.consumers.remove(&event.index) else {
            return;
        };
        let _ = entry.handle.join();

        if self.needs_restart(&event.outcome) {
            log::info!("respawning consumer {}", event.index);

            match self.spawn_consumer(event.index) {
                Ok(()) => return,
                Err(err) => log::error!("failed to respawn consumer {}: {err}", event.index),
            }
        }

        if self.consumers.is_empty() {
            self.quit = true;
        }
    }

    fn reap_producer(&mut self, event: ExitEvent) {
        let Some(entry) = self.producers.remove(&event.index) else {
            return;
        };
        let _ = entry.handle.join();

        if self.needs_restart(&event.outcome) {
            log::info!("respawning producer {}", event.index);

            match self.spawn_producer(event.index) {
                Ok(()) => return,
                Err(err) => log::error!("failed to respawn producer {}: {err}", event.index),
            }
        }

        if self.producers.is_empty() {
            self.seal_queue();
        }
    }

    /// One end marker per configured consumer slot, so every consumer
    /// eventually receives its own, however the items were load-balanced.
    fn seal_queue(&mut self) {
        let Some(queue) = &self.queue else {
            return;
        };

        let count = self.consumer_num;
        log::debug!("all producers retired, sealing the queue with {count} end markers");

        let sealer = {
            let sender = queue.sender();
            let shutdown = self.shutdown.clone();

            move || {
                for _ in 0..count {
                    match sender.send(Message::End, &shutdown) {
                        SendStatus::Sent => continue,
                        SendStatus::Stopped | SendStatus::Closed => break,
                    }
                }
            }
        };

        // Sealing happens off the supervisor thread: a full queue must not
        // stall the reaping of further worker exits.
        let settings = Settings::new().name(format!("{}: sealer", self.config.name));
        match settings.into_inner().spawn(sealer) {
            Ok(handle) => self.sealer = Some(handle),
            Err(err) => {
                log::error!("failed to spawn the queue sealer: {err}");

                let sender = queue.sender();
                for _ in 0..count {
                    match sender.send(Message::End, &self.shutdown) {
                        SendStatus::Sent => continue,
                        SendStatus::Stopped | SendStatus::Closed => break,
                    }
                }
            }
        }
    }

    fn needs_restart(&self, outcome: &Outcome) -> bool {
        !outcome.is_clean() && self.config.restart && !self.quit && self.shutdown.is_running()
    }

    fn next_worker_id(&mut self) -> WorkerId {
        self.next_id += 1;
        WorkerId::new(self.next_id)
    }

    fn settings(&self, role: Role, index: usize) -> Settings {
        let settings = Settings::new().name(format!("{}: {} {}", self.config.name, role, index));

        match self.config.worker_stack_size {
            Some(bytes) => settings.stack_size(bytes),
            None => settings,
        }
    }

    fn ctrl_sender(&self) -> Result<Sender<ExitEvent>, Error> {
        self.ctrl
            .clone()
            .ok_or_else(|| Error::config("the pool is not running"))
    }
}

impl<T> Pool<T> {
    /// Stops everything still tracked and releases the per-run resources.
    fn wind_down(&mut self) {
        self.shutdown.stop();

        for (index, entry) in self.producers.drain() {
            log::trace!("joining producer {index} ({})", entry.id);
            let _ = entry.handle.join();
        }

        for (index, entry) in self.consumers.drain() {
            log::trace!("joining consumer {index} ({})", entry.id);
            let _ = entry.handle.join();
        }

        if let Some(handle) = self.sealer.take() {
            let _ = handle.join();
        }

        self.queue = None;
        self.ctrl = None;
    }

    #[cfg(test)]
    fn live_workers(&self) -> (usize, usize) {
        (self.producers.len(), self.consumers.len())
    }
}

impl<T> Drop for Pool<T> {
    fn drop(&mut self) {
        self.wind_down()
    }
}

/* ---------- */

/// Runs `job` over every task with at most `max_workers` of them in flight.
///
/// A plain bounded-parallelism helper: no queue protocol, no restarts, no
/// producer/consumer split. Worker threads drain the task list and each task
/// runs to completion independently; a panicking job is reported and does not
/// keep the remaining tasks from running. A zero `max_workers` is treated
/// as 1. Returns once every task has completed.
///
/// # Errors
///
/// Fails when a worker thread cannot be spawned; tasks already handed to
/// running workers still complete before the error is returned.
///
/// # Examples
///
/// ```
/// foreman::execute((0..10u32).collect(), 3, |n| {
///     let _ = n * n;
/// })?;
/// # Ok::<(), foreman::Error>(())
/// ```
pub fn execute<U, F>(tasks: Vec<U>, max_workers: usize, job: F) -> Result<(), Error>
where
    U: Send,
    F: Fn(U) + Send + Sync,
{
    if tasks.is_empty() {
        return Ok(());
    }

    let workers = max_workers.clamp(1, tasks.len());
    let (tx, rx) = unbounded();

    for task in tasks {
        let _ = tx.send(task);
    }
    drop(tx);

    std::thread::scope(|scope| {
        let job = &job;

        for nth in 0..workers {
            let rx = rx.clone();

            Settings::new()
                .name(format!("execute {nth}"))
                .into_inner()
                .spawn_scoped(scope, move || {
                    for task in rx.iter() {
                        if catch_unwind(AssertUnwindSafe(|| job(task))).is_err() {
                            log::warn!("a task job panicked, moving on to the next task");
                        }
                    }
                })?;
        }

        Ok(())
    })
}

/* ---------- */

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use super::*;
    use crate::test_utils::Sink;

    #[test]
    fn zero_consumers_are_rejected() {
        assert!(matches!(
            Pool::<()>::new(0, 0),
            Err(Error::InvalidConfig(_))
        ));
    }

    #[test]
    fn mismatched_modes_are_rejected() {
        // A consumer callback without any producer to feed it.
        let mut pool = Pool::<u32>::new(2, 0).expect("failed to build the pool");
        pool.set_consumer(|_, _, _| {});
        assert!(matches!(pool.run(), Err(Error::InvalidConfig(_))));

        // A one-shot task alongside a producer source.
        let mut pool = Pool::<u32>::new(2, 0).expect("failed to build the pool");
        pool.set_producer(vec![1, 2, 3]);
        pool.set_task(|_, _| {});
        assert!(matches!(pool.run(), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn one_shot_mode_runs_every_consumer_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let indices = Arc::new(Mutex::new(HashSet::new()));

        let mut pool = Pool::<()>::new(5, 0).expect("failed to build the pool");

        let task_calls = calls.clone();
        let task_indices = indices.clone();
        pool.set_task(move |_id, index| {
            task_calls.fetch_add(1, Ordering::SeqCst);
            task_indices.lock().unwrap().insert(index);
        });

        pool.run().expect("the run failed");

        assert_eq!(calls.load(Ordering::SeqCst), 5);
        assert_eq!(*indices.lock().unwrap(), (0..5).collect::<HashSet<_>>());
        assert_eq!(pool.live_workers(), (0, 0));
    }

    #[test]
    fn sequence_items_are_all_delivered() {
        let sink = Sink::new();

        let mut pool = Pool::<&str>::new(2, 0).expect("failed to build the pool");
        pool.set_producer(vec!["a", "b", "c"]);

        let s = sink.clone();
        pool.set_consumer(move |_id, _index, item| s.push(item));

        pool.run().expect("the run failed");

        let mut got = sink.take();
        got.sort();
        assert_eq!(got, ["a", "b", "c"]);
        assert_eq!(pool.live_workers(), (0, 0));
    }

    #[test]
    fn every_produced_item_reaches_a_consumer() {
        const PER_PRODUCER: usize = 25;

        let counters: Arc<Vec<AtomicUsize>> =
            Arc::new((0..2).map(|_| AtomicUsize::new(0)).collect());
        let sink = Sink::new();

        let mut pool = Pool::<(usize, usize)>::new(3, 2).expect("failed to build the pool");

        let ticks = counters.clone();
        pool.set_producer_fn(move |_id, index| {
            let seq = ticks[index].fetch_add(1, Ordering::SeqCst);
            if seq >= PER_PRODUCER {
                Produce::Stop
            } else {
                Produce::Item((index, seq))
            }
        });

        let s = sink.clone();
        pool.set_consumer(move |_id, _index, pair| s.push(pair));

        pool.run().expect("the run failed");

        assert_eq!(sink.take().len(), 2 * PER_PRODUCER);
    }

    #[test]
    fn per_producer_order_is_preserved() {
        const PER_PRODUCER: usize = 40;

        let counters: Arc<Vec<AtomicUsize>> =
            Arc::new((0..2).map(|_| AtomicUsize::new(0)).collect());
        let sink = Sink::new();

        let mut pool = Pool::<(usize, usize)>::new(2, 2).expect("failed to build the pool");

        let ticks = counters.clone();
        pool.set_producer_fn(move |_id, index| {
            let seq = ticks[index].fetch_add(1, Ordering::SeqCst);
            if seq >= PER_PRODUCER {
                Produce::Stop
            } else {
                Produce::Item((index, seq))
            }
        });

        let s = sink.clone();
        pool.set_consumer(move |_id, consumer_index, (producer_index, seq): (usize, usize)| {
            s.push((consumer_index, producer_index, seq))
        });

        pool.run().expect("the run failed");

        let got = sink.take();
        assert_eq!(got.len(), 2 * PER_PRODUCER);

        // Whatever the split, the items one producer enqueued must reach each
        // consumer in their original relative order.
        for consumer in 0..2 {
            for producer in 0..2 {
                let seqs: Vec<_> = got
                    .iter()
                    .filter(|(c, p, _)| *c == consumer && *p == producer)
                    .map(|&(_, _, seq)| seq)
                    .collect();

                assert!(
                    seqs.windows(2).all(|pair| pair[0] < pair[1]),
                    "consumer {consumer} saw producer {producer} out of order: {seqs:?}"
                );
            }
        }
    }

    #[test]
    fn batches_and_skips_flow_through() {
        let tick = Arc::new(AtomicUsize::new(0));
        let sink = Sink::new();

        let mut pool = Pool::<u32>::new(1, 1).expect("failed to build the pool");

        pool.set_producer_fn(move |_id, _index| match tick.fetch_add(1, Ordering::SeqCst) {
            0 => Produce::Skip,
            1 => Produce::Batch(vec![1, 2, 3]),
            2 => Produce::Item(4),
            _ => Produce::Stop,
        });

        let s = sink.clone();
        pool.set_consumer(move |_id, _index, item| s.push(item));

        pool.run().expect("the run failed");

        // One producer, one consumer: delivery order is fully determined.
        assert_eq!(sink.take(), [1, 2, 3, 4]);
    }

    #[test]
    fn failed_consumer_retires_without_restart() {
        let sink = Sink::new();

        let mut pool = Pool::<u32>::new(2, 0).expect("failed to build the pool");
        pool.set_producer(vec![0, 1, 2, 3, 4, 5]);

        let s = sink.clone();
        pool.set_consumer(move |_id, _index, item| {
            if item == 0 {
                panic!("poisoned item");
            }
            s.push(item);
        });

        pool.run().expect("the run failed");

        let mut got = sink.take();
        got.sort();
        assert_eq!(got, [1, 2, 3, 4, 5]);
        assert_eq!(pool.live_workers(), (0, 0));
    }

    #[test]
    fn auto_restart_respawns_a_failed_consumer() {
        let poisoned = Arc::new(AtomicBool::new(false));
        let sink = Sink::new();

        let mut pool = Pool::<u32>::new(1, 0).expect("failed to build the pool");
        pool.set_producer(vec![10, 20, 30, 40]);
        pool.set_auto_restart();

        let s = sink.clone();
        pool.set_consumer(move |_id, _index, item| {
            if item == 10 && !poisoned.swap(true, Ordering::SeqCst) {
                panic!("poisoned item");
            }
            s.push(item);
        });

        pool.run().expect("the run failed");

        // The poisoned item died with the first consumer (at-most-once);
        // everything behind it was handled by the replacement.
        assert_eq!(sink.take(), [20, 30, 40]);
        assert_eq!(pool.live_workers(), (0, 0));
    }

    #[test]
    fn auto_restart_respawns_a_failed_producer() {
        let poisoned = Arc::new(AtomicBool::new(false));
        let emitted = Arc::new(AtomicUsize::new(0));
        let sink = Sink::new();

        let mut pool = Pool::<usize>::new(1, 1).expect("failed to build the pool");
        pool.set_auto_restart();

        pool.set_producer_fn(move |_id, _index| {
            if !poisoned.swap(true, Ordering::SeqCst) {
                panic!("first spawn always dies");
            }

            let seq = emitted.fetch_add(1, Ordering::SeqCst);
            if seq >= 3 {
                Produce::Stop
            } else {
                Produce::Item(seq)
            }
        });

        let s = sink.clone();
        pool.set_consumer(move |_id, _index, item| s.push(item));

        pool.run().expect("the run failed");

        assert_eq!(sink.take(), [0, 1, 2]);
    }

    #[test]
    fn panicking_producer_still_unblocks_the_consumers() {
        let sink = Sink::new();

        let mut pool = Pool::<u8>::new(2, 1).expect("failed to build the pool");
        pool.set_producer_fn(|_id, _index| panic!("broken source"));

        let s = sink.clone();
        pool.set_consumer(move |_id, _index, item| s.push(item));

        // Without restart the producer retires, the queue is sealed and both
        // consumers wind down with nothing delivered.
        pool.run().expect("the run failed");

        assert!(sink.take().is_empty());
        assert_eq!(pool.live_workers(), (0, 0));
    }

    #[test]
    fn a_finished_pool_can_run_again() {
        let sink = Sink::new();

        let mut pool = Pool::<u32>::new(2, 0).expect("failed to build the pool");
        let s = sink.clone();
        pool.set_consumer(move |_id, _index, item| s.push(item));

        pool.set_producer(vec![1, 2]);
        pool.run().expect("the first run failed");
        assert_eq!(pool.live_workers(), (0, 0));

        // A fresh source; the consumer callback carries over.
        pool.set_producer(vec![3, 4]);
        pool.run().expect("the second run failed");

        let mut got = sink.take();
        got.sort();
        assert_eq!(got, [1, 2, 3, 4]);
    }

    #[test]
    fn execute_bounds_the_concurrency() {
        let live = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));
        let done = Arc::new(AtomicUsize::new(0));

        let tasks: Vec<u8> = (0..5).collect();

        execute(tasks, 2, |_task| {
            let now = live.fetch_add(1, Ordering::SeqCst) + 1;
            peak.fetch_max(now, Ordering::SeqCst);

            std::thread::sleep(Duration::from_millis(40));

            live.fetch_sub(1, Ordering::SeqCst);
            done.fetch_add(1, Ordering::SeqCst);
        })
        .expect("execute failed");

        assert_eq!(done.load(Ordering::SeqCst), 5);
        assert!(peak.load(Ordering::SeqCst) <= 2);
    }

    #[test]
    fn execute_survives_panicking_jobs() {
        let done = Arc::new(AtomicUsize::new(0));

        execute((0..4u8).collect(), 2, |task| {
            if task == 0 {
                panic!("bad task");
            }
            done.fetch_add(1, Ordering::SeqCst);
        })
        .expect("execute failed");

        assert_eq!(done.load(Ordering::SeqCst), 3);
    }
}
