use std::any::Any;
use std::fmt;
use std::io;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::thread::JoinHandle;

use crossbeam_channel::Sender;

use crate::channel::{Message, QueueReceiver, QueueSender, RecvStatus, SendStatus};
use crate::settings::Settings;
use crate::source::{Produce, ProducerFn};
use crate::utils::Shutdown;

/* ---------- */

/// Callback invoked by a consumer worker for every dequeued item.
pub(crate) type ConsumerFn<T> = Arc<dyn Fn(WorkerId, usize, T) + Send + Sync>;

/// Callback invoked exactly once per consumer worker in one-shot mode.
pub(crate) type TaskFn = Arc<dyn Fn(WorkerId, usize) + Send + Sync>;

/* ---------- */

/// Identity of one spawned worker.
///
/// Unique across the lifetime of a pool, including respawns: a worker
/// restarted at the same index gets a fresh id, so callbacks can tell a
/// replacement apart from the original.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WorkerId(u64);

impl WorkerId {
    #[inline]
    pub(crate) fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Returns the raw numeric identity.
    #[inline]
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for WorkerId {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/* ---------- */

/// Which of the two pools a worker belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Role {
    Producer,
    Consumer,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Producer => f.write_str("producer"),
            Self::Consumer => f.write_str("consumer"),
        }
    }
}

/* ---------- */

/// How a worker left its loop.
///
/// A panicking user callback counts as an abnormal exit and makes the worker
/// eligible for a restart; anything else is clean.
#[derive(Debug)]
pub(crate) enum Outcome {
    Clean,
    Panicked(String),
}

impl Outcome {
    #[inline]
    pub(crate) fn is_clean(&self) -> bool {
        matches!(self, Self::Clean)
    }
}

/// Delivered to the supervisor's control channel as a worker's last action.
#[derive(Debug)]
pub(crate) struct ExitEvent {
    pub(crate) role: Role,
    pub(crate) index: usize,
    pub(crate) id: WorkerId,
    pub(crate) outcome: Outcome,
}

/* ---------- */

/// Spawns a worker thread that runs `body` and reports its exit.
///
/// The body runs under `catch_unwind` so the exit event is sent no matter how
/// the user callback behaved; the thread itself always finishes normally.
pub(crate) fn spawn(
    role: Role,
    index: usize,
    id: WorkerId,
    settings: Settings,
    ctrl: Sender<ExitEvent>,
    body: impl FnOnce() + Send + 'static,
) -> io::Result<JoinHandle<()>> {
    settings.into_inner().spawn(move || {
        let outcome = match catch_unwind(AssertUnwindSafe(body)) {
            Ok(()) => Outcome::Clean,
            Err(payload) => Outcome::Panicked(panic_message(payload)),
        };

        let _ = ctrl.send(ExitEvent {
            role,
            index,
            id,
            outcome,
        });
    })
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        String::from("opaque panic payload")
    }
}

/* ---------- */

/// The loop run by every producer worker.
pub(crate) struct ProducerWorker<T> {
    pub(crate) id: WorkerId,
    pub(crate) index: usize,
    pub(crate) produce: ProducerFn<T>,
    pub(crate) queue: QueueSender<T>,
    pub(crate) shutdown: Shutdown,
}

impl<T> ProducerWorker<T> {
    pub(crate) fn run(self) {
        while self.shutdown.is_running() {
            match (self.produce)(self.id, self.index) {
                Produce::Stop => break,
                Produce::Skip => continue,
                Produce::Item(item) => {
                    if !self.enqueue(item) {
                        break;
                    }
                }
                Produce::Batch(items) => {
                    let mut aborted = false;

                    for item in items {
                        if !self.enqueue(item) {
                            aborted = true;
                            break;
                        }
                    }

                    if aborted {
                        break;
                    }
                }
            }
        }

        log::debug!("producer {} ({}) leaving its loop", self.index, self.id);
    }

    fn enqueue(&self, item: T) -> bool {
        match self.queue.send(Message::Normal(item), &self.shutdown) {
            SendStatus::Sent => true,
            SendStatus::Stopped => false,
            SendStatus::Closed => {
                log::warn!(
                    "queue disconnected, producer {} drops its pending item",
                    self.index
                );
                false
            }
        }
    }
}

/* ---------- */

/// The loop run by every consumer worker in pipeline mode.
pub(crate) struct ConsumerWorker<T> {
    pub(crate) id: WorkerId,
    pub(crate) index: usize,
    pub(crate) consume: ConsumerFn<T>,
    pub(crate) queue: QueueReceiver<T>,
    pub(crate) shutdown: Shutdown,
}

impl<T> ConsumerWorker<T> {
    pub(crate) fn run(self) {
        loop {
            match self.queue.recv(&self.shutdown) {
                RecvStatus::Received(Message::Normal(item)) => {
                    (self.consume)(self.id, self.index, item)
                }
                RecvStatus::Received(Message::End) => break,
                RecvStatus::Stopped => break,
                RecvStatus::Closed => {
                    log::debug!("queue disconnected, consumer {} leaving", self.index);
                    break;
                }
            }
        }

        log::debug!("consumer {} ({}) leaving its loop", self.index, self.id);
    }
}

/* ---------- */

/// One-shot mode: the callback runs exactly once, no queue involved.
pub(crate) struct TaskWorker {
    pub(crate) id: WorkerId,
    pub(crate) index: usize,
    pub(crate) task: TaskFn,
}

impl TaskWorker {
    pub(crate) fn run(self) {
        (self.task)(self.id, self.index);
    }
}

/* ---------- */

#[cfg(test)]
mod tests {
    use super::*;

    use crossbeam_channel::unbounded;

    #[test]
    fn exit_event_reports_clean_completion() {
        let (tx, rx) = unbounded();
        let handle = spawn(Role::Consumer, 3, WorkerId::new(7), Settings::new(), tx, || {})
            .expect("failed to spawn the test worker");

        let event = rx.recv().expect("no exit event received");
        assert_eq!(event.role, Role::Consumer);
        assert_eq!(event.index, 3);
        assert_eq!(event.id, WorkerId::new(7));
        assert!(event.outcome.is_clean());

        handle.join().expect("worker thread should not die");
    }

    #[test]
    fn exit_event_reports_panics() {
        let (tx, rx) = unbounded();
        let handle = spawn(Role::Producer, 0, WorkerId::new(1), Settings::new(), tx, || {
            panic!("kaboom")
        })
        .expect("failed to spawn the test worker");

        let event = rx.recv().expect("no exit event received");
        assert!(matches!(event.outcome, Outcome::Panicked(ref msg) if msg.contains("kaboom")));

        // The panic was caught inside the worker, so the thread itself is fine.
        handle.join().expect("worker thread should not die");
    }
}
