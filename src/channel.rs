use std::time::Duration;

use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, SendTimeoutError, Sender};

use crate::utils::Shutdown;

/* ---------- */

/// How long a blocked queue operation waits before checking the stop token again.
const QUEUE_TICK: Duration = Duration::from_millis(20);

/* ---------- */

/// A message travelling from the producer pool to the consumer pool.
#[derive(Debug)]
pub(crate) enum Message<T> {
    /// One data item, produced by a producer worker.
    Normal(T),
    /// Tells exactly one consumer to leave its receive loop.
    End,
}

/* ---------- */

/// The bounded, multi-writer/multi-reader queue tying both pools together.
///
/// Competing-consumer semantics: a message is delivered to whichever reader's
/// receive is serviced first, never to more than one. The channel lives for
/// exactly one run and is released by dropping every endpoint.
pub(crate) struct QueueChannel<T> {
    tx: Sender<Message<T>>,
    rx: Receiver<Message<T>>,
}

impl<T> QueueChannel<T> {
    pub(crate) fn bounded(capacity: usize) -> Self {
        let (tx, rx) = bounded(capacity);
        Self { tx, rx }
    }

    pub(crate) fn sender(&self) -> QueueSender<T> {
        QueueSender {
            tx: self.tx.clone(),
        }
    }

    pub(crate) fn receiver(&self) -> QueueReceiver<T> {
        QueueReceiver {
            rx: self.rx.clone(),
        }
    }
}

/* ---------- */

/// Result of a stop-aware enqueue.
#[derive(Debug)]
pub(crate) enum SendStatus {
    Sent,
    /// The stop token was raised while waiting for queue space.
    Stopped,
    /// Every receiving endpoint is gone; the queue can never drain again.
    Closed,
}

/// Writing half of the queue, held by producer workers and the supervisor.
pub(crate) struct QueueSender<T> {
    tx: Sender<Message<T>>,
}

impl<T> QueueSender<T> {
    /// Blocks until the message is enqueued, waking periodically to honor the
    /// stop token. A full queue is a transient condition and never an error.
    pub(crate) fn send(&self, msg: Message<T>, shutdown: &Shutdown) -> SendStatus {
        let mut pending = msg;

        loop {
            if !shutdown.is_running() {
                return SendStatus::Stopped;
            }

            match self.tx.send_timeout(pending, QUEUE_TICK) {
                Ok(()) => return SendStatus::Sent,
                Err(SendTimeoutError::Timeout(msg)) => pending = msg,
                Err(SendTimeoutError::Disconnected(_)) => return SendStatus::Closed,
            }
        }
    }
}

/* ---------- */

/// Result of a stop-aware dequeue.
#[derive(Debug)]
pub(crate) enum RecvStatus<T> {
    Received(Message<T>),
    /// The stop token was raised while waiting for a message.
    Stopped,
    /// Every sending endpoint is gone and the queue is drained.
    Closed,
}

/// Reading half of the queue, held by consumer workers.
pub(crate) struct QueueReceiver<T> {
    rx: Receiver<Message<T>>,
}

impl<T> QueueReceiver<T> {
    /// Blocks until a message arrives, waking periodically to honor the stop
    /// token. A timed-out receive is retried, never treated as a stop.
    pub(crate) fn recv(&self, shutdown: &Shutdown) -> RecvStatus<T> {
        loop {
            if !shutdown.is_running() {
                return RecvStatus::Stopped;
            }

            match self.rx.recv_timeout(QUEUE_TICK) {
                Ok(msg) => return RecvStatus::Received(msg),
                Err(RecvTimeoutError::Timeout) => continue,
                Err(RecvTimeoutError::Disconnected) => return RecvStatus::Closed,
            }
        }
    }
}

/* ---------- */
