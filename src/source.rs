use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use crate::worker::WorkerId;

/* ---------- */

/// Uniform callback shape every producer source resolves into.
pub(crate) type ProducerFn<T> = Arc<dyn Fn(WorkerId, usize) -> Produce<T> + Send + Sync>;

/* ---------- */

/// What a producer callback hands back on one invocation.
///
/// # Examples
///
/// A producer that emits the numbers up to 3 and then retires:
///
/// ```
/// # use foreman::{Produce, WorkerId};
/// # use std::sync::atomic::{AtomicU32, Ordering};
/// let tick = AtomicU32::new(0);
///
/// let produce = move |_id: WorkerId, _index: usize| {
///     match tick.fetch_add(1, Ordering::SeqCst) {
///         n @ 0..=3 => Produce::Item(n),
///         _ => Produce::Stop,
///     }
/// };
/// ```
#[derive(Debug)]
pub enum Produce<T> {
    /// One data item, enqueued as a single message.
    Item(T),
    /// Several data items, each enqueued as its own message, in order.
    Batch(Vec<T>),
    /// Nothing produced this tick; the producer keeps going.
    Skip,
    /// The producer is done and its worker exits cleanly.
    Stop,
}

/* ---------- */

/// Where the data items of a pipeline come from.
///
/// A `Callback` is invoked over and over by every producer worker with the
/// worker's identity and index. A `Sequence` is drained by a single producer
/// worker, one element per invocation, stopping once exhausted; `Vec`s convert
/// into it directly:
///
/// ```
/// # use foreman::ProducerSource;
/// let source = ProducerSource::from(vec!["a", "b", "c"]);
/// ```
pub enum ProducerSource<T> {
    /// A callback invoked with `(worker id, worker index)` on every tick.
    Callback(ProducerFn<T>),
    /// A pre-built finite sequence of items.
    Sequence(Vec<T>),
}

impl<T: Send + 'static> ProducerSource<T> {
    /// Wraps a plain closure as a producer source.
    pub fn callback<F>(produce: F) -> Self
    where
        F: Fn(WorkerId, usize) -> Produce<T> + Send + Sync + 'static,
    {
        Self::Callback(Arc::new(produce))
    }

    /// Resolves the source into the uniform callback shape.
    ///
    /// A sequence becomes a callback popping one element per invocation; a
    /// poisoned sequence lock also reads as exhausted.
    pub(crate) fn resolve(self) -> ProducerFn<T> {
        match self {
            Self::Callback(produce) => produce,
            Self::Sequence(items) => {
                let items = Mutex::new(VecDeque::from(items));

                Arc::new(move |_id, _index| {
                    match items.lock().ok().and_then(|mut items| items.pop_front()) {
                        Some(item) => Produce::Item(item),
                        None => Produce::Stop,
                    }
                })
            }
        }
    }
}

impl<T> From<Vec<T>> for ProducerSource<T> {
    #[inline]
    fn from(items: Vec<T>) -> Self {
        Self::Sequence(items)
    }
}

/* ---------- */
