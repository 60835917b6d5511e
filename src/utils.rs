use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use signal_hook::consts::TERM_SIGNALS;
use signal_hook::{flag, SigId};

/* ---------- */

/// Shared stop token of a running pool.
///
/// Raised either by the supervisor during wind-down or by a termination
/// signal. Workers poll it between queue operations and callback invocations.
#[derive(Debug, Default)]
pub(crate) struct Shutdown(Arc<AtomicBool>);

impl Shutdown {
    #[inline]
    pub(crate) fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub(crate) fn stop(&self) {
        self.0.store(true, Ordering::SeqCst)
    }

    /// Returns whether the pool is still supposed to run.
    #[inline]
    pub(crate) fn is_running(&self) -> bool {
        !self.0.load(Ordering::SeqCst)
    }
}

impl AsRef<Arc<AtomicBool>> for Shutdown {
    #[inline]
    fn as_ref(&self) -> &Arc<AtomicBool> {
        &self.0
    }
}

impl Clone for Shutdown {
    #[inline]
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

/* ---------- */

/// Termination-signal observers registered for the duration of a run.
///
/// The first signal raises the stop token and lets the supervisor unwind the
/// pool in order. If that has no effect, a second signal kills the process.
/// Registrations are removed again when the guard drops, so a finished run
/// leaves no handler behind.
pub(crate) struct SignalGuard {
    ids: Vec<SigId>,
}

impl SignalGuard {
    pub(crate) fn register(shutdown: &Shutdown) -> Self {
        let mut ids = Vec::new();

        for sig in TERM_SIGNALS {
            // The forced-shutdown handler must come first so it only fires
            // once the flag below has been raised by a previous signal.
            match flag::register_conditional_shutdown(*sig, 1, shutdown.as_ref().clone()) {
                Ok(id) => ids.push(id),
                Err(err) => log::warn!("cannot register forced shutdown for signal {sig}: {err}"),
            }

            match flag::register(*sig, shutdown.as_ref().clone()) {
                Ok(id) => ids.push(id),
                Err(err) => log::warn!("cannot register graceful shutdown for signal {sig}: {err}"),
            }
        }

        Self { ids }
    }
}

impl Drop for SignalGuard {
    fn drop(&mut self) {
        for id in self.ids.drain(..) {
            signal_hook::low_level::unregister(id);
        }
    }
}
