/* ---------- */

/// Default bound of the queue channel.
pub(crate) const DEFAULT_QUEUE_CAPACITY: usize = 1024;

/* ---------- */

/// Tunable behavior of a [`Pool`], built in a chained fashion.
///
/// [`Pool`]: crate::Pool
///
/// # Examples
///
/// ```
/// # use foreman::PoolConfig;
/// let config = PoolConfig::new()
///     .name("ingest")
///     .restart(true)
///     .queue_capacity(256);
/// ```
#[derive(Debug, Clone)]
pub struct PoolConfig {
    pub(crate) name: String,
    pub(crate) restart: bool,
    pub(crate) queue_capacity: usize,
    pub(crate) worker_stack_size: Option<usize>,
}

impl PoolConfig {
    /// Returns the base configuration with default parameters.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the pool's name, used as the prefix of every worker thread name.
    #[inline]
    pub fn name<T: ToString>(mut self, name: T) -> Self {
        self.name = name.to_string();
        self
    }

    /// Enables or disables respawning workers that exited abnormally.
    #[inline]
    pub fn restart(mut self, restart: bool) -> Self {
        self.restart = restart;
        self
    }

    /// Sets the maximum number of in-flight messages in the queue channel.
    ///
    /// Producers that outrun the consumers block once the bound is reached.
    #[inline]
    pub fn queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity;
        self
    }

    /// Sets the stack size of every worker thread.
    ///
    /// The platform default is used when unset.
    #[inline]
    pub fn worker_stack_size(mut self, bytes: usize) -> Self {
        self.worker_stack_size = Some(bytes);
        self
    }
}

impl Default for PoolConfig {
    #[inline]
    fn default() -> Self {
        Self {
            name: String::from("foreman"),
            restart: false,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            worker_stack_size: None,
        }
    }
}

/* ---------- */

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chained_settings_override_the_defaults() {
        let config = PoolConfig::new();
        assert_eq!(config.name, "foreman");
        assert!(!config.restart);
        assert_eq!(config.queue_capacity, DEFAULT_QUEUE_CAPACITY);
        assert!(config.worker_stack_size.is_none());

        let config = config.name("ingest").restart(true).queue_capacity(8);
        assert_eq!(config.name, "ingest");
        assert!(config.restart);
        assert_eq!(config.queue_capacity, 8);
    }
}
