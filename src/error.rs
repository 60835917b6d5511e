/// Errors reported while configuring or starting a pool.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The pool was configured in a way that can never run.
    #[error("invalid pool configuration: {0}")]
    InvalidConfig(String),

    /// The OS refused to spawn a worker thread.
    #[error(transparent)]
    ThreadStart(#[from] std::io::Error),
}

impl Error {
    #[inline]
    pub(crate) fn config<T: ToString>(msg: T) -> Self {
        Self::InvalidConfig(msg.to_string())
    }
}
