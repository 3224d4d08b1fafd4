use dispatcher::DispatcherError;
use thiserror::Error;

/// Errors that end a supervisor run
#[derive(Debug, Error)]
pub enum SupervisorError {
    /// The read task was cancelled before handing back the dispatcher
    #[error("read task cancelled")]
    ReadTaskCancelled,

    /// Closing the sink at shutdown failed
    #[error("dispatcher shutdown failed: {0}")]
    Dispatcher(#[from] DispatcherError),
}
