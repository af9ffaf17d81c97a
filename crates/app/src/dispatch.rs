//! Detached side effects.

use std::{fmt::Display, future::Future};

use tracing::warn;

/// Runs best-effort work whose failure must never fail the caller.
///
/// `Detached` spawns onto the tokio runtime and returns immediately. `Inline`
/// awaits the work before returning, which keeps tests deterministic. In both
/// modes failures are logged and swallowed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Dispatcher {
    /// Spawn onto the runtime.
    #[default]
    Detached,
    /// Await in place.
    Inline,
}

impl Dispatcher {
    /// Run `work` under the name `task`, logging a failure instead of returning it.
    pub async fn dispatch<F, E>(&self, task: &'static str, work: F)
    where
        F: Future<Output = Result<(), E>> + Send + 'static,
        E: Display + Send + 'static,
    {
        match self {
            Self::Detached => {
                let _task = tokio::spawn(run_logged(task, work));
            }
            Self::Inline => run_logged(task, work).await,
        }
    }
}

async fn run_logged<F, E>(task: &'static str, work: F)
where
    F: Future<Output = Result<(), E>>,
    E: Display,
{
    if let Err(error) = work.await {
        warn!(task, "detached task failed: {error}");
    }
}
