//! Execution contexts for producer tasks

use std::future::Future;

use tokio::runtime::{Builder, Handle};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::config::ExecutorKind;
use crate::error::StreamError;

/// Where an active source runs its producer
#[derive(Debug, Clone, Default)]
pub enum Executor {
    /// `tokio::spawn` on the runtime the source is started from
    #[default]
    Current,

    /// Spawn onto a specific runtime, e.g. a shared worker pool
    Runtime(Handle),

    /// A dedicated OS thread driving its own current-thread runtime
    Thread { name: String },
}

impl Executor {
    pub fn from_kind(kind: ExecutorKind, thread_name: &str) -> Self {
        match kind {
            ExecutorKind::Current => Executor::Current,
            ExecutorKind::Thread => Executor::Thread {
                name: thread_name.to_string(),
            },
        }
    }

    /// Run `task` to completion in this execution context
    pub(crate) fn spawn<F>(&self, task: F) -> Result<TaskHandle, StreamError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        match self {
            Executor::Current => {
                debug!("Executor::spawn: current runtime");
                let handle = Handle::try_current().map_err(StreamError::unexpected)?;
                Ok(TaskHandle::Task(handle.spawn(task)))
            }
            Executor::Runtime(handle) => {
                debug!("Executor::spawn: runtime handle");
                Ok(TaskHandle::Task(handle.spawn(task)))
            }
            Executor::Thread { name } => {
                debug!(%name, "Executor::spawn: dedicated thread");
                let runtime = Builder::new_current_thread().enable_all().build()?;
                let (done_tx, done_rx) = oneshot::channel();
                std::thread::Builder::new().name(name.clone()).spawn(move || {
                    // Fires on return and on unwind, after the runtime is gone
                    let _done = Finished(Some(done_tx));
                    let runtime = runtime;
                    runtime.block_on(task);
                })?;
                Ok(TaskHandle::Thread(done_rx))
            }
        }
    }
}

/// Handle to await termination of a spawned producer task
pub(crate) enum TaskHandle {
    Task(JoinHandle<()>),
    Thread(oneshot::Receiver<()>),
}

impl TaskHandle {
    /// Wait until the task has fully terminated
    pub(crate) async fn join(self) {
        match self {
            TaskHandle::Task(handle) => {
                if let Err(e) = handle.await {
                    warn!(error = %e, "TaskHandle::join: producer task did not finish cleanly");
                }
            }
            TaskHandle::Thread(done) => {
                // A dropped sender also means the thread is gone
                let _ = done.await;
            }
        }
    }
}

struct Finished(Option<oneshot::Sender<()>>);

impl Drop for Finished {
    fn drop(&mut self) {
        if let Some(tx) = self.0.take() {
            let _ = tx.send(());
        }
    }
}
