use std::future::Future;
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;

use tracing::{debug, error};

use crate::error::{ApiError, Result};

pub enum TaskPoll<T> {
    Pending,
    Ready(Result<T>),
}

/// One in-flight network call running on its own worker thread.
pub struct PendingTask<T> {
    name: &'static str,
    receiver: Receiver<Result<T>>,
}

impl<T> PendingTask<T> {
    pub fn poll(&self) -> TaskPoll<T> {
        match self.receiver.try_recv() {
            Ok(result) => TaskPoll::Ready(result),
            Err(TryRecvError::Empty) => TaskPoll::Pending,
            Err(TryRecvError::Disconnected) => {
                error!("Task '{}' worker disconnected", self.name);
                TaskPoll::Ready(Err(ApiError::Unknown {
                    status: 0,
                    message: format!("{} worker stopped unexpectedly", self.name),
                }))
            }
        }
    }
}

pub fn spawn_task<T, F, Fut>(name: &'static str, job: F) -> PendingTask<T>
where
    T: Send + 'static,
    F: FnOnce() -> Fut + Send + 'static,
    Fut: Future<Output = Result<T>>,
{
    let (tx, rx) = mpsc::channel::<Result<T>>();

    thread::spawn(move || {
        let runtime = match tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
        {
            Ok(rt) => rt,
            Err(err) => {
                let _ = tx.send(Err(ApiError::Unknown {
                    status: 0,
                    message: format!("failed to initialize {name} runtime: {err}"),
                }));
                return;
            }
        };

        debug!("Task '{}' started", name);
        let result = runtime.block_on(job());
        debug!("Task '{}' finished (ok: {})", name, result.is_ok());
        let _ = tx.send(result);
    });

    PendingTask { name, receiver: rx }
}
