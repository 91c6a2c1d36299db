// SPDX-License-Identifier: GPL-3.0-only

//! Single-threaded execution context for capture jobs

use crate::errors::ExecutorError;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{Sender, channel};
use std::thread::JoinHandle;
use tracing::{debug, error};

type Job = Box<dyn FnOnce() + Send + 'static>;

/// One dedicated worker thread running jobs in submission order
///
/// Dropping the executor stops intake, drains queued jobs and joins the worker.
pub struct CaptureExecutor {
    tx: Mutex<Option<Sender<Job>>>,
    join: Mutex<Option<JoinHandle<()>>>,
    stopped: AtomicBool,
}

impl CaptureExecutor {
    pub fn new() -> Result<Self, ExecutorError> {
        let (tx, rx) = channel::<Job>();

        let join = std::thread::Builder::new()
            .name("capture-worker".to_string())
            .spawn(move || {
                debug!("Capture worker started");
                for job in rx {
                    if std::panic::catch_unwind(std::panic::AssertUnwindSafe(job)).is_err() {
                        error!("Capture job panicked");
                    }
                }
                debug!("Capture worker stopped");
            })
            .map_err(|e| ExecutorError::SpawnFailed(e.to_string()))?;

        Ok(Self {
            tx: Mutex::new(Some(tx)),
            join: Mutex::new(Some(join)),
            stopped: AtomicBool::new(false),
        })
    }

    /// Queue `job` behind every previously submitted job
    pub fn execute<F>(&self, job: F) -> Result<(), ExecutorError>
    where
        F: FnOnce() + Send + 'static,
    {
        if self.stopped.load(Ordering::Acquire) {
            return Err(ExecutorError::ShutDown);
        }
        let guard = self.tx.lock().map_err(|_| ExecutorError::ShutDown)?;
        let tx = guard.as_ref().ok_or(ExecutorError::ShutDown)?;
        tx.send(Box::new(job)).map_err(|_| ExecutorError::ShutDown)
    }

    pub fn is_shutdown(&self) -> bool {
        self.stopped.load(Ordering::Acquire)
    }

    /// Stop accepting jobs, finish the queued ones and join the worker
    pub fn shutdown(&self) {
        if self.stopped.swap(true, Ordering::AcqRel) {
            return;
        }

        if let Ok(mut tx) = self.tx.lock() {
            tx.take();
        }

        let join = self.join.lock().ok().and_then(|mut j| j.take());
        if let Some(join) = join {
            // A job that drops the last executor handle runs on the worker itself
            if join.thread().id() == std::thread::current().id() {
                return;
            }
            if join.join().is_err() {
                error!("Capture worker exited abnormally");
            }
        }
    }
}

impl Drop for CaptureExecutor {
    fn drop(&mut self) {
        self.shutdown();
    }
}
