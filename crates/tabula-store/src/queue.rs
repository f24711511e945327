//! Serialized execution queue
//!
//! A single worker thread owns the connection and runs submitted jobs one at
//! a time in submission order. No two statements ever run concurrently
//! against the store and callers never see the connection or a lock.
//! Jobs cannot be cancelled once submitted.

use std::sync::mpsc::{self, Receiver, Sender};
use std::thread::JoinHandle;

use rusqlite::Connection;
use tabula_core::Result;

use crate::config::StoreConfig;
use crate::db;
use crate::errors::queue_unavailable;

type Job = Box<dyn FnOnce(&mut Connection) + Send>;

pub struct ExecutionQueue {
    sender: Option<Sender<Job>>,
    worker: Option<JoinHandle<()>>,
}

impl ExecutionQueue {
    /// Move `conn` onto a new worker thread
    pub fn new(conn: Connection) -> Result<Self> {
        let (sender, receiver) = mpsc::channel::<Job>();
        let worker = std::thread::Builder::new()
            .name("tabula-queue".to_string())
            .spawn(move || {
                let mut conn = conn;
                while let Ok(job) = receiver.recv() {
                    job(&mut conn);
                }
                tracing::debug!("execution queue drained, closing connection");
            })
            .map_err(queue_unavailable)?;
        Ok(Self {
            sender: Some(sender),
            worker: Some(worker),
        })
    }

    pub fn open(config: &StoreConfig) -> Result<Self> {
        Self::new(db::open(config)?)
    }

    /// Enqueue `job` without waiting; the receiver yields its result once it
    /// has run.
    pub fn submit<R, F>(&self, job: F) -> Result<Receiver<R>>
    where
        F: FnOnce(&mut Connection) -> R + Send + 'static,
        R: Send + 'static,
    {
        let (reply, completion) = mpsc::sync_channel(1);
        let job: Job = Box::new(move |conn| {
            // The submitter may have abandoned the result.
            let _ = reply.send(job(conn));
        });
        self.sender
            .as_ref()
            .ok_or_else(|| queue_unavailable("queue is shutting down"))?
            .send(job)
            .map_err(|_| queue_unavailable("worker thread has stopped"))?;
        Ok(completion)
    }

    /// Enqueue `job` and block until it has run
    pub fn execute<R, F>(&self, job: F) -> Result<R>
    where
        F: FnOnce(&mut Connection) -> R + Send + 'static,
        R: Send + 'static,
    {
        self.submit(job)?
            .recv()
            .map_err(|_| queue_unavailable("worker dropped the job without replying"))
    }
}

impl Drop for ExecutionQueue {
    fn drop(&mut self) {
        // Closing the channel lets the worker finish queued jobs and exit.
        self.sender.take();
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                tracing::error!("execution queue worker panicked");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    fn queue() -> ExecutionQueue {
        ExecutionQueue::new(Connection::open_in_memory().unwrap()).unwrap()
    }

    #[test]
    fn test_execute_returns_job_result() {
        let queue = queue();
        let answer: i64 = queue
            .execute(|conn| conn.query_row("SELECT 40 + 2", [], |row| row.get(0)))
            .unwrap()
            .unwrap();
        assert_eq!(answer, 42);
    }

    #[test]
    fn test_jobs_run_in_submission_order() {
        let queue = queue();
        let order = Arc::new(Mutex::new(Vec::new()));
        let receivers: Vec<_> = (0..20)
            .map(|i| {
                let order = order.clone();
                queue
                    .submit(move |_conn| order.lock().unwrap().push(i))
                    .unwrap()
            })
            .collect();
        for receiver in receivers {
            receiver.recv().unwrap();
        }
        assert_eq!(*order.lock().unwrap(), (0..20).collect::<Vec<_>>());
    }

    #[test]
    fn test_state_persists_between_jobs() {
        let queue = queue();
        queue
            .execute(|conn| conn.execute_batch("CREATE TABLE t (v INTEGER); INSERT INTO t VALUES (7);"))
            .unwrap()
            .unwrap();
        let v: i64 = queue
            .execute(|conn| conn.query_row("SELECT v FROM t", [], |row| row.get(0)))
            .unwrap()
            .unwrap();
        assert_eq!(v, 7);
    }

    #[test]
    fn test_drop_completes_pending_jobs() {
        let done = Arc::new(Mutex::new(false));
        {
            let queue = queue();
            let flag = done.clone();
            queue
                .submit(move |_conn| *flag.lock().unwrap() = true)
                .unwrap();
        }
        assert!(*done.lock().unwrap());
    }
}
