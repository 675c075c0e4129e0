//! # Single-thread scheduler.
//!
//! [`ThreadScheduler`] owns one OS thread that drains a task queue in FIFO
//! order — the equivalent of a UI-thread dispatcher for messengers that
//! want all deliveries on one thread.
//!
//! ## Rules
//! - Tasks run strictly in posting order, one at a time.
//! - A panicking task is isolated; the worker keeps draining the queue.
//! - After [`shutdown`](ThreadScheduler::shutdown) (or drop of the last
//!   handle) further posts are dropped with a warning; queued tasks still
//!   drain before the worker exits.

use std::io;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::thread::{self, ThreadId};

use crate::scheduling::{Scheduler, Task};
use crate::utils::lock;

/// Scheduler backed by one dedicated worker thread.
pub struct ThreadScheduler {
    sender: Mutex<Option<mpsc::Sender<Task>>>,
    worker: ThreadId,
}

impl ThreadScheduler {
    /// Spawns the worker thread and returns the scheduler handle.
    pub fn spawn(name: impl Into<String>) -> io::Result<Arc<Self>> {
        let (sender, receiver) = mpsc::channel::<Task>();
        let handle = thread::Builder::new().name(name.into()).spawn(move || {
            while let Ok(task) = receiver.recv() {
                // Isolate task panics so one bad delivery cannot kill the
                // worker for every later one.
                let _ = catch_unwind(AssertUnwindSafe(task));
            }
        })?;

        Ok(Arc::new(Self {
            sender: Mutex::new(Some(sender)),
            worker: handle.thread().id(),
        }))
    }

    /// Stops accepting tasks; already-queued tasks still run.
    ///
    /// Idempotent. The worker thread exits once the queue drains.
    pub fn shutdown(&self) {
        lock(&self.sender).take();
    }
}

impl Scheduler for ThreadScheduler {
    fn post(&self, task: Task) {
        let guard = lock(&self.sender);
        match guard.as_ref() {
            Some(sender) => {
                if sender.send(task).is_err() {
                    tracing::warn!("scheduler worker is gone; dropping posted task");
                }
            }
            None => {
                tracing::warn!("scheduler is shut down; dropping posted task");
            }
        }
    }

    fn is_current(&self) -> bool {
        thread::current().id() == self.worker
    }
}

impl Drop for ThreadScheduler {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[test]
    fn test_tasks_run_on_the_worker_thread() {
        let scheduler = ThreadScheduler::spawn("test-worker").expect("spawn");

        let (tx, rx) = mpsc::channel();
        scheduler.post(Box::new(move || {
            let _ = tx.send(thread::current().id());
        }));

        let worker = rx
            .recv_timeout(Duration::from_secs(5))
            .expect("task never ran");
        assert_ne!(worker, thread::current().id());
    }

    #[test]
    fn test_is_current_only_on_the_worker_thread() {
        let scheduler = ThreadScheduler::spawn("affinity").expect("spawn");
        assert!(!scheduler.is_current());

        let (tx, rx) = mpsc::channel();
        let inner = Arc::clone(&scheduler);
        scheduler.post(Box::new(move || {
            let _ = tx.send(inner.is_current());
        }));

        assert!(rx
            .recv_timeout(Duration::from_secs(5))
            .expect("task never ran"));
    }

    #[test]
    fn test_tasks_run_in_posting_order() {
        let scheduler = ThreadScheduler::spawn("fifo").expect("spawn");

        let seen = Arc::new(Mutex::new(Vec::new()));
        let (tx, rx) = mpsc::channel();
        for index in 0..8 {
            let seen = Arc::clone(&seen);
            let tx = tx.clone();
            scheduler.post(Box::new(move || {
                lock(&seen).push(index);
                if index == 7 {
                    let _ = tx.send(());
                }
            }));
        }

        rx.recv_timeout(Duration::from_secs(5))
            .expect("tasks never drained");
        assert_eq!(*lock(&seen), (0..8).collect::<Vec<_>>());
    }

    #[test]
    fn test_panicking_task_does_not_kill_the_worker() {
        let scheduler = ThreadScheduler::spawn("panics").expect("spawn");

        scheduler.post(Box::new(|| panic!("task blew up")));

        let (tx, rx) = mpsc::channel();
        scheduler.post(Box::new(move || {
            let _ = tx.send(());
        }));

        rx.recv_timeout(Duration::from_secs(5))
            .expect("worker died after a task panic");
    }

    #[test]
    fn test_shutdown_drops_later_posts() {
        let scheduler = ThreadScheduler::spawn("shutdown").expect("spawn");
        let counter = Arc::new(AtomicUsize::new(0));

        scheduler.shutdown();
        scheduler.shutdown(); // idempotent

        let count = Arc::clone(&counter);
        scheduler.post(Box::new(move || {
            count.fetch_add(1, Ordering::SeqCst);
        }));

        thread::sleep(Duration::from_millis(50));
        assert_eq!(counter.load(Ordering::SeqCst), 0);
    }
}
