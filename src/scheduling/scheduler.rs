//! # Scheduler trait and default background executor.
//!
//! [`Scheduler`] is the explicit stand-in for a captured execution context
//! (a UI thread dispatcher, an event loop, a test executor): a messenger
//! connected with one runs its asynchronous publishes and incoming routed
//! deliveries through `post`. "No scheduler" maps to a default background
//! executor rather than to "no delivery".

use std::sync::Arc;

/// A unit of work handed to a scheduler.
pub type Task = Box<dyn FnOnce() + Send + 'static>;

/// An execution context that runs posted tasks.
///
/// Implementations decide where and when tasks run; the messenger only
/// requires that posted tasks eventually execute (or are dropped on
/// shutdown — a dropped task is a lost fire-and-forget delivery, which the
/// bus permits).
pub trait Scheduler: Send + Sync + 'static {
    /// Queues `task` for execution on this scheduler.
    fn post(&self, task: Task);

    /// Whether the calling thread is one this scheduler executes tasks on.
    ///
    /// Consulted by the synchronous-publish gate when a messenger is
    /// connected with
    /// [`ThreadingBehavior::EnsureHostScheduler`](crate::ThreadingBehavior).
    /// The default claims no affinity, which makes every strictly-checked
    /// synchronous publish fail — override it for schedulers with a real
    /// notion of "their" thread.
    fn is_current(&self) -> bool {
        false
    }
}

/// Posts `task` to `scheduler`, or to the default background executor when
/// no scheduler is configured.
pub(crate) fn post_to(scheduler: Option<&Arc<dyn Scheduler>>, task: impl FnOnce() + Send + 'static) {
    match scheduler {
        Some(scheduler) => scheduler.post(Box::new(task)),
        None => post_background(Box::new(task)),
    }
}

/// Default background executor: the current tokio runtime when inside one,
/// a dedicated thread otherwise.
fn post_background(task: Task) {
    match tokio::runtime::Handle::try_current() {
        Ok(handle) => {
            handle.spawn(async move { task() });
        }
        Err(_) => {
            std::thread::spawn(move || task());
        }
    }
}
