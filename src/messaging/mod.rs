//! Messenger runtime: registry, dispatch, and the public bus API.
//!
//! The only types most users need from this module are [`Messenger`] and
//! [`ThreadingBehavior`]; the dispatch pipeline and the subscription
//! registry are internal.
//!
//! Internal modules:
//! - [`messenger`]: the public `Messenger` handle and its operations;
//! - [`registry`]: type → subscription-list map behind the per-bus lock;
//! - [`dispatch`]: the publish pipeline (gate, source check, fan-out,
//!   routing, aggregation, hook);
//! - [`hook`]: the process-wide publish-error override.

mod dispatch;
mod hook;
mod messenger;
mod registry;

pub use hook::{clear_publish_error_hook, set_publish_error_hook};
pub use messenger::{Messenger, ThreadingBehavior};

pub(crate) use messenger::MessengerCore;
