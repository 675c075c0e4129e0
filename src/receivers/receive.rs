//! # Message handler trait.
//!
//! [`Receive`] is the handler-object counterpart of a subscribed closure:
//! one implementation per message type the object handles.
//!
//! ## Example
//! ```rust
//! use msgbus::{BusMessage, Messenger, Receive};
//! use std::sync::Arc;
//!
//! #[derive(Clone)]
//! struct JobFinished {
//!     id: u64,
//! }
//!
//! impl BusMessage for JobFinished {}
//!
//! struct Dashboard;
//!
//! impl Receive<JobFinished> for Dashboard {
//!     fn on_message(&self, message: &JobFinished) {
//!         println!("job {} finished", message.id);
//!     }
//! }
//!
//! let messenger = Messenger::new();
//! let dashboard = Arc::new(Dashboard);
//! let subscription = messenger.subscribe_receiver::<JobFinished, _>(dashboard);
//! # subscription.unsubscribe();
//! ```

use crate::messages::BusMessage;

/// Handles messages of one type.
///
/// Called synchronously on whichever thread the dispatch runs on (the
/// publisher's thread for synchronous publishes, the host scheduler's for
/// posted ones). Implementations should not block for long and must not
/// assume a particular thread unless the owning messenger enforces one.
pub trait Receive<M: BusMessage>: Send + Sync + 'static {
    /// Handles a single message.
    fn on_message(&self, message: &M);
}
