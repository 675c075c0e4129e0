//! # msgbus
//!
//! **msgbus** is an in-process publish/subscribe message bus for Rust.
//!
//! Components of one running process exchange typed messages through a
//! [`Messenger`] without holding references to each other. Delivery is
//! fire-and-forget: synchronous fan-out on the publishing thread, or
//! posted to a captured [`Scheduler`], with optional asynchronous routing
//! between named messengers.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!  publisher ──► Messenger "render" ──► local fan-out (subscription order)
//!                    │                     ├─► strong subscription ─► callable
//!                    │                     ├─► weak subscription ───► target (if alive)
//!                    │                     └─► failures collected ─► one aggregate error
//!                    │
//!                    │  message type declares routing_targets() = ["ui"]
//!                    ▼
//!            MessengerDirectory ──► Messenger "ui" ──► posted to its Scheduler
//!            (explicit, shared)                         (or background executor)
//! ```
//!
//! ### Subscription lifecycle
//! ```text
//! subscribe ──► active ──► unsubscribe / dispose ──► disposed (one-way)
//!                 │
//!                 └─ weak form: target dropped ──► pruned on next publish
//! ```
//!
//! ## Features
//! | Area              | Description                                                       | Key types / traits                        |
//! |-------------------|-------------------------------------------------------------------|-------------------------------------------|
//! | **Messages**      | Opt-in marker with per-type routing metadata.                     | [`BusMessage`]                            |
//! | **Subscribing**   | Strong/weak callables and handler objects, bulk registration.     | [`Subscription`], [`Receive`], [`ReceiverSet`] |
//! | **Publishing**    | Sync, posted, posted-with-completion, one-shot wait.              | [`Messenger`]                             |
//! | **Routing**       | Name-addressed forwarding between messengers.                     | [`MessengerDirectory`]                    |
//! | **Scheduling**    | Explicit execution contexts with thread affinity.                 | [`Scheduler`], [`ThreadScheduler`]        |
//! | **Errors**        | Typed check/publish/wait errors with stable labels.               | [`CheckError`], [`PublishError`], [`WaitError`] |
//!
//! ## Example
//! ```rust
//! use msgbus::{BusMessage, Messenger};
//!
//! #[derive(Clone, Debug, PartialEq)]
//! struct JobDone {
//!     id: u64,
//! }
//!
//! impl BusMessage for JobDone {}
//!
//! let messenger = Messenger::new();
//!
//! let subscription = messenger.subscribe(|message: &JobDone| {
//!     println!("job {} done", message.id);
//! });
//!
//! messenger.publish(JobDone { id: 7 })?;
//!
//! subscription.unsubscribe();
//! assert_eq!(messenger.count_subscriptions(), 0);
//! # Ok::<(), msgbus::PublishError>(())
//! ```

mod error;
mod messages;
mod messaging;
mod receivers;
mod routing;
mod scheduling;
mod subscriptions;
mod utils;

// ---- Public re-exports ----

pub use error::{CheckError, DeliveryFailure, PublishError, WaitError};
pub use messages::{BusMessage, MessageSource};
pub use messaging::{
    clear_publish_error_hook, set_publish_error_hook, Messenger, ThreadingBehavior,
};
pub use receivers::{Receive, ReceiverSet, Registrar, UnsubscribeAll};
pub use routing::MessengerDirectory;
pub use scheduling::{Scheduler, Task, ThreadScheduler};
pub use subscriptions::Subscription;
