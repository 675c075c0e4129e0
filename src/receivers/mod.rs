//! Handler objects and bulk registration.
//!
//! Instead of scanning objects for handler methods at runtime, a handler
//! type implements [`Receive<M>`] once per message type it handles and
//! lists those types in its [`ReceiverSet`] implementation. The
//! enumeration runs at compile time — a listed type the handler cannot
//! receive is a type error, not a silently skipped method.
//!
//! ## Contents
//! - [`Receive`] one-message-type handler trait
//! - [`ReceiverSet`] + [`Registrar`] explicit enumeration for
//!   [`subscribe_all`](crate::Messenger::subscribe_all)
//! - [`UnsubscribeAll`] convenience for subscription collections

mod receive;
mod registrar;

pub use receive::Receive;
pub use registrar::{Registrar, ReceiverSet, UnsubscribeAll};
