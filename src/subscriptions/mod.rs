//! Subscription lifecycle: registration, delivery, disposal.
//!
//! A [`Subscription`] records one handler registration for one message type
//! on one messenger. The messenger's registry and the handle returned to
//! the caller share ownership; whichever side disposes first ends the
//! registration for both.
//!
//! ## Contents
//! - [`Subscription`] public handle with identity accessors
//! - target forms (strong vs. weak) and the type-erased invoke thunk
//!   (internal)

mod subscription;
mod target;

pub use subscription::Subscription;

pub(crate) use subscription::SubscriptionInner;
pub(crate) use target::Target;
