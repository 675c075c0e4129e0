//! # Bulk registration of handler objects.
//!
//! A type that handles several message types implements [`Receive`] once
//! per type and enumerates them in [`ReceiverSet::enumerate`]; the
//! messenger's `subscribe_all` / `subscribe_all_weak` then register one
//! subscription per listed type in a single call.
//!
//! ## Example
//! ```rust
//! use msgbus::{BusMessage, Messenger, Receive, ReceiverSet, Registrar, UnsubscribeAll};
//! use std::sync::Arc;
//!
//! #[derive(Clone)]
//! struct Started;
//! impl BusMessage for Started {}
//!
//! #[derive(Clone)]
//! struct Stopped;
//! impl BusMessage for Stopped {}
//!
//! struct Audit;
//!
//! impl Receive<Started> for Audit {
//!     fn on_message(&self, _message: &Started) {}
//! }
//!
//! impl Receive<Stopped> for Audit {
//!     fn on_message(&self, _message: &Stopped) {}
//! }
//!
//! impl ReceiverSet for Audit {
//!     fn enumerate(registrar: &mut Registrar<'_, Self>) {
//!         registrar.handle::<Started>();
//!         registrar.handle::<Stopped>();
//!     }
//! }
//!
//! let messenger = Messenger::new();
//! let audit = Arc::new(Audit);
//! let subscriptions = messenger.subscribe_all(&audit);
//! assert_eq!(subscriptions.len(), 2);
//! subscriptions.unsubscribe_all();
//! ```

use std::sync::Arc;

use crate::messages::BusMessage;
use crate::messaging::Messenger;
use crate::receivers::Receive;
use crate::subscriptions::Subscription;

/// Enumerates the message types a handler object wants registered.
pub trait ReceiverSet: Send + Sync + Sized + 'static {
    /// Calls [`Registrar::handle`] once per handled message type.
    fn enumerate(registrar: &mut Registrar<'_, Self>);
}

/// Collects the registrations of one `subscribe_all` call.
pub struct Registrar<'a, T> {
    messenger: &'a Messenger,
    target: &'a Arc<T>,
    weak: bool,
    subscriptions: Vec<Subscription>,
}

impl<T: ReceiverSet> Registrar<'_, T> {
    /// Registers the target for message type `M`.
    pub fn handle<M>(&mut self)
    where
        M: BusMessage,
        T: Receive<M>,
    {
        let subscription = if self.weak {
            self.messenger.subscribe_receiver_weak::<M, T>(self.target)
        } else {
            self.messenger
                .subscribe_receiver::<M, T>(Arc::clone(self.target))
        };
        self.subscriptions.push(subscription);
    }
}

impl Messenger {
    /// Registers every message type `target` enumerates, keeping `target`
    /// alive through the returned subscriptions.
    pub fn subscribe_all<T: ReceiverSet>(&self, target: &Arc<T>) -> Vec<Subscription> {
        self.subscribe_all_with(target, false)
    }

    /// Registers every message type `target` enumerates without keeping
    /// `target` alive; each subscription prunes itself once the target is
    /// dropped.
    pub fn subscribe_all_weak<T: ReceiverSet>(&self, target: &Arc<T>) -> Vec<Subscription> {
        self.subscribe_all_with(target, true)
    }

    fn subscribe_all_with<T: ReceiverSet>(&self, target: &Arc<T>, weak: bool) -> Vec<Subscription> {
        let mut registrar = Registrar {
            messenger: self,
            target,
            weak,
            subscriptions: Vec::new(),
        };
        T::enumerate(&mut registrar);
        registrar.subscriptions
    }
}

/// Unsubscribes a whole collection of subscriptions.
pub trait UnsubscribeAll {
    /// Unsubscribes every contained subscription.
    fn unsubscribe_all(self);
}

impl<I> UnsubscribeAll for I
where
    I: IntoIterator<Item = Subscription>,
{
    fn unsubscribe_all(self) {
        for subscription in self {
            subscription.unsubscribe();
        }
    }
}
