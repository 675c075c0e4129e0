//! # Subscription handle and lifecycle.
//!
//! A subscription is created only by a messenger's subscribe operations and
//! destroyed only through [`unsubscribe`](Subscription::unsubscribe) (or its
//! [`dispose`](Subscription::dispose) alias). Disposal is one-way and
//! idempotent: the first call removes the registration from the owning
//! messenger and releases the target; later calls are no-ops.
//!
//! ## Rules
//! - A disposed subscription never appears in a registry list.
//! - Identity accessors fail with
//!   [`CheckError::SubscriptionDisposed`] after disposal.
//! - A weak subscription whose target was dropped behaves as disposed on
//!   the next delivery attempt: it silently removes itself and never fires.

use std::any::{Any, TypeId};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, Mutex, Weak};

use crate::error::{CheckError, DeliveryFailure};
use crate::messaging::{Messenger, MessengerCore};
use crate::subscriptions::target::Resolution;
use crate::subscriptions::Target;
use crate::utils::{lock, panic_message};

/// Shared state behind every [`Subscription`] handle.
pub(crate) struct SubscriptionInner {
    /// Back-reference to the owning messenger. Weak: the registry owns
    /// subscriptions, so a strong reference here would form a cycle.
    messenger: Weak<MessengerCore>,
    pub(crate) message_type: TypeId,
    message_type_name: &'static str,
    target_name: &'static str,
    /// `None` once disposed.
    target: Mutex<Option<Target>>,
}

impl SubscriptionInner {
    pub(crate) fn new(
        messenger: Weak<MessengerCore>,
        message_type: TypeId,
        message_type_name: &'static str,
        target_name: &'static str,
        target: Target,
    ) -> Self {
        Self {
            messenger,
            message_type,
            message_type_name,
            target_name,
            target: Mutex::new(Some(target)),
        }
    }

    pub(crate) fn is_disposed(&self) -> bool {
        lock(&self.target).is_none()
    }

    pub(crate) fn owner(&self) -> Option<Arc<MessengerCore>> {
        self.messenger.upgrade()
    }

    /// Disposes this subscription: releases the target and removes the
    /// registration from the owning messenger. Idempotent — only the call
    /// that actually takes the target performs the removal.
    pub(crate) fn dispose(self: &Arc<Self>) {
        let was_active = lock(&self.target).take().is_some();
        if !was_active {
            return;
        }
        if let Some(core) = self.messenger.upgrade() {
            core.registry.remove(self);
        }
    }

    /// Delivers one message to the target.
    ///
    /// Runs outside every lock held by the dispatch engine, so the handler
    /// may freely re-enter the messenger (subscribe, publish, unsubscribe
    /// itself). A panic in the handler is caught and reported to the
    /// caller for aggregation; it never aborts the surrounding fan-out.
    pub(crate) fn deliver(self: &Arc<Self>, message: &dyn Any) -> Result<(), DeliveryFailure> {
        let resolution = {
            let guard = lock(&self.target);
            match guard.as_ref() {
                // Disposed between snapshot and invocation: skip silently.
                None => return Ok(()),
                Some(target) => target.resolve(),
            }
        };

        match resolution {
            Resolution::Live(object, invoke) => {
                catch_unwind(AssertUnwindSafe(|| invoke(object.as_ref(), message))).map_err(
                    |payload| DeliveryFailure {
                        subscriber: self.target_name.to_string(),
                        reason: panic_message(payload),
                    },
                )
            }
            Resolution::Gone => {
                tracing::trace!(
                    message_type = self.message_type_name,
                    "weak subscription target dropped; pruning"
                );
                self.dispose();
                Ok(())
            }
        }
    }
}

/// Handle to one handler registration on one messenger.
///
/// Cloning the handle shares the registration; it does not duplicate it.
/// Dropping all handles does *not* unsubscribe — ownership is shared with
/// the messenger's registry, and only an explicit
/// [`unsubscribe`](Subscription::unsubscribe) (from either side) ends the
/// registration.
#[derive(Clone)]
pub struct Subscription {
    pub(crate) inner: Arc<SubscriptionInner>,
}

impl Subscription {
    /// Whether this subscription has been disposed.
    pub fn is_disposed(&self) -> bool {
        self.inner.is_disposed()
    }

    /// The exact message type this subscription listens for.
    pub fn message_type(&self) -> Result<TypeId, CheckError> {
        self.ensure_active()?;
        Ok(self.inner.message_type)
    }

    /// Type name of the message this subscription listens for.
    pub fn message_type_name(&self) -> Result<&'static str, CheckError> {
        self.ensure_active()?;
        Ok(self.inner.message_type_name)
    }

    /// Type name of the registered callable or handler.
    pub fn target_name(&self) -> Result<&'static str, CheckError> {
        self.ensure_active()?;
        Ok(self.inner.target_name)
    }

    /// The registered handler object.
    ///
    /// For a weak subscription this fails once the target has been
    /// dropped, exactly as after disposal.
    pub fn target_object(&self) -> Result<Arc<dyn Any + Send + Sync>, CheckError> {
        lock(&self.inner.target)
            .as_ref()
            .and_then(Target::object)
            .ok_or(CheckError::SubscriptionDisposed)
    }

    /// The messenger that created this subscription.
    pub fn messenger(&self) -> Result<Messenger, CheckError> {
        self.ensure_active()?;
        self.inner
            .owner()
            .map(|core| Messenger { core })
            .ok_or(CheckError::SubscriptionDisposed)
    }

    /// Ends this registration. Idempotent; never an error.
    pub fn unsubscribe(&self) {
        self.inner.dispose();
    }

    /// Alias for [`unsubscribe`](Subscription::unsubscribe).
    pub fn dispose(&self) {
        self.unsubscribe();
    }

    fn ensure_active(&self) -> Result<(), CheckError> {
        if self.is_disposed() {
            return Err(CheckError::SubscriptionDisposed);
        }
        Ok(())
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("message_type", &self.inner.message_type_name)
            .field("target", &self.inner.target_name)
            .field("disposed", &self.is_disposed())
            .finish()
    }
}
