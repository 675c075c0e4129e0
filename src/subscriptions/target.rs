//! Invocation targets: the two ownership forms of a subscription.
//!
//! A target pairs a type-erased handler object with an invoke thunk that
//! downcasts object and message back to their concrete types. The strong
//! form keeps the object alive; the weak form holds a non-owning reference
//! and reports the object gone once the last outside `Arc` is dropped.

use std::any::Any;
use std::sync::{Arc, Weak};

use crate::messages::BusMessage;
use crate::receivers::Receive;

/// Type-erased handler object.
pub(crate) type AnyTarget = dyn Any + Send + Sync;

/// Downcasts the target object and the message, then invokes the handler.
/// The downcasts cannot fail for a thunk built by this module; a mismatch
/// is silently skipped rather than turned into a panic inside dispatch.
pub(crate) type InvokeFn = dyn Fn(&AnyTarget, &dyn Any) + Send + Sync;

/// One invocation target in either ownership form.
pub(crate) enum Target {
    /// Keeps the handler object alive for the subscription's lifetime.
    Strong {
        object: Arc<AnyTarget>,
        invoke: Arc<InvokeFn>,
    },
    /// Does not keep the handler object alive; delivery checks liveness.
    Weak {
        object: Weak<AnyTarget>,
        invoke: Arc<InvokeFn>,
    },
}

/// What a delivery attempt found behind the target.
pub(crate) enum Resolution {
    /// Invoke with this object.
    Live(Arc<AnyTarget>, Arc<InvokeFn>),
    /// Weak target has been dropped; the subscription should self-dispose.
    Gone,
}

impl Target {
    /// Strong form around a plain callable.
    pub(crate) fn strong<M, F>(action: F) -> Self
    where
        M: BusMessage,
        F: Fn(&M) + Send + Sync + 'static,
    {
        let object: Arc<AnyTarget> = Arc::new(action);
        let invoke: Arc<InvokeFn> = Arc::new(|object, message| {
            let (Some(action), Some(message)) =
                (object.downcast_ref::<F>(), message.downcast_ref::<M>())
            else {
                return;
            };
            action(message);
        });
        Target::Strong { object, invoke }
    }

    /// Weak form around a target object plus an explicitly supplied method.
    pub(crate) fn weak<M, T, F>(target: &Arc<T>, action: F) -> Self
    where
        M: BusMessage,
        T: Send + Sync + 'static,
        F: Fn(&T, &M) + Send + Sync + 'static,
    {
        let erased: Arc<AnyTarget> = Arc::clone(target) as Arc<AnyTarget>;
        let invoke: Arc<InvokeFn> = Arc::new(move |object, message| {
            let (Some(target), Some(message)) =
                (object.downcast_ref::<T>(), message.downcast_ref::<M>())
            else {
                return;
            };
            action(target, message);
        });
        Target::Weak {
            object: Arc::downgrade(&erased),
            invoke,
        }
    }

    /// Strong form around a [`Receive`] handler object.
    pub(crate) fn strong_receiver<M, T>(receiver: Arc<T>) -> Self
    where
        M: BusMessage,
        T: Receive<M>,
    {
        let object: Arc<AnyTarget> = receiver as Arc<AnyTarget>;
        let invoke: Arc<InvokeFn> = Arc::new(|object, message| {
            let (Some(receiver), Some(message)) =
                (object.downcast_ref::<T>(), message.downcast_ref::<M>())
            else {
                return;
            };
            receiver.on_message(message);
        });
        Target::Strong { object, invoke }
    }

    /// Weak form around a [`Receive`] handler object.
    pub(crate) fn weak_receiver<M, T>(receiver: &Arc<T>) -> Self
    where
        M: BusMessage,
        T: Receive<M>,
    {
        let erased: Arc<AnyTarget> = Arc::clone(receiver) as Arc<AnyTarget>;
        let invoke: Arc<InvokeFn> = Arc::new(|object, message| {
            let (Some(receiver), Some(message)) =
                (object.downcast_ref::<T>(), message.downcast_ref::<M>())
            else {
                return;
            };
            receiver.on_message(message);
        });
        Target::Weak {
            object: Arc::downgrade(&erased),
            invoke,
        }
    }

    /// Resolves the target for one delivery.
    pub(crate) fn resolve(&self) -> Resolution {
        match self {
            Target::Strong { object, invoke } => {
                Resolution::Live(Arc::clone(object), Arc::clone(invoke))
            }
            Target::Weak { object, invoke } => match object.upgrade() {
                Some(object) => Resolution::Live(object, Arc::clone(invoke)),
                None => Resolution::Gone,
            },
        }
    }

    /// The target object, if it is still alive.
    pub(crate) fn object(&self) -> Option<Arc<AnyTarget>> {
        match self {
            Target::Strong { object, .. } => Some(Arc::clone(object)),
            Target::Weak { object, .. } => object.upgrade(),
        }
    }
}
