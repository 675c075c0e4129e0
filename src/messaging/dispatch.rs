//! # Publish engine.
//!
//! One publish call moves through a fixed pipeline:
//!
//! ```text
//! publish(message)
//!     │
//!     ├─ 1. scheduler gate        (strict mode: right thread?)
//!     ├─ 2. source restriction    (initial call only)
//!     ├─ 3. snapshot + fan-out    (copy list under lock, invoke outside it,
//!     │                            collect per-subscriber failures)
//!     ├─ 4. async routing         (initial call only: repost to each
//!     │                            configured target messenger)
//!     ├─ 5. aggregate             (initial call only: one Delivery error
//!     │                            carrying every failure)
//!     └─ 6. global hook           (may suppress the error)
//! ```
//!
//! ## Rules
//! - A failing subscriber never aborts the fan-out; its failure is
//!   collected and raised once, after every subscriber ran.
//! - Routed deliveries are recursive non-initial publishes: they skip the
//!   source check and routing steps, and their aggregate errors stay at
//!   the remote messenger (logged, never propagated back).
//! - Every error is offered to the global hook before propagating.

use std::any::{type_name, TypeId};
use std::sync::Arc;

use crate::error::PublishError;
use crate::messages::BusMessage;
use crate::messaging::{hook, Messenger, MessengerCore, ThreadingBehavior};
use crate::scheduling::post_to;

/// Runs one publish call against `core`, offering any error to the global
/// hook before returning it.
pub(crate) fn publish_message<M: BusMessage>(
    core: &Arc<MessengerCore>,
    message: &M,
    initial_call: bool,
) -> Result<(), PublishError> {
    match run_publish(core, message, initial_call) {
        Ok(()) => Ok(()),
        Err(error) => {
            let messenger = Messenger {
                core: Arc::clone(core),
            };
            if hook::offer(&messenger, &error) {
                Ok(())
            } else {
                Err(error)
            }
        }
    }
}

fn run_publish<M: BusMessage>(
    core: &Arc<MessengerCore>,
    message: &M,
    initial_call: bool,
) -> Result<(), PublishError> {
    // Scheduler gate. An unconfigured host scheduler means the messenger
    // has no thread affinity to enforce.
    if core.threading_behavior() == ThreadingBehavior::EnsureHostScheduler {
        if let Some(scheduler) = core.host_scheduler() {
            if !scheduler.is_current() {
                return Err(crate::error::CheckError::SchedulerMismatch.into());
            }
        }
    }

    // Source restriction applies only where the message enters the system,
    // not to routed re-publishes at their targets.
    if initial_call {
        let allowed = M::allowed_sources();
        if !allowed.is_empty() {
            let name = core.name();
            let permitted = name
                .as_deref()
                .is_some_and(|name| allowed.iter().any(|allowed_name| *allowed_name == name));
            if !permitted {
                return Err(PublishError::SourceNotAllowed {
                    message_type: type_name::<M>(),
                    allowed,
                    messenger: name.unwrap_or_else(|| "(unconnected)".to_string()),
                });
            }
        }
    }

    // Local fan-out over a snapshot, in subscription order.
    let snapshot = core.registry.snapshot(TypeId::of::<M>());
    let mut failures = Vec::new();
    for subscription in &snapshot {
        if let Err(failure) = subscription.deliver(message) {
            failures.push(failure);
        }
    }

    if initial_call {
        route_to_targets(core, message);
    }

    if !failures.is_empty() {
        if initial_call {
            return Err(PublishError::Delivery {
                message_type: type_name::<M>(),
                failures,
            });
        }
        // Routed delivery: failures stay at this messenger.
        tracing::warn!(
            message_type = type_name::<M>(),
            failed = failures.len(),
            "subscriber failures in routed delivery dropped"
        );
    }

    Ok(())
}

/// Reposts `message` to every configured routing target other than this
/// messenger itself. Each repost is a non-initial publish on the target's
/// host scheduler (or the background executor when it captured none); its
/// outcome is invisible to the originating publisher.
fn route_to_targets<M: BusMessage>(core: &Arc<MessengerCore>, message: &M) {
    let targets = M::routing_targets();
    if targets.is_empty() {
        return;
    }
    let Some(directory) = core.directory() else {
        return;
    };

    let own_name = core.name();
    for target_name in targets {
        if own_name.as_deref() == Some(*target_name) {
            continue;
        }
        let Some(target) = directory.core_by_name(target_name) else {
            tracing::debug!(
                route_target = target_name,
                "routing target not registered; skipping"
            );
            continue;
        };

        let scheduler = target.host_scheduler();
        let message = message.clone();
        post_to(scheduler.as_ref(), move || {
            let _ = publish_message(&target, &message, false);
        });
    }
}
