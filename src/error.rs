//! Error types used by the messenger runtime.
//!
//! This module defines three error enums:
//!
//! - [`CheckError`] — violations of usage rules (bad names, disposed
//!   subscriptions, scheduler affinity, directory lookups).
//! - [`PublishError`] — errors surfaced by a publish call, including the
//!   aggregate of all subscriber failures collected during one fan-out.
//! - [`WaitError`] — the distinct cancellation signal of
//!   [`wait_for_message`](crate::Messenger::wait_for_message).
//!
//! All types provide `as_label()` for stable snake_case identifiers in
//! logs and assertions.

use thiserror::Error;

/// # Usage-rule violations detected by the messenger.
///
/// These abort the offending call before any subscriber runs.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum CheckError {
    /// The messenger is already registered in a directory.
    #[error("this messenger is already connected as '{current}'")]
    AlreadyConnected {
        /// Name under which the messenger is currently registered.
        current: String,
    },

    /// Another messenger already owns the requested name.
    #[error("the name '{name}' is already in use by another messenger")]
    NameTaken {
        /// The contested name.
        name: String,
    },

    /// A messenger name must be non-empty.
    #[error("messenger name must not be empty")]
    EmptyName,

    /// No messenger is registered under the given name.
    #[error("unable to find messenger '{name}'")]
    MessengerNotFound {
        /// The name that was looked up.
        name: String,
    },

    /// An identity accessor was called on a disposed subscription.
    #[error("subscription is disposed")]
    SubscriptionDisposed,

    /// The subscription was created by a different messenger.
    #[error("subscription belongs to another messenger")]
    ForeignSubscription,

    /// A synchronous publish ran on a thread outside the host scheduler
    /// while strict checking is enabled.
    #[error("synchronous publish from a thread that does not belong to the host scheduler")]
    SchedulerMismatch,

    /// The host scheduler dropped a posted publish without running it.
    #[error("host scheduler stopped before the posted publish ran")]
    SchedulerStopped,
}

impl CheckError {
    /// Returns a short stable label (snake_case) for use in logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            CheckError::AlreadyConnected { .. } => "already_connected",
            CheckError::NameTaken { .. } => "name_taken",
            CheckError::EmptyName => "empty_name",
            CheckError::MessengerNotFound { .. } => "messenger_not_found",
            CheckError::SubscriptionDisposed => "subscription_disposed",
            CheckError::ForeignSubscription => "foreign_subscription",
            CheckError::SchedulerMismatch => "scheduler_mismatch",
            CheckError::SchedulerStopped => "scheduler_stopped",
        }
    }
}

/// One failed subscriber invocation collected during a fan-out.
#[derive(Debug, Clone)]
pub struct DeliveryFailure {
    /// Type name of the registered callable or handler that failed.
    pub subscriber: String,
    /// Panic payload text of the failure.
    pub reason: String,
}

impl std::fmt::Display for DeliveryFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.subscriber, self.reason)
    }
}

/// # Errors surfaced by a publish call.
///
/// Check and source-restriction errors abort the publish before any
/// subscriber runs; [`PublishError::Delivery`] is raised once, after the
/// whole local fan-out completed, and carries every individual failure.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum PublishError {
    /// A usage-rule violation aborted the publish.
    #[error(transparent)]
    Check(#[from] CheckError),

    /// The message type restricts which messengers may originate it, and
    /// this messenger is not on the list.
    #[error(
        "message type {message_type} may only be published by [{}]; this messenger is '{messenger}'",
        allowed.join(", ")
    )]
    SourceNotAllowed {
        /// Type name of the message.
        message_type: &'static str,
        /// Messenger names permitted to originate the message.
        allowed: &'static [&'static str],
        /// Name of the publishing messenger, or `(unconnected)`.
        messenger: String,
    },

    /// One or more subscribers failed while handling the message.
    #[error(
        "{} subscriber(s) failed while handling message type {message_type}",
        failures.len()
    )]
    Delivery {
        /// Type name of the message.
        message_type: &'static str,
        /// Every individual subscriber failure, in invocation order.
        failures: Vec<DeliveryFailure>,
    },
}

impl PublishError {
    /// Returns a short stable label (snake_case) for use in logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            PublishError::Check(check) => check.as_label(),
            PublishError::SourceNotAllowed { .. } => "source_not_allowed",
            PublishError::Delivery { .. } => "delivery_failed",
        }
    }
}

/// # Outcome of a wait that did not produce a message.
///
/// Kept separate from [`PublishError`] so that cancellation can never be
/// mistaken for a delivery failure.
#[non_exhaustive]
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitError {
    /// The cancellation token fired before a matching message arrived.
    #[error("wait for message was cancelled before a matching message arrived")]
    Cancelled,
}

impl WaitError {
    /// Returns a short stable label (snake_case) for use in logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            WaitError::Cancelled => "wait_cancelled",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_error_labels_are_stable() {
        assert_eq!(
            CheckError::NameTaken {
                name: "ui".to_string()
            }
            .as_label(),
            "name_taken"
        );
        assert_eq!(
            CheckError::SubscriptionDisposed.as_label(),
            "subscription_disposed"
        );
        assert_eq!(CheckError::SchedulerMismatch.as_label(), "scheduler_mismatch");
    }

    #[test]
    fn test_publish_error_label_passes_through_check() {
        let error = PublishError::from(CheckError::EmptyName);
        assert_eq!(error.as_label(), "empty_name");
    }

    #[test]
    fn test_source_not_allowed_names_every_source() {
        let error = PublishError::SourceNotAllowed {
            message_type: "demo::Ping",
            allowed: &["ui", "worker"],
            messenger: "(unconnected)".to_string(),
        };
        let text = error.to_string();
        assert!(text.contains("ui, worker"), "unexpected display: {text}");
        assert!(text.contains("(unconnected)"), "unexpected display: {text}");
    }

    #[test]
    fn test_delivery_error_reports_failure_count() {
        let error = PublishError::Delivery {
            message_type: "demo::Ping",
            failures: vec![
                DeliveryFailure {
                    subscriber: "a".to_string(),
                    reason: "boom".to_string(),
                },
                DeliveryFailure {
                    subscriber: "b".to_string(),
                    reason: "bang".to_string(),
                },
            ],
        };
        assert!(error.to_string().starts_with("2 subscriber(s) failed"));
        assert_eq!(error.as_label(), "delivery_failed");
    }

    #[test]
    fn test_wait_error_is_distinct_from_delivery() {
        assert_eq!(WaitError::Cancelled.as_label(), "wait_cancelled");
    }
}
