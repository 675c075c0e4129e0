//! # Marker trait for publishable message types.
//!
//! A type becomes a valid message by implementing [`BusMessage`]. The trait
//! bound on every subscribe/publish operation is the eligibility check: a
//! type that does not opt in is rejected by the compiler, not at runtime.
//!
//! Routing metadata is declared on the type itself by overriding the
//! provided methods — the Rust rendition of declarative per-type tags:
//!
//! ```rust
//! use msgbus::BusMessage;
//!
//! #[derive(Clone)]
//! struct FrameRendered {
//!     frame: u64,
//! }
//!
//! impl BusMessage for FrameRendered {
//!     // After local fan-out, forward asynchronously to the "ui" messenger.
//!     fn routing_targets() -> &'static [&'static str] {
//!         &["ui"]
//!     }
//!
//!     // Only the "render" messenger may originate this message.
//!     fn allowed_sources() -> &'static [&'static str] {
//!         &["render"]
//!     }
//! }
//! # let _ = FrameRendered { frame: 1 };
//! ```

/// Marker for types that may be published and subscribed to.
///
/// Dispatch is by exact runtime type: a subscription for `M` sees exactly
/// publishes of `M`, never of related types. Messages are cloned when they
/// cross messenger boundaries (async routing, [`wait_for_message`] results),
/// so `Clone` should be cheap — wrap heavy payloads in an `Arc`.
///
/// Both metadata methods return `'static` data, which makes message-type
/// metadata immutable for the process lifetime by construction.
///
/// Types without the marker do not compile as messages:
///
/// ```compile_fail
/// use msgbus::Messenger;
///
/// #[derive(Clone)]
/// struct NotAMessage;
///
/// let messenger = Messenger::new();
/// let _ = messenger.publish(NotAMessage);
/// ```
///
/// [`wait_for_message`]: crate::Messenger::wait_for_message
pub trait BusMessage: Clone + Send + Sync + 'static {
    /// Names of messengers this message is asynchronously forwarded to
    /// after the local fan-out. Empty means no routing applies.
    fn routing_targets() -> &'static [&'static str] {
        &[]
    }

    /// Names of messengers allowed to originate this message.
    /// Empty means every messenger may publish it.
    fn allowed_sources() -> &'static [&'static str] {
        &[]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone)]
    struct Plain;

    impl BusMessage for Plain {}

    #[derive(Clone)]
    struct Tagged;

    impl BusMessage for Tagged {
        fn routing_targets() -> &'static [&'static str] {
            &["worker", "ui"]
        }

        fn allowed_sources() -> &'static [&'static str] {
            &["ui"]
        }
    }

    #[test]
    fn test_metadata_defaults_to_unrestricted() {
        assert!(Plain::routing_targets().is_empty());
        assert!(Plain::allowed_sources().is_empty());
    }

    #[test]
    fn test_metadata_overrides_are_visible() {
        assert_eq!(Tagged::routing_targets(), &["worker", "ui"]);
        assert_eq!(Tagged::allowed_sources(), &["ui"]);
    }
}
