//! # Named message source.
//!
//! [`MessageSource`] publishes one message type to a messenger that is
//! resolved by name in a [`MessengerDirectory`](crate::MessengerDirectory)
//! at each publish call — nothing is captured at construction time, so the
//! target messenger may connect, disconnect, or be replaced between calls.
//!
//! For unit tests of publishing components, the directory lookup can be
//! bypassed entirely with [`MessageSource::replace_target_for_testing`].

use std::sync::{Arc, Mutex};

use crate::error::{CheckError, PublishError};
use crate::messages::BusMessage;
use crate::routing::MessengerDirectory;
use crate::utils::lock;

type CustomTarget<M> = Arc<dyn Fn(&M) + Send + Sync>;

/// Publishes messages of type `M` to a messenger looked up by name.
pub struct MessageSource<M: BusMessage> {
    directory: MessengerDirectory,
    messenger_name: String,
    custom_target: Mutex<Option<CustomTarget<M>>>,
}

impl<M: BusMessage> MessageSource<M> {
    /// Creates a source that resolves `messenger_name` in `directory` at
    /// each publish call.
    pub fn new(directory: &MessengerDirectory, messenger_name: impl Into<String>) -> Self {
        Self {
            directory: directory.clone(),
            messenger_name: messenger_name.into(),
            custom_target: Mutex::new(None),
        }
    }

    /// Name of the messenger this source publishes through.
    pub fn messenger_name(&self) -> &str {
        &self.messenger_name
    }

    /// Replaces the directory lookup with a custom handler.
    ///
    /// Intended for unit tests of components that publish through this
    /// source: the handler observes every message and no messenger needs to
    /// be connected.
    pub fn replace_target_for_testing(&self, target: impl Fn(&M) + Send + Sync + 'static) {
        *lock(&self.custom_target) = Some(Arc::new(target));
    }

    /// Publishes `message` synchronously through the named messenger.
    pub fn publish(&self, message: M) -> Result<(), PublishError> {
        if let Some(target) = lock(&self.custom_target).clone() {
            target(&message);
            return Ok(());
        }

        self.directory.get(&self.messenger_name)?.publish(message)
    }

    /// Publishes `message` asynchronously through the named messenger.
    ///
    /// Resolution failures are reported; delivery failures are not (see
    /// [`Messenger::begin_publish`](crate::Messenger::begin_publish)).
    pub fn begin_publish(&self, message: M) -> Result<(), CheckError> {
        if let Some(target) = lock(&self.custom_target).clone() {
            target(&message);
            return Ok(());
        }

        self.directory
            .get(&self.messenger_name)?
            .begin_publish(message);
        Ok(())
    }
}
