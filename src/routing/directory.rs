//! # Messenger directory.
//!
//! A process typically shares one directory between all messengers that
//! route to each other, but nothing is global: separate directories are
//! fully isolated, which keeps tests and independent subsystems from
//! seeing each other's buses.
//!
//! ## Rules
//! - A name maps to at most one messenger; registration is first-wins.
//! - The directory holds messengers strongly; messengers hold the
//!   directory weakly. Dropping a directory silently turns routing off
//!   for the buses that were connected to it.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::error::CheckError;
use crate::messaging::{Messenger, MessengerCore};
use crate::utils::lock;

/// Shared name → messenger table.
#[derive(Default)]
pub(crate) struct DirectoryInner {
    messengers: Mutex<HashMap<String, Arc<MessengerCore>>>,
}

impl DirectoryInner {
    /// Claims `name` for `core`; first registration wins.
    pub(crate) fn register(&self, name: &str, core: Arc<MessengerCore>) -> Result<(), CheckError> {
        match lock(&self.messengers).entry(name.to_string()) {
            Entry::Occupied(_) => Err(CheckError::NameTaken {
                name: name.to_string(),
            }),
            Entry::Vacant(slot) => {
                slot.insert(core);
                Ok(())
            }
        }
    }

    /// Releases `name`, but only if it still belongs to `core`.
    pub(crate) fn unregister(&self, name: &str, core: &Arc<MessengerCore>) {
        let mut messengers = lock(&self.messengers);
        if messengers
            .get(name)
            .is_some_and(|registered| Arc::ptr_eq(registered, core))
        {
            messengers.remove(name);
        }
    }

    pub(crate) fn core_by_name(&self, name: &str) -> Option<Arc<MessengerCore>> {
        lock(&self.messengers).get(name).cloned()
    }
}

/// Name → messenger table enabling routing between independently
/// constructed buses. Cheap to clone; clones share the table.
#[derive(Clone, Default)]
pub struct MessengerDirectory {
    inner: Arc<DirectoryInner>,
}

impl MessengerDirectory {
    /// Creates an empty directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// The messenger registered under `name`.
    ///
    /// Fails with [`CheckError::MessengerNotFound`] when the name is free;
    /// use [`try_get`](MessengerDirectory::try_get) for an optional lookup.
    pub fn get(&self, name: &str) -> Result<Messenger, CheckError> {
        if name.is_empty() {
            return Err(CheckError::EmptyName);
        }
        self.try_get(name).ok_or_else(|| CheckError::MessengerNotFound {
            name: name.to_string(),
        })
    }

    /// The messenger registered under `name`, if any.
    pub fn try_get(&self, name: &str) -> Option<Messenger> {
        self.inner
            .core_by_name(name)
            .map(|core| Messenger { core })
    }

    /// Number of registered messengers.
    pub fn len(&self) -> usize {
        lock(&self.inner.messengers).len()
    }

    /// Whether no messenger is registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Disconnects every registered messenger.
    pub fn disconnect_all(&self) {
        let cores: Vec<Arc<MessengerCore>> =
            lock(&self.inner.messengers).values().cloned().collect();
        for core in cores {
            Messenger { core }.disconnect();
        }
    }

    pub(crate) fn inner(&self) -> &Arc<DirectoryInner> {
        &self.inner
    }
}

impl std::fmt::Debug for MessengerDirectory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<String> = lock(&self.inner.messengers).keys().cloned().collect();
        f.debug_struct("MessengerDirectory")
            .field("messengers", &names)
            .finish()
    }
}
