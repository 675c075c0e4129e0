//! Cross-messenger routing: the named directory.
//!
//! Independently constructed messengers find each other through an
//! explicit [`MessengerDirectory`] — a name → messenger table shared by
//! every bus that wants to take part in routing. Connecting registers a
//! messenger under a unique name; the dispatch engine resolves a message
//! type's routing targets against the same table.

mod directory;

pub use directory::MessengerDirectory;

pub(crate) use directory::DirectoryInner;
