//! Process-wide publish-error hook.
//!
//! Before a publish error propagates to the publisher, the dispatch engine
//! offers it to a single global hook. Returning `true` suppresses the
//! error; returning `false` — or panicking — lets it propagate. The hook
//! sees errors from every messenger in the process.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, PoisonError, RwLock};

use crate::error::PublishError;
use crate::messaging::Messenger;

type Hook = dyn Fn(&Messenger, &PublishError) -> bool + Send + Sync;

static PUBLISH_ERROR_HOOK: RwLock<Option<Arc<Hook>>> = RwLock::new(None);

/// Installs the process-wide publish-error hook, replacing any previous one.
///
/// The hook runs on whichever thread the failing publish ran on and must
/// not block for long. Return `true` to suppress the error.
pub fn set_publish_error_hook(hook: impl Fn(&Messenger, &PublishError) -> bool + Send + Sync + 'static) {
    *PUBLISH_ERROR_HOOK
        .write()
        .unwrap_or_else(PoisonError::into_inner) = Some(Arc::new(hook));
}

/// Removes the process-wide publish-error hook.
pub fn clear_publish_error_hook() {
    *PUBLISH_ERROR_HOOK
        .write()
        .unwrap_or_else(PoisonError::into_inner) = None;
}

/// Offers `error` to the hook; `true` means "suppress".
///
/// A panicking hook counts as "do not suppress".
pub(crate) fn offer(messenger: &Messenger, error: &PublishError) -> bool {
    let hook = PUBLISH_ERROR_HOOK
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .clone();
    let Some(hook) = hook else {
        return false;
    };

    catch_unwind(AssertUnwindSafe(|| hook(messenger, error))).unwrap_or(false)
}
