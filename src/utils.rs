//! Small internal helpers shared across the crate.

use std::any::Any;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Locks a mutex, recovering the guard if a panicking subscriber poisoned it.
///
/// Every critical section in this crate only swaps or copies fields, so a
/// poisoned lock never guards inconsistent state.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Extracts a readable message from a panic payload.
pub(crate) fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&'static str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lock_recovers_from_poison() {
        let mutex = std::sync::Arc::new(Mutex::new(7_u32));
        let poisoner = std::sync::Arc::clone(&mutex);
        let _ = std::thread::spawn(move || {
            let _guard = poisoner.lock().unwrap();
            panic!("poison the lock");
        })
        .join();

        assert_eq!(*lock(&mutex), 7);
    }

    #[test]
    fn test_panic_message_extracts_known_payloads() {
        assert_eq!(panic_message(Box::new("static text")), "static text");
        assert_eq!(
            panic_message(Box::new("owned text".to_string())),
            "owned text"
        );
        assert_eq!(panic_message(Box::new(42_u8)), "unknown panic");
    }
}
