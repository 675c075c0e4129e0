//! Per-messenger subscription registry.
//!
//! Maps each message type to the insertion-ordered list of its active
//! subscriptions. All mutation and snapshotting goes through one lock per
//! messenger, held only for the list operation itself — subscriber
//! callbacks always run outside it.

use std::any::TypeId;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::subscriptions::SubscriptionInner;
use crate::utils::lock;

/// Type → ordered subscription list, guarded by one lock.
pub(crate) struct SubscriptionRegistry {
    by_type: Mutex<HashMap<TypeId, Vec<Arc<SubscriptionInner>>>>,
}

impl SubscriptionRegistry {
    pub(crate) fn new() -> Self {
        Self {
            by_type: Mutex::new(HashMap::new()),
        }
    }

    /// Appends a subscription to its type's list.
    pub(crate) fn insert(&self, subscription: Arc<SubscriptionInner>) {
        lock(&self.by_type)
            .entry(subscription.message_type)
            .or_default()
            .push(subscription);
    }

    /// Removes a subscription; drops the type key once its list empties.
    pub(crate) fn remove(&self, subscription: &Arc<SubscriptionInner>) {
        let mut by_type = lock(&self.by_type);
        if let Some(list) = by_type.get_mut(&subscription.message_type) {
            list.retain(|entry| !Arc::ptr_eq(entry, subscription));
            if list.is_empty() {
                by_type.remove(&subscription.message_type);
            }
        }
    }

    /// Copies the subscription list for one type.
    ///
    /// The copy is what makes it safe for subscriber callbacks to mutate
    /// subscriptions (including unsubscribing themselves) while a fan-out
    /// over the same list is in progress.
    pub(crate) fn snapshot(&self, message_type: TypeId) -> Vec<Arc<SubscriptionInner>> {
        lock(&self.by_type)
            .get(&message_type)
            .cloned()
            .unwrap_or_default()
    }

    /// Copies every active subscription across all types.
    pub(crate) fn all(&self) -> Vec<Arc<SubscriptionInner>> {
        lock(&self.by_type)
            .values()
            .flat_map(|list| list.iter().cloned())
            .collect()
    }

    pub(crate) fn count(&self) -> usize {
        lock(&self.by_type).values().map(Vec::len).sum()
    }

    pub(crate) fn count_for(&self, message_type: TypeId) -> usize {
        lock(&self.by_type)
            .get(&message_type)
            .map_or(0, Vec::len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messages::BusMessage;
    use crate::messaging::Messenger;

    #[derive(Clone)]
    struct First;
    impl BusMessage for First {}

    #[derive(Clone)]
    struct Second;
    impl BusMessage for Second {}

    #[test]
    fn test_type_key_is_dropped_when_list_empties() {
        let messenger = Messenger::new();
        let one = messenger.subscribe(|_: &First| {});
        let two = messenger.subscribe(|_: &First| {});

        one.unsubscribe();
        assert_eq!(messenger.count_subscriptions_for::<First>(), 1);

        two.unsubscribe();
        assert_eq!(messenger.count_subscriptions_for::<First>(), 0);
        // The key is gone entirely, not left behind as an empty list.
        assert!(messenger
            .core
            .registry
            .snapshot(TypeId::of::<First>())
            .is_empty());
    }

    #[test]
    fn test_counts_are_per_type_and_total() {
        let messenger = Messenger::new();
        let _a = messenger.subscribe(|_: &First| {});
        let _b = messenger.subscribe(|_: &First| {});
        let _c = messenger.subscribe(|_: &Second| {});

        assert_eq!(messenger.count_subscriptions(), 3);
        assert_eq!(messenger.count_subscriptions_for::<First>(), 2);
        assert_eq!(messenger.count_subscriptions_for::<Second>(), 1);
    }

    #[test]
    fn test_snapshot_preserves_insertion_order() {
        let messenger = Messenger::new();
        let first = messenger.subscribe(|_: &First| {});
        let second = messenger.subscribe(|_: &First| {});
        let third = messenger.subscribe(|_: &First| {});

        let snapshot = messenger.core.registry.snapshot(TypeId::of::<First>());
        assert!(Arc::ptr_eq(&snapshot[0], &first.inner));
        assert!(Arc::ptr_eq(&snapshot[1], &second.inner));
        assert!(Arc::ptr_eq(&snapshot[2], &third.inner));
    }
}
