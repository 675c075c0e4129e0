//! # Messenger: one instance of the pub/sub engine.
//!
//! A [`Messenger`] owns a subscription registry and dispatches published
//! messages to every matching subscription. It works standalone out of the
//! box; connecting it to a [`MessengerDirectory`](crate::MessengerDirectory)
//! under a name additionally makes it reachable for cross-messenger
//! routing and source restrictions.
//!
//! ## Architecture
//! ```text
//! publisher ──► Messenger::publish ──► dispatch engine
//!                                         │
//!                    ┌────────────────────┼─────────────────────┐
//!                    ▼                    ▼                     ▼
//!              subscription 1       subscription 2        subscription N
//!              (strong: keeps       (weak: prunes          ...
//!               target alive)        itself once the
//!                                    target is gone)
//!                    │
//!                    └── after local fan-out: async routing to the
//!                        messengers named by the message type
//! ```
//!
//! ## Rules
//! - Any thread may call subscribe/publish/unsubscribe concurrently; the
//!   registry lock is never held across a subscriber callback.
//! - Subscribers for one type run in subscription order within one
//!   publish call; nothing is ordered across types or concurrent calls.
//! - Delivery is fire-and-forget: no durability, no redelivery.

use std::any::{type_name, TypeId};
use std::sync::{Arc, Mutex, Weak};

use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;

use crate::error::{CheckError, PublishError, WaitError};
use crate::messages::BusMessage;
use crate::messaging::dispatch;
use crate::messaging::registry::SubscriptionRegistry;
use crate::routing::DirectoryInner;
use crate::scheduling::{post_to, Scheduler};
use crate::subscriptions::{Subscription, SubscriptionInner, Target};
use crate::utils::lock;

/// Threading discipline of a messenger's synchronous publishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ThreadingBehavior {
    /// No thread checking; publish from anywhere.
    #[default]
    Ignore,
    /// Synchronous publishes must run on the host scheduler's thread.
    EnsureHostScheduler,
}

/// Directory connection state. Reset to defaults on disconnect.
pub(crate) struct Connection {
    pub(crate) name: Option<String>,
    pub(crate) behavior: ThreadingBehavior,
    pub(crate) scheduler: Option<Arc<dyn Scheduler>>,
    pub(crate) directory: Weak<DirectoryInner>,
}

impl Default for Connection {
    fn default() -> Self {
        Self {
            name: None,
            behavior: ThreadingBehavior::Ignore,
            scheduler: None,
            directory: Weak::new(),
        }
    }
}

/// Shared state behind every [`Messenger`] handle.
pub struct MessengerCore {
    pub(crate) registry: SubscriptionRegistry,
    pub(crate) connection: Mutex<Connection>,
}

impl MessengerCore {
    pub(crate) fn name(&self) -> Option<String> {
        lock(&self.connection).name.clone()
    }

    pub(crate) fn threading_behavior(&self) -> ThreadingBehavior {
        lock(&self.connection).behavior
    }

    pub(crate) fn host_scheduler(&self) -> Option<Arc<dyn Scheduler>> {
        lock(&self.connection).scheduler.clone()
    }

    pub(crate) fn directory(&self) -> Option<Arc<DirectoryInner>> {
        lock(&self.connection).directory.upgrade()
    }
}

/// One instance of the pub/sub engine. Cheap to clone; clones share state.
#[derive(Clone)]
pub struct Messenger {
    pub(crate) core: Arc<MessengerCore>,
}

impl Messenger {
    /// Creates a standalone messenger (not connected to any directory).
    pub fn new() -> Self {
        Self {
            core: Arc::new(MessengerCore {
                registry: SubscriptionRegistry::new(),
                connection: Mutex::new(Connection::default()),
            }),
        }
    }

    // ---------------------------
    // Subscribing
    // ---------------------------

    /// Subscribes `action` to messages of type `M`.
    ///
    /// The subscription keeps the callable (and everything it captures)
    /// alive until it is unsubscribed. Subscribing the same callable to the
    /// same type twice yields two independent subscriptions, both
    /// delivered on publish.
    pub fn subscribe<M, F>(&self, action: F) -> Subscription
    where
        M: BusMessage,
        F: Fn(&M) + Send + Sync + 'static,
    {
        self.add_subscription::<M>(Target::strong(action), type_name::<F>())
    }

    /// Subscribes `target`'s `action` to messages of type `M` without
    /// keeping `target` alive.
    ///
    /// Once the last outside `Arc` to `target` is dropped, the
    /// subscription prunes itself on the next publish of `M` and never
    /// fires again.
    pub fn subscribe_weak<M, T, F>(&self, target: &Arc<T>, action: F) -> Subscription
    where
        M: BusMessage,
        T: Send + Sync + 'static,
        F: Fn(&T, &M) + Send + Sync + 'static,
    {
        self.add_subscription::<M>(Target::weak(target, action), type_name::<T>())
    }

    /// Subscribes a [`Receive`](crate::Receive) handler object, keeping it
    /// alive for the subscription's lifetime.
    pub fn subscribe_receiver<M, T>(&self, receiver: Arc<T>) -> Subscription
    where
        M: BusMessage,
        T: crate::receivers::Receive<M>,
    {
        self.add_subscription::<M>(Target::strong_receiver(receiver), type_name::<T>())
    }

    /// Subscribes a [`Receive`](crate::Receive) handler object without
    /// keeping it alive.
    pub fn subscribe_receiver_weak<M, T>(&self, receiver: &Arc<T>) -> Subscription
    where
        M: BusMessage,
        T: crate::receivers::Receive<M>,
    {
        self.add_subscription::<M>(Target::weak_receiver(receiver), type_name::<T>())
    }

    fn add_subscription<M: BusMessage>(
        &self,
        target: Target,
        target_name: &'static str,
    ) -> Subscription {
        let inner = Arc::new(SubscriptionInner::new(
            Arc::downgrade(&self.core),
            TypeId::of::<M>(),
            type_name::<M>(),
            target_name,
            target,
        ));
        self.core.registry.insert(Arc::clone(&inner));
        Subscription { inner }
    }

    /// Ends the given registration.
    ///
    /// No-op if the subscription is already disposed; fails with
    /// [`CheckError::ForeignSubscription`] if it was created by a
    /// different messenger.
    pub fn unsubscribe(&self, subscription: &Subscription) -> Result<(), CheckError> {
        match subscription.inner.owner() {
            Some(owner) if Arc::ptr_eq(&owner, &self.core) => {
                subscription.inner.dispose();
                Ok(())
            }
            _ => Err(CheckError::ForeignSubscription),
        }
    }

    /// Handles to every active subscription on this messenger.
    pub fn subscriptions(&self) -> Vec<Subscription> {
        self.core
            .registry
            .all()
            .into_iter()
            .map(|inner| Subscription { inner })
            .collect()
    }

    /// Total number of active subscriptions.
    pub fn count_subscriptions(&self) -> usize {
        self.core.registry.count()
    }

    /// Number of active subscriptions for message type `M`.
    pub fn count_subscriptions_for<M: BusMessage>(&self) -> usize {
        self.core.registry.count_for(TypeId::of::<M>())
    }

    // ---------------------------
    // Publishing
    // ---------------------------

    /// Publishes `message` synchronously to every subscriber for its type.
    ///
    /// Subscriber failures are collected and raised once as
    /// [`PublishError::Delivery`] after the whole fan-out ran; a failing
    /// subscriber never prevents the remaining ones from running.
    pub fn publish<M: BusMessage>(&self, message: M) -> Result<(), PublishError> {
        dispatch::publish_message(&self.core, &message, true)
    }

    /// Publishes `message` asynchronously and returns immediately.
    ///
    /// The whole publish (checks, fan-out, routing) is posted to the host
    /// scheduler, or to the background executor when none is captured.
    /// Delivery errors are offered to the global hook, logged, and
    /// dropped — use [`begin_publish_async`](Messenger::begin_publish_async)
    /// to observe them.
    pub fn begin_publish<M: BusMessage>(&self, message: M) {
        let core = Arc::clone(&self.core);
        let scheduler = core.host_scheduler();
        post_to(scheduler.as_ref(), move || {
            if let Err(error) = dispatch::publish_message(&core, &message, true) {
                tracing::warn!(
                    error = %error,
                    label = error.as_label(),
                    "asynchronous publish failed; error dropped"
                );
            }
        });
    }

    /// Publishes `message` asynchronously; the returned future completes
    /// once the posted publish (checks plus local fan-out) finished.
    ///
    /// This is the only asynchronous path that surfaces delivery errors to
    /// the publisher. Failures at routed target messengers remain
    /// invisible here as everywhere else.
    pub async fn begin_publish_async<M: BusMessage>(&self, message: M) -> Result<(), PublishError> {
        let (done, outcome) = oneshot::channel();
        let core = Arc::clone(&self.core);
        let scheduler = core.host_scheduler();
        post_to(scheduler.as_ref(), move || {
            let _ = done.send(dispatch::publish_message(&core, &message, true));
        });

        match outcome.await {
            Ok(result) => result,
            Err(_) => Err(CheckError::SchedulerStopped.into()),
        }
    }

    /// Waits for the next message of type `M` published on this messenger.
    ///
    /// Registers a one-shot subscription that unsubscribes itself on first
    /// delivery and resolves with a clone of the delivered message.
    /// Cancellation resolves with [`WaitError::Cancelled`] — distinct from
    /// any delivery outcome — and removes the subscription.
    pub async fn wait_for_message<M: BusMessage>(
        &self,
        cancellation: CancellationToken,
    ) -> Result<M, WaitError> {
        let (resolve, resolved) = oneshot::channel::<M>();
        let resolve = Mutex::new(Some(resolve));
        let slot: Arc<Mutex<Option<Subscription>>> = Arc::new(Mutex::new(None));

        let handler_slot = Arc::clone(&slot);
        let subscription = self.subscribe(move |message: &M| {
            // First delivery wins; unsubscribe before resolving so the
            // count is already back down when the waiter resumes.
            let Some(resolve) = lock(&resolve).take() else {
                return;
            };
            if let Some(subscription) = lock(&handler_slot).take() {
                subscription.unsubscribe();
            }
            let _ = resolve.send(message.clone());
        });
        *lock(&slot) = Some(subscription);

        let result = tokio::select! {
            _ = cancellation.cancelled() => Err(WaitError::Cancelled),
            message = resolved => message.map_err(|_| WaitError::Cancelled),
        };

        // Cancelled, or the handler lost the race to the slot: clean up.
        if let Some(subscription) = lock(&slot).take() {
            subscription.unsubscribe();
        }
        result
    }

    // ---------------------------
    // Directory connection
    // ---------------------------

    /// Registers this messenger in `directory` under `name` and captures
    /// its threading behavior and host scheduler.
    ///
    /// Fails with [`CheckError::AlreadyConnected`] if this messenger is
    /// connected anywhere, and [`CheckError::NameTaken`] if another
    /// messenger owns the name. Reconnecting (same or different name) is
    /// allowed after [`disconnect`](Messenger::disconnect).
    pub fn connect(
        &self,
        directory: &crate::routing::MessengerDirectory,
        behavior: ThreadingBehavior,
        name: impl Into<String>,
        scheduler: Option<Arc<dyn Scheduler>>,
    ) -> Result<(), CheckError> {
        let name = name.into();
        if name.is_empty() {
            return Err(CheckError::EmptyName);
        }

        let mut connection = lock(&self.core.connection);
        if let Some(current) = &connection.name {
            return Err(CheckError::AlreadyConnected {
                current: current.clone(),
            });
        }

        directory.inner().register(&name, Arc::clone(&self.core))?;
        connection.name = Some(name.clone());
        connection.behavior = behavior;
        connection.scheduler = scheduler;
        connection.directory = Arc::downgrade(directory.inner());
        drop(connection);

        tracing::debug!(name = %name, "messenger connected to directory");
        Ok(())
    }

    /// Releases this messenger's directory name and resets behavior and
    /// scheduler to their defaults. Idempotent.
    pub fn disconnect(&self) {
        let mut connection = lock(&self.core.connection);
        let Some(name) = connection.name.take() else {
            return;
        };
        if let Some(directory) = connection.directory.upgrade() {
            directory.unregister(&name, &self.core);
        }
        connection.behavior = ThreadingBehavior::Ignore;
        connection.scheduler = None;
        connection.directory = Weak::new();
        drop(connection);

        tracing::debug!(name = %name, "messenger disconnected from directory");
    }

    /// Whether this messenger currently holds a directory name.
    pub fn is_connected(&self) -> bool {
        lock(&self.core.connection).name.is_some()
    }

    /// The directory name of this messenger, if connected.
    pub fn name(&self) -> Option<String> {
        self.core.name()
    }

    /// The current threading behavior.
    pub fn threading_behavior(&self) -> ThreadingBehavior {
        self.core.threading_behavior()
    }

    /// The captured host scheduler, if any.
    pub fn host_scheduler(&self) -> Option<Arc<dyn Scheduler>> {
        self.core.host_scheduler()
    }
}

impl Default for Messenger {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Messenger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Messenger")
            .field("name", &self.core.name())
            .field("subscriptions", &self.core.registry.count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[derive(Clone, Debug, PartialEq)]
    struct Ping(u32);

    impl BusMessage for Ping {}

    #[derive(Clone)]
    struct Other;

    impl BusMessage for Other {}

    #[test]
    fn test_each_publish_reaches_the_subscriber() {
        for publish_count in [0_usize, 1, 2, 5] {
            let messenger = Messenger::new();
            let received = Arc::new(AtomicUsize::new(0));
            let count = Arc::clone(&received);
            let _subscription = messenger.subscribe(move |_: &Ping| {
                count.fetch_add(1, Ordering::SeqCst);
            });

            for value in 0..publish_count {
                messenger.publish(Ping(value as u32)).expect("publish");
            }

            assert_eq!(received.load(Ordering::SeqCst), publish_count);
            assert_eq!(messenger.count_subscriptions(), 1);
            assert_eq!(messenger.count_subscriptions_for::<Ping>(), 1);
        }
    }

    #[test]
    fn test_publish_without_subscribers_is_ok() {
        let messenger = Messenger::new();
        messenger
            .publish(Ping(1))
            .expect("publish with no subscribers");
    }

    #[test]
    fn test_publish_stops_reaching_an_unsubscribed_subscriber() {
        let messenger = Messenger::new();
        let received = Arc::new(AtomicUsize::new(0));
        let count = Arc::clone(&received);
        let subscription = messenger.subscribe(move |_: &Ping| {
            count.fetch_add(1, Ordering::SeqCst);
        });

        messenger.publish(Ping(1)).expect("publish");
        messenger.unsubscribe(&subscription).expect("unsubscribe");
        messenger.publish(Ping(2)).expect("publish");

        assert_eq!(received.load(Ordering::SeqCst), 1);
        assert_eq!(messenger.count_subscriptions_for::<Ping>(), 0);

        // Unsubscribing again stays a no-op.
        messenger.unsubscribe(&subscription).expect("still no-op");
    }

    #[test]
    fn test_subscribers_run_in_subscription_order() {
        let messenger = Messenger::new();
        let order = Arc::new(Mutex::new(Vec::new()));
        let subscriptions: Vec<_> = (0..5)
            .map(|index| {
                let order = Arc::clone(&order);
                messenger.subscribe(move |_: &Ping| {
                    lock(&order).push(index);
                })
            })
            .collect();

        messenger.publish(Ping(0)).expect("publish");

        assert_eq!(*lock(&order), vec![0, 1, 2, 3, 4]);
        drop(subscriptions);
    }

    #[test]
    fn test_duplicate_subscribe_delivers_twice() {
        let messenger = Messenger::new();
        let received = Arc::new(AtomicUsize::new(0));
        let action = {
            let count = Arc::clone(&received);
            move |_: &Ping| {
                count.fetch_add(1, Ordering::SeqCst);
            }
        };

        let _one = messenger.subscribe(action.clone());
        let _two = messenger.subscribe(action);
        assert_eq!(messenger.count_subscriptions_for::<Ping>(), 2);

        messenger.publish(Ping(1)).expect("publish");
        assert_eq!(received.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_subscriber_may_unsubscribe_itself_during_dispatch() {
        let messenger = Messenger::new();
        let received = Arc::new(AtomicUsize::new(0));

        let slot: Arc<Mutex<Option<Subscription>>> = Arc::new(Mutex::new(None));
        let handler_slot = Arc::clone(&slot);
        let count = Arc::clone(&received);
        let subscription = messenger.subscribe(move |_: &Ping| {
            count.fetch_add(1, Ordering::SeqCst);
            if let Some(own) = lock(&handler_slot).take() {
                own.unsubscribe();
            }
        });
        *lock(&slot) = Some(subscription);

        messenger.publish(Ping(1)).expect("publish");
        messenger.publish(Ping(2)).expect("publish");

        assert_eq!(received.load(Ordering::SeqCst), 1);
        assert_eq!(messenger.count_subscriptions_for::<Ping>(), 0);
    }

    #[test]
    fn test_unsubscribe_rejects_foreign_subscription() {
        let owner = Messenger::new();
        let other = Messenger::new();
        let subscription = owner.subscribe(|_: &Ping| {});

        let error = other
            .unsubscribe(&subscription)
            .expect_err("must reject foreign subscription");
        assert!(matches!(error, CheckError::ForeignSubscription));

        // The registration is untouched.
        assert!(!subscription.is_disposed());
        assert_eq!(owner.count_subscriptions_for::<Ping>(), 1);
    }

    #[test]
    fn test_subscriptions_enumerates_every_type() {
        let messenger = Messenger::new();
        let _a = messenger.subscribe(|_: &Ping| {});
        let _b = messenger.subscribe(|_: &Other| {});

        let all = messenger.subscriptions();
        assert_eq!(all.len(), 2);
        assert!(all.iter().all(|subscription| !subscription.is_disposed()));
    }

    #[tokio::test]
    async fn test_begin_publish_delivers_without_reporting() {
        let messenger = Messenger::new();
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        let _subscription = messenger.subscribe(move |message: &Ping| {
            let _ = tx.send(message.clone());
        });

        messenger.begin_publish(Ping(9));

        let delivered = tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .expect("message never delivered")
            .expect("channel closed");
        assert_eq!(delivered, Ping(9));
    }

    #[tokio::test]
    async fn test_begin_publish_async_reports_delivery_errors() {
        let messenger = Messenger::new();
        let _bad = messenger.subscribe(|_: &Ping| panic!("async failure"));

        let error = messenger
            .begin_publish_async(Ping(1))
            .await
            .expect_err("must surface the aggregate error");
        assert_eq!(error.as_label(), "delivery_failed");
    }

    #[tokio::test]
    async fn test_begin_publish_async_reports_a_stopped_scheduler() {
        let directory = crate::routing::MessengerDirectory::new();
        let scheduler = crate::scheduling::ThreadScheduler::spawn("stopped").expect("spawn");
        let messenger = Messenger::new();
        messenger
            .connect(
                &directory,
                ThreadingBehavior::Ignore,
                "stopped-host",
                Some(Arc::clone(&scheduler) as Arc<dyn Scheduler>),
            )
            .expect("connect");

        scheduler.shutdown();

        let error = messenger
            .begin_publish_async(Ping(1))
            .await
            .expect_err("scheduler is stopped");
        assert_eq!(error.as_label(), "scheduler_stopped");
    }

    #[tokio::test]
    async fn test_wait_for_message_resolves_with_the_published_value() {
        let messenger = Messenger::new();

        let publisher = {
            let messenger = messenger.clone();
            tokio::spawn(async move {
                while messenger.count_subscriptions_for::<Ping>() == 0 {
                    tokio::time::sleep(Duration::from_millis(1)).await;
                }
                messenger.publish(Ping(42)).expect("publish");
            })
        };

        let message = tokio::time::timeout(
            Duration::from_secs(5),
            messenger.wait_for_message::<Ping>(CancellationToken::new()),
        )
        .await
        .expect("wait timed out")
        .expect("wait failed");

        assert_eq!(message, Ping(42));
        // Resolution unsubscribed the one-shot subscription.
        assert_eq!(messenger.count_subscriptions_for::<Ping>(), 0);
        publisher.await.expect("publisher task");
    }

    #[tokio::test]
    async fn test_wait_for_message_resolves_exactly_once() {
        let messenger = Messenger::new();

        let publisher = {
            let messenger = messenger.clone();
            tokio::spawn(async move {
                while messenger.count_subscriptions_for::<Ping>() == 0 {
                    tokio::time::sleep(Duration::from_millis(1)).await;
                }
                messenger.publish(Ping(1)).expect("publish");
                messenger.publish(Ping(2)).expect("publish");
            })
        };

        let message = tokio::time::timeout(
            Duration::from_secs(5),
            messenger.wait_for_message::<Ping>(CancellationToken::new()),
        )
        .await
        .expect("wait timed out")
        .expect("wait failed");

        assert_eq!(message, Ping(1), "wait must resolve with the first message");
        publisher.await.expect("publisher task");
    }

    #[tokio::test]
    async fn test_wait_for_message_cancellation_is_distinct() {
        let messenger = Messenger::new();
        let cancellation = CancellationToken::new();

        let canceller = {
            let cancellation = cancellation.clone();
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(20)).await;
                cancellation.cancel();
            })
        };

        let outcome = tokio::time::timeout(
            Duration::from_secs(5),
            messenger.wait_for_message::<Ping>(cancellation),
        )
        .await
        .expect("cancellation must not hang");

        assert_eq!(outcome, Err(WaitError::Cancelled));
        // The one-shot subscription was cleaned up on cancellation.
        assert_eq!(messenger.count_subscriptions_for::<Ping>(), 0);
        canceller.await.expect("canceller task");
    }
}
