// SPDX-License-Identifier: MPL-2.0
//! Payload-less change broadcast and the dispatchers that deliver it.
//!
//! A [`ChangeChannel`] snapshots its subscribers when a publish begins and
//! hands the delivery to a [`Dispatcher`]. The inline dispatcher runs the
//! delivery on the publishing thread; [`QueuedDispatcher`] forwards it to a
//! [`MainQueue`] drained on the UI thread.
//!
//! No lock is held while callbacks run, so a callback may subscribe,
//! unsubscribe or publish again.

use super::lock_unpoisoned;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Weak};
use tokio::sync::mpsc;

/// A unit of delivery work.
pub type Job = Box<dyn FnOnce() + Send + 'static>;

/// Decides on which execution context change deliveries run.
pub trait Dispatcher: Send + Sync {
    fn dispatch(&self, job: Job);
}

/// Runs deliveries immediately on the publishing thread.
///
/// Suitable when the preference is only ever changed from the UI thread.
#[derive(Debug, Default, Clone, Copy)]
pub struct InlineDispatcher;

impl Dispatcher for InlineDispatcher {
    fn dispatch(&self, job: Job) {
        job();
    }
}

/// Forwards deliveries to a [`MainQueue`].
#[derive(Debug, Clone)]
pub struct QueuedDispatcher {
    sender: mpsc::UnboundedSender<Job>,
}

impl QueuedDispatcher {
    /// Creates a dispatcher and the queue the UI thread drains.
    #[must_use]
    pub fn new() -> (Self, MainQueue) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, MainQueue { receiver })
    }
}

impl Dispatcher for QueuedDispatcher {
    fn dispatch(&self, job: Job) {
        if self.sender.send(job).is_err() {
            tracing::debug!("main queue closed, dropping change delivery");
        }
    }
}

/// FIFO of pending deliveries, owned by the UI thread.
#[derive(Debug)]
pub struct MainQueue {
    receiver: mpsc::UnboundedReceiver<Job>,
}

impl MainQueue {
    /// Runs every delivery queued so far and returns how many ran.
    ///
    /// Deliveries queued by the jobs themselves also run before this returns.
    pub fn run_pending(&mut self) -> usize {
        let mut ran = 0;
        while let Ok(job) = self.receiver.try_recv() {
            job();
            ran += 1;
        }
        ran
    }

    /// Runs deliveries as they arrive until every dispatcher is dropped.
    pub async fn run(mut self) {
        while let Some(job) = self.receiver.recv().await {
            job();
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.receiver.is_empty()
    }
}

struct Subscriber {
    id: u64,
    active: AtomicBool,
    callback: Box<dyn Fn() + Send + Sync>,
}

struct Shared {
    subscribers: Mutex<Vec<Arc<Subscriber>>>,
    next_id: AtomicU64,
    published: AtomicU64,
    dispatcher: Arc<dyn Dispatcher>,
}

impl Shared {
    fn remove(&self, id: u64) {
        lock_unpoisoned(&self.subscribers).retain(|subscriber| subscriber.id != id);
    }
}

/// Broadcast channel with no payload.
///
/// Cloning yields another handle to the same channel.
#[derive(Clone)]
pub struct ChangeChannel {
    shared: Arc<Shared>,
}

impl ChangeChannel {
    #[must_use]
    pub fn new(dispatcher: Arc<dyn Dispatcher>) -> Self {
        Self {
            shared: Arc::new(Shared {
                subscribers: Mutex::new(Vec::new()),
                next_id: AtomicU64::new(0),
                published: AtomicU64::new(0),
                dispatcher,
            }),
        }
    }

    /// Creates a channel delivering on the publishing thread.
    #[must_use]
    pub fn inline() -> Self {
        Self::new(Arc::new(InlineDispatcher))
    }

    /// Registers `callback` for every event published from now on.
    ///
    /// The callback stays registered until the returned handle is cancelled
    /// or dropped.
    pub fn subscribe(&self, callback: impl Fn() + Send + Sync + 'static) -> Subscription {
        let id = self.shared.next_id.fetch_add(1, Ordering::Relaxed);
        let subscriber = Arc::new(Subscriber {
            id,
            active: AtomicBool::new(true),
            callback: Box::new(callback),
        });
        lock_unpoisoned(&self.shared.subscribers).push(Arc::clone(&subscriber));
        Subscription {
            subscriber,
            channel: Arc::downgrade(&self.shared),
        }
    }

    /// Publishes one event to every current subscriber.
    pub fn publish(&self) {
        let snapshot = lock_unpoisoned(&self.shared.subscribers).clone();
        let sequence = self.shared.published.fetch_add(1, Ordering::AcqRel) + 1;
        tracing::debug!(sequence, subscribers = snapshot.len(), "publishing language change");

        self.shared.dispatcher.dispatch(Box::new(move || {
            for subscriber in snapshot {
                // Cancelled after the snapshot was taken but before delivery.
                if subscriber.active.load(Ordering::Acquire) {
                    (subscriber.callback)();
                }
            }
        }));
    }

    /// Returns the number of live subscriptions.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        lock_unpoisoned(&self.shared.subscribers).len()
    }

    /// Returns how many events were published on this channel.
    #[must_use]
    pub fn published(&self) -> u64 {
        self.shared.published.load(Ordering::Acquire)
    }
}

impl Default for ChangeChannel {
    fn default() -> Self {
        Self::inline()
    }
}

impl fmt::Debug for ChangeChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChangeChannel")
            .field("subscribers", &self.subscriber_count())
            .field("published", &self.published())
            .finish()
    }
}

/// Cancellation handle returned by [`ChangeChannel::subscribe`].
///
/// Dropping the handle unsubscribes.
#[must_use = "dropping a subscription immediately unsubscribes it"]
pub struct Subscription {
    subscriber: Arc<Subscriber>,
    channel: Weak<Shared>,
}

impl Subscription {
    /// Unsubscribes now. Equivalent to dropping the handle.
    pub fn cancel(self) {}

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.subscriber.active.load(Ordering::Acquire)
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.subscriber.active.store(false, Ordering::Release);
        if let Some(channel) = self.channel.upgrade() {
            channel.remove(self.subscriber.id);
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.subscriber.id)
            .field("active", &self.is_active())
            .finish()
    }
}
