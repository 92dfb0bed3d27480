use std::panic::{AssertUnwindSafe, catch_unwind};

use smallvec::SmallVec;
use tracing::warn;

use crate::orders::OrderId;

/// Which part of an order a mutation touched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderChangeKind {
    Price,
    StopLoss,
    TakeProfit,
    Time,
    Side,
    Label,
    Cancel,
}

/// One order mutation, fanned out to subscribers after the registry commits it.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderChange {
    pub id: OrderId,
    pub changed: SmallVec<[OrderChangeKind; 4]>,
}

/// Identity of one change subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Subscriber = Box<dyn FnMut(&OrderChange)>;

/// Synchronous fan-out of order mutations.
///
/// Subscribers are invoked in subscription order on the mutating thread. A
/// panicking subscriber is isolated: the panic is swallowed and the remaining
/// subscribers are still notified, so one misbehaving listener can never block
/// a mutation or starve its peers.
#[derive(Default)]
pub struct OrderChangeBus {
    next_subscription: u64,
    subscribers: Vec<(SubscriptionId, Subscriber)>,
}

impl OrderChangeBus {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, subscriber: impl FnMut(&OrderChange) + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.subscribers.push((id, Box::new(subscriber)));
        id
    }

    /// Removes a subscription. Returns `true` when removed.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        if let Some(position) = self
            .subscribers
            .iter()
            .position(|(existing, _)| *existing == id)
        {
            self.subscribers.remove(position);
            return true;
        }
        false
    }

    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    pub fn notify(&mut self, change: &OrderChange) {
        for (id, subscriber) in &mut self.subscribers {
            if catch_unwind(AssertUnwindSafe(|| subscriber(change))).is_err() {
                warn!(
                    subscription = id.0,
                    "order-change subscriber panicked; continuing fan-out"
                );
            }
        }
    }
}

impl std::fmt::Debug for OrderChangeBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrderChangeBus")
            .field("next_subscription", &self.next_subscription)
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}
