use alloc::rc::{Rc, Weak};
use alloc::vec::Vec;
use core::cell::RefCell;
use core::fmt;

type Inbox<K> = RefCell<Option<Vec<K>>>;

struct Shared<K> {
    items: Vec<K>,
    subscribers: Vec<Weak<Inbox<K>>>,
}

/// An observable, ordered list of item keys.
///
/// This is the upstream collaborator of a [`crate::WindowController`]: the data layer mutates
/// the sequence (pagination, deletions, reorders) and every subscriber receives the new order.
/// Delivery is synchronous and coalescing: a subscription only ever holds the latest value, so
/// intermediate orders between two reads are never observed.
///
/// Cloning a `Sequence` clones the handle, not the items.
pub struct Sequence<K> {
    shared: Rc<RefCell<Shared<K>>>,
}

impl<K> Clone for Sequence<K> {
    fn clone(&self) -> Self {
        Self {
            shared: Rc::clone(&self.shared),
        }
    }
}

impl<K: Clone> Default for Sequence<K> {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl<K: Clone> Sequence<K> {
    pub fn new(items: Vec<K>) -> Self {
        Self {
            shared: Rc::new(RefCell::new(Shared {
                items,
                subscribers: Vec::new(),
            })),
        }
    }

    /// Registers a subscriber. A non-empty current order is delivered immediately.
    pub fn subscribe(&self) -> Subscription<K> {
        let mut shared = self.shared.borrow_mut();
        let seed = (!shared.items.is_empty()).then(|| shared.items.clone());
        let inbox = Rc::new(RefCell::new(seed));
        shared.subscribers.push(Rc::downgrade(&inbox));
        Subscription { inbox }
    }

    /// A copy of the current order.
    pub fn get(&self) -> Vec<K> {
        self.shared.borrow().items.clone()
    }

    pub fn len(&self) -> usize {
        self.shared.borrow().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shared.borrow().items.is_empty()
    }

    pub fn set(&self, items: Vec<K>) {
        self.mutate(|current| *current = items);
    }

    pub fn push_back(&self, item: K) {
        self.mutate(|current| current.push(item));
    }

    pub fn extend_back(&self, items: impl IntoIterator<Item = K>) {
        self.mutate(|current| current.extend(items));
    }

    pub fn push_front(&self, item: K) {
        self.mutate(|current| current.insert(0, item));
    }

    /// Prepends `items`, keeping their order.
    pub fn extend_front(&self, items: impl IntoIterator<Item = K>) {
        self.mutate(|current| {
            let tail = core::mem::take(current);
            current.extend(items);
            current.extend(tail);
        });
    }

    pub fn retain(&self, keep: impl FnMut(&K) -> bool) {
        self.mutate(|current| current.retain(keep));
    }

    /// Applies `f` to the order and notifies every live subscriber.
    pub fn mutate(&self, f: impl FnOnce(&mut Vec<K>)) {
        let mut shared = self.shared.borrow_mut();
        f(&mut shared.items);
        let Shared { items, subscribers } = &mut *shared;
        subscribers.retain(|weak| match weak.upgrade() {
            Some(inbox) => {
                *inbox.borrow_mut() = Some(items.clone());
                true
            }
            None => false,
        });
    }
}

impl<K: PartialEq> Sequence<K> {
    /// Removes the first occurrence of `item`. Returns `false` (and notifies no one) when absent.
    pub fn remove(&self, item: &K) -> bool
    where
        K: Clone,
    {
        let found = self.shared.borrow().items.iter().position(|k| k == item);
        match found {
            Some(at) => {
                self.mutate(|current| {
                    current.remove(at);
                });
                true
            }
            None => false,
        }
    }
}

impl<K: fmt::Debug> fmt::Debug for Sequence<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let shared = self.shared.borrow();
        f.debug_struct("Sequence")
            .field("items", &shared.items)
            .field("subscribers", &shared.subscribers.len())
            .finish()
    }
}

/// The receiving end of a [`Sequence`] subscription.
///
/// Dropping it unsubscribes.
pub struct Subscription<K> {
    inbox: Rc<Inbox<K>>,
}

impl<K> Subscription<K> {
    /// Takes the latest undelivered order, if any.
    pub fn take(&self) -> Option<Vec<K>> {
        self.inbox.borrow_mut().take()
    }

    pub fn has_pending(&self) -> bool {
        self.inbox.borrow().is_some()
    }
}

impl<K> fmt::Debug for Subscription<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("has_pending", &self.has_pending())
            .finish()
    }
}
