use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use thiserror::Error;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{Element, IntersectionObserver, IntersectionObserverEntry, IntersectionObserverInit};

use crate::geometry::Rect;
use crate::intersection::IntersectionRecord;

pub const DEFAULT_THRESHOLDS: [f64; 9] = [0.0, 0.01, 0.1, 0.2, 0.5, 0.8, 0.9, 0.99, 1.0];

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ObserveError {
    #[error("intersection observer unavailable: {0}")]
    Unavailable(String),
    #[error("observer pool has been disconnected")]
    Disconnected,
}

pub type Handler = Rc<dyn Fn(IntersectionRecord)>;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// Result of cancelling a subscription.
#[derive(Debug, PartialEq, Eq)]
pub enum Release<T> {
    /// Unknown or already cancelled id.
    Unknown,
    /// Other subscriptions still observe the target.
    Shared,
    /// Last subscription for the target is gone.
    Released(T),
}

impl<T> Release<T> {
    pub fn was_active(&self) -> bool {
        !matches!(self, Self::Unknown)
    }
}

struct Subscriber<T> {
    id: SubscriptionId,
    target: T,
    handler: Handler,
}

pub struct SubscriberRegistry<T> {
    next_id: u64,
    subscribers: Vec<Subscriber<T>>,
}

impl<T> Default for SubscriberRegistry<T> {
    fn default() -> Self {
        Self {
            next_id: 0,
            subscribers: Vec::new(),
        }
    }
}

impl<T: PartialEq> SubscriberRegistry<T> {
    /// Returns the new id and whether this is the first subscription for `target`.
    pub fn subscribe(&mut self, target: T, handler: Handler) -> (SubscriptionId, bool) {
        let first = !self.is_observed(&target);
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.subscribers.push(Subscriber {
            id,
            target,
            handler,
        });
        (id, first)
    }

    pub fn cancel(&mut self, id: SubscriptionId) -> Release<T> {
        let Some(index) = self.subscribers.iter().position(|sub| sub.id == id) else {
            return Release::Unknown;
        };
        let removed = self.subscribers.remove(index);
        if self.is_observed(&removed.target) {
            Release::Shared
        } else {
            Release::Released(removed.target)
        }
    }

    pub fn is_active(&self, id: SubscriptionId) -> bool {
        self.subscribers.iter().any(|sub| sub.id == id)
    }

    pub fn is_observed(&self, target: &T) -> bool {
        self.subscribers.iter().any(|sub| &sub.target == target)
    }

    pub fn handlers_for(&self, target: &T) -> Vec<(SubscriptionId, Handler)> {
        self.subscribers
            .iter()
            .filter(|sub| &sub.target == target)
            .map(|sub| (sub.id, Rc::clone(&sub.handler)))
            .collect()
    }

    /// Removes every subscription and returns the distinct targets.
    pub fn clear(&mut self) -> Vec<T> {
        let mut targets: Vec<T> = Vec::new();
        for sub in self.subscribers.drain(..) {
            if !targets.contains(&sub.target) {
                targets.push(sub.target);
            }
        }
        targets
    }

    pub fn len(&self) -> usize {
        self.subscribers.len()
    }
}

/// Delivers `record` to every handler of `target`, re-checking each
/// subscription right before its call so a handler cancelled by an earlier
/// one is skipped.
pub fn dispatch<T: PartialEq>(
    registry: &RefCell<SubscriberRegistry<T>>,
    target: &T,
    record: IntersectionRecord,
) -> usize {
    let handlers = registry.borrow().handlers_for(target);
    let mut delivered = 0;
    for (id, handler) in handlers {
        if !registry.borrow().is_active(id) {
            continue;
        }
        handler(record);
        delivered += 1;
    }
    delivered
}

impl IntersectionRecord {
    pub fn from_entry(entry: &IntersectionObserverEntry) -> Self {
        let rect = entry.bounding_client_rect();
        Self {
            rect: Rect::new(rect.x(), rect.y(), rect.width(), rect.height()),
            intersection_ratio: entry.intersection_ratio(),
        }
    }
}

type ObserverCallback = Closure<dyn FnMut(js_sys::Array, IntersectionObserver)>;

struct Platform {
    observer: IntersectionObserver,
    _callback: ObserverCallback,
}

struct PoolInner {
    thresholds: Vec<f64>,
    registry: RefCell<SubscriberRegistry<Element>>,
    platform: RefCell<Option<Platform>>,
    disconnected: Cell<bool>,
}

impl PoolInner {
    fn observer(self: &Rc<Self>) -> Result<IntersectionObserver, ObserveError> {
        if self.disconnected.get() {
            return Err(ObserveError::Disconnected);
        }
        if let Some(platform) = self.platform.borrow().as_ref() {
            return Ok(platform.observer.clone());
        }

        let weak = Rc::downgrade(self);
        let callback: ObserverCallback = Closure::new(
            move |entries: js_sys::Array, _observer: IntersectionObserver| {
                let Some(inner) = weak.upgrade() else {
                    return;
                };
                for value in entries.iter() {
                    let entry: IntersectionObserverEntry = value.unchecked_into();
                    let record = IntersectionRecord::from_entry(&entry);
                    dispatch(&inner.registry, &entry.target(), record);
                }
            },
        );

        let thresholds: js_sys::Array = self
            .thresholds
            .iter()
            .map(|threshold| JsValue::from_f64(*threshold))
            .collect();
        let options = IntersectionObserverInit::new();
        options.set_threshold(&thresholds);

        let observer =
            IntersectionObserver::new_with_options(callback.as_ref().unchecked_ref(), &options)
                .map_err(|err| ObserveError::Unavailable(format!("{err:?}")))?;
        log::debug!(
            "created intersection observer with {} thresholds",
            self.thresholds.len()
        );

        *self.platform.borrow_mut() = Some(Platform {
            observer: observer.clone(),
            _callback: callback,
        });
        Ok(observer)
    }

    fn release(&self, id: SubscriptionId) -> bool {
        let release = self.registry.borrow_mut().cancel(id);
        let was_active = release.was_active();
        if let Release::Released(element) = release {
            if let Some(platform) = self.platform.borrow().as_ref() {
                platform.observer.unobserve(&element);
            }
        }
        was_active
    }

    fn disconnect(&self) {
        self.disconnected.set(true);
        let subscriptions = self.registry.borrow().len();
        let released = self.registry.borrow_mut().clear();
        if let Some(platform) = self.platform.borrow_mut().take() {
            platform.observer.disconnect();
            log::debug!(
                "disconnected intersection observer ({subscriptions} subscriptions, {} elements)",
                released.len()
            );
        }
    }
}

impl Drop for PoolInner {
    fn drop(&mut self) {
        if let Some(platform) = self.platform.get_mut().take() {
            platform.observer.disconnect();
        }
    }
}

pub struct ObserverPool {
    inner: Rc<PoolInner>,
}

impl ObserverPool {
    pub fn new(thresholds: &[f64]) -> Self {
        Self {
            inner: Rc::new(PoolInner {
                thresholds: thresholds.to_vec(),
                registry: RefCell::new(SubscriberRegistry::default()),
                platform: RefCell::new(None),
                disconnected: Cell::new(false),
            }),
        }
    }

    pub fn observe<F>(&self, element: &Element, handler: F) -> Result<Subscription, ObserveError>
    where
        F: Fn(IntersectionRecord) + 'static,
    {
        let observer = self.inner.observer()?;
        let (id, first) = self
            .inner
            .registry
            .borrow_mut()
            .subscribe(element.clone(), Rc::new(handler));
        if first {
            observer.observe(element);
        }
        Ok(Subscription {
            id,
            pool: Rc::downgrade(&self.inner),
        })
    }

    pub fn disconnect(&self) {
        self.inner.disconnect();
    }
}

/// Cancelled on drop.
pub struct Subscription {
    id: SubscriptionId,
    pool: Weak<PoolInner>,
}

impl Subscription {
    /// Returns `false` when the subscription was already cancelled or its
    /// pool is gone.
    pub fn cancel(&self) -> bool {
        self.pool
            .upgrade()
            .is_some_and(|inner| inner.release(self.id))
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(y: f64) -> IntersectionRecord {
        IntersectionRecord {
            rect: Rect::new(0.0, y, 10.0, 10.0),
            intersection_ratio: 0.5,
        }
    }

    fn counting_handler(count: &Rc<Cell<usize>>) -> Handler {
        let count = Rc::clone(count);
        Rc::new(move |_: IntersectionRecord| count.set(count.get() + 1))
    }

    #[test]
    fn first_subscription_per_target_is_flagged() {
        let mut registry = SubscriberRegistry::default();
        let count = Rc::new(Cell::new(0));
        let (_, first) = registry.subscribe(1u32, counting_handler(&count));
        let (_, second) = registry.subscribe(1u32, counting_handler(&count));
        let (_, other) = registry.subscribe(2u32, counting_handler(&count));
        assert!(first);
        assert!(!second);
        assert!(other);
        assert_eq!(registry.len(), 3);
    }

    #[test]
    fn shared_target_is_released_by_last_subscription() {
        let mut registry = SubscriberRegistry::default();
        let count = Rc::new(Cell::new(0));
        let (a, _) = registry.subscribe(7u32, counting_handler(&count));
        let (b, _) = registry.subscribe(7u32, counting_handler(&count));

        let release = registry.cancel(a);
        assert!(release.was_active());
        assert_eq!(release, Release::Shared);
        assert!(registry.is_observed(&7));
        assert_eq!(registry.cancel(b), Release::Released(7));
        assert!(!registry.is_observed(&7));
    }

    #[test]
    fn cancel_is_idempotent() {
        let mut registry = SubscriberRegistry::default();
        let count = Rc::new(Cell::new(0));
        let (id, _) = registry.subscribe(1u32, counting_handler(&count));
        assert_eq!(registry.cancel(id), Release::Released(1));
        assert_eq!(registry.cancel(id), Release::Unknown);
        assert!(!registry.cancel(id).was_active());
        assert_eq!(registry.len(), 0);
    }

    #[test]
    fn dispatch_reaches_only_matching_target() {
        let registry = RefCell::new(SubscriberRegistry::default());
        let hits_a = Rc::new(Cell::new(0));
        let hits_b = Rc::new(Cell::new(0));
        registry
            .borrow_mut()
            .subscribe("a", counting_handler(&hits_a));
        registry
            .borrow_mut()
            .subscribe("b", counting_handler(&hits_b));

        assert_eq!(dispatch(&registry, &"a", record(0.0)), 1);
        assert_eq!(dispatch(&registry, &"a", record(5.0)), 1);
        assert_eq!(hits_a.get(), 2);
        assert_eq!(hits_b.get(), 0);
    }

    #[test]
    fn cancelled_subscription_receives_nothing() {
        let registry = RefCell::new(SubscriberRegistry::default());
        let hits = Rc::new(Cell::new(0));
        let (id, _) = registry.borrow_mut().subscribe(1u32, counting_handler(&hits));
        dispatch(&registry, &1, record(0.0));
        registry.borrow_mut().cancel(id);
        assert_eq!(dispatch(&registry, &1, record(1.0)), 0);
        assert_eq!(hits.get(), 1);
    }

    #[test]
    fn handler_cancelled_mid_dispatch_is_skipped() {
        let registry = Rc::new(RefCell::new(SubscriberRegistry::default()));
        let late_hits = Rc::new(Cell::new(0));
        let victim = Rc::new(Cell::new(None));

        let canceller: Handler = {
            let registry = Rc::clone(&registry);
            let victim = Rc::clone(&victim);
            Rc::new(move |_: IntersectionRecord| {
                if let Some(id) = victim.get() {
                    registry.borrow_mut().cancel(id);
                }
            })
        };
        registry.borrow_mut().subscribe(1u32, canceller);
        let (late, _) = registry
            .borrow_mut()
            .subscribe(1u32, counting_handler(&late_hits));
        victim.set(Some(late));

        assert_eq!(dispatch(&registry, &1, record(0.0)), 1);
        assert_eq!(late_hits.get(), 0);
    }

    #[test]
    fn clear_returns_distinct_targets() {
        let mut registry = SubscriberRegistry::default();
        let count = Rc::new(Cell::new(0));
        registry.subscribe(1u32, counting_handler(&count));
        registry.subscribe(1u32, counting_handler(&count));
        registry.subscribe(2u32, counting_handler(&count));
        assert_eq!(registry.clear(), vec![1, 2]);
        assert_eq!(registry.len(), 0);
    }
}
