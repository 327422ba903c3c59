//! # Event Bus System
//!
//! Typed, in-process publish/subscribe used to decouple the subsystems of the
//! application core from each other and from the host shell.
//!
//! ## Overview
//!
//! - **Events** are plain Rust values. Any `Send + Sync + 'static` type can be
//!   published; the concrete type is the routing key.
//! - **Subscribers** register a closure for one event type and get back a
//!   [`SubscriptionId`] used to deregister it.
//! - **Producers** supply the current value of an event type on demand. A
//!   new subscriber immediately receives that value.
//! - **Dead events**: a publish that reaches nobody is wrapped in a
//!   [`DeadEvent`] and offered to `DeadEvent` subscribers.
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────────┐  publish(E)   ┌────────────────────┐   Fn(&E)   ┌────────────┐
//! │ RequestClient ├──────────────>│                    ├───────────>│ Subscriber │
//! └───────────────┘               │      EventBus      │            └────────────┘
//!                                 │  (TypeId → handler │
//! ┌───────────────┐  publish(E)   │     registry)      │   mpsc     ┌────────────┐
//! │  Application  ├──────────────>│                    ├───────────>│ async task │
//! └───────────────┘               └────────────────────┘            └────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use core_runtime::events::EventBus;
//! use std::sync::atomic::{AtomicUsize, Ordering};
//! use std::sync::Arc;
//!
//! #[derive(Debug, Clone)]
//! struct Greeting(String);
//!
//! let bus = EventBus::new();
//! let seen = Arc::new(AtomicUsize::new(0));
//!
//! let counter = Arc::clone(&seen);
//! let id = bus.subscribe(move |greeting: &Greeting| {
//!     assert_eq!(greeting.0, "hello");
//!     counter.fetch_add(1, Ordering::SeqCst);
//! });
//!
//! assert_eq!(bus.publish(Greeting("hello".into())), 1);
//! assert!(bus.unsubscribe(id));
//! assert_eq!(bus.publish(Greeting("hello".into())), 0);
//! assert_eq!(seen.load(Ordering::SeqCst), 1);
//! ```
//!
//! ## Delivery Semantics
//!
//! - Delivery is synchronous: every matching handler has run when `publish`
//!   returns, on the publishing thread. Events published from a background
//!   task are therefore handled on that task's thread.
//! - Handlers are snapshotted before dispatch and no lock is held while they
//!   run, so a handler may publish, subscribe or unsubscribe. A nested
//!   publish is delivered depth-first before the outer publish continues.
//! - Nothing is persisted or replayed.
//!
//! ## Async Consumers
//!
//! [`EventBus::subscribe_channel`] bridges the bus to a Tokio unbounded
//! channel:
//!
//! ```rust
//! use core_runtime::events::EventBus;
//!
//! # #[tokio::main]
//! # async fn main() {
//! let bus = EventBus::new();
//! let (_id, mut rx) = bus.subscribe_channel::<u32>();
//!
//! bus.publish(7u32);
//! assert_eq!(rx.recv().await, Some(7));
//! # }
//! ```

use crate::error::{Error, Result};
use std::any::{type_name, Any, TypeId};
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tokio::sync::mpsc;
use tracing::{debug, trace};
use uuid::Uuid;

/// Marker for values that can travel over the bus.
pub trait Event: Any + Send + Sync {}

impl<T: Any + Send + Sync> Event for T {}

/// Identity of one registered handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(Uuid);

impl SubscriptionId {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

type Handler = Arc<dyn Fn(&dyn Any) + Send + Sync>;
type Producer = Arc<dyn Fn() -> Option<Box<dyn Any + Send + Sync>> + Send + Sync>;

struct Subscriber {
    id: SubscriptionId,
    handler: Handler,
}

#[derive(Default)]
struct Registry {
    subscribers: HashMap<TypeId, Vec<Subscriber>>,
    index: HashMap<SubscriptionId, TypeId>,
    producers: HashMap<TypeId, Producer>,
}

/// Wrapper for an event that had no subscriber when it was published.
pub struct DeadEvent {
    event_type: &'static str,
    event: Box<dyn Any + Send + Sync>,
}

impl DeadEvent {
    /// Type name of the undelivered event
    pub fn event_type(&self) -> &'static str {
        self.event_type
    }

    /// Borrow the undelivered event if it is of type `E`
    pub fn downcast_ref<E: Event>(&self) -> Option<&E> {
        self.event.downcast_ref::<E>()
    }
}

impl fmt::Debug for DeadEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeadEvent")
            .field("event_type", &self.event_type)
            .finish_non_exhaustive()
    }
}

/// Central event bus.
///
/// Cloning is cheap and every clone shares the same registry, so the bus can
/// be handed to each component that needs it.
#[derive(Clone, Default)]
pub struct EventBus {
    registry: Arc<RwLock<Registry>>,
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let registry = self.read();
        f.debug_struct("EventBus")
            .field("event_types", &registry.subscribers.len())
            .field("subscriptions", &registry.index.len())
            .field("producers", &registry.producers.len())
            .finish()
    }
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `handler` for events of type `E`.
    ///
    /// If a producer is registered for `E`, the handler is called with the
    /// producer's current value before this method returns.
    pub fn subscribe<E, F>(&self, handler: F) -> SubscriptionId
    where
        E: Event,
        F: Fn(&E) + Send + Sync + 'static,
    {
        let id = SubscriptionId::new();
        let type_id = TypeId::of::<E>();
        let handler: Handler = Arc::new(move |event: &dyn Any| {
            if let Some(event) = event.downcast_ref::<E>() {
                handler(event);
            }
        });

        let producer = {
            let mut registry = self.write();
            registry.subscribers.entry(type_id).or_default().push(Subscriber {
                id,
                handler: Arc::clone(&handler),
            });
            registry.index.insert(id, type_id);
            registry.producers.get(&type_id).cloned()
        };

        debug!(event_type = type_name::<E>(), subscription = %id, "Subscribed");

        if let Some(value) = producer.and_then(|produce| produce()) {
            handler(&*value as &dyn Any);
        }

        id
    }

    /// Removes a handler. Returns `false` if the id is unknown.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut registry = self.write();
        let Some(type_id) = registry.index.remove(&id) else {
            return false;
        };

        if let Some(subscribers) = registry.subscribers.get_mut(&type_id) {
            subscribers.retain(|s| s.id != id);
            if subscribers.is_empty() {
                registry.subscribers.remove(&type_id);
            }
        }

        debug!(subscription = %id, "Unsubscribed");
        true
    }

    /// Delivers `event` to every handler registered for `E`.
    ///
    /// Returns the number of handlers invoked. With no handler the event is
    /// offered to `DeadEvent` subscribers and `0` is returned.
    pub fn publish<E: Event>(&self, event: E) -> usize {
        let handlers = self.handlers_for(TypeId::of::<E>());

        if handlers.is_empty() {
            if TypeId::of::<E>() != TypeId::of::<DeadEvent>() {
                trace!(event_type = type_name::<E>(), "No subscribers for event");
                self.publish(DeadEvent {
                    event_type: type_name::<E>(),
                    event: Box::new(event),
                });
            }
            return 0;
        }

        trace!(
            event_type = type_name::<E>(),
            handlers = handlers.len(),
            "Publishing event"
        );

        for handler in &handlers {
            handler(&event as &dyn Any);
        }

        handlers.len()
    }

    /// Registers the producer for `E` and delivers its current value to the
    /// existing subscribers.
    ///
    /// # Errors
    ///
    /// [`Error::ProducerExists`] if `E` already has a producer.
    pub fn register_producer<E, F>(&self, producer: F) -> Result<()>
    where
        E: Event,
        F: Fn() -> Option<E> + Send + Sync + 'static,
    {
        let type_id = TypeId::of::<E>();
        let producer: Producer = Arc::new(move || {
            producer().map(|event| Box::new(event) as Box<dyn Any + Send + Sync>)
        });

        {
            let mut registry = self.write();
            match registry.producers.entry(type_id) {
                Entry::Occupied(_) => {
                    return Err(Error::ProducerExists {
                        event_type: type_name::<E>().to_string(),
                    });
                }
                Entry::Vacant(slot) => {
                    slot.insert(Arc::clone(&producer));
                }
            }
        }

        debug!(event_type = type_name::<E>(), "Producer registered");

        if let Some(value) = producer() {
            for handler in self.handlers_for(type_id) {
                handler(&*value as &dyn Any);
            }
        }

        Ok(())
    }

    /// Removes the producer for `E`. Returns `false` if none was registered.
    pub fn unregister_producer<E: Event>(&self) -> bool {
        self.write().producers.remove(&TypeId::of::<E>()).is_some()
    }

    /// Subscribes an unbounded Tokio channel to events of type `E`.
    ///
    /// The subscription stays registered after the receiver is dropped;
    /// call [`EventBus::unsubscribe`] with the returned id to remove it.
    pub fn subscribe_channel<E>(&self) -> (SubscriptionId, mpsc::UnboundedReceiver<E>)
    where
        E: Event + Clone,
    {
        let (tx, rx) = mpsc::unbounded_channel();
        let id = self.subscribe(move |event: &E| {
            if tx.send(event.clone()).is_err() {
                trace!(event_type = type_name::<E>(), "Channel receiver dropped");
            }
        });
        (id, rx)
    }

    /// Number of handlers currently registered for `E`
    pub fn subscriber_count<E: Event>(&self) -> usize {
        self.read()
            .subscribers
            .get(&TypeId::of::<E>())
            .map_or(0, Vec::len)
    }

    fn handlers_for(&self, type_id: TypeId) -> Vec<Handler> {
        self.read()
            .subscribers
            .get(&type_id)
            .map(|subscribers| {
                subscribers
                    .iter()
                    .map(|s| Arc::clone(&s.handler))
                    .collect()
            })
            .unwrap_or_default()
    }

    fn read(&self) -> RwLockReadGuard<'_, Registry> {
        self.registry.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Registry> {
        self.registry.write().unwrap_or_else(PoisonError::into_inner)
    }
}
