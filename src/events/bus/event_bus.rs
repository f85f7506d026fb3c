// src/events/bus/event_bus.rs
//
// Synchronous event bus for list controller events.
//
// - Handlers run immediately, in subscription order, on the emitting thread
// - A panicking handler is logged and does not stop the others
// - The most recent emissions are kept in a bounded log for inspection

use std::any::{Any, TypeId};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::events::types::ListEvent;

type Handler = Box<dyn Fn(&dyn Any) + Send + Sync>;

const DEFAULT_LOG_CAPACITY: usize = 256;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventLogEntry {
    pub event_type: String,
    pub event_id: String,
    pub occurred_at: String,
    pub handler_count: usize,
}

/// Cheap to clone; clones share handlers and log.
#[derive(Clone)]
pub struct EventBus {
    handlers: Arc<RwLock<HashMap<TypeId, Vec<Handler>>>>,
    log: Arc<RwLock<VecDeque<EventLogEntry>>>,
    capacity: usize,
}

fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl EventBus {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_LOG_CAPACITY)
    }

    /// Bus keeping at most `capacity` log entries (at least one)
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            handlers: Arc::new(RwLock::new(HashMap::new())),
            log: Arc::new(RwLock::new(VecDeque::with_capacity(capacity))),
            capacity,
        }
    }

    pub fn subscribe<E, F>(&self, handler: F)
    where
        E: ListEvent + 'static,
        F: Fn(&E) + Send + Sync + 'static,
    {
        let wrapped: Handler = Box::new(move |event: &dyn Any| {
            if let Some(event) = event.downcast_ref::<E>() {
                handler(event);
            }
        });

        write(&self.handlers)
            .entry(TypeId::of::<E>())
            .or_default()
            .push(wrapped);
    }

    pub fn emit<E>(&self, event: E)
    where
        E: ListEvent + 'static,
    {
        let handlers = read(&self.handlers);
        let subscribed = handlers.get(&TypeId::of::<E>());
        let handler_count = subscribed.map_or(0, Vec::len);

        {
            let mut log = write(&self.log);
            if log.len() == self.capacity {
                log.pop_front();
            }
            log.push_back(EventLogEntry {
                event_type: event.event_type().to_string(),
                event_id: event.event_id().to_string(),
                occurred_at: event.occurred_at().to_rfc3339(),
                handler_count,
            });
        }

        log::trace!("[event] {} | {} handlers", event.event_type(), handler_count);

        for (idx, handler) in subscribed.into_iter().flatten().enumerate() {
            let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
                handler(&event as &dyn Any)
            }));
            if outcome.is_err() {
                log::error!("Handler {} for {} panicked", idx, event.event_type());
            }
        }
    }

    /// Logged emissions, oldest first
    pub fn event_log(&self) -> Vec<EventLogEntry> {
        read(&self.log).iter().cloned().collect()
    }

    /// Logged emissions of one event type
    pub fn emitted(&self, event_type: &str) -> usize {
        read(&self.log)
            .iter()
            .filter(|entry| entry.event_type == event_type)
            .count()
    }

    pub fn clear_event_log(&self) {
        write(&self.log).clear();
    }

    pub fn subscriber_count<E: 'static>(&self) -> usize {
        read(&self.handlers)
            .get(&TypeId::of::<E>())
            .map_or(0, Vec::len)
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
