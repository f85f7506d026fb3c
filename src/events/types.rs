// src/events/types.rs
//
// Facts a list controller reports about itself.
//
// RULES:
// - Events describe what already happened
// - Events are immutable
// - Events carry identities and counts, not whole collections

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::ResourceKind;

pub trait ListEvent: std::fmt::Debug + Clone + Send + Sync {
    fn event_id(&self) -> Uuid;

    fn occurred_at(&self) -> DateTime<Utc>;

    fn event_type(&self) -> &'static str;
}

macro_rules! list_event {
    ($name:ident) => {
        impl ListEvent for $name {
            fn event_id(&self) -> Uuid {
                self.event_id
            }
            fn occurred_at(&self) -> DateTime<Utc> {
                self.occurred_at
            }
            fn event_type(&self) -> &'static str {
                stringify!($name)
            }
        }
    };
}

// ============================================================================
// FETCH EVENTS
// ============================================================================

/// A fetch response was accepted as the current snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectionRefreshed {
    pub event_id: Uuid,
    pub occurred_at: DateTime<Utc>,
    pub kind: ResourceKind,
    pub generation: u64,
    pub item_count: usize,
}

impl CollectionRefreshed {
    pub fn new(kind: ResourceKind, generation: u64, item_count: usize) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            occurred_at: Utc::now(),
            kind,
            generation,
            item_count,
        }
    }
}

list_event!(CollectionRefreshed);

/// A fetch response arrived after a newer fetch was issued and was dropped
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StaleResponseDiscarded {
    pub event_id: Uuid,
    pub occurred_at: DateTime<Utc>,
    pub kind: ResourceKind,
    pub generation: u64,
    pub current_generation: u64,
}

impl StaleResponseDiscarded {
    pub fn new(kind: ResourceKind, generation: u64, current_generation: u64) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            occurred_at: Utc::now(),
            kind,
            generation,
            current_generation,
        }
    }
}

list_event!(StaleResponseDiscarded);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListFetchFailed {
    pub event_id: Uuid,
    pub occurred_at: DateTime<Utc>,
    pub kind: ResourceKind,
    pub generation: u64,
    pub message: String,
}

impl ListFetchFailed {
    pub fn new(kind: ResourceKind, generation: u64, message: String) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            occurred_at: Utc::now(),
            kind,
            generation,
            message,
        }
    }
}

list_event!(ListFetchFailed);

// ============================================================================
// MUTATION EVENTS
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MutationSucceeded {
    pub event_id: Uuid,
    pub occurred_at: DateTime<Utc>,
    pub kind: ResourceKind,
    pub intent_id: Uuid,
    pub verb: String,
    pub target_ids: Vec<String>,
}

impl MutationSucceeded {
    pub fn new(kind: ResourceKind, intent_id: Uuid, verb: &str, target_ids: Vec<String>) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            occurred_at: Utc::now(),
            kind,
            intent_id,
            verb: verb.to_string(),
            target_ids,
        }
    }
}

list_event!(MutationSucceeded);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MutationFailed {
    pub event_id: Uuid,
    pub occurred_at: DateTime<Utc>,
    pub kind: ResourceKind,
    pub intent_id: Uuid,
    pub verb: String,
    pub target_ids: Vec<String>,
    pub message: String,
}

impl MutationFailed {
    pub fn new(
        kind: ResourceKind,
        intent_id: Uuid,
        verb: &str,
        target_ids: Vec<String>,
        message: String,
    ) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            occurred_at: Utc::now(),
            kind,
            intent_id,
            verb: verb.to_string(),
            target_ids,
            message,
        }
    }
}

list_event!(MutationFailed);

// ============================================================================
// VIEW EVENTS
// ============================================================================

/// Selected rows vanished from the filtered view and were unselected
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectionPruned {
    pub event_id: Uuid,
    pub occurred_at: DateTime<Utc>,
    pub kind: ResourceKind,
    pub removed: Vec<String>,
}

impl SelectionPruned {
    pub fn new(kind: ResourceKind, removed: Vec<String>) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            occurred_at: Utc::now(),
            kind,
            removed,
        }
    }
}

list_event!(SelectionPruned);

/// The current page fell off the end of a shrunken list
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageClamped {
    pub event_id: Uuid,
    pub occurred_at: DateTime<Utc>,
    pub kind: ResourceKind,
    pub from_page: usize,
    pub to_page: usize,
}

impl PageClamped {
    pub fn new(kind: ResourceKind, from_page: usize, to_page: usize) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            occurred_at: Utc::now(),
            kind,
            from_page,
            to_page,
        }
    }
}

list_event!(PageClamped);
