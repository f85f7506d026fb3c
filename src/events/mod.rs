// src/events/mod.rs
//
// List controller events - Public API

pub mod bus;
pub mod types;

pub use bus::{EventBus, EventLogEntry};
pub use types::{
    CollectionRefreshed, ListEvent, ListFetchFailed, MutationFailed, MutationSucceeded,
    PageClamped, SelectionPruned, StaleResponseDiscarded,
};
