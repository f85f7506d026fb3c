// src/services/mod.rs
//
// Services Module - List page orchestration

pub mod debounce;
pub mod filter_sort;
pub mod list_controller;
pub mod mutation_coordinator;
pub mod paginator;

#[cfg(test)]
mod list_controller_tests;

pub use debounce::DebouncedQuery;

pub use filter_sort::{natural_cmp, FilterSortSet};

pub use list_controller::{ControllerOptions, PageView, RefreshOutcome, ResourceListController};

pub use mutation_coordinator::MutationCoordinator;

pub use paginator::{PageSlice, Paginator};
