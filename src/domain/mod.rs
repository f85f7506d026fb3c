// src/domain/mod.rs
//
// Domain Root - pure list-page types and their invariants
//
// Nothing in here performs I/O or knows about the gateway.

// ============================================================================
// MODULE DECLARATIONS
// ============================================================================

pub mod mutation;
pub mod page;
pub mod query;
pub mod resource;

// ============================================================================
// PUBLIC API RE-EXPORTS
// ============================================================================

pub use mutation::{MutationIntent, MutationKind, MutationPhase};
pub use page::PageState;
pub use query::{QueryState, SortDirection, ALL_FACET_VALUE};
pub use resource::{
    validate_draft, validate_patch, FacetField, Resource, ResourceCollection, ResourceKind,
    ResourceProfile, SortField, SortKind, ID_FIELD,
};

// ============================================================================
// DOMAIN ERROR TYPES
// ============================================================================

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Invariant violation: {0}")]
    InvariantViolation(String),

    #[error("{0} is required")]
    MissingField(String),

    #[error("Unknown resource kind: {0}")]
    UnknownResourceKind(String),
}

pub type DomainResult<T> = Result<T, DomainError>;
