// src/lib.rs
// EduHub - Educator dashboard list pages
//
// Architecture:
// - Domain-centric: records, queries, pages and mutation intents are pure types
// - Gateway-driven: every list and mutation goes through ResourceGateway
// - Explicit: one controller per list page, owned by the dashboard context
// - Latest-wins: only the newest issued fetch may replace a snapshot

// ============================================================================
// FOUNDATION
// ============================================================================

pub mod config;
pub mod domain;
pub mod error;
pub mod events;
pub mod repositories;
pub mod services;

// ============================================================================
// BOUNDARY + APPLICATION LAYER
// ============================================================================

pub mod application;
pub mod integrations;

// ============================================================================
// PUBLIC API - Domain
// ============================================================================

pub use domain::{
    validate_draft,
    validate_patch,
    DomainError,
    FacetField,
    MutationIntent,
    MutationKind,
    MutationPhase,
    PageState,
    QueryState,
    Resource,
    ResourceCollection,
    ResourceKind,
    ResourceProfile,
    SortDirection,
    SortField,
    SortKind,
};

// ============================================================================
// PUBLIC API - Error Types
// ============================================================================

pub use error::{AppError, AppResult, FALLBACK_MESSAGE};

// ============================================================================
// PUBLIC API - Configuration
// ============================================================================

pub use config::{DashboardConfig, PaginationMode};

// ============================================================================
// PUBLIC API - Events
// ============================================================================

pub use events::{
    CollectionRefreshed,
    EventBus,
    EventLogEntry,
    ListEvent,
    ListFetchFailed,
    MutationFailed,
    MutationSucceeded,
    PageClamped,
    SelectionPruned,
    StaleResponseDiscarded,
};

// ============================================================================
// PUBLIC API - Gateways
// ============================================================================

pub use repositories::{EnvelopeStyle, InMemoryGateway, ListParams, ResourceGateway};

pub use integrations::{normalize, Envelope, LogNotifier, Notifier, RestGateway};

// ============================================================================
// PUBLIC API - Services
// ============================================================================

pub use services::{
    ControllerOptions,
    DebouncedQuery,
    FilterSortSet,
    MutationCoordinator,
    PageSlice,
    PageView,
    Paginator,
    RefreshOutcome,
    ResourceListController,
};

// ============================================================================
// PUBLIC API - Application Layer
// ============================================================================

pub use application::{Dashboard, Educator, ErrorResponse, Navigator, PageViewDto, SessionContext};
