pub mod collection;
pub mod entity;
pub mod invariants;
pub mod profile;

pub use collection::ResourceCollection;
pub use entity::{Resource, ID_FIELD};
pub use invariants::{validate_draft, validate_patch};
pub use profile::{FacetField, ResourceKind, ResourceProfile, SortField, SortKind};
