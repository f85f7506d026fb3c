// src/application/mod.rs
//
// Application Layer
//
// ARCHITECTURE:
// - Sits above services: the dashboard context, session and UI boundary
// - Holds the shared dashboard state explicitly; there are no globals
// - Translates controller state into DTOs and AppError into UI responses

pub mod dashboard;
pub mod dto;
pub mod error_handling;
pub mod session;

pub use dashboard::Dashboard;
pub use dto::{BannerDto, FacetDto, MutationStatusDto, PageViewDto, SortDto};
pub use error_handling::{ErrorOrigin, ErrorResponse, ErrorSurface, ErrorType, ToErrorResponse};
pub use session::{Educator, Navigator, SessionContext, LOGIN_ROUTE};
