// src/application/dto/mod.rs
//
// Data Transfer Objects
//
// CRITICAL PRINCIPLES:
// - DTOs are render-ready: labels and counts are computed here, once
// - DTOs are simple, serializable structs
// - Conversion FROM controller and domain types only (never TO)

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::{MutationIntent, SortDirection};
use crate::services::PageView;

// ============================================================================
// LIST PAGE DTOs
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageViewDto {
    pub kind: String,
    pub label: String,
    pub rows: Vec<Value>,
    pub current_page: usize,
    pub total_pages: usize,
    pub total_items: usize,
    /// "Showing 11-20 of 42", or "No results"
    pub showing: String,
    pub can_go_back: bool,
    pub can_go_forward: bool,
    pub search: String,
    pub facets: Vec<FacetDto>,
    pub sort: Option<SortDto>,
    pub selected: Vec<String>,
    pub loading: bool,
    pub banner: Option<BannerDto>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FacetDto {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortDto {
    pub key: String,
    pub direction: SortDirection,
}

/// Inline load-error banner with a retry action
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BannerDto {
    pub message: String,
    pub retry: bool,
}

pub fn showing_label(display_range: (usize, usize), total_items: usize) -> String {
    match display_range {
        (0, _) => "No results".to_string(),
        (start, end) => format!("Showing {}-{} of {}", start, end, total_items),
    }
}

impl From<PageView> for PageViewDto {
    fn from(view: PageView) -> Self {
        let facets = view
            .query
            .active_facets()
            .map(|(name, value)| FacetDto {
                name: name.to_string(),
                value: value.to_string(),
            })
            .collect();
        let sort = view.query.sort_key.clone().map(|key| SortDto {
            key,
            direction: view.query.sort_direction,
        });

        Self {
            kind: view.kind.as_str().to_string(),
            label: view.kind.label().to_string(),
            rows: view.items.into_iter().map(|r| r.into_value()).collect(),
            current_page: view.current_page,
            total_pages: view.total_pages,
            total_items: view.total_items,
            showing: showing_label(view.display_range, view.total_items),
            can_go_back: view.current_page > 1,
            can_go_forward: view.current_page < view.total_pages,
            search: view.query.raw_text,
            facets,
            sort,
            selected: view.selected,
            loading: view.loading,
            banner: view.error.map(|message| BannerDto {
                message,
                retry: true,
            }),
        }
    }
}

// ============================================================================
// MUTATION DTOs
// ============================================================================

/// State of a dialog's mutation for the submit button and error line
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MutationStatusDto {
    pub intent_id: String,
    pub action: String,
    pub target_ids: Vec<String>,
    pub submitting: bool,
    pub error: Option<String>,
}

impl From<&MutationIntent> for MutationStatusDto {
    fn from(intent: &MutationIntent) -> Self {
        Self {
            intent_id: intent.id.to_string(),
            action: intent.kind.verb().to_string(),
            target_ids: intent.target_ids.clone(),
            submitting: intent.is_pending(),
            error: intent.error.clone(),
        }
    }
}
