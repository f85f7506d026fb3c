// src/repositories/resource_gateway.rs
//
// Remote resource gateway contract
//
// RULES:
// - One async call per verb; payloads stay raw JSON
// - Failures come back as AppError (Gateway / Transport)
// - NO envelope sniffing here; that is the normalizer's job
// - NO timeouts beyond what the transport imposes

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

#[cfg(test)]
use mockall::automock;

use crate::domain::{QueryState, ResourceProfile, SortDirection};
use crate::error::AppResult;

/// Optional pagination and filter object sent with list calls
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ListParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    #[serde(flatten)]
    pub facets: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order: Option<SortDirection>,
}

impl ListParams {
    /// Fetch everything; the caller paginates locally.
    pub fn unpaged() -> Self {
        Self::default()
    }

    /// One server page, carrying the current query.
    pub fn for_page(page: usize, limit: usize, query: &QueryState) -> Self {
        let search = query.debounced_text.trim();
        Self {
            page: Some(page),
            limit: Some(limit),
            search: (!search.is_empty()).then(|| search.to_string()),
            facets: query
                .active_facets()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            sort: query.sort_key.clone(),
            order: query.sort_key.as_ref().map(|_| query.sort_direction),
        }
    }

    /// Query-string pairs, in a stable order
    pub fn to_query_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = Vec::new();
        if let Some(page) = self.page {
            pairs.push(("page".to_string(), page.to_string()));
        }
        if let Some(limit) = self.limit {
            pairs.push(("limit".to_string(), limit.to_string()));
        }
        if let Some(search) = &self.search {
            pairs.push(("search".to_string(), search.clone()));
        }
        for (name, value) in &self.facets {
            pairs.push((name.clone(), value.clone()));
        }
        if let Some(sort) = &self.sort {
            pairs.push(("sort".to_string(), sort.clone()));
        }
        if let Some(order) = self.order {
            pairs.push(("order".to_string(), order.as_str().to_string()));
        }
        pairs
    }
}

#[cfg_attr(test, automock)]
#[async_trait]
pub trait ResourceGateway: Send + Sync {
    async fn list(&self, profile: &ResourceProfile, params: &ListParams) -> AppResult<Value>;

    async fn get_by_id(&self, profile: &ResourceProfile, id: &str) -> AppResult<Value>;

    async fn create(&self, profile: &ResourceProfile, draft: &Value) -> AppResult<Value>;

    async fn update(&self, profile: &ResourceProfile, id: &str, patch: &Value)
        -> AppResult<Value>;

    async fn delete(&self, profile: &ResourceProfile, id: &str) -> AppResult<()>;

    /// Attach every record in `ids` to `target` (a course, batch or series)
    async fn bulk_assign(
        &self,
        profile: &ResourceProfile,
        ids: &[String],
        target: &str,
    ) -> AppResult<Value>;
}
