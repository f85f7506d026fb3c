// src/repositories/memory_gateway.rs
//
// In-memory gateway for tests and offline runs
//
// Behaves like the REST backend where the controller can observe it:
// server-assigned `_id` and `createdAt`, 404-style rejections for unknown
// records, configurable response envelopes, and `page`/`limit` slicing with
// a reported total. Search and facet params are accepted but not applied.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::Utc;
use serde_json::{json, Value};
use uuid::Uuid;

use super::resource_gateway::{ListParams, ResourceGateway};
use crate::domain::{ResourceKind, ResourceProfile, ID_FIELD};
use crate::error::{AppError, AppResult};

/// How list responses are wrapped
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum EnvelopeStyle {
    Bare,
    #[default]
    Keyed,
    Nested,
}

#[derive(Default)]
pub struct InMemoryGateway {
    records: Mutex<HashMap<ResourceKind, Vec<Value>>>,
    style: EnvelopeStyle,
    pending_failure: Mutex<Option<AppError>>,
    list_calls: AtomicUsize,
    write_calls: AtomicUsize,
}

impl InMemoryGateway {
    pub fn new(style: EnvelopeStyle) -> Self {
        Self {
            style,
            ..Self::default()
        }
    }

    /// Seed records for a kind, replacing what was there
    pub fn seed(&self, kind: ResourceKind, records: Vec<Value>) {
        self.lock_records().insert(kind, records);
    }

    /// Make the next gateway call fail with `error`
    pub fn fail_next(&self, error: AppError) {
        *self
            .pending_failure
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(error);
    }

    pub fn records(&self, kind: ResourceKind) -> Vec<Value> {
        self.lock_records().get(&kind).cloned().unwrap_or_default()
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    pub fn write_calls(&self) -> usize {
        self.write_calls.load(Ordering::SeqCst)
    }

    fn lock_records(&self) -> MutexGuard<'_, HashMap<ResourceKind, Vec<Value>>> {
        self.records
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn take_failure(&self) -> AppResult<()> {
        let failure = self
            .pending_failure
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take();
        match failure {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    fn not_found(profile: &ResourceProfile, id: &str) -> AppError {
        AppError::Gateway {
            status: Some(404),
            message: Some(format!("{} {} not found", profile.kind.label(), id)),
            errors: Vec::new(),
        }
    }

    fn wrap(&self, profile: &ResourceProfile, items: Vec<Value>, total: usize) -> Value {
        match self.style {
            EnvelopeStyle::Bare => Value::Array(items),
            EnvelopeStyle::Keyed => json!({ profile.items_key.as_str(): items, "total": total }),
            EnvelopeStyle::Nested => json!({
                "success": true,
                "data": { profile.items_key.as_str(): items, "total": total }
            }),
        }
    }

    /// Field bulk assignment appends its target to
    fn assignment_field(profile: &ResourceProfile) -> String {
        profile
            .facet_fields
            .iter()
            .find(|f| f.name == "course")
            .map(|f| f.path.trim_end_matches("._id").to_string())
            .unwrap_or_else(|| "assignments".to_string())
    }
}

fn record_id(record: &Value) -> Option<&str> {
    record.get(ID_FIELD).and_then(Value::as_str)
}

#[async_trait]
impl ResourceGateway for InMemoryGateway {
    async fn list(&self, profile: &ResourceProfile, params: &ListParams) -> AppResult<Value> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        self.take_failure()?;

        let all = self.records(profile.kind);
        let total = all.len();
        let items = match (params.page, params.limit) {
            (Some(page), Some(limit)) if limit > 0 => all
                .into_iter()
                .skip(page.saturating_sub(1) * limit)
                .take(limit)
                .collect(),
            _ => all,
        };
        Ok(self.wrap(profile, items, total))
    }

    async fn get_by_id(&self, profile: &ResourceProfile, id: &str) -> AppResult<Value> {
        self.take_failure()?;
        self.records(profile.kind)
            .into_iter()
            .find(|r| record_id(r) == Some(id))
            .ok_or_else(|| Self::not_found(profile, id))
    }

    async fn create(&self, profile: &ResourceProfile, draft: &Value) -> AppResult<Value> {
        self.write_calls.fetch_add(1, Ordering::SeqCst);
        self.take_failure()?;

        let mut record = draft.as_object().cloned().ok_or_else(|| {
            AppError::from_response_body(Some(400), &json!({ "message": "Body must be an object" }))
        })?;
        record.insert(ID_FIELD.to_string(), json!(Uuid::new_v4().simple().to_string()));
        record.insert("createdAt".to_string(), json!(Utc::now().to_rfc3339()));

        let record = Value::Object(record);
        self.lock_records()
            .entry(profile.kind)
            .or_default()
            .push(record.clone());
        Ok(record)
    }

    async fn update(
        &self,
        profile: &ResourceProfile,
        id: &str,
        patch: &Value,
    ) -> AppResult<Value> {
        self.write_calls.fetch_add(1, Ordering::SeqCst);
        self.take_failure()?;

        let mut records = self.lock_records();
        let record = records
            .get_mut(&profile.kind)
            .and_then(|list| list.iter_mut().find(|r| record_id(r) == Some(id)))
            .ok_or_else(|| Self::not_found(profile, id))?;

        if let (Some(target), Some(changes)) = (record.as_object_mut(), patch.as_object()) {
            for (key, value) in changes {
                if key != ID_FIELD {
                    target.insert(key.clone(), value.clone());
                }
            }
            target.insert("updatedAt".to_string(), json!(Utc::now().to_rfc3339()));
        }
        Ok(record.clone())
    }

    async fn delete(&self, profile: &ResourceProfile, id: &str) -> AppResult<()> {
        self.write_calls.fetch_add(1, Ordering::SeqCst);
        self.take_failure()?;

        let mut records = self.lock_records();
        let list = records.entry(profile.kind).or_default();
        let before = list.len();
        list.retain(|r| record_id(r) != Some(id));
        if list.len() == before {
            return Err(Self::not_found(profile, id));
        }
        Ok(())
    }

    async fn bulk_assign(
        &self,
        profile: &ResourceProfile,
        ids: &[String],
        target: &str,
    ) -> AppResult<Value> {
        self.write_calls.fetch_add(1, Ordering::SeqCst);
        self.take_failure()?;

        let field = Self::assignment_field(profile);
        let mut records = self.lock_records();
        let list = records.entry(profile.kind).or_default();
        let mut modified = 0usize;

        for record in list.iter_mut() {
            let selected = record_id(record).is_some_and(|rid| ids.iter().any(|id| id == rid));
            if !selected {
                continue;
            }
            if let Some(map) = record.as_object_mut() {
                let entry = map.entry(field.clone()).or_insert_with(|| json!([]));
                if !entry.is_array() {
                    *entry = json!([entry.clone()]);
                }
                if let Some(values) = entry.as_array_mut() {
                    if !values.iter().any(|v| v.as_str() == Some(target)) {
                        values.push(json!(target));
                    }
                }
                modified += 1;
            }
        }

        Ok(json!({ "modified": modified }))
    }
}
