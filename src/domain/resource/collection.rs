use std::collections::HashSet;

use serde_json::Value;

use super::entity::Resource;

/// Ordered records of a single resource type.
///
/// Never holds two records with the same identity.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResourceCollection {
    items: Vec<Resource>,
}

impl ResourceCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Accept normalized payload items.
    ///
    /// Items that are not objects with a string `_id` are dropped, and a
    /// repeated identity keeps its first occurrence.
    pub fn from_items(items: Vec<Value>) -> Self {
        let total = items.len();
        let mut seen = HashSet::new();
        let mut accepted = Vec::with_capacity(total);
        let mut duplicates = 0usize;

        for item in items {
            let Some(resource) = Resource::from_value(item) else {
                continue;
            };
            let id = resource.id().unwrap_or_default().to_string();
            if seen.insert(id) {
                accepted.push(resource);
            } else {
                duplicates += 1;
            }
        }

        let unidentified = total - accepted.len() - duplicates;
        if unidentified > 0 {
            log::warn!("Dropped {} records without a string _id", unidentified);
        }
        if duplicates > 0 {
            log::warn!("Dropped {} records with a repeated _id", duplicates);
        }

        Self { items: accepted }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Resource> {
        self.items.iter()
    }

    pub fn as_slice(&self) -> &[Resource] {
        &self.items
    }

    pub fn get(&self, id: &str) -> Option<&Resource> {
        self.items.iter().find(|r| r.id() == Some(id))
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    /// Remove a record by identity. Returns whether anything was removed.
    pub fn remove(&mut self, id: &str) -> bool {
        let before = self.items.len();
        self.items.retain(|r| r.id() != Some(id));
        self.items.len() != before
    }

    pub fn ids(&self) -> Vec<String> {
        self.items
            .iter()
            .filter_map(|r| r.id().map(str::to_string))
            .collect()
    }
}
