// src/services/filter_sort.rs
//
// Filter/sort predicate set
//
// Applied in a fixed order:
// 1. facet equality (cheap, usually the most selective)
// 2. free-text match over the profile's searchable fields
// 3. stable sort by the selected key
//
// Records missing a faceted field never match a selected facet value.
// Records missing the sort field go last in both directions.

use std::cmp::Ordering;

use chrono::{DateTime, NaiveDate, Utc};
use serde_json::Value;

use crate::domain::{
    QueryState, Resource, ResourceProfile, SortDirection, SortField, SortKind, ID_FIELD,
};

/// Comparable value extracted from a record's sort field
#[derive(Debug, Clone, PartialEq)]
enum SortValue {
    Text(String),
    Number(f64),
    Date(DateTime<Utc>),
}

pub struct FilterSortSet<'a> {
    profile: &'a ResourceProfile,
}

impl<'a> FilterSortSet<'a> {
    pub fn new(profile: &'a ResourceProfile) -> Self {
        Self { profile }
    }

    /// Filter then sort `records` for `query`
    pub fn apply(&self, records: &[Resource], query: &QueryState) -> Vec<Resource> {
        let mut kept: Vec<Resource> = records
            .iter()
            .filter(|r| self.matches_facets(r, query))
            .filter(|r| self.matches_text(r, &query.debounced_text))
            .cloned()
            .collect();

        if let Some(key) = &query.sort_key {
            self.sort(&mut kept, key, query.sort_direction);
        }
        kept
    }

    pub fn matches_facets(&self, record: &Resource, query: &QueryState) -> bool {
        query.active_facets().all(|(facet, selected)| {
            record
                .field(self.profile.facet_path(facet))
                .is_some_and(|value| facet_matches(value, selected))
        })
    }

    /// Empty (or blank) text keeps everything
    pub fn matches_text(&self, record: &Resource, text: &str) -> bool {
        let needle = text.trim().to_lowercase();
        if needle.is_empty() {
            return true;
        }
        let haystack = self
            .profile
            .searchable_fields
            .iter()
            .filter_map(|path| record.field_text(path))
            .collect::<Vec<_>>()
            .join(" ")
            .to_lowercase();
        haystack.contains(&needle)
    }

    /// Stable sort. `Desc` flips the comparator, not the output, so equal
    /// keys keep their input order either way.
    pub fn sort(&self, records: &mut Vec<Resource>, key: &str, direction: SortDirection) {
        let field = self
            .profile
            .sort_field(key)
            .cloned()
            .unwrap_or_else(|| SortField::new(key, SortKind::Text));

        let mut keyed: Vec<(Option<SortValue>, Resource)> = records
            .drain(..)
            .map(|r| (sort_value(&r, &field), r))
            .collect();

        keyed.sort_by(|(a, _), (b, _)| compare_sort_values(a.as_ref(), b.as_ref(), direction));
        records.extend(keyed.into_iter().map(|(_, r)| r));
    }
}

/// A field "contains" the selected value when it equals it, lists it as an
/// array element, or lists it in a comma-separated string. Never a substring.
fn facet_matches(value: &Value, selected: &str) -> bool {
    let selected = selected.trim().to_lowercase();
    match value {
        Value::String(s) => s
            .split(',')
            .any(|part| part.trim().to_lowercase() == selected),
        Value::Number(n) => n.to_string() == selected,
        Value::Bool(b) => b.to_string() == selected,
        Value::Array(items) => items.iter().any(|item| facet_matches(item, &selected)),
        // A populated reference matches on its identity or its display name
        Value::Object(map) => [ID_FIELD, "title", "name"]
            .iter()
            .filter_map(|key| map.get(*key))
            .any(|v| !v.is_object() && facet_matches(v, &selected)),
        Value::Null => false,
    }
}

fn sort_value(record: &Resource, field: &SortField) -> Option<SortValue> {
    let value = record.field(&field.path)?;
    match field.kind {
        SortKind::Text => record.field_text(&field.path).map(SortValue::Text),
        SortKind::Numeric => match value {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        }
        .filter(|n| n.is_finite())
        .map(SortValue::Number),
        SortKind::Date => value.as_str().and_then(parse_date).map(SortValue::Date),
    }
}

fn parse_date(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
                .map(|naive| naive.and_utc())
        })
}

fn compare_sort_values(
    a: Option<&SortValue>,
    b: Option<&SortValue>,
    direction: SortDirection,
) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => {
            let ordering = match (a, b) {
                (SortValue::Text(a), SortValue::Text(b)) => natural_cmp(a, b),
                (SortValue::Number(a), SortValue::Number(b)) => a.total_cmp(b),
                (SortValue::Date(a), SortValue::Date(b)) => a.cmp(b),
                _ => Ordering::Equal,
            };
            match direction {
                SortDirection::Asc => ordering,
                SortDirection::Desc => ordering.reverse(),
            }
        }
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Case-insensitive ordering that compares digit runs by value
/// ("Ch2" < "Ch10"). Ties fall back to a plain comparison.
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    let a_lower = a.to_lowercase();
    let b_lower = b.to_lowercase();
    let mut left = Chunks::new(&a_lower);
    let mut right = Chunks::new(&b_lower);

    loop {
        match (left.next(), right.next()) {
            (None, None) => return a.cmp(b),
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(l), Some(r)) => {
                let ordering = match (is_digits(l), is_digits(r)) {
                    (true, true) => compare_digit_runs(l, r),
                    _ => l.cmp(r),
                };
                if ordering != Ordering::Equal {
                    return ordering;
                }
            }
        }
    }
}

fn is_digits(chunk: &str) -> bool {
    chunk.starts_with(|c: char| c.is_ascii_digit())
}

fn compare_digit_runs(a: &str, b: &str) -> Ordering {
    let a = a.trim_start_matches('0');
    let b = b.trim_start_matches('0');
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}

/// Alternating runs of ASCII digits and everything else
struct Chunks<'s> {
    rest: &'s str,
}

impl<'s> Chunks<'s> {
    fn new(s: &'s str) -> Self {
        Self { rest: s }
    }
}

impl<'s> Iterator for Chunks<'s> {
    type Item = &'s str;

    fn next(&mut self) -> Option<Self::Item> {
        let first = self.rest.chars().next()?;
        let digits = first.is_ascii_digit();
        let end = self
            .rest
            .char_indices()
            .find(|(_, c)| c.is_ascii_digit() != digits)
            .map_or(self.rest.len(), |(i, _)| i);
        let (chunk, rest) = self.rest.split_at(end);
        self.rest = rest;
        Some(chunk)
    }
}
