// src/integrations/envelope.rs
//
// Response envelope normalization
//
// The backend wraps lists differently per endpoint:
//   [ ... ]                      bare array
//   { "<itemsKey>": [ ... ] }    keyed
//   { "data": { ... } }          nested once under `data`
//
// The envelope is resolved here, once, at the boundary. Nothing downstream
// looks at payload shapes again. An unrecognized shape is "no items", never
// an error.

use serde_json::Value;

use crate::domain::ID_FIELD;

const DATA_KEY: &str = "data";
const TOTAL_KEYS: [&str; 3] = ["total", "totalCount", "count"];

/// Envelope shape of a list payload, with its items
#[derive(Debug, Clone, PartialEq)]
pub enum Envelope {
    Bare(Vec<Value>),
    Keyed(Vec<Value>),
    /// Items found one level down, under `data`
    Nested(Vec<Value>),
    Unrecognized,
}

impl Envelope {
    pub fn classify(payload: Value, items_key: &str) -> Self {
        Self::classify_level(payload, items_key).unwrap_or(Envelope::Unrecognized)
    }

    fn classify_level(payload: Value, items_key: &str) -> Option<Self> {
        match payload {
            Value::Array(items) => Some(Envelope::Bare(items)),
            Value::Object(mut map) => {
                if matches!(map.get(items_key), Some(Value::Array(_))) {
                    if let Some(Value::Array(items)) = map.remove(items_key) {
                        return Some(Envelope::Keyed(items));
                    }
                }
                match map.remove(DATA_KEY) {
                    // One level only: `data.data` is not followed.
                    Some(inner) => Self::classify_flat(inner, items_key).map(Envelope::Nested),
                    None => None,
                }
            }
            _ => None,
        }
    }

    fn classify_flat(payload: Value, items_key: &str) -> Option<Vec<Value>> {
        match payload {
            Value::Array(items) => Some(items),
            Value::Object(mut map) => match map.remove(items_key) {
                Some(Value::Array(items)) => Some(items),
                _ => None,
            },
            _ => None,
        }
    }

    pub fn shape(&self) -> &'static str {
        match self {
            Envelope::Bare(_) => "bare",
            Envelope::Keyed(_) => "keyed",
            Envelope::Nested(_) => "nested",
            Envelope::Unrecognized => "unrecognized",
        }
    }

    pub fn into_items(self) -> Vec<Value> {
        match self {
            Envelope::Bare(items) | Envelope::Keyed(items) | Envelope::Nested(items) => items,
            Envelope::Unrecognized => Vec::new(),
        }
    }
}

/// Canonical item list of a list payload
pub fn normalize(payload: Value, items_key: &str) -> Vec<Value> {
    let envelope = Envelope::classify(payload, items_key);
    if envelope == Envelope::Unrecognized {
        log::warn!(
            "List payload has no recognizable '{}' items; treating as empty",
            items_key
        );
    }
    envelope.into_items()
}

/// The single record inside a get-by-id payload.
///
/// Accepts the record itself, `{ data: record }`, or a wrapper with one
/// identified record under any key (`{ test: record }`).
pub fn unwrap_record(payload: Value) -> Option<Value> {
    fn identified(value: &Value) -> bool {
        value.get(ID_FIELD).and_then(Value::as_str).is_some()
    }

    let Value::Object(mut map) = payload else {
        return None;
    };
    if map.get(ID_FIELD).and_then(Value::as_str).is_some() {
        return Some(Value::Object(map));
    }
    if let Some(data) = map.remove(DATA_KEY) {
        if identified(&data) {
            return Some(data);
        }
        if let Value::Object(inner) = data {
            return inner.into_iter().map(|(_, v)| v).find(identified);
        }
        return None;
    }
    map.into_iter().map(|(_, v)| v).find(identified)
}

/// Server-side total of a paginated payload, if the envelope reports one.
///
/// Looks at `total`, `totalCount`, `count` and `pagination.total`, on the
/// payload and under `data`.
pub fn extract_total(payload: &Value) -> Option<usize> {
    fn at_level(map: &serde_json::Map<String, Value>) -> Option<usize> {
        TOTAL_KEYS
            .iter()
            .find_map(|key| map.get(*key).and_then(Value::as_u64))
            .or_else(|| {
                map.get("pagination")
                    .and_then(|p| p.get("total"))
                    .and_then(Value::as_u64)
            })
            .and_then(|n| usize::try_from(n).ok())
    }

    let map = payload.as_object()?;
    at_level(map).or_else(|| map.get(DATA_KEY)?.as_object().and_then(at_level))
}
