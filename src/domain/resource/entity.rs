use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Field that carries a record's identity on every backend resource
pub const ID_FIELD: &str = "_id";

/// A single dashboard record (test, question, course, student, ...)
///
/// Records are kept as the JSON object the backend returned: every resource
/// type shares one controller, so fields are reached through selectors rather
/// than typed accessors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Resource {
    fields: Map<String, Value>,
}

impl Resource {
    /// Wrap a JSON value. Only objects with a non-empty string `_id` qualify.
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(fields) => {
                let resource = Self { fields };
                resource.id().is_some().then_some(resource)
            }
            _ => None,
        }
    }

    /// Stable identity key
    pub fn id(&self) -> Option<&str> {
        self.fields
            .get(ID_FIELD)
            .and_then(Value::as_str)
            .filter(|id| !id.is_empty())
    }

    /// Resolve a dotted field path (`course.title`).
    ///
    /// Null values count as missing.
    pub fn field(&self, path: &str) -> Option<&Value> {
        let mut segments = path.split('.');
        let first = segments.next()?;
        let mut current = self.fields.get(first)?;
        for segment in segments {
            current = current.as_object()?.get(segment)?;
        }
        (!current.is_null()).then_some(current)
    }

    /// Text rendering of a field used for search and facet matching.
    ///
    /// Arrays are joined with spaces, populated references render their
    /// `title`/`name` and `_id`.
    pub fn field_text(&self, path: &str) -> Option<String> {
        self.field(path).and_then(value_text)
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.fields)
    }
}

pub(crate) fn value_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Array(items) => {
            let parts: Vec<String> = items.iter().filter_map(value_text).collect();
            (!parts.is_empty()).then(|| parts.join(" "))
        }
        Value::Object(map) => {
            let parts: Vec<String> = ["title", "name", ID_FIELD]
                .iter()
                .filter_map(|key| map.get(*key).and_then(value_text))
                .collect();
            (!parts.is_empty()).then(|| parts.join(" "))
        }
    }
}
