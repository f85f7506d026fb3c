use std::sync::OnceLock;

use regex::Regex;
use serde_json::Value;

use super::entity::value_text;
use super::profile::{ResourceKind, ResourceProfile};
use crate::domain::{DomainError, DomainResult};

fn email_pattern() -> &'static Regex {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    EMAIL.get_or_init(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email pattern"))
}

/// Client-side checks on a create draft, run before the gateway is called.
pub fn validate_draft(profile: &ResourceProfile, draft: &Value) -> DomainResult<()> {
    let fields = draft.as_object().ok_or_else(|| {
        DomainError::InvariantViolation(format!("{} draft must be an object", profile.kind.label()))
    })?;

    for required in &profile.required_fields {
        let present = fields
            .get(required)
            .and_then(value_text)
            .is_some_and(|text| !text.trim().is_empty());
        if !present {
            return Err(DomainError::MissingField(required.clone()));
        }
    }

    validate_shared_fields(profile.kind, fields)
}

/// Checks on an update patch: only fields that are present are validated,
/// and a required field may not be blanked.
pub fn validate_patch(profile: &ResourceProfile, patch: &Value) -> DomainResult<()> {
    let fields = patch.as_object().ok_or_else(|| {
        DomainError::InvariantViolation(format!("{} update must be an object", profile.kind.label()))
    })?;

    for required in &profile.required_fields {
        if let Some(value) = fields.get(required) {
            let blank = value_text(value).map_or(true, |text| text.trim().is_empty());
            if blank {
                return Err(DomainError::MissingField(required.clone()));
            }
        }
    }

    validate_shared_fields(profile.kind, fields)
}

fn validate_shared_fields(
    kind: ResourceKind,
    fields: &serde_json::Map<String, Value>,
) -> DomainResult<()> {
    if kind == ResourceKind::Student {
        if let Some(email) = fields.get("email").and_then(Value::as_str) {
            if !email_pattern().is_match(email.trim()) {
                return Err(DomainError::InvariantViolation(format!(
                    "'{}' is not a valid email address",
                    email
                )));
            }
        }
    }

    for numeric in ["price", "duration", "totalMarks", "marks"] {
        if let Some(n) = fields.get(numeric).and_then(Value::as_f64) {
            if n < 0.0 {
                return Err(DomainError::InvariantViolation(format!(
                    "{} cannot be negative",
                    numeric
                )));
            }
        }
    }

    Ok(())
}
