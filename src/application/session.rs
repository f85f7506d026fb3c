// src/application/session.rs
//
// Educator session
//
// RULES:
// - The session is explicit state owned by the dashboard, never a global
// - init / teardown bracket one signed-in educator
// - Pages that need an educator go through `guard`, which redirects to the
//   login route when nobody is signed in

use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[cfg(test)]
use mockall::automock;

use crate::error::{AppError, AppResult};

pub const LOGIN_ROUTE: &str = "/login";

/// The signed-in educator, as the auth backend describes them
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Educator {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    /// Remaining profile fields, kept as sent
    #[serde(flatten)]
    pub profile: Map<String, Value>,
}

impl Educator {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: None,
            email: None,
            profile: Map::new(),
        }
    }

    pub fn with_name(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }

    /// Parse an auth payload (`{ educator: {...} }`, `{ data: {...} }` or the
    /// record itself)
    pub fn from_payload(payload: Value) -> AppResult<Self> {
        let record = match payload {
            Value::Object(mut map) => match map.remove("educator").or_else(|| map.remove("data")) {
                Some(inner @ Value::Object(_)) => inner,
                _ => Value::Object(map),
            },
            other => other,
        };
        let educator: Self = serde_json::from_value(record)?;
        if educator.id.trim().is_empty() {
            return Err(AppError::Unauthenticated);
        }
        Ok(educator)
    }
}

/// Route changes requested by the dashboard
#[cfg_attr(test, automock)]
pub trait Navigator: Send + Sync {
    fn navigate(&self, route: &str);
}

#[derive(Debug, Default)]
pub struct SessionContext {
    educator: RwLock<Option<Educator>>,
}

impl SessionContext {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, Option<Educator>> {
        self.educator
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, Option<Educator>> {
        self.educator
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Sign `educator` in, replacing whoever was signed in
    pub fn init(&self, educator: Educator) {
        log::info!("Session started for educator {}", educator.id);
        if let Some(previous) = self.write().replace(educator) {
            log::debug!("Replaced session of educator {}", previous.id);
        }
    }

    /// Sign out. Returns the educator that was signed in, if any.
    pub fn teardown(&self) -> Option<Educator> {
        let previous = self.write().take();
        if let Some(educator) = &previous {
            log::info!("Session ended for educator {}", educator.id);
        }
        previous
    }

    pub fn current(&self) -> Option<Educator> {
        self.read().clone()
    }

    pub fn is_signed_in(&self) -> bool {
        self.read().is_some()
    }

    pub fn require_educator(&self) -> AppResult<Educator> {
        self.current().ok_or(AppError::Unauthenticated)
    }

    /// The signed-in educator, or a redirect to the login route
    pub fn guard(&self, navigator: &dyn Navigator) -> Option<Educator> {
        let educator = self.current();
        if educator.is_none() {
            log::debug!("No educator signed in; redirecting to {}", LOGIN_ROUTE);
            navigator.navigate(LOGIN_ROUTE);
        }
        educator
    }
}
