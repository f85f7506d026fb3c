// src/services/mutation_coordinator.rs
//
// Mutation coordinator
//
// CRITICAL RULES:
// - An intent goes Idle -> Pending -> Idle; nothing in between
// - At most one pending mutation per record; a second one is rejected
//   before the gateway is called
// - Mutations on unrelated records are not serialized
// - A failure keeps its message on the intent and is returned to the caller
// - No automatic retries
//
// Refreshing the collection afterwards is the list controller's job.

use std::collections::HashSet;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::domain::{MutationIntent, MutationKind, ResourceKind};
use crate::error::{AppError, AppResult};
use crate::events::{EventBus, MutationFailed, MutationSucceeded};
use crate::integrations::Notifier;

type InFlight = Arc<Mutex<HashSet<String>>>;

fn lock(set: &InFlight) -> MutexGuard<'_, HashSet<String>> {
    set.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Releases reserved record ids when the mutation ends, however it ends
struct Reservation {
    in_flight: InFlight,
    ids: Vec<String>,
}

impl Drop for Reservation {
    fn drop(&mut self) {
        let mut set = lock(&self.in_flight);
        for id in &self.ids {
            set.remove(id);
        }
    }
}

pub struct MutationCoordinator {
    kind: ResourceKind,
    in_flight: InFlight,
    notifier: Arc<dyn Notifier>,
    event_bus: Arc<EventBus>,
}

impl MutationCoordinator {
    pub fn new(kind: ResourceKind, notifier: Arc<dyn Notifier>, event_bus: Arc<EventBus>) -> Self {
        Self {
            kind,
            in_flight: Arc::new(Mutex::new(HashSet::new())),
            notifier,
            event_bus,
        }
    }

    pub fn is_pending(&self, id: &str) -> bool {
        lock(&self.in_flight).contains(id)
    }

    pub fn pending_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = lock(&self.in_flight).iter().cloned().collect();
        ids.sort();
        ids
    }

    /// Run `call` for `intent`.
    ///
    /// `call` is not polled when a targeted record already has a mutation
    /// pending; the intent gets the rejection as its error instead.
    pub async fn perform<T, Fut>(&self, intent: &mut MutationIntent, call: Fut) -> AppResult<T>
    where
        Fut: Future<Output = AppResult<T>>,
    {
        let _reservation = match self.reserve(&intent.target_ids) {
            Ok(reservation) => reservation,
            Err(busy) => {
                log::warn!("Rejected {} on {}: {}", intent.kind.verb(), self.kind, busy);
                intent.fail(busy.user_message());
                return Err(busy);
            }
        };

        intent.begin();
        self.notifier.loading(&self.progress_message(&intent.kind));

        match call.await {
            Ok(value) => {
                intent.succeed();
                log::info!(
                    "{} {} succeeded ({:?})",
                    self.kind,
                    intent.kind.verb(),
                    intent.target_ids
                );
                self.notifier.success(&self.success_message(intent));
                self.event_bus.emit(MutationSucceeded::new(
                    self.kind,
                    intent.id,
                    intent.kind.verb(),
                    intent.target_ids.clone(),
                ));
                Ok(value)
            }
            Err(error) => {
                let message = error.user_message();
                intent.fail(message.clone());
                log::warn!("{} {} failed: {}", self.kind, intent.kind.verb(), error);
                self.notifier.error(&message);
                self.event_bus.emit(MutationFailed::new(
                    self.kind,
                    intent.id,
                    intent.kind.verb(),
                    intent.target_ids.clone(),
                    message,
                ));
                Err(error)
            }
        }
    }

    /// Reserve every id or none of them
    fn reserve(&self, ids: &[String]) -> AppResult<Reservation> {
        let mut set = lock(&self.in_flight);
        if let Some(busy) = ids.iter().find(|id| set.contains(*id)) {
            return Err(AppError::MutationInProgress(busy.clone()));
        }
        let mut unique = Vec::with_capacity(ids.len());
        for id in ids {
            if set.insert(id.clone()) {
                unique.push(id.clone());
            }
        }
        Ok(Reservation {
            in_flight: Arc::clone(&self.in_flight),
            ids: unique,
        })
    }

    fn progress_message(&self, kind: &MutationKind) -> String {
        let label = self.kind.label();
        match kind {
            MutationKind::Create => format!("Creating {}...", label.to_lowercase()),
            MutationKind::Update => format!("Saving {}...", label.to_lowercase()),
            MutationKind::Delete => format!("Deleting {}...", label.to_lowercase()),
            MutationKind::BulkAssign { .. } => "Assigning...".to_string(),
        }
    }

    fn success_message(&self, intent: &MutationIntent) -> String {
        let label = self.kind.label();
        match &intent.kind {
            MutationKind::Create => format!("{} created", label),
            MutationKind::Update => format!("{} updated", label),
            MutationKind::Delete => format!("{} deleted", label),
            MutationKind::BulkAssign { target } => format!(
                "{} {} assigned to {}",
                intent.target_ids.len(),
                label.to_lowercase(),
                target
            ),
        }
    }
}
