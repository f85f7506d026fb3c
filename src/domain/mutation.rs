use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum MutationKind {
    Create,
    Update,
    Delete,
    /// Assign several records to one target (course, batch, series)
    BulkAssign { target: String },
}

impl MutationKind {
    pub fn verb(&self) -> &'static str {
        match self {
            MutationKind::Create => "create",
            MutationKind::Update => "update",
            MutationKind::Delete => "delete",
            MutationKind::BulkAssign { .. } => "bulk-assign",
        }
    }
}

/// Lifecycle of one intent: `Idle -> Pending -> Idle`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MutationPhase {
    #[default]
    Idle,
    Pending,
}

/// What a dialog is trying to do, and how the last attempt went.
///
/// The dialog keeps the intent across attempts; a failure leaves `error` set
/// so it can be shown until the user resubmits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MutationIntent {
    pub id: Uuid,
    pub kind: MutationKind,
    pub target_ids: Vec<String>,
    pub phase: MutationPhase,
    pub error: Option<String>,
}

impl MutationIntent {
    fn new(kind: MutationKind, target_ids: Vec<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            target_ids,
            phase: MutationPhase::Idle,
            error: None,
        }
    }

    pub fn create() -> Self {
        Self::new(MutationKind::Create, Vec::new())
    }

    pub fn update(id: impl Into<String>) -> Self {
        Self::new(MutationKind::Update, vec![id.into()])
    }

    pub fn delete(id: impl Into<String>) -> Self {
        Self::new(MutationKind::Delete, vec![id.into()])
    }

    pub fn bulk_assign(ids: Vec<String>, target: impl Into<String>) -> Self {
        Self::new(
            MutationKind::BulkAssign {
                target: target.into(),
            },
            ids,
        )
    }

    /// Single targeted record, for create/update/delete
    pub fn target_id(&self) -> Option<&str> {
        match self.target_ids.as_slice() {
            [only] => Some(only.as_str()),
            _ => None,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.phase == MutationPhase::Pending
    }

    pub(crate) fn begin(&mut self) {
        self.phase = MutationPhase::Pending;
    }

    pub(crate) fn succeed(&mut self) {
        self.phase = MutationPhase::Idle;
        self.error = None;
    }

    /// Back to idle with `message` kept for the dialog
    pub(crate) fn fail(&mut self, message: String) {
        self.phase = MutationPhase::Idle;
        self.error = Some(message);
    }
}
