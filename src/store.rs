// Copyright 2025 Cowboy AI, LLC.

//! Assignment persistence
//!
//! `update` is the validated, conditional write used for editor changes: it
//! is rejected when the caller's original no longer matches the stored
//! version. `system_update` is the engine's own path; it skips validation and
//! replays only what the patch changed relative to the caller's original onto
//! whatever is stored, so concurrent edits to other fields survive.

use crate::assignment::{Assignment, AssignmentPatch};
use crate::entity::AggregateRoot;
use crate::errors::{AssignmentError, AssignmentResult};
use crate::identifiers::AssignmentId;
use async_trait::async_trait;
use chrono::Utc;
use indexmap::IndexMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

/// Persistence of assignment documents
#[cfg_attr(any(test, feature = "test-utils"), mockall::automock)]
#[async_trait]
pub trait AssignmentStore: Send + Sync {
    /// Load an assignment
    async fn find_one(&self, id: AssignmentId) -> AssignmentResult<Option<Assignment>>;

    /// Insert new assignments
    async fn insert(&self, assignments: Vec<Assignment>) -> AssignmentResult<Vec<AssignmentId>>;

    /// Validated conditional update against `original`
    async fn update(
        &self,
        id: AssignmentId,
        patch: AssignmentPatch,
        original: &Assignment,
    ) -> AssignmentResult<Assignment>;

    /// Privileged update used by the engine itself
    async fn system_update(
        &self,
        id: AssignmentId,
        patch: AssignmentPatch,
        original: &Assignment,
    ) -> AssignmentResult<Assignment>;
}

enum WriteMode<'a> {
    /// Version-checked and validated against the caller's original
    Checked(&'a Assignment),
    /// Changes relative to the original replayed onto the stored document
    Rebased(&'a Assignment),
}

/// In-memory assignment store
#[derive(Clone, Default)]
pub struct InMemoryAssignmentStore {
    documents: Arc<RwLock<IndexMap<AssignmentId, Assignment>>>,
}

impl InMemoryAssignmentStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// All stored assignments in insertion order
    pub async fn all(&self) -> Vec<Assignment> {
        self.documents.read().await.values().cloned().collect()
    }

    /// Number of stored assignments
    pub async fn len(&self) -> usize {
        self.documents.read().await.len()
    }

    /// Whether the store is empty
    pub async fn is_empty(&self) -> bool {
        self.documents.read().await.is_empty()
    }

    async fn write_patch(
        &self,
        id: AssignmentId,
        patch: AssignmentPatch,
        mode: WriteMode<'_>,
    ) -> AssignmentResult<Assignment> {
        let mut documents = self.documents.write().await;
        let stored = documents
            .get(&id)
            .ok_or_else(|| AssignmentError::not_found("Assignment", id))?;

        let mut next = match mode {
            WriteMode::Checked(original) => {
                if stored.version() != original.version() {
                    return Err(AssignmentError::ConcurrencyConflict {
                        id: id.to_string(),
                        expected: original.version(),
                        actual: stored.version(),
                    });
                }
                let next = stored.patched(&patch);
                next.assigned_to.validate()?;
                next
            }
            WriteMode::Rebased(original) => {
                let mut patch = patch;
                if let Some(assigned_to) = patch.assigned_to.take() {
                    patch.assigned_to = Some(assigned_to.rebased(
                        &original.assigned_to,
                        &stored.assigned_to,
                    ));
                }
                stored.patched(&patch)
            }
        };
        next.increment_version();
        next.versioncreated = Utc::now();

        debug!(assignment_id = %id, version = next.version(), "assignment written");
        documents.insert(id, next.clone());
        Ok(next)
    }
}

#[async_trait]
impl AssignmentStore for InMemoryAssignmentStore {
    async fn find_one(&self, id: AssignmentId) -> AssignmentResult<Option<Assignment>> {
        Ok(self.documents.read().await.get(&id).cloned())
    }

    async fn insert(&self, assignments: Vec<Assignment>) -> AssignmentResult<Vec<AssignmentId>> {
        for assignment in &assignments {
            assignment.assigned_to.validate()?;
        }

        let mut documents = self.documents.write().await;
        if let Some(existing) = assignments.iter().find(|a| documents.contains_key(&a.id)) {
            return Err(AssignmentError::validation(
                format!("assignment {}", existing.id),
                "id",
                "Assignment already exists.",
            ));
        }

        let ids = assignments.iter().map(|a| a.id).collect();
        for assignment in assignments {
            documents.insert(assignment.id, assignment);
        }
        Ok(ids)
    }

    async fn update(
        &self,
        id: AssignmentId,
        patch: AssignmentPatch,
        original: &Assignment,
    ) -> AssignmentResult<Assignment> {
        self.write_patch(id, patch, WriteMode::Checked(original)).await
    }

    async fn system_update(
        &self,
        id: AssignmentId,
        patch: AssignmentPatch,
        original: &Assignment,
    ) -> AssignmentResult<Assignment> {
        self.write_patch(id, patch, WriteMode::Rebased(original)).await
    }
}
