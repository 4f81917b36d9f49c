// Copyright 2025 Cowboy AI, LLC.

//! Aggregate root contract

/// Marker trait for aggregate roots
///
/// Aggregate roots are the entry points for modifying aggregates. The
/// version is what conditional writes are checked against.
///
/// # Examples
///
/// ```rust
/// use cim_domain_assignment::{AggregateRoot, AssignmentDraft, PlanningId, CoverageId};
///
/// let draft = AssignmentDraft::new(PlanningId::new(), CoverageId::new());
/// let mut assignment = draft.into_assignment(
///     cim_domain_assignment::AssignedTo::default(),
///     None,
///     chrono::Utc::now(),
/// );
/// assert_eq!(assignment.version(), 0);
/// assignment.increment_version();
/// assert_eq!(assignment.version(), 1);
/// ```
pub trait AggregateRoot: Sized {
    /// The type of ID for this aggregate
    type Id: Copy + Eq + Send + Sync;

    /// Get the aggregate's ID
    fn id(&self) -> Self::Id;

    /// Get the aggregate's version for optimistic concurrency
    fn version(&self) -> u64;

    /// Increment the version
    fn increment_version(&mut self);
}
