// Copyright 2025 Cowboy AI, LLC.

//! Collaborator ports
//!
//! The engine reaches desks, content, deliveries, planning, history and the
//! notification bus only through these traits. In-memory implementations
//! live in [`crate::infrastructure`]; unit tests use the mockall mocks.

use crate::assignment::{Assignment, PlanningSnapshot};
use crate::content::{ContentItem, DeliveryRecord};
use crate::errors::AssignmentResult;
use crate::identifiers::{
    AssignmentId, ContentItemId, CoverageId, DeliveryId, DeskId, PlanningId, UserId,
};
use crate::notifications::{Activity, Notification};
use crate::state_machine::TransitionTrigger;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Member of a desk
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeskMember {
    /// The member
    pub user: UserId,
}

/// A desk as returned by the directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Desk {
    /// Desk id
    pub id: DeskId,
    /// Display name
    pub name: String,
    /// Members
    pub members: Vec<DeskMember>,
}

impl Desk {
    /// Ids of all members
    pub fn member_ids(&self) -> Vec<UserId> {
        self.members.iter().map(|m| m.user).collect()
    }
}

/// History entries written for assignments
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HistoryOperation {
    /// Assignment created
    Create,
    /// Desk or user changed
    Reassigned,
    /// Content linked
    ContentLink,
    /// Completed
    Complete,
    /// Availability confirmed
    Confirm,
    /// Availability reverted
    Revert,
    /// Content submitted to another desk
    Submitted,
    /// Cancelled
    Cancelled,
}

impl HistoryOperation {
    /// History entry recorded for a transition
    pub fn for_trigger(trigger: TransitionTrigger) -> Self {
        match trigger {
            TransitionTrigger::Create => HistoryOperation::Create,
            TransitionTrigger::Reassign | TransitionTrigger::LockChange => {
                HistoryOperation::Reassigned
            }
            TransitionTrigger::DeskMove => HistoryOperation::Submitted,
            TransitionTrigger::ContentLink => HistoryOperation::ContentLink,
            TransitionTrigger::Publish | TransitionTrigger::Complete => HistoryOperation::Complete,
            TransitionTrigger::Cancel => HistoryOperation::Cancelled,
            TransitionTrigger::ConfirmAvailability => HistoryOperation::Confirm,
            TransitionTrigger::RevertAvailability => HistoryOperation::Revert,
        }
    }
}

/// Desk lookup
#[cfg_attr(any(test, feature = "test-utils"), mockall::automock)]
#[async_trait]
pub trait DeskDirectory: Send + Sync {
    /// Find a desk by id
    async fn find_one(&self, desk: DeskId) -> AssignmentResult<Option<Desk>>;
}

/// Fire-and-forget notification bus
///
/// Implementations log transport failures instead of returning them.
#[cfg_attr(any(test, feature = "test-utils"), mockall::automock)]
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Publish a notification
    async fn publish(&self, notification: Notification);
}

/// User activity feed
#[cfg_attr(any(test, feature = "test-utils"), mockall::automock)]
#[async_trait]
pub trait ActivityFeed: Send + Sync {
    /// Record an activity and notify its users
    async fn record(&self, activity: Activity) -> AssignmentResult<()>;
}

/// Delivery records
#[cfg_attr(any(test, feature = "test-utils"), mockall::automock)]
#[async_trait]
pub trait DeliveryStore: Send + Sync {
    /// Insert delivery records
    async fn insert_many(&self, records: Vec<DeliveryRecord>) -> AssignmentResult<Vec<DeliveryId>>;

    /// Any delivery for an assignment
    async fn find_one_by_assignment(
        &self,
        assignment: AssignmentId,
    ) -> AssignmentResult<Option<DeliveryRecord>>;
}

/// Assignment history
#[cfg_attr(any(test, feature = "test-utils"), mockall::automock)]
#[async_trait]
pub trait HistoryLog: Send + Sync {
    /// Record a lifecycle operation
    async fn record(&self, operation: HistoryOperation, assignment: &Assignment) -> AssignmentResult<()>;

    /// Record that content items were linked to an assignment
    async fn record_content_link(
        &self,
        item_ids: &[ContentItemId],
        assignment: &Assignment,
    ) -> AssignmentResult<()>;
}

/// Planning and coverage access
#[cfg_attr(any(test, feature = "test-utils"), mockall::automock)]
#[async_trait]
pub trait PlanningStore: Send + Sync {
    /// Re-publish a planning item so consumers see new linkage
    async fn republish(&self, planning: PlanningId) -> AssignmentResult<()>;

    /// Current planning block of a coverage
    async fn coverage_planning(
        &self,
        planning: PlanningId,
        coverage: CoverageId,
    ) -> AssignmentResult<Option<PlanningSnapshot>>;
}

/// Content item access
#[cfg_attr(any(test, feature = "test-utils"), mockall::automock)]
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Find a content item
    async fn find_one(&self, item: ContentItemId) -> AssignmentResult<Option<ContentItem>>;

    /// All items in the rewrite chain of `item`, including itself
    async fn find_related(&self, item: ContentItemId) -> AssignmentResult<Vec<ContentItem>>;

    /// Stamp the assignment reference on an item
    ///
    /// Conditional: fails with a validation error when the item already
    /// references an assignment, so only one link can claim it.
    async fn set_assignment(
        &self,
        item: ContentItemId,
        assignment: AssignmentId,
    ) -> AssignmentResult<()>;
}
