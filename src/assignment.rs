// Copyright 2025 Cowboy AI, LLC.

//! Assignment aggregate
//!
//! An assignment binds one planned coverage slot to a desk, a user on that
//! desk, or an external coverage provider, and tracks the work through its
//! workflow states. The coverage and planning entities are owned elsewhere;
//! the assignment keeps references plus a denormalized [`PlanningSnapshot`].

use crate::entity::AggregateRoot;
use crate::errors::{AssignmentError, AssignmentResult};
use crate::identifiers::{
    AssignmentId, ContentItemId, CoverageId, DeskId, PlanningId, UserId, UserRef,
};
use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Workflow state of an assignment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum AssignmentState {
    /// Handed to a desk/user, no content yet
    Assigned,
    /// Content moved onto the assignment's desk for review
    Submitted,
    /// Content linked but not yet published
    InProgress,
    /// Content published, or availability confirmed
    Completed,
    /// Coverage cancelled; the record stays for audit
    Cancelled,
}

impl AssignmentState {
    /// All states in workflow order
    pub const ALL: [AssignmentState; 5] = [
        AssignmentState::Assigned,
        AssignmentState::Submitted,
        AssignmentState::InProgress,
        AssignmentState::Completed,
        AssignmentState::Cancelled,
    ];

    /// Wire name of the state
    pub fn name(&self) -> &'static str {
        match self {
            AssignmentState::Assigned => "assigned",
            AssignmentState::Submitted => "submitted",
            AssignmentState::InProgress => "in_progress",
            AssignmentState::Completed => "completed",
            AssignmentState::Cancelled => "cancelled",
        }
    }

    /// Terminal for the normal content-driven flow
    pub fn is_terminal(&self) -> bool {
        matches!(self, AssignmentState::Completed | AssignmentState::Cancelled)
    }

    /// Check if a transition to the target state is part of the state graph
    ///
    /// Staying in the same state is always allowed (an idempotent write).
    /// `Completed -> Assigned` is the revert edge, any live state may be
    /// cancelled and publishing completes even a cancelled assignment.
    /// Everything else only moves forward.
    pub fn can_transition_to(&self, target: AssignmentState) -> bool {
        use AssignmentState::*;

        if *self == target {
            return true;
        }

        matches!(
            (*self, target),
            (Assigned, Submitted)
                | (Assigned, InProgress)
                | (Assigned, Completed)
                | (Submitted, InProgress)
                | (Submitted, Completed)
                | (InProgress, Submitted)
                | (InProgress, Completed)
                | (Assigned | Submitted | InProgress | Completed, Cancelled)
                | (Completed, Assigned)
                | (Cancelled, Completed)
        )
    }

    /// List group this state is shown under
    pub fn list_group(&self) -> AssignmentListGroup {
        AssignmentListGroup::for_state(*self)
    }
}

impl fmt::Display for AssignmentState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Buckets assignments are listed in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssignmentListGroup {
    /// Waiting to be worked on
    ToDo,
    /// Content is being produced
    InProgress,
    /// Finished one way or another
    Completed,
}

impl AssignmentListGroup {
    /// Group for a workflow state
    pub fn for_state(state: AssignmentState) -> Self {
        match state {
            AssignmentState::Assigned | AssignmentState::Submitted => AssignmentListGroup::ToDo,
            AssignmentState::InProgress => AssignmentListGroup::InProgress,
            AssignmentState::Completed | AssignmentState::Cancelled => {
                AssignmentListGroup::Completed
            }
        }
    }

    /// States listed in this group
    pub fn states(&self) -> &'static [AssignmentState] {
        match self {
            AssignmentListGroup::ToDo => &[AssignmentState::Assigned, AssignmentState::Submitted],
            AssignmentListGroup::InProgress => &[AssignmentState::InProgress],
            AssignmentListGroup::Completed => {
                &[AssignmentState::Completed, AssignmentState::Cancelled]
            }
        }
    }
}

/// External provider fulfilling a coverage instead of a staff user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct CoverageProvider {
    /// Provider code
    pub qcode: String,
    /// Display name
    pub name: String,
}

/// Coverage status vocabulary entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct NewsCoverageStatus {
    /// Status code, e.g. `ncostat:int`
    pub qcode: String,
    /// Display name
    #[serde(default)]
    pub name: Option<String>,
}

/// Copy of a coverage's planning block taken at the time of an assignment change
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct PlanningSnapshot {
    /// Story slugline
    #[serde(default)]
    pub slugline: Option<String>,
    /// Content type of the planned output (text, picture, ...)
    #[serde(default)]
    pub g2_content_type: Option<String>,
    /// Editorial note
    #[serde(default)]
    pub ednote: Option<String>,
    /// When the coverage is due
    #[serde(default)]
    pub scheduled: Option<DateTime<Utc>>,
    /// Status of the coverage at snapshot time
    #[serde(default)]
    pub news_coverage_status: Option<NewsCoverageStatus>,
}

/// Who an assignment is currently with
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Assignee {
    /// Nobody yet
    Unassigned,
    /// A desk queue, no specific person
    Desk(DeskId),
    /// A user, normally on a desk
    User {
        /// Desk the user works the assignment from
        desk: Option<DeskId>,
        /// The user (or a provider code stored in the user slot)
        user: UserRef,
    },
    /// An external coverage provider
    Provider {
        /// Desk handling the provider's delivery, if any
        desk: Option<DeskId>,
        /// The provider
        provider: CoverageProvider,
    },
}

/// The embedded `assigned_to` block of an assignment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct AssignedTo {
    /// Desk the assignment is queued on
    #[serde(default)]
    pub desk: Option<DeskId>,
    /// Assigned user or provider code
    #[serde(default)]
    pub user: Option<UserRef>,
    /// Who put the assignment on its current desk
    #[serde(default)]
    pub assignor_desk: Option<UserId>,
    /// Who gave the assignment to its current user
    #[serde(default)]
    pub assignor_user: Option<UserId>,
    /// When the desk last changed
    #[serde(default)]
    pub assigned_date_desk: Option<DateTime<Utc>>,
    /// When the user last changed
    #[serde(default)]
    pub assigned_date_user: Option<DateTime<Utc>>,
    /// Workflow state
    pub state: AssignmentState,
    /// External provider, when the assignee is not a staff user
    #[serde(default)]
    pub coverage_provider: Option<CoverageProvider>,
    /// Content items linked to the assignment
    #[serde(default)]
    pub item_ids: Vec<ContentItemId>,
}

impl Default for AssignedTo {
    fn default() -> Self {
        Self {
            desk: None,
            user: None,
            assignor_desk: None,
            assignor_user: None,
            assigned_date_desk: None,
            assigned_date_user: None,
            state: AssignmentState::Assigned,
            coverage_provider: None,
            item_ids: Vec::new(),
        }
    }
}

impl AssignedTo {
    /// The current assignee
    pub fn assignee(&self) -> Assignee {
        if let Some(provider) = &self.coverage_provider {
            return Assignee::Provider {
                desk: self.desk,
                provider: provider.clone(),
            };
        }

        match (&self.user, self.desk) {
            (Some(user), desk) => Assignee::User {
                desk,
                user: user.clone(),
            },
            (None, Some(desk)) => Assignee::Desk(desk),
            (None, None) => Assignee::Unassigned,
        }
    }

    /// Enforce that a user assignment always has a desk
    pub fn validate(&self) -> AssignmentResult<()> {
        if self.user.is_some() && self.desk.is_none() {
            return Err(AssignmentError::validation(
                "assignment",
                "assigned_to.desk",
                "Assignment should have a desk.",
            ));
        }
        Ok(())
    }

    /// Whether desk or user differ from `other`
    pub fn assignee_differs(&self, other: &AssignedTo) -> bool {
        self.desk != other.desk || self.user != other.user
    }

    /// Replay the changes this block makes to `original` on top of `stored`
    ///
    /// Desk and user move as groups together with their assignor and date.
    /// Groups this block left as they were in `original` keep their stored
    /// value, and linked items are merged rather than replaced.
    pub fn rebased(&self, original: &AssignedTo, stored: &AssignedTo) -> AssignedTo {
        let mut next = stored.clone();

        if self.desk != original.desk
            || self.assignor_desk != original.assignor_desk
            || self.assigned_date_desk != original.assigned_date_desk
        {
            next.desk = self.desk;
            next.assignor_desk = self.assignor_desk;
            next.assigned_date_desk = self.assigned_date_desk;
        }
        if self.user != original.user
            || self.assignor_user != original.assignor_user
            || self.assigned_date_user != original.assigned_date_user
        {
            next.user = self.user.clone();
            next.assignor_user = self.assignor_user;
            next.assigned_date_user = self.assigned_date_user;
        }
        if self.state != original.state {
            next.state = self.state;
        }
        if self.coverage_provider != original.coverage_provider {
            next.coverage_provider = self.coverage_provider.clone();
        }

        next.item_ids
            .retain(|id| self.item_ids.contains(id) || !original.item_ids.contains(id));
        for id in &self.item_ids {
            if !next.item_ids.contains(id) {
                next.item_ids.push(*id);
            }
        }
        next
    }
}

/// The assignment aggregate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Assignment {
    /// Unique identifier
    pub id: AssignmentId,
    /// Coverage slot this assignment fulfils
    pub coverage_item: CoverageId,
    /// Planning item owning the coverage
    pub planning_item: PlanningId,
    /// Assignee and workflow state
    pub assigned_to: AssignedTo,
    /// Planning block as of the last assignment change
    #[serde(default)]
    pub planning: PlanningSnapshot,
    /// User who created the assignment
    #[serde(default)]
    pub original_creator: Option<UserId>,
    /// User who last changed the assignment
    #[serde(default)]
    pub version_creator: Option<UserId>,
    /// Creation time
    pub firstcreated: DateTime<Utc>,
    /// Last change time
    pub versioncreated: DateTime<Utc>,
    /// Document version for conditional writes
    #[serde(default)]
    pub version: u64,
}

impl AggregateRoot for Assignment {
    type Id = AssignmentId;

    fn id(&self) -> Self::Id {
        self.id
    }

    fn version(&self) -> u64 {
        self.version
    }

    fn increment_version(&mut self) {
        self.version += 1;
    }
}

impl Assignment {
    /// Current workflow state
    pub fn state(&self) -> AssignmentState {
        self.assigned_to.state
    }

    /// Whether the assignment was cancelled
    pub fn is_cancelled(&self) -> bool {
        self.state() == AssignmentState::Cancelled
    }

    /// Whether the assignment is completed
    pub fn is_completed(&self) -> bool {
        self.state() == AssignmentState::Completed
    }

    /// Only work in progress can be explicitly completed
    pub fn can_complete(&self) -> bool {
        self.state() == AssignmentState::InProgress
    }

    /// Whether the assignment can still be edited at all
    pub fn can_edit(&self) -> bool {
        !self.is_cancelled() && !self.is_completed()
    }

    /// Whether desk/user may still be changed by an editor
    pub fn can_edit_assigned_to(&self) -> bool {
        self.can_edit() && self.state() != AssignmentState::InProgress
    }

    /// User who is responsible for the latest version
    pub fn last_actor(&self) -> Option<UserId> {
        self.version_creator.or(self.original_creator)
    }

    /// Copy of this assignment with `patch` applied
    pub fn patched(&self, patch: &AssignmentPatch) -> Assignment {
        let mut next = self.clone();
        if let Some(assigned_to) = &patch.assigned_to {
            next.assigned_to = assigned_to.clone();
        }
        if let Some(planning) = &patch.planning {
            next.planning = planning.clone();
        }
        if patch.version_creator.is_some() {
            next.version_creator = patch.version_creator;
        }
        next
    }
}

/// Partial update of an assignment as handed to the store
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AssignmentPatch {
    /// Replacement `assigned_to` block
    pub assigned_to: Option<AssignedTo>,
    /// Replacement planning snapshot
    pub planning: Option<PlanningSnapshot>,
    /// Author of the change
    pub version_creator: Option<UserId>,
}

impl AssignmentPatch {
    /// Patch replacing the `assigned_to` block
    pub fn assigned_to(assigned_to: AssignedTo) -> Self {
        Self {
            assigned_to: Some(assigned_to),
            ..Default::default()
        }
    }

    /// Also replace the planning snapshot
    pub fn with_planning(mut self, planning: PlanningSnapshot) -> Self {
        self.planning = Some(planning);
        self
    }

    /// Record the author of the change
    pub fn by(mut self, author: Option<UserId>) -> Self {
        self.version_creator = author;
        self
    }
}

/// Desk/user/provider an editor wants the assignment to be with
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AssigneeProposal {
    /// Proposed desk
    pub desk: Option<DeskId>,
    /// Proposed user or provider code
    pub user: Option<UserRef>,
    /// Proposed external provider
    pub coverage_provider: Option<CoverageProvider>,
    /// Explicit state, used when restoring an assignment
    pub state: Option<AssignmentState>,
}

impl AssigneeProposal {
    /// Put the assignment on a desk
    pub fn desk(desk: DeskId) -> Self {
        Self {
            desk: Some(desk),
            ..Default::default()
        }
    }

    /// Give the assignment to a user on a desk
    pub fn user(desk: DeskId, user: impl Into<UserRef>) -> Self {
        Self {
            desk: Some(desk),
            user: Some(user.into()),
            ..Default::default()
        }
    }

    /// Give the assignment to an external provider
    pub fn provider(desk: Option<DeskId>, provider: CoverageProvider) -> Self {
        Self {
            desk,
            user: Some(UserRef::new(provider.qcode.clone())),
            coverage_provider: Some(provider),
            ..Default::default()
        }
    }
}

/// Input for creating an assignment
#[derive(Debug, Clone, PartialEq)]
pub struct AssignmentDraft {
    pub(crate) planning_item: PlanningId,
    pub(crate) coverage_item: CoverageId,
    pub(crate) assignee: AssigneeProposal,
    pub(crate) planning: PlanningSnapshot,
}

impl AssignmentDraft {
    /// Draft for a coverage of a planning item
    pub fn new(planning_item: PlanningId, coverage_item: CoverageId) -> Self {
        Self {
            planning_item,
            coverage_item,
            assignee: AssigneeProposal::default(),
            planning: PlanningSnapshot::default(),
        }
    }

    /// Set the proposed assignee
    pub fn assignee(mut self, assignee: AssigneeProposal) -> Self {
        self.assignee = assignee;
        self
    }

    /// Assign to a desk
    pub fn desk(mut self, desk: DeskId) -> Self {
        self.assignee.desk = Some(desk);
        self
    }

    /// Assign to a user (or provider code)
    pub fn user(mut self, user: impl Into<UserRef>) -> Self {
        self.assignee.user = Some(user.into());
        self
    }

    /// Override the initial state, e.g. when restoring
    pub fn state(mut self, state: AssignmentState) -> Self {
        self.assignee.state = Some(state);
        self
    }

    /// Coverage planning block to snapshot
    pub fn planning(mut self, planning: PlanningSnapshot) -> Self {
        self.planning = planning;
        self
    }

    /// Proposed assignee of the draft
    pub fn proposed_assignee(&self) -> &AssigneeProposal {
        &self.assignee
    }

    /// Materialize the draft with a computed `assigned_to` block
    pub fn into_assignment(
        self,
        assigned_to: AssignedTo,
        creator: Option<UserId>,
        now: DateTime<Utc>,
    ) -> Assignment {
        Assignment {
            id: AssignmentId::new(),
            coverage_item: self.coverage_item,
            planning_item: self.planning_item,
            assigned_to,
            planning: self.planning,
            original_creator: creator,
            version_creator: None,
            firstcreated: now,
            versioncreated: now,
            version: 0,
        }
    }
}

/// Explicit changes an editor requests on an existing assignment
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AssignmentChanges {
    /// New assignee, `None` leaves desk/user alone
    pub assignee: Option<AssigneeProposal>,
    /// New planning snapshot
    pub planning: Option<PlanningSnapshot>,
}

impl AssignmentChanges {
    /// Reassign to a new assignee
    pub fn reassign(assignee: AssigneeProposal) -> Self {
        Self {
            assignee: Some(assignee),
            planning: None,
        }
    }
}

/// The user a workflow operation runs on behalf of
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    /// User id
    pub id: UserId,
    /// Login name, used in activity messages
    pub username: String,
}

impl Actor {
    /// Create an actor
    pub fn new(id: UserId, username: impl Into<String>) -> Self {
        Self {
            id,
            username: username.into(),
        }
    }
}

/// JSON schema of the assignment document
pub fn assignment_json_schema() -> schemars::schema::RootSchema {
    schemars::schema_for!(Assignment)
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    fn assignment_in(state: AssignmentState) -> Assignment {
        let assigned_to = AssignedTo {
            state,
            ..Default::default()
        };
        AssignmentDraft::new(PlanningId::new(), CoverageId::new()).into_assignment(
            assigned_to,
            None,
            Utc::now(),
        )
    }

    #[test_case(AssignmentState::Assigned, AssignmentState::Submitted, true ; "assigned to submitted")]
    #[test_case(AssignmentState::Assigned, AssignmentState::InProgress, true ; "assigned to in progress")]
    #[test_case(AssignmentState::InProgress, AssignmentState::Submitted, true ; "in progress moved desks")]
    #[test_case(AssignmentState::InProgress, AssignmentState::Assigned, false ; "in progress cannot go back")]
    #[test_case(AssignmentState::Completed, AssignmentState::InProgress, false ; "completed stays completed")]
    #[test_case(AssignmentState::Completed, AssignmentState::Assigned, true ; "revert")]
    #[test_case(AssignmentState::Completed, AssignmentState::Cancelled, true ; "cancel completed")]
    #[test_case(AssignmentState::Cancelled, AssignmentState::Assigned, false ; "cancelled is final")]
    #[test_case(AssignmentState::Cancelled, AssignmentState::Completed, true ; "publish after cancel")]
    #[test_case(AssignmentState::Cancelled, AssignmentState::Cancelled, true ; "re-cancel")]
    fn test_state_graph(from: AssignmentState, to: AssignmentState, allowed: bool) {
        assert_eq!(from.can_transition_to(to), allowed);
    }

    #[test]
    fn test_state_wire_names() {
        let json = serde_json::to_string(&AssignmentState::InProgress).unwrap();
        assert_eq!(json, "\"in_progress\"");
        assert_eq!(AssignmentState::Cancelled.to_string(), "cancelled");
    }

    #[test]
    fn test_list_groups_cover_every_state_once() {
        for state in AssignmentState::ALL {
            let group = state.list_group();
            assert!(group.states().contains(&state));
        }
        assert_eq!(
            AssignmentListGroup::for_state(AssignmentState::Submitted),
            AssignmentListGroup::ToDo
        );
    }

    #[test]
    fn test_edit_predicates() {
        let in_progress = assignment_in(AssignmentState::InProgress);
        assert!(in_progress.can_complete());
        assert!(in_progress.can_edit());
        assert!(!in_progress.can_edit_assigned_to());

        let assigned = assignment_in(AssignmentState::Assigned);
        assert!(!assigned.can_complete());
        assert!(assigned.can_edit_assigned_to());

        let cancelled = assignment_in(AssignmentState::Cancelled);
        assert!(cancelled.is_cancelled());
        assert!(!cancelled.can_edit());
    }

    #[test]
    fn test_assignee_shapes() {
        let desk = DeskId::new();
        let user = UserId::new();

        assert_eq!(AssignedTo::default().assignee(), Assignee::Unassigned);

        let on_desk = AssignedTo {
            desk: Some(desk),
            ..Default::default()
        };
        assert_eq!(on_desk.assignee(), Assignee::Desk(desk));

        let with_user = AssignedTo {
            desk: Some(desk),
            user: Some(user.into()),
            ..Default::default()
        };
        assert!(matches!(with_user.assignee(), Assignee::User { desk: Some(d), .. } if d == desk));

        let provider = CoverageProvider {
            qcode: "stringer".to_string(),
            name: "Stringer".to_string(),
        };
        let proposal = AssigneeProposal::provider(Some(desk), provider.clone());
        let with_provider = AssignedTo {
            desk: proposal.desk,
            user: proposal.user,
            coverage_provider: proposal.coverage_provider,
            ..Default::default()
        };
        assert_eq!(
            with_provider.assignee(),
            Assignee::Provider {
                desk: Some(desk),
                provider
            }
        );
    }

    #[test]
    fn test_user_without_desk_is_invalid() {
        let assigned_to = AssignedTo {
            user: Some(UserId::new().into()),
            ..Default::default()
        };
        let err = assigned_to.validate().unwrap_err();
        assert!(err.is_validation_error());
    }

    #[test]
    fn test_patch_only_touches_given_fields() {
        let original = assignment_in(AssignmentState::Assigned);
        let author = UserId::new();
        let planning = PlanningSnapshot {
            slugline: Some("budget".to_string()),
            ..Default::default()
        };

        let patched = original.patched(&AssignmentPatch::default().with_planning(planning.clone()).by(Some(author)));

        assert_eq!(patched.assigned_to, original.assigned_to);
        assert_eq!(patched.planning, planning);
        assert_eq!(patched.version_creator, Some(author));
    }

    #[test]
    fn test_rebase_keeps_concurrent_changes() {
        let (d1, d2) = (DeskId::new(), DeskId::new());
        let (kept, added) = (ContentItemId::new(), ContentItemId::new());
        let original = AssignedTo {
            desk: Some(d1),
            ..Default::default()
        };
        let stored = AssignedTo {
            desk: Some(d2),
            assigned_date_desk: Some(Utc::now()),
            item_ids: vec![kept],
            ..original.clone()
        };
        let next = AssignedTo {
            state: AssignmentState::InProgress,
            item_ids: vec![added],
            ..original.clone()
        };

        let rebased = next.rebased(&original, &stored);

        assert_eq!(rebased.desk, Some(d2));
        assert_eq!(rebased.assigned_date_desk, stored.assigned_date_desk);
        assert_eq!(rebased.state, AssignmentState::InProgress);
        assert_eq!(rebased.item_ids, vec![kept, added]);
    }

    #[test]
    fn test_rebase_applies_own_changes() {
        let original = AssignedTo {
            desk: Some(DeskId::new()),
            user: Some(UserId::new().into()),
            item_ids: vec![ContentItemId::new()],
            ..Default::default()
        };
        let next = AssignedTo {
            desk: Some(DeskId::new()),
            user: None,
            assigned_date_desk: Some(Utc::now()),
            state: AssignmentState::Submitted,
            item_ids: Vec::new(),
            ..original.clone()
        };

        pretty_assertions::assert_eq!(next.rebased(&original, &original), next);
    }

    #[test]
    fn test_schema_names_assigned_to_block() {
        let schema = serde_json::to_value(assignment_json_schema()).unwrap();
        assert!(schema["properties"]["assigned_to"].is_object());
        assert!(schema["definitions"]["AssignmentState"].is_object());
    }
}
