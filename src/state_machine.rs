// Copyright 2025 Cowboy AI, LLC.

//! Assignment state machine
//!
//! Pure decision logic: every function takes the persisted `assigned_to`
//! block plus the proposed change and returns the block that should be
//! written next, wrapped in a [`Transition`] record. Inputs are never
//! mutated and nothing here performs I/O, so the workflow and linking
//! services can always recompute a decision from a freshly read original.
//!
//! Desk and user stamping are independent: whichever of the two actually
//! changed gets its own assignor and timestamp, and an unchanged field keeps
//! the stamps it already had.

use crate::assignment::{AssignedTo, AssigneeProposal, AssignmentState};
use crate::content::ContentState;
use crate::errors::{AssignmentError, AssignmentResult};
use crate::identifiers::{ContentItemId, DeskId, UserId, UserRef};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// What caused a transition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransitionTrigger {
    /// Assignment created
    Create,
    /// Desk/user changed by an editor
    Reassign,
    /// Linked content moved to another desk
    DeskMove,
    /// Content linked to the assignment
    ContentLink,
    /// Linked content published
    Publish,
    /// Coverage cancelled
    Cancel,
    /// Linked content claimed by another editor
    LockChange,
    /// Explicit completion
    Complete,
    /// Completed without content
    ConfirmAvailability,
    /// Completion without content undone
    RevertAvailability,
}

impl fmt::Display for TransitionTrigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TransitionTrigger::Create => "create",
            TransitionTrigger::Reassign => "reassign",
            TransitionTrigger::DeskMove => "desk_move",
            TransitionTrigger::ContentLink => "content_link",
            TransitionTrigger::Publish => "publish",
            TransitionTrigger::Cancel => "cancel",
            TransitionTrigger::LockChange => "lock_change",
            TransitionTrigger::Complete => "complete",
            TransitionTrigger::ConfirmAvailability => "confirm_availability",
            TransitionTrigger::RevertAvailability => "revert_availability",
        };
        f.write_str(s)
    }
}

/// Record of a decided transition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transition {
    /// State before
    pub from: AssignmentState,
    /// State after
    pub to: AssignmentState,
    /// What caused it
    pub trigger: TransitionTrigger,
    /// The `assigned_to` block to persist
    pub assigned_to: AssignedTo,
}

impl Transition {
    /// Whether the workflow state moves
    pub fn changes_state(&self) -> bool {
        self.from != self.to
    }
}

/// Reassignment requested as part of a content link
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinkReassignment {
    /// The user doing the link, who becomes the assignee
    pub user: UserId,
    /// Desk the linked item sits on
    pub desk: Option<DeskId>,
}

/// Decision functions for the assignment lifecycle
pub struct AssignmentStateMachine;

impl AssignmentStateMachine {
    /// Initial `assigned_to` block for a new assignment
    ///
    /// The state defaults to ASSIGNED unless the proposal carries one (used
    /// when restoring). Desk and user present on creation are stamped with
    /// the actor and `now`.
    pub fn initial(
        proposal: &AssigneeProposal,
        actor: Option<UserId>,
        now: DateTime<Utc>,
    ) -> AssignmentResult<Transition> {
        let state = proposal.state.unwrap_or(AssignmentState::Assigned);
        let mut next = AssignedTo {
            state,
            coverage_provider: proposal.coverage_provider.clone(),
            ..Default::default()
        };
        if let Some(desk) = proposal.desk {
            stamp_desk(&mut next, Some(desk), actor, now);
        }
        if let Some(user) = &proposal.user {
            stamp_user(&mut next, Some(user.clone()), actor, now);
        }
        next.validate()?;

        Ok(Transition {
            from: state,
            to: state,
            trigger: TransitionTrigger::Create,
            assigned_to: next,
        })
    }

    /// Apply an editor's desk/user change to the persisted block
    pub fn reassign(
        original: &AssignedTo,
        proposal: &AssigneeProposal,
        actor: Option<UserId>,
        now: DateTime<Utc>,
    ) -> AssignmentResult<Transition> {
        let mut next = original.clone();

        if proposal.desk != original.desk {
            stamp_desk(&mut next, proposal.desk, actor, now);
        }
        if proposal.user != original.user {
            stamp_user(&mut next, proposal.user.clone(), actor, now);
        }
        next.coverage_provider = proposal.coverage_provider.clone();
        if let Some(state) = proposal.state {
            next.state = state;
        }
        next.validate()?;

        guarded(original, next, TransitionTrigger::Reassign)
    }

    /// Linked content was sent to another desk
    ///
    /// The assignment follows the content to its desk as SUBMITTED, with the
    /// user cleared and the mover recorded as assignor. Completed and
    /// cancelled assignments, and moves within the same desk, are no-ops.
    pub fn on_desk_move(
        original: &AssignedTo,
        content_desk: DeskId,
        mover: Option<UserId>,
        now: DateTime<Utc>,
    ) -> Option<Transition> {
        if original.state.is_terminal() || original.desk == Some(content_desk) {
            return None;
        }

        let mut next = original.clone();
        stamp_desk(&mut next, Some(content_desk), mover, now);
        next.user = None;
        next.assignor_user = mover;
        next.state = AssignmentState::Submitted;

        guarded(original, next, TransitionTrigger::DeskMove).ok()
    }

    /// Content was linked to the assignment
    ///
    /// Published content completes the assignment, anything else puts it in
    /// progress. Completed and cancelled assignments are left untouched.
    pub fn on_content_linked(
        original: &AssignedTo,
        content_state: ContentState,
        linked: &[ContentItemId],
        reassignment: Option<LinkReassignment>,
        now: DateTime<Utc>,
    ) -> Option<Transition> {
        if original.state.is_terminal() {
            return None;
        }

        let mut next = original.clone();
        next.state = if content_state.is_published() {
            AssignmentState::Completed
        } else {
            AssignmentState::InProgress
        };
        for id in linked {
            if !next.item_ids.contains(id) {
                next.item_ids.push(*id);
            }
        }

        if let Some(reassignment) = reassignment {
            let actor = Some(reassignment.user);
            if !next
                .user
                .as_ref()
                .is_some_and(|user| user.is_user(&reassignment.user))
            {
                stamp_user(&mut next, Some(UserRef::from(reassignment.user)), actor, now);
                next.coverage_provider = None;
            }
            if reassignment.desk.is_some() && reassignment.desk != next.desk {
                stamp_desk(&mut next, reassignment.desk, actor, now);
            }
        }

        guarded(original, next, TransitionTrigger::ContentLink).ok()
    }

    /// Linked content was published
    ///
    /// Completes the assignment from any state, cancelled included. Only an
    /// assignment that is already completed is left alone.
    pub fn on_publish(original: &AssignedTo) -> Option<Transition> {
        if original.state == AssignmentState::Completed {
            return None;
        }

        let mut next = original.clone();
        next.state = AssignmentState::Completed;
        guarded(original, next, TransitionTrigger::Publish).ok()
    }

    /// Coverage cancelled; desk and user stay for audit
    pub fn on_cancel(original: &AssignedTo) -> Option<Transition> {
        if original.state == AssignmentState::Cancelled {
            return None;
        }

        let mut next = original.clone();
        next.state = AssignmentState::Cancelled;
        guarded(original, next, TransitionTrigger::Cancel).ok()
    }

    /// Linked content is now edited by `editor`
    ///
    /// Only the user moves; desk and state stay, completed assignments
    /// included. Cancelled assignments are left alone, and so are assignments
    /// without a desk since a user needs one.
    pub fn on_lock_change(
        original: &AssignedTo,
        editor: UserId,
        now: DateTime<Utc>,
    ) -> Option<Transition> {
        if original.state == AssignmentState::Cancelled || original.desk.is_none() {
            return None;
        }
        if original
            .user
            .as_ref()
            .is_some_and(|user| user.is_user(&editor))
        {
            return None;
        }

        let mut next = original.clone();
        stamp_user(&mut next, Some(UserRef::from(editor)), Some(editor), now);
        next.coverage_provider = None;
        guarded(original, next, TransitionTrigger::LockChange).ok()
    }

    /// Explicit completion of work in progress
    pub fn complete(original: &AssignedTo) -> AssignmentResult<Transition> {
        if original.state != AssignmentState::InProgress {
            return Err(AssignmentError::validation(
                "assignment",
                "assigned_to.state",
                format!("Cannot complete an assignment that is {}.", original.state),
            ));
        }

        let mut next = original.clone();
        next.state = AssignmentState::Completed;
        guarded(original, next, TransitionTrigger::Complete)
    }

    /// Complete an assignment that needs no content
    pub fn confirm_availability(original: &AssignedTo) -> AssignmentResult<Transition> {
        if !matches!(
            original.state,
            AssignmentState::Assigned | AssignmentState::Submitted
        ) {
            return Err(AssignmentError::validation(
                "assignment",
                "assigned_to.state",
                format!("Cannot confirm availability of an assignment that is {}.", original.state),
            ));
        }

        let mut next = original.clone();
        next.state = AssignmentState::Completed;
        guarded(original, next, TransitionTrigger::ConfirmAvailability)
    }

    /// Undo a confirmation of availability
    pub fn revert_availability(original: &AssignedTo) -> AssignmentResult<Transition> {
        if original.state != AssignmentState::Completed {
            return Err(AssignmentError::validation(
                "assignment",
                "assigned_to.state",
                format!("Cannot revert an assignment that is {}.", original.state),
            ));
        }
        if !original.item_ids.is_empty() {
            return Err(AssignmentError::validation(
                "assignment",
                "assigned_to.item_ids",
                "Cannot revert an assignment with linked content.",
            ));
        }

        let mut next = original.clone();
        next.state = AssignmentState::Assigned;
        guarded(original, next, TransitionTrigger::RevertAvailability)
    }
}

fn stamp_desk(
    next: &mut AssignedTo,
    desk: Option<DeskId>,
    actor: Option<UserId>,
    now: DateTime<Utc>,
) {
    next.desk = desk;
    next.assignor_desk = actor;
    next.assigned_date_desk = Some(now);
}

// Removing the user clears it without new stamps.
fn stamp_user(
    next: &mut AssignedTo,
    user: Option<UserRef>,
    actor: Option<UserId>,
    now: DateTime<Utc>,
) {
    let set = user.is_some();
    next.user = user;
    if set {
        next.assignor_user = actor;
        next.assigned_date_user = Some(now);
    }
}

fn guarded(
    original: &AssignedTo,
    next: AssignedTo,
    trigger: TransitionTrigger,
) -> AssignmentResult<Transition> {
    if !original.state.can_transition_to(next.state) {
        return Err(AssignmentError::InvalidStateTransition {
            from: original.state.to_string(),
            to: next.state.to_string(),
        });
    }

    Ok(Transition {
        from: original.state,
        to: next.state,
        trigger,
        assigned_to: next,
    })
}
