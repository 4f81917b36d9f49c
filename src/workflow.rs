// Copyright 2025 Cowboy AI, LLC.

//! Assignment workflow service
//!
//! Orchestrates [`AssignmentStateMachine`] decisions against the
//! [`AssignmentStore`], announces every persisted change on the notification
//! bus and tells assignees about their work.
//!
//! Every entry point reads the assignment fresh from the store, computes the
//! next block from that copy and writes it back. Notification, activity and
//! history failures are logged and never undo a persisted change.

use crate::assignment::{
    Actor, Assignment, AssignmentChanges, AssignmentDraft, AssignmentPatch, AssignmentState,
    PlanningSnapshot,
};
use crate::content::{ContentChange, ContentItem};
use crate::errors::{AssignmentError, AssignmentResult};
use crate::identifiers::{AssignmentId, DeskId, UserId, UserRef};
use crate::infrastructure::WorkflowConfig;
use crate::notifications::{Activity, AssignmentNotice, Notification};
use crate::ports::{
    ActivityFeed, Desk, DeskDirectory, HistoryLog, HistoryOperation, Notifier, PlanningStore,
};
use crate::state_machine::{AssignmentStateMachine, Transition};
use crate::store::AssignmentStore;
use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Lifecycle operations on assignments
#[derive(Clone)]
pub struct AssignmentWorkflowService {
    store: Arc<dyn AssignmentStore>,
    desks: Arc<dyn DeskDirectory>,
    planning: Arc<dyn PlanningStore>,
    history: Arc<dyn HistoryLog>,
    notifier: Arc<dyn Notifier>,
    activity: Arc<dyn ActivityFeed>,
    config: WorkflowConfig,
}

impl AssignmentWorkflowService {
    /// Create the service with the default configuration
    pub fn new(
        store: Arc<dyn AssignmentStore>,
        desks: Arc<dyn DeskDirectory>,
        planning: Arc<dyn PlanningStore>,
        history: Arc<dyn HistoryLog>,
        notifier: Arc<dyn Notifier>,
        activity: Arc<dyn ActivityFeed>,
    ) -> Self {
        Self {
            store,
            desks,
            planning,
            history,
            notifier,
            activity,
            config: WorkflowConfig::default(),
        }
    }

    /// Replace the configuration
    pub fn with_config(mut self, config: WorkflowConfig) -> Self {
        self.config = config;
        self
    }

    /// Active configuration
    pub fn config(&self) -> &WorkflowConfig {
        &self.config
    }

    pub(crate) fn store(&self) -> &Arc<dyn AssignmentStore> {
        &self.store
    }

    pub(crate) fn planning(&self) -> &Arc<dyn PlanningStore> {
        &self.planning
    }

    pub(crate) fn history(&self) -> &Arc<dyn HistoryLog> {
        &self.history
    }

    pub(crate) fn notifier(&self) -> &Arc<dyn Notifier> {
        &self.notifier
    }

    /// Load an assignment
    pub async fn find(&self, id: AssignmentId) -> AssignmentResult<Option<Assignment>> {
        self.store.find_one(id).await
    }

    /// Create an assignment from a draft
    ///
    /// A user without a desk is rejected before anything is written. The
    /// assignee is told about the new work unless it starts out completed.
    pub async fn create(
        &self,
        draft: AssignmentDraft,
        actor: Option<&Actor>,
    ) -> AssignmentResult<Assignment> {
        let actor_id = actor.map(|a| a.id);
        let now = Utc::now();

        let transition = AssignmentStateMachine::initial(draft.proposed_assignee(), actor_id, now)?;
        let assignment = draft.into_assignment(transition.assigned_to, actor_id, now);
        self.store.insert(vec![assignment.clone()]).await?;

        info!(
            assignment_id = %assignment.id,
            state = %assignment.state(),
            "assignment created"
        );

        self.record_history(HistoryOperation::Create, &assignment).await;
        self.notifier
            .publish(Notification::AssignmentCreated(AssignmentNotice::new(
                &assignment,
                None,
            )))
            .await;
        if assignment.state() != AssignmentState::Completed {
            self.notify_assignee(&assignment, actor).await;
        }

        Ok(assignment)
    }

    /// Apply an editor's changes
    ///
    /// Desk and user can only change while `can_edit_assigned_to` holds. The
    /// assignee is notified only when desk or user actually changed.
    pub async fn update(
        &self,
        id: AssignmentId,
        changes: AssignmentChanges,
        actor: Option<&Actor>,
    ) -> AssignmentResult<Assignment> {
        let original = self.require(id).await?;
        let actor_id = actor.map(|a| a.id);

        let transition = match &changes.assignee {
            Some(proposal) => {
                let assignee_changes =
                    proposal.desk != original.assigned_to.desk || proposal.user != original.assigned_to.user;
                if assignee_changes && !original.can_edit_assigned_to() {
                    return Err(AssignmentError::validation(
                        format!("assignment {id}"),
                        "assigned_to",
                        format!("Cannot reassign an assignment that is {}.", original.state()),
                    ));
                }
                Some(AssignmentStateMachine::reassign(
                    &original.assigned_to,
                    proposal,
                    actor_id,
                    Utc::now(),
                )?)
            }
            None => None,
        };

        let patch = AssignmentPatch {
            assigned_to: transition.as_ref().map(|t| t.assigned_to.clone()),
            planning: changes.planning,
            version_creator: actor_id,
        };
        let updated = self.store.update(id, patch, &original).await?;

        let modified = updated.assigned_to.assignee_differs(&original.assigned_to);
        info!(
            assignment_id = %id,
            from = %original.state(),
            to = %updated.state(),
            modified,
            "assignment updated"
        );

        if modified {
            self.record_history(HistoryOperation::Reassigned, &updated).await;
        }
        self.publish_updated(&updated, &original).await;
        if modified {
            self.notify_assignee(&updated, actor).await;
        }

        Ok(updated)
    }

    /// Privileged write used by the engine itself
    ///
    /// Skips validation and still announces the change.
    pub async fn system_update(
        &self,
        id: AssignmentId,
        patch: AssignmentPatch,
        original: &Assignment,
    ) -> AssignmentResult<Assignment> {
        let updated = self.store.system_update(id, patch, original).await?;
        self.publish_updated(&updated, original).await;
        Ok(updated)
    }

    /// Cancel an assignment
    ///
    /// Missing assignments are a silent no-op and so is re-cancelling. The
    /// planning snapshot is refreshed from the live coverage when it can be
    /// read. Notification trouble never stops the cancellation.
    pub async fn cancel(
        &self,
        id: AssignmentId,
        actor: Option<&Actor>,
    ) -> AssignmentResult<Option<Assignment>> {
        let Some(original) = self.store.find_one(id).await? else {
            debug!(assignment_id = %id, "cancel of unknown assignment ignored");
            return Ok(None);
        };
        let Some(transition) = AssignmentStateMachine::on_cancel(&original.assigned_to) else {
            debug!(assignment_id = %id, "assignment already cancelled");
            return Ok(Some(original));
        };

        let planning = match self
            .planning
            .coverage_planning(original.planning_item, original.coverage_item)
            .await
        {
            Ok(Some(snapshot)) => snapshot,
            Ok(None) => {
                warn!(assignment_id = %id, coverage_id = %original.coverage_item, "coverage not found, keeping planning snapshot");
                original.planning.clone()
            }
            Err(err) => {
                warn!(assignment_id = %id, error = %err, "coverage lookup failed, keeping planning snapshot");
                original.planning.clone()
            }
        };

        let updated = self
            .apply(&original, transition, actor.map(|a| a.id), Some(planning))
            .await?;
        self.notify_cancellation(&updated, actor).await;

        Ok(Some(updated))
    }

    /// Linked content was sent to another desk
    pub async fn on_content_desk_move(
        &self,
        change: &ContentChange,
        content: &ContentItem,
        actor: Option<&Actor>,
    ) -> AssignmentResult<Option<Assignment>> {
        let Some(assignment) = self.linked_assignment(content).await? else {
            return Ok(None);
        };
        let Some(desk) = change.desk_after(content) else {
            debug!(assignment_id = %assignment.id, "content has no desk, nothing to follow");
            return Ok(None);
        };

        let mover = actor.map(|a| a.id).or(change.version_creator);
        match AssignmentStateMachine::on_desk_move(&assignment.assigned_to, desk, mover, Utc::now()) {
            Some(transition) => self.apply(&assignment, transition, mover, None).await.map(Some),
            None => {
                debug!(assignment_id = %assignment.id, "desk move needs no transition");
                Ok(None)
            }
        }
    }

    /// Linked content was published
    pub async fn on_content_publish(
        &self,
        change: &ContentChange,
        content: &ContentItem,
        actor: Option<&Actor>,
    ) -> AssignmentResult<Option<Assignment>> {
        let Some(assignment) = self.linked_assignment(content).await? else {
            return Ok(None);
        };

        let author = actor.map(|a| a.id).or(change.version_creator);
        match AssignmentStateMachine::on_publish(&assignment.assigned_to) {
            Some(transition) => self.apply(&assignment, transition, author, None).await.map(Some),
            None => {
                debug!(assignment_id = %assignment.id, state = %assignment.state(), "publish needs no transition");
                Ok(None)
            }
        }
    }

    /// Linked content is now edited by someone else
    pub async fn on_content_lock_change(
        &self,
        change: &ContentChange,
        content: &ContentItem,
        actor: Option<&Actor>,
    ) -> AssignmentResult<Option<Assignment>> {
        let Some(assignment) = self.linked_assignment(content).await? else {
            return Ok(None);
        };
        let Some(editor) = change.editor().or(actor.map(|a| a.id)) else {
            return Ok(None);
        };

        match AssignmentStateMachine::on_lock_change(&assignment.assigned_to, editor, Utc::now()) {
            Some(transition) => self
                .apply(&assignment, transition, Some(editor), None)
                .await
                .map(Some),
            None => {
                debug!(assignment_id = %assignment.id, "editor already assigned");
                Ok(None)
            }
        }
    }

    /// Complete work in progress
    pub async fn complete(
        &self,
        id: AssignmentId,
        actor: Option<&Actor>,
    ) -> AssignmentResult<Assignment> {
        let original = self.require(id).await?;
        let transition = AssignmentStateMachine::complete(&original.assigned_to)?;
        self.apply(&original, transition, actor.map(|a| a.id), None).await
    }

    /// Complete an assignment that needs no content
    pub async fn confirm_availability(
        &self,
        id: AssignmentId,
        actor: Option<&Actor>,
    ) -> AssignmentResult<Assignment> {
        let original = self.require(id).await?;
        let transition = AssignmentStateMachine::confirm_availability(&original.assigned_to)?;
        self.apply(&original, transition, actor.map(|a| a.id), None).await
    }

    /// Undo a confirmation of availability
    pub async fn revert_availability(
        &self,
        id: AssignmentId,
        actor: Option<&Actor>,
    ) -> AssignmentResult<Assignment> {
        let original = self.require(id).await?;
        let transition = AssignmentStateMachine::revert_availability(&original.assigned_to)?;
        self.apply(&original, transition, actor.map(|a| a.id), None).await
    }

    /// Persist the assignment side of a content link
    ///
    /// Completing links go through the privileged path, anything else through
    /// the validated conditional update. History is left to the caller.
    pub(crate) async fn apply_content_link(
        &self,
        original: &Assignment,
        transition: Transition,
        actor: Option<&Actor>,
    ) -> AssignmentResult<Assignment> {
        let actor_id = actor.map(|a| a.id);
        let completes = transition.to == AssignmentState::Completed;
        let patch = AssignmentPatch::assigned_to(transition.assigned_to).by(actor_id);

        let updated = if completes {
            self.store.system_update(original.id, patch, original).await?
        } else {
            self.store.update(original.id, patch, original).await?
        };

        info!(
            assignment_id = %original.id,
            from = %transition.from,
            to = %transition.to,
            trigger = %transition.trigger,
            "assignment transitioned"
        );

        self.publish_updated(&updated, original).await;
        if !completes && updated.assigned_to.assignee_differs(&original.assigned_to) {
            self.notify_assignee(&updated, actor).await;
        }
        Ok(updated)
    }

    async fn apply(
        &self,
        original: &Assignment,
        transition: Transition,
        author: Option<UserId>,
        planning: Option<PlanningSnapshot>,
    ) -> AssignmentResult<Assignment> {
        let trigger = transition.trigger;
        let (from, to) = (transition.from, transition.to);

        let mut patch = AssignmentPatch::assigned_to(transition.assigned_to).by(author);
        patch.planning = planning;
        let updated = self.system_update(original.id, patch, original).await?;

        info!(
            assignment_id = %original.id,
            from = %from,
            to = %to,
            trigger = %trigger,
            "assignment transitioned"
        );
        self.record_history(HistoryOperation::for_trigger(trigger), &updated)
            .await;

        Ok(updated)
    }

    async fn require(&self, id: AssignmentId) -> AssignmentResult<Assignment> {
        self.store
            .find_one(id)
            .await?
            .ok_or_else(|| AssignmentError::not_found("Assignment", id))
    }

    async fn linked_assignment(&self, content: &ContentItem) -> AssignmentResult<Option<Assignment>> {
        let Some(id) = content.assignment_id else {
            return Ok(None);
        };
        let assignment = self.store.find_one(id).await?;
        if assignment.is_none() {
            debug!(assignment_id = %id, item_id = %content.id, "content references unknown assignment");
        }
        Ok(assignment)
    }

    async fn publish_updated(&self, updated: &Assignment, original: &Assignment) {
        self.notifier
            .publish(Notification::AssignmentUpdated(AssignmentNotice::new(
                updated,
                Some(original),
            )))
            .await;
    }

    async fn record_history(&self, operation: HistoryOperation, assignment: &Assignment) {
        if let Err(err) = self.history.record(operation, assignment).await {
            warn!(assignment_id = %assignment.id, ?operation, error = %err, "history entry not recorded");
        }
    }

    async fn notify_assignee(&self, assignment: &Assignment, actor: Option<&Actor>) {
        let Some(activity) = Activity::assigned(assignment, actor, &self.config.activity_resource)
        else {
            debug!(assignment_id = %assignment.id, "assignee is not a user, no activity");
            return;
        };
        if let Err(err) = self.activity.record(activity).await {
            warn!(assignment_id = %assignment.id, error = %err, "assignment activity not recorded");
        }
    }

    async fn notify_cancellation(&self, assignment: &Assignment, actor: Option<&Actor>) {
        let desk = match assignment.assigned_to.desk {
            Some(desk_id) => self.find_desk(assignment, desk_id).await,
            None => None,
        };

        // A provider code is nobody to notify, the desk hears about it instead
        let recipients: Vec<UserId> =
            match assignment.assigned_to.user.as_ref().and_then(UserRef::user_id) {
                Some(user) => vec![user],
                None => desk.as_ref().map(Desk::member_ids).unwrap_or_default(),
            };
        if recipients.is_empty() {
            debug!(assignment_id = %assignment.id, "nobody to tell about the cancellation");
            return;
        }

        let desk_name = desk.map(|d| d.name).unwrap_or_default();
        let activity = Activity::cancelled(
            assignment,
            &desk_name,
            actor,
            recipients,
            &self.config.activity_resource,
        );
        if let Err(err) = self.activity.record(activity).await {
            warn!(assignment_id = %assignment.id, error = %err, "cancellation activity not recorded");
        }
    }

    async fn find_desk(&self, assignment: &Assignment, desk_id: DeskId) -> Option<Desk> {
        match self.desks.find_one(desk_id).await {
            Ok(Some(desk)) => Some(desk),
            Ok(None) => {
                warn!(assignment_id = %assignment.id, desk_id = %desk_id, "desk not found");
                None
            }
            Err(err) => {
                warn!(assignment_id = %assignment.id, desk_id = %desk_id, error = %err, "desk lookup failed");
                None
            }
        }
    }
}
