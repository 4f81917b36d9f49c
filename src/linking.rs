// Copyright 2025 Cowboy AI, LLC.

//! Content linking
//!
//! Binds a content item, and every unlinked item of its rewrite chain, to an
//! assignment exactly once. The assignment is advanced first, then each item
//! is claimed with a conditional stamp, and delivery records are written last.
//! A failure leaves deliveries missing rather than an assignment that claims
//! content it does not have, and a link that loses the claim on the actioned
//! item writes no deliveries at all.

use crate::assignment::{Actor, Assignment};
use crate::content::{ContentItem, DeliveryRecord};
use crate::errors::{AssignmentError, AssignmentResult, LinkStage};
use crate::identifiers::{AssignmentId, ContentItemId, DeliveryId};
use crate::notifications::Notification;
use crate::ports::{ContentStore, DeliveryStore};
use crate::state_machine::{AssignmentStateMachine, LinkReassignment};
use crate::workflow::AssignmentWorkflowService;
use chrono::Utc;
use futures::future::try_join_all;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// A request to link content to an assignment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkRequest {
    /// Assignment to fulfil
    pub assignment_id: AssignmentId,
    /// Actioned content item
    pub item_id: ContentItemId,
    /// Hand the assignment to the acting user and the item's desk
    #[serde(default)]
    pub reassign: bool,
}

impl LinkRequest {
    /// Link without reassigning
    pub fn new(assignment_id: AssignmentId, item_id: ContentItemId) -> Self {
        Self {
            assignment_id,
            item_id,
            reassign: false,
        }
    }

    /// Also reassign to the acting user
    pub fn reassigning(mut self) -> Self {
        self.reassign = true;
        self
    }
}

/// Result of a successful link
#[derive(Debug, Clone, PartialEq)]
pub struct LinkOutcome {
    /// Assignment after the link
    pub assignment: Assignment,
    /// Items newly linked, actioned item included
    pub linked_item_ids: Vec<ContentItemId>,
    /// Delivery records written
    pub deliveries: Vec<DeliveryId>,
}

/// Links produced content to assignments
#[derive(Clone)]
pub struct ContentLinkingService {
    workflow: Arc<AssignmentWorkflowService>,
    content: Arc<dyn ContentStore>,
    deliveries: Arc<dyn DeliveryStore>,
}

impl ContentLinkingService {
    /// Create the service
    pub fn new(
        workflow: Arc<AssignmentWorkflowService>,
        content: Arc<dyn ContentStore>,
        deliveries: Arc<dyn DeliveryStore>,
    ) -> Self {
        Self {
            workflow,
            content,
            deliveries,
        }
    }

    /// Link `request.item_id` and its unlinked rewrites to the assignment
    ///
    /// Fails with a validation error, without writing anything, when the
    /// assignment or item is missing, the assignment is cancelled, the item
    /// is already linked or not on a desk, or a non-rewrite item would add a
    /// second delivery. Failures after validation are consistency errors
    /// naming the step that broke.
    pub async fn link(
        &self,
        request: LinkRequest,
        actor: Option<&Actor>,
    ) -> AssignmentResult<LinkOutcome> {
        let (assignment, item) = self.validate(&request).await?;
        let was_completed = assignment.is_completed();

        let linked = self.unlinked_family(&item).await?;
        let linked_ids: Vec<ContentItemId> = linked.iter().map(|i| i.id).collect();

        let reassignment = match (request.reassign, actor) {
            (true, Some(actor)) => Some(LinkReassignment {
                user: actor.id,
                desk: item.desk(),
            }),
            (true, None) => {
                debug!(assignment_id = %assignment.id, "reassign requested without an actor, ignored");
                None
            }
            (false, _) => None,
        };

        let updated = match AssignmentStateMachine::on_content_linked(
            &assignment.assigned_to,
            item.state,
            &linked_ids,
            reassignment,
            Utc::now(),
        ) {
            Some(transition) => self
                .workflow
                .apply_content_link(&assignment, transition, actor)
                .await
                .map_err(|err| consistency(&assignment, LinkStage::AssignmentUpdate, err))?,
            None => {
                debug!(assignment_id = %assignment.id, "assignment already completed, state kept");
                assignment.clone()
            }
        };

        self.claim(&item, &linked_ids, &assignment)
            .await
            .map_err(|err| consistency(&assignment, LinkStage::ItemStamping, err))?;

        let records = linked
            .iter()
            .map(|linked_item| DeliveryRecord {
                item_id: linked_item.id,
                assignment_id: assignment.id,
                planning_id: assignment.planning_item,
                coverage_id: assignment.coverage_item,
                item_state: linked_item.state,
                sequence_no: linked_item.rewrite_sequence,
                publish_time: linked_item.firstpublished,
            })
            .collect();
        let deliveries = self
            .deliveries
            .insert_many(records)
            .await
            .map_err(|err| consistency(&assignment, LinkStage::DeliveryCreation, err))?;

        info!(
            assignment_id = %assignment.id,
            item_id = %item.id,
            linked = linked_ids.len(),
            state = %updated.state(),
            "content linked"
        );

        if let Err(err) = self
            .workflow
            .history()
            .record_content_link(&linked_ids, &updated)
            .await
        {
            warn!(assignment_id = %assignment.id, error = %err, "content link history not recorded");
        }

        if self.workflow.config().republish_planning_on_link
            && (!item.state.is_published() || was_completed)
        {
            if let Err(err) = self.workflow.planning().republish(assignment.planning_item).await {
                warn!(planning_id = %assignment.planning_item, error = %err, "planning not re-published");
            }
        }

        let notifier = self.workflow.notifier();
        notifier
            .publish(Notification::ContentUpdated {
                items: linked_ids.clone(),
            })
            .await;
        notifier
            .publish(Notification::ContentLinked {
                item: item.id,
                assignment: assignment.id,
            })
            .await;

        Ok(LinkOutcome {
            assignment: updated,
            linked_item_ids: linked_ids,
            deliveries,
        })
    }

    async fn validate(&self, request: &LinkRequest) -> AssignmentResult<(Assignment, ContentItem)> {
        let entity = format!("assignment {}", request.assignment_id);

        let assignment = self
            .workflow
            .store()
            .find_one(request.assignment_id)
            .await?
            .ok_or_else(|| {
                AssignmentError::validation(&entity, "assignment_id", "Assignment not found.")
            })?;
        if assignment.is_cancelled() {
            return Err(AssignmentError::validation(
                &entity,
                "assigned_to.state",
                "Assignment is cancelled. Cannot link assignment and content.",
            ));
        }

        let item_entity = format!("content {}", request.item_id);
        let item = self
            .content
            .find_one(request.item_id)
            .await?
            .ok_or_else(|| {
                AssignmentError::validation(&item_entity, "item_id", "Content item not found.")
            })?;
        if item.is_linked() {
            return Err(AssignmentError::validation(
                &item_entity,
                "assignment_id",
                "Content is already linked to an assignment. Cannot link assignment and content.",
            ));
        }
        if !item.is_in_workflow() {
            return Err(AssignmentError::validation(
                &item_entity,
                "task.desk",
                "Content not in workflow. Cannot link assignment and content.",
            ));
        }
        if !item.is_rewrite()
            && self
                .deliveries
                .find_one_by_assignment(assignment.id)
                .await?
                .is_some()
        {
            return Err(AssignmentError::validation(
                &entity,
                "delivery",
                "Content already exists for the assignment. Cannot link assignment and content.",
            ));
        }

        Ok((assignment, item))
    }

    /// Stamp the actioned item first so a concurrent link of the same item
    /// fails before touching the rest of the family
    async fn claim(
        &self,
        item: &ContentItem,
        linked_ids: &[ContentItemId],
        assignment: &Assignment,
    ) -> AssignmentResult<()> {
        self.content.set_assignment(item.id, assignment.id).await?;
        try_join_all(
            linked_ids
                .iter()
                .filter(|id| **id != item.id)
                .map(|id| self.content.set_assignment(*id, assignment.id)),
        )
        .await?;
        Ok(())
    }

    async fn unlinked_family(&self, item: &ContentItem) -> AssignmentResult<Vec<ContentItem>> {
        let mut family: Vec<ContentItem> = self
            .content
            .find_related(item.id)
            .await?
            .into_iter()
            .filter(|related| !related.is_linked())
            .collect();
        if !family.iter().any(|related| related.id == item.id) {
            family.insert(0, item.clone());
        }
        Ok(family)
    }
}

fn consistency(assignment: &Assignment, stage: LinkStage, err: AssignmentError) -> AssignmentError {
    warn!(assignment_id = %assignment.id, %stage, error = %err, "content link failed part way");
    AssignmentError::Consistency {
        assignment_id: assignment.id.to_string(),
        stage,
        message: err.to_string(),
    }
}
