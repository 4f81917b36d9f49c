// Copyright 2025 Cowboy AI, LLC.

//! Workflow notifications and activity messages
//!
//! [`Notification`] is what goes out on the notification bus under the event
//! names subscribers listen for. [`Activity`] is what lands in a user's
//! activity feed.

use crate::assignment::{Actor, Assignment};
use crate::identifiers::{AssignmentId, ContentItemId, CoverageId, DeskId, PlanningId, UserId, UserRef};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Payload of the assignment events
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssignmentNotice {
    /// The assignment
    pub item: AssignmentId,
    /// Its coverage
    pub coverage: CoverageId,
    /// Its planning item
    pub planning: PlanningId,
    /// Assignee after the change
    pub assigned_user: Option<UserRef>,
    /// Desk after the change
    pub assigned_desk: Option<DeskId>,
    /// Who made the change
    pub user: Option<UserId>,
    /// Desk before the change
    pub original_assigned_desk: Option<DeskId>,
    /// Assignee before the change
    pub original_assigned_user: Option<UserRef>,
}

impl AssignmentNotice {
    /// Notice for `assignment`, compared with what it was before
    pub fn new(assignment: &Assignment, original: Option<&Assignment>) -> Self {
        Self {
            item: assignment.id,
            coverage: assignment.coverage_item,
            planning: assignment.planning_item,
            assigned_user: assignment.assigned_to.user.clone(),
            assigned_desk: assignment.assigned_to.desk,
            user: assignment.last_actor(),
            original_assigned_desk: original.and_then(|o| o.assigned_to.desk),
            original_assigned_user: original.and_then(|o| o.assigned_to.user.clone()),
        }
    }
}

/// Event published on the notification bus
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "payload")]
pub enum Notification {
    /// `assignments:created`
    #[serde(rename = "assignments:created")]
    AssignmentCreated(AssignmentNotice),
    /// `assignments:updated`
    #[serde(rename = "assignments:updated")]
    AssignmentUpdated(AssignmentNotice),
    /// `content:link`
    #[serde(rename = "content:link")]
    ContentLinked {
        /// Actioned content item
        item: ContentItemId,
        /// Assignment it was linked to
        assignment: AssignmentId,
    },
    /// `content:update`
    #[serde(rename = "content:update")]
    ContentUpdated {
        /// Items whose assignment reference changed
        items: Vec<ContentItemId>,
    },
}

impl Notification {
    /// Event name subscribers listen for
    pub fn event_name(&self) -> &'static str {
        match self {
            Notification::AssignmentCreated(_) => "assignments:created",
            Notification::AssignmentUpdated(_) => "assignments:updated",
            Notification::ContentLinked { .. } => "content:link",
            Notification::ContentUpdated { .. } => "content:update",
        }
    }

    /// Event payload without the event name
    pub fn payload(&self) -> serde_json::Value {
        let value = match self {
            Notification::AssignmentCreated(notice) | Notification::AssignmentUpdated(notice) => {
                serde_json::to_value(notice)
            }
            Notification::ContentLinked { item, assignment } => Ok(serde_json::json!({
                "item": item,
                "assignment": assignment,
            })),
            Notification::ContentUpdated { items } => Ok(serde_json::json!({ "items": items })),
        };
        value.unwrap_or(serde_json::Value::Null)
    }

    /// Assignment the event is about, if any
    pub fn assignment_id(&self) -> Option<AssignmentId> {
        match self {
            Notification::AssignmentCreated(notice) | Notification::AssignmentUpdated(notice) => {
                Some(notice.item)
            }
            Notification::ContentLinked { assignment, .. } => Some(*assignment),
            Notification::ContentUpdated { .. } => None,
        }
    }
}

/// Kind of activity feed entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityKind {
    /// Coverage handed to a user
    Assigned,
    /// Coverage cancelled
    Cancelled,
}

/// Activity feed entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Activity {
    /// Kind of entry
    pub kind: ActivityKind,
    /// Message template with `{{param}}` placeholders
    pub message: String,
    /// Users to notify
    pub notify: Vec<UserId>,
    /// Template parameters
    pub params: BTreeMap<String, String>,
    /// Resource the activity belongs to
    pub resource: String,
}

const ASSIGNED_TEMPLATE: &str = "{{assignor}} assigned a coverage to {{assignee}}";
const CANCELLED_TEMPLATE: &str =
    "Assignment {{slugline}} for desk {{desk}} has been cancelled by {{user}}";

impl Activity {
    /// Tell the assigned user about their new coverage
    ///
    /// Returns `None` when the assignee is not a system user, e.g. an
    /// external provider code.
    pub fn assigned(assignment: &Assignment, actor: Option<&Actor>, resource: &str) -> Option<Self> {
        let user = assignment.assigned_to.user.as_ref()?.user_id()?;
        let self_assigned = actor.is_some_and(|a| a.id == user);

        let (assignor, assignee) = match actor {
            Some(_) if self_assigned => ("You".to_string(), "yourself"),
            Some(actor) => (actor.username.clone(), "you"),
            None => ("system".to_string(), "you"),
        };

        let mut params = BTreeMap::new();
        params.insert("assignor".to_string(), assignor);
        params.insert("assignee".to_string(), assignee.to_string());
        params.insert("assignment_id".to_string(), assignment.id.to_string());

        Some(Self {
            kind: ActivityKind::Assigned,
            message: ASSIGNED_TEMPLATE.to_string(),
            notify: vec![user],
            params,
            resource: resource.to_string(),
        })
    }

    /// Tell the assignees that the coverage was cancelled
    ///
    /// The canceller reads as "You" when they are the assigned user.
    pub fn cancelled(
        assignment: &Assignment,
        desk_name: &str,
        actor: Option<&Actor>,
        notify: Vec<UserId>,
        resource: &str,
    ) -> Self {
        let mut params = BTreeMap::new();
        params.insert(
            "slugline".to_string(),
            assignment.planning.slugline.clone().unwrap_or_default(),
        );
        params.insert("desk".to_string(), desk_name.to_string());
        let assignee = assignment.assigned_to.user.as_ref().and_then(UserRef::user_id);
        let user = match actor {
            Some(actor) if assignee == Some(actor.id) => "You".to_string(),
            Some(actor) => actor.username.clone(),
            None => "system".to_string(),
        };
        params.insert("user".to_string(), user);
        params.insert("assignment_id".to_string(), assignment.id.to_string());

        Self {
            kind: ActivityKind::Cancelled,
            message: CANCELLED_TEMPLATE.to_string(),
            notify,
            params,
            resource: resource.to_string(),
        }
    }

    /// Message with the template parameters filled in
    pub fn render(&self) -> String {
        self.params
            .iter()
            .fold(self.message.clone(), |message, (key, value)| {
                message.replace(&format!("{{{{{key}}}}}"), value)
            })
    }
}
