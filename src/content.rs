// Copyright 2025 Cowboy AI, LLC.

//! Content items as seen by the assignment engine
//!
//! Only the handful of fields the engine reads are modelled; the authoring
//! format itself belongs to the content subsystem.

use crate::identifiers::{AssignmentId, ContentItemId, CoverageId, DeskId, PlanningId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Editorial state of a content item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentState {
    /// Personal draft
    Draft,
    /// Being worked on in a desk stage
    InProgress,
    /// Sent to a desk for review
    Submitted,
    /// Waiting for a scheduled publish
    Scheduled,
    /// Published
    Published,
    /// Published and corrected
    Corrected,
    /// Published and killed
    Killed,
    /// Spiked
    Spiked,
}

impl ContentState {
    /// Published or corrected content fulfils its assignment
    pub fn is_published(&self) -> bool {
        matches!(self, ContentState::Published | ContentState::Corrected)
    }
}

impl fmt::Display for ContentState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ContentState::Draft => "draft",
            ContentState::InProgress => "in_progress",
            ContentState::Submitted => "submitted",
            ContentState::Scheduled => "scheduled",
            ContentState::Published => "published",
            ContentState::Corrected => "corrected",
            ContentState::Killed => "killed",
            ContentState::Spiked => "spiked",
        };
        f.write_str(s)
    }
}

/// Desk/user a content item currently sits with
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentTask {
    /// Desk
    pub desk: Option<DeskId>,
    /// User
    pub user: Option<UserId>,
}

/// A produced content item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentItem {
    /// Item id
    pub id: ContentItemId,
    /// Editorial state
    pub state: ContentState,
    /// Desk/user routing
    #[serde(default)]
    pub task: ContentTask,
    /// Assignment the item fulfils
    #[serde(default)]
    pub assignment_id: Option<AssignmentId>,
    /// Item this one rewrites or corrects
    #[serde(default)]
    pub rewrite_of: Option<ContentItemId>,
    /// Position in the rewrite chain
    #[serde(default)]
    pub rewrite_sequence: u32,
    /// First publish time
    #[serde(default)]
    pub firstpublished: Option<DateTime<Utc>>,
    /// User who saved the latest version
    #[serde(default)]
    pub version_creator: Option<UserId>,
    /// User holding the edit lock
    #[serde(default)]
    pub lock_user: Option<UserId>,
}

impl ContentItem {
    /// A fresh item on a desk
    pub fn new(state: ContentState, desk: Option<DeskId>) -> Self {
        Self {
            id: ContentItemId::new(),
            state,
            task: ContentTask { desk, user: None },
            assignment_id: None,
            rewrite_of: None,
            rewrite_sequence: 0,
            firstpublished: None,
            version_creator: None,
            lock_user: None,
        }
    }

    /// Desk the item is on
    pub fn desk(&self) -> Option<DeskId> {
        self.task.desk
    }

    /// Items sitting on a desk are in the editorial workflow
    pub fn is_in_workflow(&self) -> bool {
        self.task.desk.is_some()
    }

    /// Whether this item rewrites an earlier one
    pub fn is_rewrite(&self) -> bool {
        self.rewrite_of.is_some()
    }

    /// Whether the item already fulfils an assignment
    pub fn is_linked(&self) -> bool {
        self.assignment_id.is_some()
    }
}

/// Fields changed by a content save, move or publish
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentChange {
    /// New desk, when the item was sent somewhere
    pub desk: Option<DeskId>,
    /// User who made the change
    pub version_creator: Option<UserId>,
    /// User now holding the edit lock
    pub lock_user: Option<UserId>,
    /// New editorial state
    pub state: Option<ContentState>,
}

impl ContentChange {
    /// The user now working on the item, lock holder first
    pub fn editor(&self) -> Option<UserId> {
        self.lock_user.or(self.version_creator)
    }

    /// Desk after the change, falling back to where the item was
    pub fn desk_after(&self, original: &ContentItem) -> Option<DeskId> {
        self.desk.or(original.task.desk)
    }
}

/// Record that a content item was delivered against an assignment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeliveryRecord {
    /// Delivered item
    pub item_id: ContentItemId,
    /// Assignment fulfilled
    pub assignment_id: AssignmentId,
    /// Planning item owning the coverage
    pub planning_id: PlanningId,
    /// Coverage fulfilled
    pub coverage_id: CoverageId,
    /// Item state at link time
    pub item_state: ContentState,
    /// Rewrite sequence number of the item
    pub sequence_no: u32,
    /// First publish time of the item
    pub publish_time: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_published_states() {
        assert!(ContentState::Published.is_published());
        assert!(ContentState::Corrected.is_published());
        assert!(!ContentState::Draft.is_published());
        assert!(!ContentState::Killed.is_published());
    }

    #[test]
    fn test_workflow_membership_follows_desk() {
        let on_desk = ContentItem::new(ContentState::Draft, Some(DeskId::new()));
        assert!(on_desk.is_in_workflow());

        let personal = ContentItem::new(ContentState::Draft, None);
        assert!(!personal.is_in_workflow());
    }

    #[test]
    fn test_editor_prefers_lock_holder() {
        let saver = UserId::new();
        let locker = UserId::new();
        let change = ContentChange {
            version_creator: Some(saver),
            lock_user: Some(locker),
            ..Default::default()
        };
        assert_eq!(change.editor(), Some(locker));

        let change = ContentChange {
            version_creator: Some(saver),
            ..Default::default()
        };
        assert_eq!(change.editor(), Some(saver));
    }

    #[test]
    fn test_desk_after_falls_back_to_original() {
        let desk = DeskId::new();
        let item = ContentItem::new(ContentState::InProgress, Some(desk));
        assert_eq!(ContentChange::default().desk_after(&item), Some(desk));
    }
}
