// Copyright 2025 Cowboy AI, LLC.

//! In-memory collaborators
//!
//! Used by the test suites and by embedders that want to run the engine
//! without external services. The recording variants keep everything they
//! are handed so callers can assert on it.

use crate::assignment::{Assignment, PlanningSnapshot};
use crate::content::{ContentItem, DeliveryRecord};
use crate::errors::{AssignmentError, AssignmentResult};
use crate::identifiers::{
    AssignmentId, ContentItemId, CoverageId, DeliveryId, DeskId, PlanningId,
};
use crate::notifications::{Activity, Notification};
use crate::ports::{
    ActivityFeed, ContentStore, DeliveryStore, Desk, DeskDirectory, HistoryLog, HistoryOperation,
    Notifier, PlanningStore,
};
use async_trait::async_trait;
use indexmap::{IndexMap, IndexSet};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Desk directory backed by a map
#[derive(Clone, Default)]
pub struct InMemoryDeskDirectory {
    desks: Arc<RwLock<IndexMap<DeskId, Desk>>>,
}

impl InMemoryDeskDirectory {
    /// Create an empty directory
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a desk
    pub async fn add(&self, desk: Desk) {
        self.desks.write().await.insert(desk.id, desk);
    }
}

#[async_trait]
impl DeskDirectory for InMemoryDeskDirectory {
    async fn find_one(&self, desk: DeskId) -> AssignmentResult<Option<Desk>> {
        Ok(self.desks.read().await.get(&desk).cloned())
    }
}

/// Notifier that keeps every notification
#[derive(Clone, Default)]
pub struct RecordingNotifier {
    published: Arc<RwLock<Vec<Notification>>>,
}

impl RecordingNotifier {
    /// Create an empty recorder
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything published so far
    pub async fn published(&self) -> Vec<Notification> {
        self.published.read().await.clone()
    }

    /// Event names published so far, in order
    pub async fn event_names(&self) -> Vec<&'static str> {
        self.published
            .read()
            .await
            .iter()
            .map(Notification::event_name)
            .collect()
    }

    /// Forget everything recorded
    pub async fn clear(&self) {
        self.published.write().await.clear();
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn publish(&self, notification: Notification) {
        self.published.write().await.push(notification);
    }
}

/// Activity feed that keeps every activity
#[derive(Clone, Default)]
pub struct RecordingActivityFeed {
    activities: Arc<RwLock<Vec<Activity>>>,
}

impl RecordingActivityFeed {
    /// Create an empty feed
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything recorded so far
    pub async fn activities(&self) -> Vec<Activity> {
        self.activities.read().await.clone()
    }
}

#[async_trait]
impl ActivityFeed for RecordingActivityFeed {
    async fn record(&self, activity: Activity) -> AssignmentResult<()> {
        self.activities.write().await.push(activity);
        Ok(())
    }
}

/// Delivery store backed by a map
#[derive(Clone, Default)]
pub struct InMemoryDeliveryStore {
    records: Arc<RwLock<IndexMap<DeliveryId, DeliveryRecord>>>,
}

impl InMemoryDeliveryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// All deliveries in insertion order
    pub async fn all(&self) -> Vec<DeliveryRecord> {
        self.records.read().await.values().cloned().collect()
    }

    /// Deliveries of one item
    pub async fn for_item(&self, item: ContentItemId) -> Vec<DeliveryRecord> {
        self.records
            .read()
            .await
            .values()
            .filter(|r| r.item_id == item)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl DeliveryStore for InMemoryDeliveryStore {
    async fn insert_many(&self, records: Vec<DeliveryRecord>) -> AssignmentResult<Vec<DeliveryId>> {
        let mut stored = self.records.write().await;
        let mut ids = Vec::with_capacity(records.len());
        for record in records {
            let id = DeliveryId::new();
            stored.insert(id, record);
            ids.push(id);
        }
        Ok(ids)
    }

    async fn find_one_by_assignment(
        &self,
        assignment: AssignmentId,
    ) -> AssignmentResult<Option<DeliveryRecord>> {
        Ok(self
            .records
            .read()
            .await
            .values()
            .find(|r| r.assignment_id == assignment)
            .cloned())
    }
}

/// One history entry
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryEntry {
    /// What happened
    pub operation: HistoryOperation,
    /// To which assignment
    pub assignment_id: AssignmentId,
    /// Items linked, for content link entries
    pub item_ids: Vec<ContentItemId>,
}

/// History log that keeps every entry
#[derive(Clone, Default)]
pub struct InMemoryHistoryLog {
    entries: Arc<RwLock<Vec<HistoryEntry>>>,
}

impl InMemoryHistoryLog {
    /// Create an empty log
    pub fn new() -> Self {
        Self::default()
    }

    /// Entries of one assignment, oldest first
    pub async fn entries_for(&self, assignment: AssignmentId) -> Vec<HistoryEntry> {
        self.entries
            .read()
            .await
            .iter()
            .filter(|e| e.assignment_id == assignment)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl HistoryLog for InMemoryHistoryLog {
    async fn record(&self, operation: HistoryOperation, assignment: &Assignment) -> AssignmentResult<()> {
        self.entries.write().await.push(HistoryEntry {
            operation,
            assignment_id: assignment.id,
            item_ids: Vec::new(),
        });
        Ok(())
    }

    async fn record_content_link(
        &self,
        item_ids: &[ContentItemId],
        assignment: &Assignment,
    ) -> AssignmentResult<()> {
        self.entries.write().await.push(HistoryEntry {
            operation: HistoryOperation::ContentLink,
            assignment_id: assignment.id,
            item_ids: item_ids.to_vec(),
        });
        Ok(())
    }
}

/// Planning store holding coverage planning blocks
#[derive(Clone, Default)]
pub struct InMemoryPlanningStore {
    coverages: Arc<RwLock<IndexMap<(PlanningId, CoverageId), PlanningSnapshot>>>,
    republished: Arc<RwLock<Vec<PlanningId>>>,
}

impl InMemoryPlanningStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the live planning block of a coverage
    pub async fn set_coverage(
        &self,
        planning: PlanningId,
        coverage: CoverageId,
        snapshot: PlanningSnapshot,
    ) {
        self.coverages
            .write()
            .await
            .insert((planning, coverage), snapshot);
    }

    /// Planning items re-published so far
    pub async fn republished(&self) -> Vec<PlanningId> {
        self.republished.read().await.clone()
    }
}

#[async_trait]
impl PlanningStore for InMemoryPlanningStore {
    async fn republish(&self, planning: PlanningId) -> AssignmentResult<()> {
        self.republished.write().await.push(planning);
        Ok(())
    }

    async fn coverage_planning(
        &self,
        planning: PlanningId,
        coverage: CoverageId,
    ) -> AssignmentResult<Option<PlanningSnapshot>> {
        Ok(self.coverages.read().await.get(&(planning, coverage)).cloned())
    }
}

/// Content store backed by a map
#[derive(Clone, Default)]
pub struct InMemoryContentStore {
    items: Arc<RwLock<IndexMap<ContentItemId, ContentItem>>>,
}

impl InMemoryContentStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace an item
    pub async fn add(&self, item: ContentItem) {
        self.items.write().await.insert(item.id, item);
    }

    /// Current version of an item
    pub async fn get(&self, item: ContentItemId) -> Option<ContentItem> {
        self.items.read().await.get(&item).cloned()
    }
}

#[async_trait]
impl ContentStore for InMemoryContentStore {
    async fn find_one(&self, item: ContentItemId) -> AssignmentResult<Option<ContentItem>> {
        Ok(self.items.read().await.get(&item).cloned())
    }

    async fn find_related(&self, item: ContentItemId) -> AssignmentResult<Vec<ContentItem>> {
        let items = self.items.read().await;
        if !items.contains_key(&item) {
            return Err(AssignmentError::not_found("ContentItem", item));
        }

        // Walk rewrite links in both directions until the family stops growing.
        let mut family: IndexSet<ContentItemId> = IndexSet::new();
        family.insert(item);
        loop {
            let before = family.len();
            for candidate in items.values() {
                let linked = candidate
                    .rewrite_of
                    .is_some_and(|parent| family.contains(&parent));
                let parent_of_member = family.iter().any(|member| {
                    items
                        .get(member)
                        .and_then(|m| m.rewrite_of)
                        .is_some_and(|parent| parent == candidate.id)
                });
                if linked || parent_of_member {
                    family.insert(candidate.id);
                }
            }
            if family.len() == before {
                break;
            }
        }

        Ok(family
            .iter()
            .filter_map(|id| items.get(id).cloned())
            .collect())
    }

    async fn set_assignment(
        &self,
        item: ContentItemId,
        assignment: AssignmentId,
    ) -> AssignmentResult<()> {
        let mut items = self.items.write().await;
        let stored = items
            .get_mut(&item)
            .ok_or_else(|| AssignmentError::not_found("ContentItem", item))?;
        if let Some(existing) = stored.assignment_id {
            return Err(AssignmentError::validation(
                format!("content {item}"),
                "assignment_id",
                format!("Content is already linked to assignment {existing}."),
            ));
        }
        stored.assignment_id = Some(assignment);
        Ok(())
    }
}
