//! Shared wiring for the integration tests: every collaborator in memory.

#![allow(dead_code)]

use std::sync::Arc;

use cim_domain_assignment::infrastructure::{
    InMemoryContentStore, InMemoryDeliveryStore, InMemoryDeskDirectory, InMemoryHistoryLog,
    InMemoryPlanningStore, RecordingActivityFeed, RecordingNotifier,
};
use cim_domain_assignment::{
    Actor, AssignmentWorkflowService, ContentItem, ContentLinkingService, ContentState, Desk,
    DeskId, DeskMember, InMemoryAssignmentStore, UserId,
};

pub struct Engine {
    pub store: InMemoryAssignmentStore,
    pub desks: InMemoryDeskDirectory,
    pub planning: InMemoryPlanningStore,
    pub history: InMemoryHistoryLog,
    pub notifier: RecordingNotifier,
    pub activity: RecordingActivityFeed,
    pub content: InMemoryContentStore,
    pub deliveries: InMemoryDeliveryStore,
    pub workflow: Arc<AssignmentWorkflowService>,
    pub linking: ContentLinkingService,
}

impl Engine {
    pub fn new() -> Self {
        let store = InMemoryAssignmentStore::new();
        let desks = InMemoryDeskDirectory::new();
        let planning = InMemoryPlanningStore::new();
        let history = InMemoryHistoryLog::new();
        let notifier = RecordingNotifier::new();
        let activity = RecordingActivityFeed::new();
        let content = InMemoryContentStore::new();
        let deliveries = InMemoryDeliveryStore::new();

        let workflow = Arc::new(AssignmentWorkflowService::new(
            Arc::new(store.clone()),
            Arc::new(desks.clone()),
            Arc::new(planning.clone()),
            Arc::new(history.clone()),
            Arc::new(notifier.clone()),
            Arc::new(activity.clone()),
        ));
        let linking = ContentLinkingService::new(
            workflow.clone(),
            Arc::new(content.clone()),
            Arc::new(deliveries.clone()),
        );

        Self {
            store,
            desks,
            planning,
            history,
            notifier,
            activity,
            content,
            deliveries,
            workflow,
            linking,
        }
    }

    /// Register a desk with the given members
    pub async fn desk(&self, name: &str, members: &[UserId]) -> DeskId {
        let id = DeskId::new();
        self.desks
            .add(Desk {
                id,
                name: name.to_string(),
                members: members.iter().map(|&user| DeskMember { user }).collect(),
            })
            .await;
        id
    }

    /// Store a content item sitting on `desk`
    pub async fn item(&self, state: ContentState, desk: Option<DeskId>) -> ContentItem {
        let item = ContentItem::new(state, desk);
        self.content.add(item.clone()).await;
        item
    }
}

pub fn actor(name: &str) -> Actor {
    Actor::new(UserId::new(), name)
}
