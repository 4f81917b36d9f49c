// Copyright 2025 Cowboy AI, LLC.

//! # CIM Domain Assignment
//!
//! Assignment workflow engine for editorial coverage.
//!
//! An assignment binds a planned coverage slot to a desk, a user or an
//! external provider and follows the work through its lifecycle:
//! assigned → submitted → in progress → completed, or cancelled.
//!
//! - **State machine**: pure transition decisions over the `assigned_to` block
//! - **Workflow service**: create, update, cancel and the content-event hooks
//! - **Linking service**: binds content items to an assignment exactly once
//! - **Ports**: collaborator traits for desks, content, deliveries, planning,
//!   history, activity and the notification bus
//! - **Infrastructure**: in-memory collaborators and a NATS notification bus
//!
//! ## Design Principles
//!
//! 1. **Type Safety**: Phantom-typed identifiers keep desks, users and items apart
//! 2. **Pure Decisions**: Transitions take the stored block and return a new one
//! 3. **Fresh Reads**: Every entry point decides from the freshly loaded document
//! 4. **State First**: Notification trouble never undoes a persisted change

#![warn(missing_docs)]

mod assignment;
mod content;
mod entity;
mod errors;
mod identifiers;
mod linking;
mod notifications;
mod state_machine;
mod store;
mod workflow;
pub mod infrastructure;
pub mod ports;

// Re-export core types
pub use assignment::{
    assignment_json_schema, Actor, AssignedTo, Assignee, AssigneeProposal, Assignment,
    AssignmentChanges, AssignmentDraft, AssignmentListGroup, AssignmentPatch, AssignmentState,
    CoverageProvider, NewsCoverageStatus, PlanningSnapshot,
};
pub use content::{ContentChange, ContentItem, ContentState, ContentTask, DeliveryRecord};
pub use entity::AggregateRoot;
pub use errors::{AssignmentError, AssignmentResult, LinkStage};
pub use identifiers::{
    AssignmentId, AssignmentMarker, ContentItemId, ContentItemMarker, CoverageId, CoverageMarker,
    DeliveryId, DeliveryMarker, DeskId, DeskMarker, EntityId, PlanningId, PlanningMarker, UserId,
    UserMarker, UserRef,
};
pub use linking::{ContentLinkingService, LinkOutcome, LinkRequest};
pub use notifications::{Activity, ActivityKind, AssignmentNotice, Notification};
pub use ports::{
    ActivityFeed, ContentStore, DeliveryStore, Desk, DeskDirectory, DeskMember, HistoryLog,
    HistoryOperation, Notifier, PlanningStore,
};
pub use state_machine::{AssignmentStateMachine, LinkReassignment, Transition, TransitionTrigger};
pub use store::{AssignmentStore, InMemoryAssignmentStore};
pub use workflow::AssignmentWorkflowService;

#[cfg(feature = "test-utils")]
pub use store::MockAssignmentStore;
