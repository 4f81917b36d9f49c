// Copyright 2025 Cowboy AI, LLC.

//! Infrastructure layer for the assignment engine
//!
//! This module contains the concrete collaborators:
//! - NATS notification bus
//! - In-memory collaborators for tests and embedding
//! - Workflow configuration

/// Workflow configuration
pub mod config;
pub mod memory;
pub mod nats_client;

pub use config::WorkflowConfig;
pub use memory::{
    HistoryEntry, InMemoryContentStore, InMemoryDeliveryStore, InMemoryDeskDirectory,
    InMemoryHistoryLog, InMemoryPlanningStore, RecordingActivityFeed, RecordingNotifier,
};
pub use nats_client::{connect, NatsConfig, NatsError, NatsNotifier};
