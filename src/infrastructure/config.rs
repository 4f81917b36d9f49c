// Copyright 2025 Cowboy AI, LLC.

//! Workflow configuration

use serde::{Deserialize, Serialize};

/// Tunables of the workflow and linking services
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkflowConfig {
    /// Resource name stamped on activity records
    pub activity_resource: String,

    /// Re-publish the planning item after content is linked
    pub republish_planning_on_link: bool,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            activity_resource: "assignments".to_string(),
            republish_planning_on_link: true,
        }
    }
}
