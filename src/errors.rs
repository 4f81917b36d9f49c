// Copyright 2025 Cowboy AI, LLC.

//! Error types for assignment workflow operations

use std::fmt;
use thiserror::Error;

/// The step of a content link that failed after validation passed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkStage {
    /// Persisting the derived assignment state
    AssignmentUpdate,
    /// Stamping the assignment reference onto the content items
    ItemStamping,
    /// Writing delivery records for the linked items
    DeliveryCreation,
}

impl fmt::Display for LinkStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LinkStage::AssignmentUpdate => "assignment update",
            LinkStage::DeliveryCreation => "delivery creation",
            LinkStage::ItemStamping => "item stamping",
        };
        f.write_str(s)
    }
}

/// Errors that can occur in assignment workflow operations
#[derive(Debug, Clone, Error)]
pub enum AssignmentError {
    /// Malformed or logically inconsistent input; nothing was written
    #[error("Validation error on {entity}.{field}: {message}")]
    Validation {
        /// Entity the input was meant for (with id when known)
        entity: String,
        /// Offending field
        field: String,
        /// Message suitable for the end user
        message: String,
    },

    /// Referenced entity does not exist
    #[error("Entity not found: {entity_type} with id {id}")]
    NotFound {
        /// Type of entity that wasn't found
        entity_type: String,
        /// ID that was searched for
        id: String,
    },

    /// A link left the assignment and its deliveries out of step
    #[error("Consistency error linking assignment {assignment_id} during {stage}: {message}")]
    Consistency {
        /// Assignment being linked
        assignment_id: String,
        /// Step that failed
        stage: LinkStage,
        /// Underlying failure
        message: String,
    },

    /// Conditional write rejected because the stored document moved on
    #[error("Concurrency conflict on {id}: expected version {expected}, but found {actual}")]
    ConcurrencyConflict {
        /// Document id
        id: String,
        /// Version the caller read
        expected: u64,
        /// Version currently stored
        actual: u64,
    },

    /// Transition outside the assignment state graph
    #[error("Invalid state transition from {from} to {to}")]
    InvalidStateTransition {
        /// Current state
        from: String,
        /// Attempted target state
        to: String,
    },

    /// A collaborator (store, directory, bus) failed
    #[error("External service error: {service} - {message}")]
    ExternalService {
        /// Name of the collaborator
        service: String,
        /// Error message from the collaborator
        message: String,
    },

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Result type for assignment operations
pub type AssignmentResult<T> = Result<T, AssignmentError>;

impl From<serde_json::Error> for AssignmentError {
    fn from(err: serde_json::Error) -> Self {
        AssignmentError::Serialization(err.to_string())
    }
}

impl AssignmentError {
    /// Create a validation error
    pub fn validation(
        entity: impl Into<String>,
        field: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        AssignmentError::Validation {
            entity: entity.into(),
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create a not-found error
    pub fn not_found(entity_type: impl Into<String>, id: impl ToString) -> Self {
        AssignmentError::NotFound {
            entity_type: entity_type.into(),
            id: id.to_string(),
        }
    }

    /// Create an error for a failing collaborator
    pub fn external(service: impl Into<String>, message: impl ToString) -> Self {
        AssignmentError::ExternalService {
            service: service.into(),
            message: message.to_string(),
        }
    }

    /// Check if this is a not found error
    pub fn is_not_found(&self) -> bool {
        matches!(self, AssignmentError::NotFound { .. })
    }

    /// Check if this is a validation error
    pub fn is_validation_error(&self) -> bool {
        matches!(self, AssignmentError::Validation { .. })
    }

    /// Check if this is a concurrency error
    pub fn is_concurrency_error(&self) -> bool {
        matches!(self, AssignmentError::ConcurrencyConflict { .. })
    }

    /// Check if this is a link consistency error
    pub fn is_consistency_error(&self) -> bool {
        matches!(self, AssignmentError::Consistency { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_messages() {
        let err = AssignmentError::validation("assignment", "assigned_to.desk", "Assignment should have a desk.");
        assert_eq!(
            err.to_string(),
            "Validation error on assignment.assigned_to.desk: Assignment should have a desk."
        );

        let err = AssignmentError::not_found("Desk", "d-1");
        assert_eq!(err.to_string(), "Entity not found: Desk with id d-1");

        let err = AssignmentError::Consistency {
            assignment_id: "a-1".to_string(),
            stage: LinkStage::DeliveryCreation,
            message: "timeout".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Consistency error linking assignment a-1 during delivery creation: timeout"
        );

        let err = AssignmentError::ConcurrencyConflict {
            id: "a-1".to_string(),
            expected: 2,
            actual: 3,
        };
        assert_eq!(
            err.to_string(),
            "Concurrency conflict on a-1: expected version 2, but found 3"
        );

        let err = AssignmentError::external("desks", "connection reset");
        assert_eq!(err.to_string(), "External service error: desks - connection reset");
    }

    #[test]
    fn test_helper_method_exclusivity() {
        let validation = AssignmentError::validation("content", "assignment_id", "already linked");
        assert!(validation.is_validation_error());
        assert!(!validation.is_not_found());
        assert!(!validation.is_concurrency_error());
        assert!(!validation.is_consistency_error());

        let missing = AssignmentError::not_found("Assignment", "a-1");
        assert!(missing.is_not_found());
        assert!(!missing.is_validation_error());

        let conflict = AssignmentError::ConcurrencyConflict {
            id: "a-1".to_string(),
            expected: 1,
            actual: 2,
        };
        assert!(conflict.is_concurrency_error());
        assert!(!conflict.is_not_found());
    }

    #[test]
    fn test_serde_json_conversion() {
        let serde_err = serde_json::from_str::<serde_json::Value>("{ invalid json }").unwrap_err();
        let err: AssignmentError = serde_err.into();
        assert!(matches!(err, AssignmentError::Serialization(msg) if !msg.is_empty()));
    }
}
