// Copyright 2025 Cowboy AI, LLC.

//! Typed identifiers for the assignment domain
//!
//! Every entity the engine touches is referenced by a UUID wrapped in a
//! phantom-typed [`EntityId`], so a desk id can never be passed where a user
//! id is expected. The one exception is the assignee slot of an assignment,
//! which may hold an external provider code and is therefore a [`UserRef`].

use schemars::gen::SchemaGenerator;
use schemars::schema::{InstanceType, Schema, SchemaObject};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::marker::PhantomData;
use std::str::FromStr;
use uuid::Uuid;

/// A typed entity ID using phantom types for type safety
///
/// # Examples
///
/// ```rust
/// use cim_domain_assignment::{DeskId, UserId};
///
/// let desk = DeskId::new();
/// let user = UserId::new();
///
/// // These are different types - won't compile if mixed up:
/// // let _: DeskId = user; // ERROR!
/// assert_ne!(desk.as_uuid(), user.as_uuid());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId<T> {
    id: Uuid,
    #[serde(skip)]
    _phantom: PhantomData<T>,
}

impl<T> EntityId<T> {
    /// Create a new random entity ID
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            _phantom: PhantomData,
        }
    }

    /// Create an entity ID from a UUID
    pub fn from_uuid(id: Uuid) -> Self {
        Self {
            id,
            _phantom: PhantomData,
        }
    }

    /// Get the underlying UUID
    pub fn as_uuid(&self) -> &Uuid {
        &self.id
    }
}

impl<T> fmt::Display for EntityId<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id)
    }
}

impl<T> Default for EntityId<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> From<Uuid> for EntityId<T> {
    fn from(id: Uuid) -> Self {
        Self::from_uuid(id)
    }
}

impl<T> From<EntityId<T>> for Uuid {
    fn from(id: EntityId<T>) -> Self {
        id.id
    }
}

impl<T> FromStr for EntityId<T> {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self::from_uuid)
    }
}

impl<T> JsonSchema for EntityId<T> {
    fn schema_name() -> String {
        "EntityId".to_string()
    }

    fn json_schema(_gen: &mut SchemaGenerator) -> Schema {
        SchemaObject {
            instance_type: Some(InstanceType::String.into()),
            format: Some("uuid".to_string()),
            ..Default::default()
        }
        .into()
    }
}

// Marker types for entity IDs
/// Marker for assignment entities
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AssignmentMarker;

/// Marker for desk entities
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DeskMarker;

/// Marker for user entities
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UserMarker;

/// Marker for planning entities
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PlanningMarker;

/// Marker for coverage entities
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CoverageMarker;

/// Marker for content item entities
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContentItemMarker;

/// Marker for delivery records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DeliveryMarker;

/// Identifier of an assignment
pub type AssignmentId = EntityId<AssignmentMarker>;
/// Identifier of a desk
pub type DeskId = EntityId<DeskMarker>;
/// Identifier of a system user
pub type UserId = EntityId<UserMarker>;
/// Identifier of a planning item
pub type PlanningId = EntityId<PlanningMarker>;
/// Identifier of a coverage slot inside a planning item
pub type CoverageId = EntityId<CoverageMarker>;
/// Identifier of a produced content item
pub type ContentItemId = EntityId<ContentItemMarker>;
/// Identifier of a delivery record
pub type DeliveryId = EntityId<DeliveryMarker>;

/// The raw value held in an assignment's user slot
///
/// Usually a [`UserId`], but an external coverage provider can be assigned
/// through its qcode, which is not a user id at all.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct UserRef(String);

impl UserRef {
    /// Wrap a raw assignee value
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// The raw assignee value
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The system user behind this reference, if the value is a well-formed
    /// user identifier.
    ///
    /// A provider qcode that happens to be a valid UUID is reported as a user.
    pub fn user_id(&self) -> Option<UserId> {
        self.0.parse().ok()
    }

    /// Whether this reference points at the given user
    pub fn is_user(&self, user: &UserId) -> bool {
        self.user_id().as_ref() == Some(user)
    }
}

impl From<UserId> for UserRef {
    fn from(id: UserId) -> Self {
        Self(id.to_string())
    }
}

impl From<&UserId> for UserRef {
    fn from(id: &UserId) -> Self {
        Self(id.to_string())
    }
}

impl fmt::Display for UserRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
