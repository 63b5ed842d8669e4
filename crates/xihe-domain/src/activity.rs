//! User activity records (append-only audit trail).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::values::{Account, ResourceType};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityType {
    Create,
    Fork,
}

impl ActivityType {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Fork => "fork",
        }
    }
}

/// The resource an activity refers to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceObject {
    pub resource_type: ResourceType,
    pub owner: Account,
    pub id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Activity {
    /// The user who performed the action.
    pub owner: Account,
    pub activity_type: ActivityType,
    pub time: DateTime<Utc>,
    pub resource: ResourceObject,
}

impl Activity {
    #[must_use]
    pub fn new(owner: Account, activity_type: ActivityType, resource: ResourceObject) -> Self {
        Self { owner, activity_type, time: Utc::now(), resource }
    }

    /// Activity recorded when `owner` creates one of their own resources.
    #[must_use]
    pub fn for_creating_resource(owner: &Account, resource_type: ResourceType, id: &str) -> Self {
        Self::new(
            owner.clone(),
            ActivityType::Create,
            ResourceObject { resource_type, owner: owner.clone(), id: id.to_string() },
        )
    }
}
