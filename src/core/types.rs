use crate::core::{InstanceValue, QualifiedName};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

pub type InstanceId = Uuid;

/// Engine-facing property map, keyed by qualified name.
pub type PropertyBag = BTreeMap<QualifiedName, InstanceValue>;

/// Durable property map, keyed by the textual form of the qualified name.
pub type DurableRecord = BTreeMap<String, InstanceValue>;

/// Version sentinel meaning "no lock held".
pub const UNBOUND_VERSION: i64 = -1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum InstanceState {
    #[default]
    Uninitialized,
    Initialized,
    Completed,
}

/// Owner scope issued by the store: `(owner id, registration id)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OwnerBinding {
    pub owner_id: Uuid,
    pub registration_id: Uuid,
}

impl OwnerBinding {
    pub fn generate() -> Self {
        Self {
            owner_id: Uuid::new_v4(),
            registration_id: Uuid::new_v4(),
        }
    }
}
