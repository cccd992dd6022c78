use crate::core::{InstanceId, InstanceState, OwnerBinding, PropertyBag, UNBOUND_VERSION};

/// What the caller currently knows about its bound instance.
#[derive(Debug, Clone)]
pub struct InstanceView {
    pub(crate) instance_id: Option<InstanceId>,
    pub(crate) version: i64,
    pub(crate) state: InstanceState,
    pub(crate) data: PropertyBag,
    pub(crate) metadata: PropertyBag,
    pub(crate) owner: Option<OwnerBinding>,
}

impl InstanceView {
    pub fn instance_id(&self) -> Option<InstanceId> {
        self.instance_id
    }

    pub fn is_bound_to_instance(&self) -> bool {
        self.instance_id.is_some()
    }

    pub fn version(&self) -> i64 {
        self.version
    }

    pub fn is_bound_to_lock(&self) -> bool {
        self.version != UNBOUND_VERSION
    }

    pub fn state(&self) -> InstanceState {
        self.state
    }

    pub fn data(&self) -> &PropertyBag {
        &self.data
    }

    pub fn metadata(&self) -> &PropertyBag {
        &self.metadata
    }

    pub fn owner(&self) -> Option<OwnerBinding> {
        self.owner
    }
}

impl Default for InstanceView {
    fn default() -> Self {
        Self {
            instance_id: None,
            version: UNBOUND_VERSION,
            state: InstanceState::Uninitialized,
            data: PropertyBag::new(),
            metadata: PropertyBag::new(),
            owner: None,
        }
    }
}
