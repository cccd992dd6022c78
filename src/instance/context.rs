use super::InstanceView;
use crate::codec;
use crate::core::{InstanceId, InstanceState, OwnerBinding, PropertyBag, Result, StoreError};

/// Per-handle persistence context.
///
/// The engine owns one context per instance handle and passes it to every
/// command; handlers record their effects here.
#[derive(Debug, Clone, Default)]
pub struct InstanceContext {
    view: InstanceView,
    handle_freed: bool,
}

impl InstanceContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn for_instance(id: InstanceId) -> Self {
        let mut context = Self::new();
        context.view.instance_id = Some(id);
        context
    }

    pub fn view(&self) -> &InstanceView {
        &self.view
    }

    pub fn is_handle_freed(&self) -> bool {
        self.handle_freed
    }

    /// Binds the context to `id`. Rebinding to the same id is allowed.
    pub fn bind_instance(&mut self, id: InstanceId) -> Result<()> {
        match self.view.instance_id {
            Some(bound) if bound != id => Err(StoreError::InvalidOperation(format!(
                "context already bound to instance {bound}, cannot bind {id}"
            ))),
            _ => {
                self.view.instance_id = Some(id);
                Ok(())
            }
        }
    }

    pub(crate) fn require_instance_id(&self) -> Result<InstanceId> {
        self.view.instance_id.ok_or(StoreError::InstanceNotBound)
    }

    /// Binds the lock at `version` if none is held yet.
    pub(crate) fn ensure_lock(&mut self) {
        if !self.view.is_bound_to_lock() {
            self.bind_acquired_lock(0);
        }
    }

    pub(crate) fn bind_acquired_lock(&mut self, version: i64) {
        self.view.version = version;
    }

    pub(crate) fn bind_instance_owner(&mut self, owner: OwnerBinding) {
        self.view.owner = Some(owner);
    }

    pub(crate) fn completed_instance(&mut self) {
        self.view.state = InstanceState::Completed;
    }

    pub(crate) fn persisted_instance(&mut self, data: &PropertyBag) {
        self.view.data = codec::visible(data);
        if self.view.state == InstanceState::Uninitialized {
            self.view.state = InstanceState::Initialized;
        }
    }

    pub(crate) fn wrote_instance_metadata(&mut self, changes: &PropertyBag) {
        codec::apply_metadata_changes(&mut self.view.metadata, changes);
    }

    pub(crate) fn loaded_instance(
        &mut self,
        state: InstanceState,
        data: PropertyBag,
        metadata: PropertyBag,
    ) {
        self.view.state = state;
        self.view.data = data;
        self.view.metadata = metadata;
    }

    pub(crate) fn free_handle(&mut self) {
        self.handle_freed = true;
    }
}
