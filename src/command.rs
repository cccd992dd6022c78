use crate::core::{InstanceId, InstanceValue, OwnerBinding, PropertyBag, QualifiedName};

/// Persists an instance's Data and a patch of its Metadata.
#[derive(Debug, Clone, Default)]
pub struct SaveInstanceCommand {
    pub instance_data: PropertyBag,
    pub instance_metadata_changes: PropertyBag,
    pub complete_instance: bool,
    pub unlock_instance: bool,
}

impl SaveInstanceCommand {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn data(mut self, name: impl Into<QualifiedName>, value: InstanceValue) -> Self {
        self.instance_data.insert(name.into(), value);
        self
    }

    pub fn metadata_change(
        mut self,
        name: impl Into<QualifiedName>,
        value: InstanceValue,
    ) -> Self {
        self.instance_metadata_changes.insert(name.into(), value);
        self
    }

    pub fn complete(mut self) -> Self {
        self.complete_instance = true;
        self
    }

    pub fn unlock(mut self) -> Self {
        self.unlock_instance = true;
        self
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct LoadInstanceCommand {
    /// The caller is probing for an instance that may not exist yet.
    pub accept_uninitialized_instance: bool,
}

/// Commands understood by the store.
#[derive(Debug, Clone)]
pub enum InstanceCommand {
    SaveInstance(SaveInstanceCommand),
    LoadInstance(LoadInstanceCommand),
    CreateOwner,
    DeleteOwner,
    TryLoadRunnable,
    /// Any command this store has no handler for.
    Unsupported(String),
}

impl InstanceCommand {
    pub fn name(&self) -> &str {
        match self {
            Self::SaveInstance(_) => "SaveInstance",
            Self::LoadInstance(_) => "LoadInstance",
            Self::CreateOwner => "CreateOwner",
            Self::DeleteOwner => "DeleteOwner",
            Self::TryLoadRunnable => "TryLoadRunnable",
            Self::Unsupported(name) => name,
        }
    }
}

impl From<SaveInstanceCommand> for InstanceCommand {
    fn from(command: SaveInstanceCommand) -> Self {
        Self::SaveInstance(command)
    }
}

impl From<LoadInstanceCommand> for InstanceCommand {
    fn from(command: LoadInstanceCommand) -> Self {
        Self::LoadInstance(command)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandOutcome {
    Saved,
    Loaded(InstanceId),
    OwnerCreated(OwnerBinding),
    OwnerDeleted,
    /// `TryLoadRunnable` found no expired timer.
    NoRunnableInstance,
    /// Neutral "false": the command was not handled.
    NotHandled,
}

impl CommandOutcome {
    pub fn is_handled(&self) -> bool {
        !matches!(self, Self::NotHandled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_save_builder() {
        let command = SaveInstanceCommand::new()
            .data("Foo", InstanceValue::new("bar"))
            .metadata_change("Mode", InstanceValue::new("fast"))
            .unlock();

        assert_eq!(command.instance_data.len(), 1);
        assert_eq!(command.instance_metadata_changes.len(), 1);
        assert!(command.unlock_instance);
        assert!(!command.complete_instance);
    }

    #[test]
    fn test_names_and_outcomes() {
        assert_eq!(InstanceCommand::TryLoadRunnable.name(), "TryLoadRunnable");
        assert_eq!(
            InstanceCommand::Unsupported("QueryActivatableWorkflows".into()).name(),
            "QueryActivatableWorkflows"
        );
        assert!(CommandOutcome::NoRunnableInstance.is_handled());
        assert!(!CommandOutcome::NotHandled.is_handled());
    }
}
