use async_trait::async_trait;
use crate::command::{CommandOutcome, InstanceCommand};
use crate::core::Result;
use crate::facade::InstanceStore;
use crate::instance::InstanceContext;
use std::time::Duration;

/// A generic trait for instance persistence providers.
///
/// The execution engine talks to its store only through this trait, so the
/// file-backed [`InstanceStore`] can be swapped for another backend.
#[async_trait]
pub trait InstancePersistence: Send + Sync {
    /// Run one command against the caller's context.
    async fn execute(
        &self,
        context: &mut InstanceContext,
        command: InstanceCommand,
        timeout: Duration,
    ) -> Result<CommandOutcome>;

    /// Boolean form of [`execute`](Self::execute): `Ok(false)` when the command was not handled.
    async fn try_command(
        &self,
        context: &mut InstanceContext,
        command: InstanceCommand,
        timeout: Duration,
    ) -> Result<bool> {
        Ok(self.execute(context, command, timeout).await?.is_handled())
    }
}

#[async_trait]
impl InstancePersistence for InstanceStore {
    async fn execute(
        &self,
        context: &mut InstanceContext,
        command: InstanceCommand,
        timeout: Duration,
    ) -> Result<CommandOutcome> {
        InstanceStore::execute(self, context, command, timeout).await
    }
}
