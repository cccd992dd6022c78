use crate::codec;
use crate::command::{CommandOutcome, InstanceCommand, LoadInstanceCommand, SaveInstanceCommand};
use crate::config::StoreConfig;
use crate::core::{InstanceId, InstanceState, Result, StoreError};
use crate::instance::InstanceContext;
use crate::owner::OwnerRegistry;
use crate::storage::{
    FileInstanceRepository, FileTimerIndex, InstanceRecords, InstanceRepository, StoreLayout,
    TimerIndex,
};
use chrono::{DateTime, Utc};
use log::{debug, warn};
use std::sync::Arc;
use std::time::Duration;
use tokio::fs;
use tokio::sync::watch;
use tracing::{Instrument, Level, event, info_span};

/// Steps of a load, from a resolved instance id to a populated view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadPhase {
    Idle,
    Binding,
    Reading,
    Internalizing,
    Delivered,
}

/// Durable instance store.
///
/// Accepts [`InstanceCommand`]s against a caller-owned [`InstanceContext`] and
/// persists instance records plus the pending timer index in one directory.
pub struct InstanceStore {
    config: StoreConfig,
    repository: Arc<dyn InstanceRepository>,
    timers: Arc<dyn TimerIndex>,
    owners: OwnerRegistry,
}

impl InstanceStore {
    /// Opens the file-backed store, creating the root directory if absent.
    pub async fn open(config: StoreConfig) -> Result<Self> {
        let layout = StoreLayout::new(&config.root_dir);
        let repository = Arc::new(FileInstanceRepository::new(layout.clone(), config.pretty));
        let timers = Arc::new(FileTimerIndex::new(layout, config.pretty));
        Self::with_backends(config, repository, timers).await
    }

    pub async fn with_backends(
        config: StoreConfig,
        repository: Arc<dyn InstanceRepository>,
        timers: Arc<dyn TimerIndex>,
    ) -> Result<Self> {
        config.validate().map_err(StoreError::InvalidOperation)?;
        fs::create_dir_all(&config.root_dir).await.map_err(|err| {
            StoreError::IoError(format!(
                "Failed to create store directory '{}': {}",
                config.root_dir.display(),
                err
            ))
        })?;

        Ok(Self {
            config,
            repository,
            timers,
            owners: OwnerRegistry::new(),
        })
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    pub fn owners(&self) -> &OwnerRegistry {
        &self.owners
    }

    pub fn subscribe_runnable(&self) -> watch::Receiver<bool> {
        self.owners.subscribe()
    }

    /// Runs one command to completion.
    ///
    /// `timeout` is accepted for protocol compatibility and not enforced.
    /// Unknown commands yield [`CommandOutcome::NotHandled`]; handler failures
    /// come back as the handler's own [`StoreError`].
    pub async fn execute(
        &self,
        context: &mut InstanceContext,
        command: InstanceCommand,
        timeout: Duration,
    ) -> Result<CommandOutcome> {
        let span = info_span!(
            "instance_store.execute",
            command = command.name(),
            instance = ?context.view().instance_id(),
            timeout_ms = timeout.as_millis() as u64,
        );

        async move {
            let name = command.name().to_string();
            let outcome = match command {
                InstanceCommand::SaveInstance(save) => self.save_instance(context, save).await,
                InstanceCommand::LoadInstance(load) => self.load_instance(context, load).await,
                InstanceCommand::CreateOwner => self.create_owner(context),
                InstanceCommand::DeleteOwner => self.delete_owner(),
                InstanceCommand::TryLoadRunnable => self.try_load_runnable(context).await,
                InstanceCommand::Unsupported(_) => Ok(CommandOutcome::NotHandled),
            };

            match &outcome {
                Ok(result) => debug!("{name} -> {result:?}"),
                Err(err) => debug!("{name} failed: {err}"),
            }
            outcome
        }
        .instrument(span)
        .await
    }

    async fn save_instance(
        &self,
        context: &mut InstanceContext,
        command: SaveInstanceCommand,
    ) -> Result<CommandOutcome> {
        let id = context.require_instance_id()?;

        if command.complete_instance {
            context.ensure_lock();
            context.completed_instance();
            // The index must never point at deleted records.
            if let Err(err) = self.timers.remove(id).await {
                warn!("failed to clear timer of completed instance {id}: {err}");
            }
            if !self.config.keep_instance_data_after_completion {
                if let Err(err) = self.repository.delete_instance(id).await {
                    warn!("failed to delete records of completed instance {id}: {err}");
                }
            }
            context.free_handle();
            return Ok(CommandOutcome::Saved);
        }

        let pending_timer = codec::pending_timer_expiration(&command.instance_data)?;
        let records = InstanceRecords {
            data: codec::externalize(&command.instance_data)?,
            metadata: codec::merge_metadata(
                context.view().metadata(),
                &command.instance_metadata_changes,
            )?,
        };

        context.ensure_lock();
        self.repository.write_instance(id, &records).await?;
        self.timers.record_timer(id, pending_timer).await?;

        context.wrote_instance_metadata(&command.instance_metadata_changes);
        context.persisted_instance(&command.instance_data);
        if command.unlock_instance {
            context.free_handle();
        }

        Ok(CommandOutcome::Saved)
    }

    async fn load_instance(
        &self,
        context: &mut InstanceContext,
        command: LoadInstanceCommand,
    ) -> Result<CommandOutcome> {
        if command.accept_uninitialized_instance {
            return Ok(CommandOutcome::NotHandled);
        }
        let id = context.require_instance_id()?;
        self.load_resolved(context, id).await
    }

    /// Loads the earliest expired instance. Timer entries whose records are
    /// gone are dropped from the index and skipped.
    async fn try_load_runnable(&self, context: &mut InstanceContext) -> Result<CommandOutcome> {
        while let Some(id) = self.timers.find_expired(Utc::now()).await? {
            if self.repository.contains_instance(id).await? {
                return self.load_resolved(context, id).await;
            }
            warn!("dropping timer of instance {id}: no records on disk");
            self.timers.remove(id).await?;
        }
        Ok(CommandOutcome::NoRunnableInstance)
    }

    /// Shared tail of `LoadInstance` and `TryLoadRunnable`.
    async fn load_resolved(
        &self,
        context: &mut InstanceContext,
        id: InstanceId,
    ) -> Result<CommandOutcome> {
        let mut phase = LoadPhase::Idle;

        advance(id, &mut phase, LoadPhase::Binding);
        context.bind_instance(id)?;
        context.ensure_lock();

        advance(id, &mut phase, LoadPhase::Reading);
        let records = self
            .repository
            .read_instance(id)
            .await
            .inspect_err(|err| debug!("load of {id} failed while {phase:?}: {err}"))?;

        advance(id, &mut phase, LoadPhase::Internalizing);
        let data = codec::internalize(records.data)?;
        let metadata = codec::internalize(records.metadata)?;

        advance(id, &mut phase, LoadPhase::Delivered);
        context.loaded_instance(InstanceState::Initialized, data, metadata);
        Ok(CommandOutcome::Loaded(id))
    }

    fn create_owner(&self, context: &mut InstanceContext) -> Result<CommandOutcome> {
        let owner = self.owners.create_owner()?;
        context.bind_instance_owner(owner);
        Ok(CommandOutcome::OwnerCreated(owner))
    }

    fn delete_owner(&self) -> Result<CommandOutcome> {
        self.owners.delete_owner()?;
        Ok(CommandOutcome::OwnerDeleted)
    }

    /// Ids of every instance with a Data record on disk.
    pub async fn list_instances(&self) -> Result<Vec<InstanceId>> {
        self.repository.list_instances().await
    }

    /// Timer index entries, earliest deadline first.
    pub async fn timers(&self) -> Result<Vec<(InstanceId, DateTime<Utc>)>> {
        self.timers.entries().await
    }

    pub async fn find_expired(&self, now: DateTime<Utc>) -> Result<Option<InstanceId>> {
        self.timers.find_expired(now).await
    }

    /// Polls the timer index until an instance is runnable or `timeout` elapses.
    pub async fn wait_for_runnable(
        &self,
        poll_interval: Duration,
        timeout: Duration,
    ) -> Result<Option<InstanceId>> {
        let poll = async {
            loop {
                if let Some(id) = self.timers.find_expired(Utc::now()).await? {
                    return Ok::<InstanceId, StoreError>(id);
                }
                tokio::time::sleep(poll_interval).await;
            }
        };

        match tokio::time::timeout(timeout, poll).await {
            Ok(found) => found.map(Some),
            Err(_) => Ok(None),
        }
    }
}

fn advance(id: InstanceId, phase: &mut LoadPhase, next: LoadPhase) {
    let from = *phase;
    event!(Level::TRACE, instance = %id, from = ?from, to = ?next, "load phase");
    *phase = next;
}

impl std::fmt::Debug for InstanceStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InstanceStore")
            .field("config", &self.config)
            .field("owners", &self.owners)
            .finish()
    }
}
