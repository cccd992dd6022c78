//! Owner registry
//!
//! Issues the owner scope for a store and carries the "runnable work may
//! exist" signal that pollers watch before calling `TryLoadRunnable`.

use crate::core::{OwnerBinding, Result};
use log::debug;
use std::sync::RwLock;
use tokio::sync::watch;

#[derive(Debug)]
pub struct OwnerRegistry {
    active: RwLock<Option<OwnerBinding>>,
    runnable: watch::Sender<bool>,
}

impl OwnerRegistry {
    pub fn new() -> Self {
        let (runnable, _) = watch::channel(false);
        Self {
            active: RwLock::new(None),
            runnable,
        }
    }

    /// Generates a fresh owner, makes it the active scope and arms the
    /// runnable signal.
    pub fn create_owner(&self) -> Result<OwnerBinding> {
        let owner = OwnerBinding::generate();
        *self.active.write()? = Some(owner);
        self.runnable.send_replace(true);
        debug!(
            "owner created: owner_id={} registration_id={}",
            owner.owner_id, owner.registration_id
        );
        Ok(owner)
    }

    /// Owners are not tracked for cleanup; deleting one always succeeds.
    pub fn delete_owner(&self) -> Result<()> {
        debug!("owner delete requested");
        Ok(())
    }

    pub fn active_owner(&self) -> Result<Option<OwnerBinding>> {
        Ok(*self.active.read()?)
    }

    pub fn has_runnable_signal(&self) -> bool {
        *self.runnable.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.runnable.subscribe()
    }
}

impl Default for OwnerRegistry {
    fn default() -> Self {
        Self::new()
    }
}
