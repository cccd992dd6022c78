// ============================================================================
// Instance Store Library
// ============================================================================

pub mod core;
pub mod codec;
pub mod storage;
pub mod instance;
pub mod owner;
pub mod command;
pub mod config;
pub mod facade;
pub mod interface;

// Re-export main types for convenience
pub use facade::{InstanceStore, LoadPhase};
pub use crate::core::{
    DurableRecord, InstanceId, InstanceState, InstanceValue, OwnerBinding, PropertyBag,
    PropertyValue, QualifiedName, Result, StoreError, UNBOUND_VERSION, ValueOptions,
};
pub use command::{CommandOutcome, InstanceCommand, LoadInstanceCommand, SaveInstanceCommand};
pub use config::StoreConfig;
pub use instance::{InstanceContext, InstanceView};
pub use interface::InstancePersistence;
pub use owner::OwnerRegistry;
