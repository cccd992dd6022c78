pub mod error;
pub mod name;
pub mod types;
pub mod value;

pub use error::{Result, StoreError};
pub use name::{QualifiedName, TIMER_EXPIRATION_LOCAL_NAME, WORKFLOW_NAMESPACE};
pub use types::{
    DurableRecord, InstanceId, InstanceState, OwnerBinding, PropertyBag, UNBOUND_VERSION,
};
pub use value::{InstanceValue, PropertyValue, ValueFlag, ValueOptions};
