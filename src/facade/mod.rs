mod store;

pub use store::{InstanceStore, LoadPhase};
