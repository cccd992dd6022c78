mod io;
pub mod layout;
pub mod repository;
pub mod timer;

pub use layout::StoreLayout;
pub use repository::{FileInstanceRepository, InstanceRecords, InstanceRepository};
pub use timer::{FileTimerIndex, TimerIndex, TimerTable};
