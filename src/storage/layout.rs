use crate::core::InstanceId;
use std::path::{Path, PathBuf};

pub const INSTANCE_DATA_SUFFIX: &str = "-InstanceData";
pub const INSTANCE_METADATA_SUFFIX: &str = "-InstanceMetadata";
pub const TIMER_TABLE_FILE: &str = "TimerTable";

/// Flat on-disk layout of a store directory.
#[derive(Debug, Clone)]
pub struct StoreLayout {
    root_dir: PathBuf,
}

impl StoreLayout {
    pub fn new<P: AsRef<Path>>(root_dir: P) -> Self {
        Self {
            root_dir: root_dir.as_ref().to_path_buf(),
        }
    }

    pub fn root_dir(&self) -> &Path {
        &self.root_dir
    }

    pub fn data_path(&self, id: InstanceId) -> PathBuf {
        self.root_dir.join(format!("{id}{INSTANCE_DATA_SUFFIX}"))
    }

    pub fn metadata_path(&self, id: InstanceId) -> PathBuf {
        self.root_dir.join(format!("{id}{INSTANCE_METADATA_SUFFIX}"))
    }

    pub fn timer_table_path(&self) -> PathBuf {
        self.root_dir.join(TIMER_TABLE_FILE)
    }

    /// Recovers the instance id from a Data record file name.
    pub fn instance_id_from_data_file(file_name: &str) -> Option<InstanceId> {
        file_name
            .strip_suffix(INSTANCE_DATA_SUFFIX)
            .and_then(|id| id.parse().ok())
    }
}
