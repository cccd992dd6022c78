use super::io::{atomic_write, decode, encode, read_optional, remove_if_exists};
use super::layout::StoreLayout;
use crate::core::{DurableRecord, InstanceId, Result, StoreError};
use async_trait::async_trait;
use tokio::fs;

/// Durable Data + Metadata records of an instance.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InstanceRecords {
    pub data: DurableRecord,
    pub metadata: DurableRecord,
}

/// Storage backend for per-instance records.
#[async_trait]
pub trait InstanceRepository: Send + Sync {
    /// Fully replaces both records of `id`.
    async fn write_instance(&self, id: InstanceId, records: &InstanceRecords) -> Result<()>;

    /// Fails with [`StoreError::InstanceNotFound`] if either record is absent.
    async fn read_instance(&self, id: InstanceId) -> Result<InstanceRecords>;

    /// Deletes both records. Missing records are not an error.
    async fn delete_instance(&self, id: InstanceId) -> Result<()>;

    /// True when a Data record exists for `id`.
    async fn contains_instance(&self, id: InstanceId) -> Result<bool> {
        match self.read_instance(id).await {
            Ok(_) => Ok(true),
            Err(err) if err.is_not_found() => Ok(false),
            Err(err) => Err(err),
        }
    }

    async fn list_instances(&self) -> Result<Vec<InstanceId>>;
}

/// One pretty-printed JSON file per record, in a flat directory.
#[derive(Debug, Clone)]
pub struct FileInstanceRepository {
    layout: StoreLayout,
    pretty: bool,
}

impl FileInstanceRepository {
    pub fn new(layout: StoreLayout, pretty: bool) -> Self {
        Self { layout, pretty }
    }

    pub fn layout(&self) -> &StoreLayout {
        &self.layout
    }
}

#[async_trait]
impl InstanceRepository for FileInstanceRepository {
    async fn write_instance(&self, id: InstanceId, records: &InstanceRecords) -> Result<()> {
        // Encode both before touching disk so a bad record never half-applies.
        let data = encode(&records.data, self.pretty)?;
        let metadata = encode(&records.metadata, self.pretty)?;

        atomic_write(&self.layout.data_path(id), &data).await?;
        atomic_write(&self.layout.metadata_path(id), &metadata).await?;
        Ok(())
    }

    async fn read_instance(&self, id: InstanceId) -> Result<InstanceRecords> {
        let data_path = self.layout.data_path(id);
        let metadata_path = self.layout.metadata_path(id);

        let data_bytes = read_optional(&data_path)
            .await?
            .ok_or(StoreError::InstanceNotFound(id))?;
        let metadata_bytes = read_optional(&metadata_path)
            .await?
            .ok_or(StoreError::InstanceNotFound(id))?;

        Ok(InstanceRecords {
            data: decode(&data_path, &data_bytes)?,
            metadata: decode(&metadata_path, &metadata_bytes)?,
        })
    }

    async fn delete_instance(&self, id: InstanceId) -> Result<()> {
        let data = remove_if_exists(&self.layout.data_path(id)).await;
        let metadata = remove_if_exists(&self.layout.metadata_path(id)).await;
        data.and(metadata)
    }

    async fn contains_instance(&self, id: InstanceId) -> Result<bool> {
        let path = self.layout.data_path(id);
        fs::try_exists(&path).await.map_err(|err| {
            StoreError::IoError(format!("Failed to stat '{}': {}", path.display(), err))
        })
    }

    async fn list_instances(&self) -> Result<Vec<InstanceId>> {
        let root = self.layout.root_dir();
        let mut entries = fs::read_dir(root).await.map_err(|err| {
            StoreError::IoError(format!("Failed to list '{}': {}", root.display(), err))
        })?;

        let mut ids = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|err| StoreError::IoError(err.to_string()))?
        {
            if let Some(id) = entry
                .file_name()
                .to_str()
                .and_then(StoreLayout::instance_id_from_data_file)
            {
                ids.push(id);
            }
        }
        ids.sort();
        Ok(ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::InstanceValue;
    use tempfile::TempDir;
    use uuid::Uuid;

    fn repository(dir: &TempDir) -> FileInstanceRepository {
        FileInstanceRepository::new(StoreLayout::new(dir.path()), true)
    }

    fn records() -> InstanceRecords {
        let mut data = DurableRecord::new();
        data.insert("Foo".to_string(), InstanceValue::new("bar"));
        let mut metadata = DurableRecord::new();
        metadata.insert("{urn:test}Owner".to_string(), InstanceValue::new("alice"));
        InstanceRecords { data, metadata }
    }

    #[tokio::test]
    async fn test_write_and_read() {
        let dir = TempDir::new().unwrap();
        let repo = repository(&dir);
        let id = Uuid::new_v4();

        repo.write_instance(id, &records()).await.unwrap();
        assert_eq!(repo.read_instance(id).await.unwrap(), records());

        // Indented on disk.
        let text = std::fs::read_to_string(repo.layout().data_path(id)).unwrap();
        assert!(text.contains("\n  \"Foo\""));
        assert!(!repo.layout().data_path(id).with_extension("tmp").exists());
    }

    #[tokio::test]
    async fn test_read_missing_is_not_found() {
        let dir = TempDir::new().unwrap();
        let repo = repository(&dir);
        let id = Uuid::new_v4();

        let err = repo.read_instance(id).await.unwrap_err();
        assert!(err.is_not_found());

        // Data without metadata is still not found.
        std::fs::write(repo.layout().data_path(id), "{}").unwrap();
        assert!(repo.read_instance(id).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_read_malformed_is_serialization_error() {
        let dir = TempDir::new().unwrap();
        let repo = repository(&dir);
        let id = Uuid::new_v4();

        std::fs::write(repo.layout().data_path(id), "{ \"Foo\": ").unwrap();
        std::fs::write(repo.layout().metadata_path(id), "{}").unwrap();
        assert!(matches!(
            repo.read_instance(id).await,
            Err(StoreError::Serialization(_))
        ));
    }

    #[tokio::test]
    async fn test_delete_and_list() {
        let dir = TempDir::new().unwrap();
        let repo = repository(&dir);
        let first = Uuid::new_v4();
        let second = Uuid::new_v4();

        repo.write_instance(first, &records()).await.unwrap();
        repo.write_instance(second, &records()).await.unwrap();

        let mut expected = vec![first, second];
        expected.sort();
        assert_eq!(repo.list_instances().await.unwrap(), expected);

        repo.delete_instance(first).await.unwrap();
        assert_eq!(repo.list_instances().await.unwrap(), vec![second]);
        assert!(!repo.layout().metadata_path(first).exists());

        // Deleting again is fine.
        repo.delete_instance(first).await.unwrap();
    }
}
