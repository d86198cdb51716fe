//! Local-disk backend.
//!
//! Objects live at `root/{bucket}/{key}`; `/` in a key becomes a directory
//! level. Writes go through a temp file that is fsynced and renamed into
//! place, so readers never observe a partial object.

use super::{ObjectStore, StorageError, StorageResult, ensure_key_safe};
use crate::models::bucket::Bucket;
use async_trait::async_trait;
use bytes::Bytes;
use std::{
    io::{self, ErrorKind},
    path::{Path, PathBuf},
};
use tokio::{
    fs::{self, File},
    io::AsyncWriteExt,
};
use tracing::debug;
use uuid::Uuid;

const TMP_PREFIX: &str = ".tmp-";

#[derive(Clone, Debug)]
pub struct DiskStore {
    /// Directory holding one sub-directory per physical bucket.
    base_path: PathBuf,
}

impl DiskStore {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    fn bucket_root(&self, bucket: &Bucket) -> StorageResult<PathBuf> {
        let name = bucket.name.as_str();
        if name.is_empty() || name.contains('/') || ensure_key_safe(name).is_err() {
            return Err(StorageError::InvalidBucketName(name.to_string()));
        }
        Ok(self.base_path.join(name))
    }

    fn object_path(&self, bucket: &Bucket, key: &str) -> StorageResult<PathBuf> {
        ensure_key_safe(key)?;
        let mut path = self.bucket_root(bucket)?;
        path.extend(key.split('/'));
        Ok(path)
    }

    /// Remove empty directories from `start` upwards, stopping at `stop`.
    async fn prune_empty_dirs(&self, start: &Path, stop: &Path) {
        let mut current = start.to_path_buf();
        while current.starts_with(stop) && current != stop {
            match fs::remove_dir(&current).await {
                Ok(_) => match current.parent() {
                    Some(parent) => current = parent.to_path_buf(),
                    None => break,
                },
                Err(err) if err.kind() == ErrorKind::NotFound => break,
                Err(err) if err.kind() == ErrorKind::DirectoryNotEmpty => break,
                Err(err) => {
                    debug!("failed to prune directory {}: {}", current.display(), err);
                    break;
                }
            }
        }
    }
}

/// Collect `/`-joined paths of all regular files below `root`.
async fn walk_keys(root: &Path) -> io::Result<Vec<String>> {
    let mut keys = Vec::new();
    let mut pending = vec![(root.to_path_buf(), String::new())];

    while let Some((dir, rel)) = pending.pop() {
        let mut entries = match fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(err) if err.kind() == ErrorKind::NotFound => continue,
            Err(err) => return Err(err),
        };
        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name().to_string_lossy().into_owned();
            if name.starts_with(TMP_PREFIX) {
                continue;
            }
            let child = if rel.is_empty() {
                name
            } else {
                format!("{rel}/{name}")
            };
            if entry.file_type().await?.is_dir() {
                pending.push((entry.path(), child));
            } else {
                keys.push(child);
            }
        }
    }

    Ok(keys)
}

#[async_trait]
impl ObjectStore for DiskStore {
    async fn list_keys(&self, bucket: &Bucket) -> StorageResult<Vec<String>> {
        let root = self.bucket_root(bucket)?;
        let prefix = bucket.key_prefix();
        let mut keys: Vec<String> = walk_keys(&root)
            .await?
            .into_iter()
            .filter(|key| key.starts_with(prefix))
            .collect();
        keys.sort();
        Ok(keys)
    }

    async fn put_object(
        &self,
        bucket: &Bucket,
        key: &str,
        body: Bytes,
        _content_type: Option<&str>,
    ) -> StorageResult<()> {
        let file_path = self.object_path(bucket, key)?;
        let parent = file_path.parent().map(Path::to_path_buf).ok_or_else(|| {
            StorageError::Io(io::Error::new(
                ErrorKind::Other,
                "object path missing parent directory",
            ))
        })?;
        fs::create_dir_all(&parent).await?;

        let tmp_path = parent.join(format!("{TMP_PREFIX}{}", Uuid::new_v4()));
        let written = async {
            let mut file = File::create(&tmp_path).await?;
            file.write_all(&body).await?;
            file.flush().await?;
            file.sync_all().await?;
            fs::rename(&tmp_path, &file_path).await
        }
        .await;

        if let Err(err) = written {
            let _ = fs::remove_file(&tmp_path).await;
            return Err(StorageError::Io(err));
        }

        debug!("wrote {} bytes to {}", body.len(), file_path.display());
        Ok(())
    }

    async fn delete_object(&self, bucket: &Bucket, key: &str) -> StorageResult<()> {
        let file_path = self.object_path(bucket, key)?;
        match fs::remove_file(&file_path).await {
            Ok(_) => debug!("removed {}", file_path.display()),
            Err(err) if err.kind() == ErrorKind::NotFound => {
                debug!("{} already missing", file_path.display());
                return Ok(());
            }
            Err(err) => return Err(StorageError::Io(err)),
        }

        if let Some(parent) = file_path.parent() {
            let bucket_root = self.bucket_root(bucket)?;
            self.prune_empty_dirs(parent, &bucket_root).await;
        }
        Ok(())
    }
}
