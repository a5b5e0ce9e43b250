//! Whole-file JSON persistence for the secret store.
//!
//! The store is a single JSON array rewritten in full on every mutation.
//! Writes go to a sibling temp file first and are renamed into place, so a
//! concurrent reader sees either the previous or the next version, never a
//! torn file.

use std::path::{Path, PathBuf};

use super::{SecretRecord, StoreError};

pub struct SecretStore {
    path: PathBuf,
}

impl SecretStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read and deserialize every record. An absent file is an empty store.
    pub fn load(&self) -> Result<Vec<SecretRecord>, StoreError> {
        let data = match std::fs::read_to_string(&self.path) {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(StoreError::Io(e)),
        };
        serde_json::from_str(&data).map_err(|e| StoreError::Corrupt(e.to_string()))
    }

    /// Serialize and replace the whole store atomically.
    pub fn save(&self, records: &[SecretRecord]) -> Result<(), StoreError> {
        let json = serde_json::to_string_pretty(records)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
            #[cfg(unix)]
            {
                use std::os::unix::fs::PermissionsExt;
                std::fs::set_permissions(parent, std::fs::Permissions::from_mode(0o700))?;
            }
        }

        let tmp = self.tmp_path();
        std::fs::write(&tmp, json.as_bytes())?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&tmp, std::fs::Permissions::from_mode(0o600))?;
        }
        std::fs::rename(&tmp, &self.path)?;

        tracing::debug!(path = %self.path.display(), count = records.len(), "Store saved");
        Ok(())
    }

    fn tmp_path(&self) -> PathBuf {
        let file_name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "store".to_string());
        self.path.with_file_name(format!("{file_name}.tmp"))
    }
}

pub fn find_by_id<'a>(records: &'a [SecretRecord], id: &str) -> Option<&'a SecretRecord> {
    records.iter().find(|r| r.id == id)
}

/// Insert `record`, dropping any existing record with the same id first.
/// Replacement is remove-then-append: the old credential enrollment dies
/// with the old record.
pub fn replace(records: &mut Vec<SecretRecord>, record: SecretRecord) {
    records.retain(|r| r.id != record.id);
    records.push(record);
}

/// Remove the record with `id`; returns whether one existed.
pub fn remove(records: &mut Vec<SecretRecord>, id: &str) -> bool {
    let before = records.len();
    records.retain(|r| r.id != id);
    records.len() != before
}
