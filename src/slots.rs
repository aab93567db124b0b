use crate::catalog::CatalogStore;
use crate::config::Config;
use crate::constants;
use crate::error::{CatalogError, Result};
use crate::imaging;
use crate::types::ImageSlot;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::fs;
use tracing::{debug, info, warn};

/// Outcome of a successful slot upload.
#[derive(Debug)]
pub struct UploadOutcome {
    /// New served path for the slot, freshness token included.
    pub url: String,
    /// Stored filename.
    pub filename: String,
    /// Size of the normalized file on disk, in KB.
    pub size_kb: u64,
}

/// The per-slot assign/replace/clear workflow.
///
/// Normalizes incoming bytes on the blocking pool, supersedes old files
/// best-effort, and keeps the store (and therefore the CSV backup) in sync.
pub struct SlotManager {
    store: Arc<CatalogStore>,
    images_dir: PathBuf,
    uploads_dir: PathBuf,
    max_dimension: u32,
    jpeg_quality: u8,
}

impl SlotManager {
    pub fn new(store: Arc<CatalogStore>, config: &Config) -> Self {
        Self {
            store,
            images_dir: config.paths.images_dir.clone(),
            uploads_dir: config.paths.uploads_dir.clone(),
            max_dimension: config.images.max_dimension,
            jpeg_quality: config.images.jpeg_quality,
        }
    }

    /// Creates the image and staging directories and sweeps any staging
    /// leftovers from a previous run. Leftover deletions that fail are
    /// ignored; they are retried on the next start.
    pub fn prepare_dirs(&self) -> Result<()> {
        std::fs::create_dir_all(&self.images_dir)?;
        std::fs::create_dir_all(&self.uploads_dir)?;
        if let Ok(entries) = std::fs::read_dir(&self.uploads_dir) {
            for entry in entries.flatten() {
                let _ = std::fs::remove_file(entry.path());
            }
        }
        Ok(())
    }

    pub fn uploads_dir(&self) -> &Path {
        &self.uploads_dir
    }

    /// Assigns or replaces one image slot from a raw uploaded payload.
    ///
    /// Validation failures and normalization failures leave the catalog, the
    /// image directory, and the CSV backup untouched.
    pub async fn set_slot(&self, product_id: &str, index: i64, raw: Vec<u8>) -> Result<UploadOutcome> {
        let index = check_index(index)?;
        if raw.is_empty() {
            return Err(CatalogError::invalid("empty upload payload"));
        }
        let product = self
            .store
            .get(product_id)
            .ok_or_else(|| CatalogError::invalid(format!("unknown product '{product_id}'")))?;

        // CPU-bound, keep it off the request loop
        let max_dimension = self.max_dimension;
        let quality = self.jpeg_quality;
        let normalized = tokio::task::spawn_blocking(move || {
            imaging::normalize(&raw, max_dimension, quality)
        })
        .await
        .map_err(|e| {
            CatalogError::Io(std::io::Error::new(
                std::io::ErrorKind::Other,
                format!("normalization task failed: {e}"),
            ))
        })??;

        // Supersede the old file first; a locked file just gets orphaned
        if let Some(old) = product.images[index].filename() {
            self.remove_stored(old).await;
        }

        let filename = product.stored_filename(index);
        let path = self.images_dir.join(&filename);
        fs::write(&path, &normalized).await?;
        let size_kb = normalized.len() as u64 / 1024;

        let slot = ImageSlot::filled(filename.clone());
        let url = slot.served_path();
        self.store.set_slot(product_id, index, slot)?;

        info!(
            product = %product.name,
            slot = index + 1,
            file = %filename,
            size_kb,
            "Image uploaded"
        );
        Ok(UploadOutcome { url, filename, size_kb })
    }

    /// Clears one image slot, deleting the stored file best-effort.
    pub async fn clear_slot(&self, product_id: &str, index: i64) -> Result<()> {
        let index = check_index(index)?;
        let product = self
            .store
            .get(product_id)
            .ok_or_else(|| CatalogError::invalid(format!("unknown product '{product_id}'")))?;

        let cleared = self.store.clear_slot(product_id, index)?;
        if let Some(filename) = cleared.filename() {
            self.remove_stored(filename).await;
        }

        info!(product = %product.name, slot = index + 1, "Image removed");
        Ok(())
    }

    /// Deletes a file from the canonical image directory, ignoring lock and
    /// not-found errors.
    async fn remove_stored(&self, filename: &str) {
        let path = self.images_dir.join(filename);
        match fs::remove_file(&path).await {
            Ok(()) => debug!(file = %path.display(), "Removed superseded image"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!(file = %path.display(), "Could not remove superseded image: {e}"),
        }
    }
}

/// Validates a raw slot index from the URL into [0,3].
fn check_index(index: i64) -> Result<usize> {
    if (0..constants::SLOT_COUNT as i64).contains(&index) {
        Ok(index as usize)
    } else {
        Err(CatalogError::invalid(format!("slot index {index} out of range")))
    }
}

/// Fire-and-forget deletion of a staging file, with bounded retries.
///
/// Some platforms keep the file locked briefly after the handler is done
/// with it; a short delay plus a few spaced attempts clears the common case.
/// Exhausting the retries only logs, the upload has already succeeded.
pub fn schedule_staging_cleanup(path: PathBuf) {
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(constants::STAGING_DELETE_INITIAL_MS)).await;
        for attempt in 1..=constants::STAGING_DELETE_ATTEMPTS {
            match fs::remove_file(&path).await {
                Ok(()) => return,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => return,
                Err(e) => {
                    debug!(
                        file = %path.display(),
                        attempt,
                        "Staging file delete failed: {e}"
                    );
                }
            }
            tokio::time::sleep(Duration::from_millis(constants::STAGING_DELETE_BACKOFF_MS)).await;
        }
        warn!(file = %path.display(), "Giving up on staging file, leaving it for the startup sweep");
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_bounds() {
        assert!(check_index(-1).is_err());
        assert!(check_index(4).is_err());
        assert_eq!(check_index(0).unwrap(), 0);
        assert_eq!(check_index(3).unwrap(), 3);
    }
}
