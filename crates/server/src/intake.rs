//! Asset intake: extension allow-list, filename policy, and the write to the upload root.

use std::path::{Path, PathBuf};

use shared::{AssetEntry, IntakeOutcome};

use crate::config::ServerConfig;
use crate::error::{IntakeError, IntakeResult};

/// An accepted asset, fully written to disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredAsset {
    pub filename: String,
    pub path: PathBuf,
    pub url: String,
}

impl From<StoredAsset> for IntakeOutcome {
    fn from(asset: StoredAsset) -> Self {
        IntakeOutcome::Stored {
            filename: asset.filename,
            url: asset.url,
        }
    }
}

/// Validates and persists uploads into a fixed directory
#[derive(Debug, Clone)]
pub struct AssetIntake {
    upload_dir: PathBuf,
    public_base_url: String,
    allowed_extensions: Vec<String>,
}

impl AssetIntake {
    pub fn new(config: &ServerConfig) -> Self {
        Self {
            upload_dir: config.upload_dir(),
            public_base_url: config.public_base_url(),
            allowed_extensions: config.allowed_extensions.clone(),
        }
    }

    pub fn upload_dir(&self) -> &Path {
        &self.upload_dir
    }

    /// Create the upload directory if it does not exist yet
    pub async fn ensure_upload_dir(&self) -> IntakeResult<()> {
        tokio::fs::create_dir_all(&self.upload_dir).await?;
        Ok(())
    }

    /// `true` iff the filename has a `.` and its final suffix, lower-cased, is allowed
    pub fn allowed_file(&self, filename: &str) -> bool {
        extension_of(filename)
            .map(|ext| self.allowed_extensions.iter().any(|a| *a == ext))
            .unwrap_or(false)
    }

    /// Check a filename against the extension allow-list and the path policy.
    pub fn validate(&self, filename: &str) -> IntakeResult<()> {
        if !is_safe_filename(filename) {
            return Err(IntakeError::UnsafeFilename(filename.to_string()));
        }
        if !self.allowed_file(filename) {
            return Err(IntakeError::RejectedExtension(filename.to_string()));
        }
        Ok(())
    }

    pub fn asset_url(&self, filename: &str) -> String {
        format!("{}/{}", self.public_base_url, filename)
    }

    /// Validate and write `bytes` to `{upload_dir}/{filename}`, replacing any
    /// existing file of the same name. The write completes before the URL is returned.
    pub async fn store(&self, filename: &str, bytes: &[u8]) -> IntakeResult<StoredAsset> {
        if let Err(e) = self.validate(filename) {
            tracing::warn!("Rejected upload: {e}");
            return Err(e);
        }

        self.ensure_upload_dir().await?;
        let path = self.upload_dir.join(filename);
        tokio::fs::write(&path, bytes).await?;

        tracing::info!("Stored {} ({} bytes)", path.display(), bytes.len());
        Ok(StoredAsset {
            filename: filename.to_string(),
            path,
            url: self.asset_url(filename),
        })
    }

    /// Upload boundary: rejections become an outcome, write failures stay errors.
    pub async fn submit(&self, filename: &str, bytes: &[u8]) -> IntakeResult<IntakeOutcome> {
        match self.store(filename, bytes).await {
            Ok(asset) => Ok(asset.into()),
            Err(e) => match e.reject_reason() {
                Some(reason) => Ok(IntakeOutcome::Rejected { reason }),
                None => Err(e),
            },
        }
    }

    /// Assets currently in the upload directory, sorted by filename
    pub async fn list(&self) -> IntakeResult<Vec<AssetEntry>> {
        let mut entries = match tokio::fs::read_dir(&self.upload_dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut assets = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            if !entry.file_type().await?.is_file() {
                continue;
            }
            let Ok(filename) = entry.file_name().into_string() else {
                continue;
            };
            if self.allowed_file(&filename) {
                assets.push(AssetEntry {
                    url: self.asset_url(&filename),
                    filename,
                });
            }
        }
        assets.sort_by(|a, b| a.filename.cmp(&b.filename));
        Ok(assets)
    }
}

/// Lower-cased suffix after the last `.`, if any
pub fn extension_of(filename: &str) -> Option<String> {
    filename
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
}

/// Filenames are used verbatim as storage keys, so anything that could
/// leave the upload directory is refused.
pub fn is_safe_filename(filename: &str) -> bool {
    !filename.is_empty()
        && !filename.contains('/')
        && !filename.contains('\\')
        && !filename.contains("..")
        && !filename.contains('\0')
}
