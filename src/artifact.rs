use log::{debug, warn};
use std::io;
use std::path::{Path, PathBuf};
use tempfile::{Builder, NamedTempFile};
use uuid::Uuid;

/// File name for one recognition request. Depends only on its inputs, so two
/// requests differing in any of them never collide.
pub fn artifact_file_name(user_id: u64, timestamp_ms: i64, nonce: &Uuid) -> String {
    format!("temp_{}_{}_{}.ogg", user_id, timestamp_ms, nonce.simple())
}

/// Downloaded audio kept on disk only while a recognizer needs a file path.
///
/// The file is removed by [`AudioArtifact::release`]; dropping the artifact
/// without releasing it still removes the file, silently.
pub struct AudioArtifact {
    file: NamedTempFile,
}

impl AudioArtifact {
    pub fn create(dir: &Path, user_id: u64) -> io::Result<Self> {
        let name = artifact_file_name(user_id, chrono::Utc::now().timestamp_millis(), &Uuid::new_v4());
        let file = Builder::new()
            .prefix(&name)
            .rand_bytes(0)
            .tempfile_in(dir)?;
        debug!("Created audio artifact {}", file.path().display());
        Ok(Self { file })
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }

    pub fn path_buf(&self) -> PathBuf {
        self.file.path().to_path_buf()
    }

    /// A fresh async handle for writing into the artifact.
    pub fn writer(&self) -> io::Result<tokio::fs::File> {
        Ok(tokio::fs::File::from_std(self.file.reopen()?))
    }

    pub fn release(self) {
        let path = self.path_buf();
        match self.file.close() {
            Ok(()) => debug!("Removed audio artifact {}", path.display()),
            Err(e) => warn!("Failed to remove audio artifact {}: {}", path.display(), e),
        }
    }
}
