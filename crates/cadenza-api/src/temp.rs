//! Request-scoped scratch directory for a downloaded clip

use std::io;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Private directory holding one clip; the directory and everything the
/// resolver left in it are removed when the guard is dropped
#[derive(Debug)]
pub struct TempAudioFile {
    dir: Option<TempDir>,
    path: PathBuf,
}

impl TempAudioFile {
    /// Creates `<parent>/cadenza_XXXXXX/` and names the clip
    /// `audio_<uuid>.<format>` inside it; the clip itself is not created
    pub fn new(parent: &Path, format: &str) -> io::Result<Self> {
        let dir = tempfile::Builder::new().prefix("cadenza_").tempdir_in(parent)?;
        let path = dir
            .path()
            .join(format!("audio_{}.{}", uuid::Uuid::new_v4(), format));
        Ok(Self {
            dir: Some(dir),
            path,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for TempAudioFile {
    fn drop(&mut self) {
        let Some(dir) = self.dir.take() else {
            return;
        };
        let display = dir.path().display().to_string();
        match dir.close() {
            Ok(()) => log::info!("Cleaned up: {}", display),
            Err(e) => log::warn!("Cleanup failed for {}: {}", display, e),
        }
    }
}
