//! Saving a received PDF into the download directory.

use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::error::ConvertError;
use crate::session::DEFAULT_FILENAME;

#[derive(Debug, Clone)]
pub struct Downloads {
    dir: PathBuf,
}

impl Downloads {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Where `filename` would be written. Directory parts are discarded so
    /// nothing lands outside the download directory.
    pub fn target_for(&self, filename: &str) -> PathBuf {
        let name = Path::new(filename)
            .file_name()
            .and_then(|n| n.to_str())
            .filter(|n| !n.is_empty())
            .unwrap_or(DEFAULT_FILENAME);
        self.dir.join(name)
    }

    /// Write `payload` to a temp file next to the target and move it into
    /// place, replacing any earlier file of the same name.
    pub async fn save(&self, filename: &str, payload: Vec<u8>) -> Result<PathBuf, ConvertError> {
        let dir = self.dir.clone();
        let target = self.target_for(filename);

        let result = tokio::task::spawn_blocking(move || {
            let write = || -> std::io::Result<()> {
                std::fs::create_dir_all(&dir)?;
                let mut tmp = NamedTempFile::new_in(&dir)?;
                tmp.write_all(&payload)?;
                tmp.flush()?;
                tmp.persist(&target).map_err(|e| e.error)?;
                Ok(())
            };
            match write() {
                Ok(()) => Ok(target),
                Err(source) => Err(ConvertError::Save {
                    path: target,
                    source,
                }),
            }
        })
        .await;

        match result {
            Ok(saved) => saved,
            Err(e) => Err(ConvertError::Task(e.to_string())),
        }
    }
}
