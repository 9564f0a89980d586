use std::cell::RefCell;
use std::path::PathBuf;
use std::rc::Rc;

use anyhow::Context as _;

use crate::capture::media::extension_for_mime;
use crate::foundation::error::{ReelError, ReelResult};

/// A finished recording.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Artifact {
    /// Container bytes.
    pub bytes: Vec<u8>,
    /// Mime type of `bytes`, including codec parameters.
    pub mime_type: String,
}

impl Artifact {
    /// File extension derived from the mime type.
    pub fn extension(&self) -> &str {
        extension_for_mime(&self.mime_type)
    }
}

/// Destination for a finished recording.
pub trait ExportSink {
    /// Persist or offer `artifact` under `filename`.
    fn export(&mut self, artifact: &Artifact, filename: &str) -> ReelResult<()>;
}

/// Writes artifacts into a directory.
#[derive(Clone, Debug)]
pub struct DirExport {
    dir: PathBuf,
    overwrite: bool,
}

impl DirExport {
    /// Export into `dir`, creating it if needed.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            overwrite: true,
        }
    }

    /// Refuse to replace existing files.
    pub fn no_overwrite(mut self) -> Self {
        self.overwrite = false;
        self
    }
}

impl ExportSink for DirExport {
    fn export(&mut self, artifact: &Artifact, filename: &str) -> ReelResult<()> {
        std::fs::create_dir_all(&self.dir)
            .with_context(|| format!("failed to create output directory '{}'", self.dir.display()))?;
        let path = self.dir.join(filename);
        if !self.overwrite && path.exists() {
            return Err(ReelError::export(format!(
                "output file '{}' already exists",
                path.display()
            )));
        }
        std::fs::write(&path, &artifact.bytes)
            .with_context(|| format!("failed to write '{}'", path.display()))?;
        tracing::info!(
            path = %path.display(),
            bytes = artifact.bytes.len(),
            mime = %artifact.mime_type,
            "exported recording"
        );
        Ok(())
    }
}

/// Keeps exported artifacts in memory. Clones share the same store.
#[derive(Clone, Debug, Default)]
pub struct MemoryExport {
    exported: Rc<RefCell<Vec<(String, Artifact)>>>,
}

impl MemoryExport {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// `(filename, artifact)` pairs in export order.
    pub fn exported(&self) -> Vec<(String, Artifact)> {
        self.exported.borrow().clone()
    }

    /// Number of exports so far.
    pub fn count(&self) -> usize {
        self.exported.borrow().len()
    }
}

impl ExportSink for MemoryExport {
    fn export(&mut self, artifact: &Artifact, filename: &str) -> ReelResult<()> {
        self.exported
            .borrow_mut()
            .push((filename.to_string(), artifact.clone()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn artifact() -> Artifact {
        Artifact {
            bytes: vec![1, 2, 3],
            mime_type: "video/webm; codecs=vp9".to_string(),
        }
    }

    #[test]
    fn dir_export_writes_file() {
        let dir = PathBuf::from("target").join("export_dir_test");
        let _ = std::fs::remove_dir_all(&dir);
        DirExport::new(&dir)
            .export(&artifact(), "animation.webm")
            .unwrap();
        assert_eq!(std::fs::read(dir.join("animation.webm")).unwrap(), vec![1, 2, 3]);

        let err = DirExport::new(&dir)
            .no_overwrite()
            .export(&artifact(), "animation.webm");
        assert!(matches!(err, Err(ReelError::Export(_))));
    }

    #[test]
    fn memory_export_clones_share_storage() {
        let store = MemoryExport::new();
        let mut handle = store.clone();
        handle.export(&artifact(), "a.webm").unwrap();
        assert_eq!(store.count(), 1);
        assert_eq!(store.exported()[0].1.extension(), "webm");
    }
}
