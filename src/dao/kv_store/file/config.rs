use std::path::PathBuf;

/// Runtime configuration describing where values are persisted on disk.
#[derive(Debug, Clone)]
pub struct FileConfig {
    /// Directory holding one file per key.
    pub dir: PathBuf,
    /// Byte capacity over every stored key and value; `None` for unbounded.
    pub quota_bytes: Option<usize>,
}

impl FileConfig {
    /// Construct a configuration storing one file per key under `dir`.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            quota_bytes: None,
        }
    }

    /// Cap the total payload (keys plus values) the directory may hold.
    pub fn with_quota(mut self, bytes: usize) -> Self {
        self.quota_bytes = Some(bytes);
        self
    }
}
