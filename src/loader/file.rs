use super::traits::DatasetSource;
use crate::model::LoadError;
use std::path::PathBuf;

/// Reads the dataset workbook from a path on disk. Used for the optional
/// default dataset picked up at startup.
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait::async_trait]
impl DatasetSource for FileSource {
    async fn fetch(&self) -> Result<Vec<u8>, LoadError> {
        Ok(tokio::fs::read(&self.path).await?)
    }
}
