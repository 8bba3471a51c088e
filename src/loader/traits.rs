use crate::model::LoadError;

#[async_trait::async_trait]
pub trait DatasetSource: Send + Sync {
    async fn fetch(&self) -> Result<Vec<u8>, LoadError>;
}
