use crate::domain::model::CompletionResponse;
use crate::utils::error::Result;
use async_trait::async_trait;

pub trait Storage: Send + Sync {
    /// Missing objects are reported as `FlashgenError::StorageNotFound`.
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
    fn delete_file(&self, path: &str) -> impl std::future::Future<Output = Result<()>> + Send;
}

pub trait ConfigProvider: Send + Sync {
    fn completion_endpoint(&self) -> &str;
    fn api_key(&self) -> Option<&str>;
    fn model(&self) -> &str;
    fn timeout_seconds(&self) -> u64;
    fn json_mode(&self) -> bool;
}

/// A hosted language-model endpoint: one system instruction, one user turn.
#[async_trait]
pub trait CompletionService: Send + Sync {
    async fn complete(&self, system_instruction: &str, user_message: &str)
        -> Result<CompletionResponse>;
}
