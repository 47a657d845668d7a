use crate::utils::error::Result;
use async_trait::async_trait;

/// Whole-blob key/value persistence. Every write replaces the stored blob.
pub trait Storage: Send + Sync {
    fn read_file(&self, key: &str) -> impl std::future::Future<Output = Result<Option<Vec<u8>>>> + Send;
    fn write_file(
        &self,
        key: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

pub trait ConfigProvider: Send + Sync {
    fn data_dir(&self) -> &str;
    fn services_url(&self) -> Option<&str>;
    fn categories_url(&self) -> Option<&str>;
}

/// Remote source of published CSV text.
#[async_trait]
pub trait CsvSource: Send + Sync {
    async fn fetch_csv(&self, source_name: &str, url: &str) -> Result<String>;
}
