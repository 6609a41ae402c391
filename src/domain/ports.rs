use crate::domain::model::{CompletionRequest, Lead, OutgoingEmail};
use crate::utils::error::Result;
use async_trait::async_trait;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

/// 產生潛在客戶名單（合成資料、爬蟲或 CRM 匯出）
#[async_trait]
pub trait LeadSource: Send + Sync {
    async fn collect(&self, count: usize) -> Result<Vec<Lead>>;
}

/// 外部文字生成能力，視為黑盒子
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn complete(&self, request: &CompletionRequest) -> Result<String>;
}

#[async_trait]
pub trait MailTransport: Send + Sync {
    async fn send(&self, email: &OutgoingEmail) -> Result<()>;
}
