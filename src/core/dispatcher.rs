use crate::config::toml_config::OutreachConfig;
use crate::core::{
    table, DispatchFailure, DispatchMode, GeneratedMessage, MailTransport, OutgoingEmail,
    SendRecord, SendStatus, Storage,
};
use crate::utils::error::Result;
use chrono::Utc;
use std::sync::Arc;

pub const DEFAULT_SUBJECT: &str = "Propertyvisualizer: Ihre Immobilienverwaltung optimieren";

#[derive(Debug, Clone, Default)]
pub struct DispatchReport {
    pub records: Vec<SendRecord>,
    pub failures: Vec<DispatchFailure>,
}

pub struct Dispatcher {
    transport: Arc<dyn MailTransport>,
    mode: DispatchMode,
    test_recipient: String,
    subject: String,
}

impl Dispatcher {
    pub fn new(
        transport: Arc<dyn MailTransport>,
        mode: DispatchMode,
        test_recipient: impl Into<String>,
    ) -> Self {
        Self {
            transport,
            mode,
            test_recipient: test_recipient.into(),
            subject: DEFAULT_SUBJECT.to_string(),
        }
    }

    pub fn from_config(transport: Arc<dyn MailTransport>, config: &OutreachConfig) -> Self {
        Self::new(
            transport,
            config.dispatch_mode(),
            config.test_recipient().unwrap_or_default(),
        )
        .with_subject(config.email.subject.clone())
    }

    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = subject.into();
        self
    }

    async fn attempt(
        &self,
        message: &GeneratedMessage,
        recipient: &str,
        status: SendStatus,
        report: &mut DispatchReport,
    ) {
        let email = OutgoingEmail {
            recipient: recipient.to_string(),
            subject: self.subject.clone(),
            body: message.personalized_text.clone(),
        };

        match self.transport.send(&email).await {
            Ok(()) => {
                tracing::info!("📧 Email sent successfully to {}", recipient);
                report.records.push(SendRecord {
                    lead_id: message.lead.id,
                    recipient: recipient.to_string(),
                    subject: self.subject.clone(),
                    sent_at: Utc::now(),
                    status,
                });
            }
            Err(e) => {
                tracing::error!("❌ Failed to send email to {}: {}", recipient, e);
                report.failures.push(DispatchFailure {
                    lead_id: message.lead.id,
                    recipient: recipient.to_string(),
                    reason: e.to_string(),
                });
            }
        }
    }

    /// 單筆寄送失敗不會中斷整批
    pub async fn dispatch(&self, messages: &[GeneratedMessage]) -> DispatchReport {
        let mut report = DispatchReport::default();

        match self.mode {
            DispatchMode::Test => {
                tracing::info!(
                    "🧪 TEST MODE: sending one sample email to {}",
                    self.test_recipient
                );
                // 只寄第一封，其餘忽略
                if let Some(first) = messages.first() {
                    self.attempt(first, &self.test_recipient, SendStatus::SentTest, &mut report)
                        .await;
                }
            }
            DispatchMode::Live => {
                tracing::info!("📨 LIVE MODE: sending {} emails", messages.len());
                for message in messages {
                    self.attempt(message, &message.lead.email, SendStatus::Sent, &mut report)
                        .await;
                }
            }
        }

        report
    }

    /// 第三階段。沒有傳入訊息時從 personalized_emails.csv 讀取。
    pub async fn run<S: Storage>(
        &self,
        storage: &S,
        messages: Option<Vec<GeneratedMessage>>,
    ) -> Result<DispatchReport> {
        let messages = match messages {
            Some(messages) => messages,
            None => table::load_messages(storage).await?,
        };

        let report = self.dispatch(&messages).await;
        table::save_send_records(storage, &report.records).await?;

        tracing::info!(
            "✅ Dispatch finished: {} sent, {} failed",
            report.records.len(),
            report.failures.len()
        );
        Ok(report)
    }
}
