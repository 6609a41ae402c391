use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 一筆潛在客戶。建立後不再修改。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lead {
    pub id: u32,
    pub company_name: String,
    pub contact_name: String,
    pub position: String,
    pub email: String,
    pub phone: String,
    pub website: String,
    pub city: String,
    pub properties_count: u32,
    pub source: String,
}

/// Lead 加上個人化內容，與輸入的 Lead 一對一
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedMessage {
    pub lead: Lead,
    pub personalized_text: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SendStatus {
    #[serde(rename = "sent")]
    Sent,
    #[serde(rename = "sent (test)")]
    SentTest,
}

/// 每次成功寄送一筆
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SendRecord {
    pub lead_id: u32,
    pub recipient: String,
    pub subject: String,
    pub sent_at: DateTime<Utc>,
    pub status: SendStatus,
}

/// 寄送失敗，不寫入 sent_emails.csv，只留在報告裡
#[derive(Debug, Clone, PartialEq)]
pub struct DispatchFailure {
    pub lead_id: u32,
    pub recipient: String,
    pub reason: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchMode {
    /// 只寄第一封到測試收件人
    Test,
    Live,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OtherCosts {
    pub email_service: f64,
    pub data_sources: f64,
    pub hosting: f64,
}

impl OtherCosts {
    pub fn total(&self) -> f64 {
        self.email_service + self.data_sources + self.hosting
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostEstimate {
    pub daily_volume: u32,
    pub emails_per_month: u64,
    pub estimated_token_usage: u64,
    pub estimated_monthly_llm_cost: f64,
    pub other_costs: OtherCosts,
    pub total_estimated_monthly_cost: f64,
}

impl CostEstimate {
    pub fn cost_per_email(&self) -> Option<f64> {
        if self.emails_per_month == 0 {
            None
        } else {
            Some(self.total_estimated_monthly_cost / self.emails_per_month as f64)
        }
    }
}

/// 一次文字生成請求
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub system: String,
    pub prompt: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

/// 生成結果：成功的文字，或改用範本的原因
#[derive(Debug, Clone, PartialEq)]
pub enum GenerationOutcome {
    Generated(String),
    Fallback { reason: String },
}

impl GenerationOutcome {
    pub fn is_fallback(&self) -> bool {
        matches!(self, Self::Fallback { .. })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OutgoingEmail {
    pub recipient: String,
    pub subject: String,
    pub body: String,
}
