//! CSV 表格存取。每個階段的輸出都經過這裡寫入 Storage，
//! 單獨重跑某個階段時再從這裡讀回來。

use crate::core::{GeneratedMessage, Lead, SendRecord, Storage};
use crate::utils::error::{OutreachError, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

pub const LEADS_FILE: &str = "leads.csv";
pub const MESSAGES_FILE: &str = "personalized_emails.csv";
pub const SENT_FILE: &str = "sent_emails.csv";
pub const COST_FILE: &str = "cost_estimates.json";

pub const LEAD_HEADER: &[&str] = &[
    "id",
    "company_name",
    "contact_name",
    "position",
    "email",
    "phone",
    "website",
    "city",
    "properties_count",
    "source",
];

pub const MESSAGE_HEADER: &[&str] = &[
    "id",
    "company_name",
    "contact_name",
    "position",
    "email",
    "phone",
    "website",
    "city",
    "properties_count",
    "source",
    "personalized_text",
];

pub const SEND_HEADER: &[&str] = &["lead_id", "recipient", "subject", "sent_at", "status"];

/// personalized_emails.csv 的一列：Lead 欄位攤平再加上內容
#[derive(Debug, Serialize, Deserialize)]
struct MessageRow {
    id: u32,
    company_name: String,
    contact_name: String,
    position: String,
    email: String,
    phone: String,
    website: String,
    city: String,
    properties_count: u32,
    source: String,
    personalized_text: String,
}

impl From<&GeneratedMessage> for MessageRow {
    fn from(message: &GeneratedMessage) -> Self {
        let lead = &message.lead;
        Self {
            id: lead.id,
            company_name: lead.company_name.clone(),
            contact_name: lead.contact_name.clone(),
            position: lead.position.clone(),
            email: lead.email.clone(),
            phone: lead.phone.clone(),
            website: lead.website.clone(),
            city: lead.city.clone(),
            properties_count: lead.properties_count,
            source: lead.source.clone(),
            personalized_text: message.personalized_text.clone(),
        }
    }
}

impl From<MessageRow> for GeneratedMessage {
    fn from(row: MessageRow) -> Self {
        Self {
            lead: Lead {
                id: row.id,
                company_name: row.company_name,
                contact_name: row.contact_name,
                position: row.position,
                email: row.email,
                phone: row.phone,
                website: row.website,
                city: row.city,
                properties_count: row.properties_count,
                source: row.source,
            },
            personalized_text: row.personalized_text,
        }
    }
}

/// 固定表頭，空集合也會寫出表頭
pub fn encode_table<T: Serialize>(header: &[&str], rows: &[T]) -> Result<Vec<u8>> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());

    writer.write_record(header)?;
    for row in rows {
        writer.serialize(row)?;
    }

    writer
        .into_inner()
        .map_err(|e| OutreachError::IoError(e.into_error()))
}

pub fn decode_table<T: DeserializeOwned>(data: &[u8]) -> Result<Vec<T>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(data);

    let mut rows = Vec::new();
    for row in reader.deserialize() {
        rows.push(row?);
    }
    Ok(rows)
}

/// 讀取上游產物；檔案不存在時回傳 MissingInputError
pub async fn read_artifact<S: Storage>(storage: &S, path: &str) -> Result<Vec<u8>> {
    match storage.read_file(path).await {
        Ok(data) => Ok(data),
        Err(OutreachError::IoError(e)) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(OutreachError::MissingInputError {
                artifact: path.to_string(),
            })
        }
        Err(e) => Err(e),
    }
}

pub async fn save_leads<S: Storage>(storage: &S, leads: &[Lead]) -> Result<()> {
    let data = encode_table(LEAD_HEADER, leads)?;
    tracing::debug!("Writing {} leads ({} bytes) to {}", leads.len(), data.len(), LEADS_FILE);
    storage.write_file(LEADS_FILE, &data).await
}

pub async fn load_leads<S: Storage>(storage: &S) -> Result<Vec<Lead>> {
    let data = read_artifact(storage, LEADS_FILE).await?;
    decode_table(&data)
}

pub async fn save_messages<S: Storage>(storage: &S, messages: &[GeneratedMessage]) -> Result<()> {
    let rows: Vec<MessageRow> = messages.iter().map(MessageRow::from).collect();
    let data = encode_table(MESSAGE_HEADER, &rows)?;
    tracing::debug!(
        "Writing {} messages ({} bytes) to {}",
        messages.len(),
        data.len(),
        MESSAGES_FILE
    );
    storage.write_file(MESSAGES_FILE, &data).await
}

pub async fn load_messages<S: Storage>(storage: &S) -> Result<Vec<GeneratedMessage>> {
    let data = read_artifact(storage, MESSAGES_FILE).await?;
    let rows: Vec<MessageRow> = decode_table(&data)?;
    Ok(rows.into_iter().map(GeneratedMessage::from).collect())
}

pub async fn save_send_records<S: Storage>(storage: &S, records: &[SendRecord]) -> Result<()> {
    let data = encode_table(SEND_HEADER, records)?;
    storage.write_file(SENT_FILE, &data).await
}

pub async fn load_send_records<S: Storage>(storage: &S) -> Result<Vec<SendRecord>> {
    let data = read_artifact(storage, SENT_FILE).await?;
    decode_table(&data)
}
