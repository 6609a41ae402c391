use crate::config::toml_config::OutreachConfig;
use crate::core::{
    table, CompletionRequest, GeneratedMessage, GenerationOutcome, Lead, Storage, TextGenerator,
};
use crate::utils::error::Result;
use regex::{Captures, Regex};
use std::sync::{Arc, OnceLock};

/// 提示詞與生成參數
#[derive(Debug, Clone, PartialEq)]
pub struct PromptSettings {
    pub language: String,
    pub product: String,
    pub max_words: u32,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl Default for PromptSettings {
    fn default() -> Self {
        Self {
            language: "German".to_string(),
            product: "property management software".to_string(),
            max_words: 150,
            temperature: 0.7,
            max_tokens: 500,
        }
    }
}

impl PromptSettings {
    pub fn from_config(config: &OutreachConfig) -> Self {
        Self {
            language: config.generation.language.clone(),
            product: config.campaign.product.clone(),
            max_words: config.generation.max_words,
            temperature: config.generation.temperature,
            max_tokens: config.generation.max_tokens,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct GenerationReport {
    pub messages: Vec<GeneratedMessage>,
    pub fallbacks: usize,
}

fn placeholder_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\{([a-z_]+)\}").expect("placeholder pattern is valid"))
}

/// 用 lead 的欄位填入範本。不認得的佔位符原樣保留。
pub fn render_template(template: &str, lead: &Lead) -> String {
    placeholder_pattern()
        .replace_all(template, |caps: &Captures| match &caps[1] {
            "contact_name" => lead.contact_name.clone(),
            "position" => lead.position.clone(),
            "company_name" => lead.company_name.clone(),
            "city" => lead.city.clone(),
            "properties_count" => lead.properties_count.to_string(),
            _ => caps[0].to_string(),
        })
        .into_owned()
}

/// 逐筆呼叫文字生成；任何失敗都改用範本，不會中斷整批
pub struct MessageGenerator {
    generator: Arc<dyn TextGenerator>,
    template: String,
    settings: PromptSettings,
}

impl MessageGenerator {
    pub fn new(
        generator: Arc<dyn TextGenerator>,
        template: impl Into<String>,
        settings: PromptSettings,
    ) -> Self {
        Self {
            generator,
            template: template.into(),
            settings,
        }
    }

    pub fn build_request(&self, lead: &Lead) -> CompletionRequest {
        let s = &self.settings;
        let prompt = format!(
            "Create a personalized cold outreach email in {language} for a {product}.\n\n\
             Company: {company}\n\
             Contact: {contact}\n\
             Position: {position}\n\
             City: {city}\n\
             Properties: {properties}\n\n\
             The email should:\n\
             1. Address them by name\n\
             2. Reference their specific property management needs\n\
             3. Mention how our software can help their specific business\n\
             4. Include a clear call to action\n\n\
             Keep it professional but conversational. Maximum {max_words} words.",
            language = s.language,
            product = s.product,
            company = lead.company_name,
            contact = lead.contact_name,
            position = lead.position,
            city = lead.city,
            properties = lead.properties_count,
            max_words = s.max_words,
        );

        CompletionRequest {
            system: format!(
                "You are an expert in creating personalized business emails in {}.",
                s.language
            ),
            prompt,
            temperature: s.temperature,
            max_tokens: s.max_tokens,
        }
    }

    pub async fn attempt(&self, lead: &Lead) -> GenerationOutcome {
        let request = self.build_request(lead);
        match self.generator.complete(&request).await {
            Ok(text) => {
                let trimmed = text.trim();
                if trimmed.is_empty() {
                    GenerationOutcome::Fallback {
                        reason: "empty completion".to_string(),
                    }
                } else {
                    GenerationOutcome::Generated(trimmed.to_string())
                }
            }
            Err(e) => GenerationOutcome::Fallback {
                reason: e.to_string(),
            },
        }
    }

    pub async fn personalize(&self, lead: Lead) -> (GeneratedMessage, GenerationOutcome) {
        let outcome = self.attempt(&lead).await;
        let personalized_text = match &outcome {
            GenerationOutcome::Generated(text) => text.clone(),
            GenerationOutcome::Fallback { reason } => {
                tracing::warn!(
                    "⚠️ Generation failed for lead {} ({}), using template: {}",
                    lead.id,
                    lead.company_name,
                    reason
                );
                render_template(&self.template, &lead)
            }
        };

        (
            GeneratedMessage {
                lead,
                personalized_text,
            },
            outcome,
        )
    }

    /// 依序處理，輸出順序與輸入相同
    pub async fn generate_all(&self, leads: Vec<Lead>) -> GenerationReport {
        let total = leads.len();
        tracing::info!("✍️ Generating personalized emails for {} leads", total);

        let mut report = GenerationReport {
            messages: Vec::with_capacity(total),
            fallbacks: 0,
        };

        for (index, lead) in leads.into_iter().enumerate() {
            tracing::info!("Processing lead {}/{}: {}", index + 1, total, lead.company_name);
            let (message, outcome) = self.personalize(lead).await;
            if outcome.is_fallback() {
                report.fallbacks += 1;
            }
            report.messages.push(message);
        }

        report
    }

    /// 第二階段。沒有傳入 leads 時從 leads.csv 讀取。
    pub async fn run<S: Storage>(
        &self,
        storage: &S,
        leads: Option<Vec<Lead>>,
    ) -> Result<GenerationReport> {
        let leads = match leads {
            Some(leads) => leads,
            None => {
                tracing::debug!("No leads handed over, loading {}", table::LEADS_FILE);
                table::load_leads(storage).await?
            }
        };

        let report = self.generate_all(leads).await;
        table::save_messages(storage, &report.messages).await?;

        tracing::info!(
            "✅ Generated {} personalized emails ({} from template)",
            report.messages.len(),
            report.fallbacks
        );
        Ok(report)
    }
}
