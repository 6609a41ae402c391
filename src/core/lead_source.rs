use crate::config::toml_config::OutreachConfig;
use crate::core::{table, Lead, LeadSource, Storage};
use crate::utils::error::{OutreachError, Result};
use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::time::Duration;

const COMPANY_PREFIXES: &[&str] = &["ABC", "XYZ", "Best", "Top", "Prime"];
const COMPANY_TYPES: &[&str] = &[
    "Immobilienmakler",
    "Hausverwaltung",
    "Immobilienberater",
    "Bauträger",
];
const CITIES: &[&str] = &[
    "Berlin",
    "München",
    "Hamburg",
    "Frankfurt",
    "Köln",
    "Düsseldorf",
    "Stuttgart",
];
const FIRST_NAMES: &[&str] = &["Hans", "Peter", "Michael", "Thomas", "Andreas"];
const LAST_NAMES: &[&str] = &["Müller", "Schmidt", "Weber", "Schneider", "Fischer"];
const POSITIONS: &[&str] = &["Geschäftsführer", "Inhaber", "Verkaufsleiter", "Makler"];

/// 合成的潛在客戶來源，代替真正的爬蟲或 CRM 匯出
#[derive(Debug, Clone)]
pub struct SyntheticLeadSource {
    market: String,
    allowed_sources: Vec<String>,
    seed: Option<u64>,
    delay: Duration,
}

impl SyntheticLeadSource {
    pub fn new(market: impl Into<String>, allowed_sources: Vec<String>) -> Self {
        Self {
            market: market.into(),
            allowed_sources: allowed_sources
                .into_iter()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
            seed: None,
            delay: Duration::ZERO,
        }
    }

    pub fn from_config(config: &OutreachConfig) -> Self {
        Self::new(
            config.campaign.market.clone(),
            config.campaign.lead_sources.clone(),
        )
        .with_seed(config.lead_seed())
        .with_delay(config.lead_delay())
    }

    pub fn with_seed(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    fn pick<'a>(rng: &mut StdRng, pool: &'a [&'a str]) -> &'a str {
        pool[rng.gen_range(0..pool.len())]
    }

    fn synthesize(&self, rng: &mut StdRng, id: u32) -> Lead {
        let company_name = format!(
            "{} {} {}",
            Self::pick(rng, COMPANY_PREFIXES),
            Self::pick(rng, COMPANY_TYPES),
            Self::pick(rng, CITIES)
        );
        let contact_name = format!(
            "{} {}",
            Self::pick(rng, FIRST_NAMES),
            Self::pick(rng, LAST_NAMES)
        );
        let source = self.allowed_sources[rng.gen_range(0..self.allowed_sources.len())].clone();

        Lead {
            id,
            company_name,
            contact_name,
            position: Self::pick(rng, POSITIONS).to_string(),
            email: format!("contact{}@example-{}.de", id, id),
            phone: format!(
                "+49 {} {}",
                rng.gen_range(100..=999),
                rng.gen_range(1_000_000..=9_999_999)
            ),
            website: format!("https://www.immobilien-{}.de", id),
            city: Self::pick(rng, CITIES).to_string(),
            properties_count: rng.gen_range(5..=100),
            source,
        }
    }
}

#[async_trait]
impl LeadSource for SyntheticLeadSource {
    async fn collect(&self, count: usize) -> Result<Vec<Lead>> {
        if self.allowed_sources.is_empty() {
            return Err(OutreachError::ConfigError {
                message: "campaign.lead_sources must list at least one source".to_string(),
            });
        }

        tracing::info!(
            "🔎 Collecting {} leads for the {} market",
            count,
            self.market
        );

        let mut rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let mut leads = Vec::with_capacity(count);
        for index in 0..count {
            let id = u32::try_from(index + 1).map_err(|_| OutreachError::InvalidConfigValueError {
                field: "num_leads".to_string(),
                value: count.to_string(),
                reason: "Too many leads requested".to_string(),
            })?;
            leads.push(self.synthesize(&mut rng, id));

            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
        }

        Ok(leads)
    }
}

/// 第一階段：收集並寫入 leads.csv
pub async fn collect_leads<S: Storage>(
    source: &dyn LeadSource,
    storage: &S,
    count: usize,
) -> Result<Vec<Lead>> {
    let leads = source.collect(count).await?;
    table::save_leads(storage, &leads).await?;
    tracing::info!(
        "✅ Collected and saved {} leads to {}",
        leads.len(),
        table::LEADS_FILE
    );
    Ok(leads)
}
