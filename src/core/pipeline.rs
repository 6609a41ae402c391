use crate::config::toml_config::OutreachConfig;
use crate::core::cost::estimate_cost;
use crate::core::dispatcher::{DispatchReport, Dispatcher};
use crate::core::generator::{GenerationReport, MessageGenerator, PromptSettings};
use crate::core::lead_source::{collect_leads, SyntheticLeadSource};
use crate::core::{table, CostEstimate, Lead, LeadSource, MailTransport, Storage, TextGenerator};
use crate::utils::error::{OutreachError, Result};
use crate::utils::monitor::SystemMonitor;
use chrono::{DateTime, Local};
use std::sync::Arc;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
pub enum Stage {
    Leads,
    Generate,
    Send,
    Cost,
}

#[derive(Debug, Clone)]
pub struct RunOptions {
    pub skip_scraping: bool,
    pub skip_sending: bool,
    pub num_leads: usize,
    pub scale_to: u32,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            skip_scraping: false,
            skip_sending: false,
            num_leads: 20,
            scale_to: 100,
        }
    }
}

/// 完整執行後的統計
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub started_at: DateTime<Local>,
    pub finished_at: DateTime<Local>,
    pub duration: Duration,
    /// None 表示沿用既有的 leads.csv
    pub leads_collected: Option<usize>,
    pub messages_generated: usize,
    pub fallbacks_used: usize,
    /// None 表示略過寄送階段
    pub dispatch: Option<DispatchReport>,
    pub cost: CostEstimate,
}

impl RunSummary {
    pub fn emails_sent(&self) -> usize {
        self.dispatch.as_ref().map_or(0, |d| d.records.len())
    }

    pub fn send_failures(&self) -> usize {
        self.dispatch.as_ref().map_or(0, |d| d.failures.len())
    }
}

/// 單獨執行某個階段的結果
#[derive(Debug, Clone)]
pub enum StageReport {
    Leads(Vec<Lead>),
    Generated(GenerationReport),
    Dispatched(DispatchReport),
    Cost(CostEstimate),
}

pub struct OutreachPipeline<S: Storage> {
    storage: S,
    lead_source: Box<dyn LeadSource>,
    generator: MessageGenerator,
    dispatcher: Dispatcher,
    cost_per_1k_tokens: f64,
    avg_tokens_per_email: u32,
    monitor: SystemMonitor,
}

impl<S: Storage> OutreachPipeline<S> {
    pub fn new(
        storage: S,
        lead_source: Box<dyn LeadSource>,
        generator: MessageGenerator,
        dispatcher: Dispatcher,
    ) -> Self {
        Self {
            storage,
            lead_source,
            generator,
            dispatcher,
            cost_per_1k_tokens: crate::core::cost::DEFAULT_COST_PER_1K_TOKENS,
            avg_tokens_per_email: crate::core::cost::DEFAULT_AVG_TOKENS_PER_EMAIL,
            monitor: SystemMonitor::default(),
        }
    }

    /// 依設定組出各階段；外部能力（文字生成、寄信）由呼叫端注入
    pub fn from_config(
        storage: S,
        config: &OutreachConfig,
        text_generator: Arc<dyn TextGenerator>,
        transport: Arc<dyn MailTransport>,
        template: impl Into<String>,
    ) -> Self {
        let generator = MessageGenerator::new(
            text_generator,
            template,
            PromptSettings::from_config(config),
        );
        let dispatcher = Dispatcher::from_config(transport, config);

        Self::new(
            storage,
            Box::new(SyntheticLeadSource::from_config(config)),
            generator,
            dispatcher,
        )
        .with_cost_model(
            config.generation.cost_per_1k_tokens,
            config.generation.avg_tokens_per_email,
        )
    }

    pub fn with_cost_model(mut self, cost_per_1k_tokens: f64, avg_tokens_per_email: u32) -> Self {
        self.cost_per_1k_tokens = cost_per_1k_tokens;
        self.avg_tokens_per_email = avg_tokens_per_email;
        self
    }

    pub fn with_monitoring(mut self, enabled: bool) -> Self {
        self.monitor = SystemMonitor::new(enabled);
        self
    }

    /// 第四階段：成本估算並寫入 cost_estimates.json
    pub async fn estimate_costs(&self, scale_to: u32) -> Result<CostEstimate> {
        let estimate = estimate_cost(scale_to, self.cost_per_1k_tokens, self.avg_tokens_per_email);
        let json = serde_json::to_vec_pretty(&estimate)?;
        self.storage.write_file(table::COST_FILE, &json).await?;

        tracing::info!(
            "💶 Cost estimate for {} emails/day: {:.2} per month",
            scale_to,
            estimate.total_estimated_monthly_cost
        );
        Ok(estimate)
    }

    pub async fn run(&self, options: &RunOptions) -> Result<RunSummary> {
        let started_at = Local::now();
        let clock = Instant::now();
        tracing::info!(
            "🚀 Starting cold outreach pipeline at {}",
            started_at.format("%Y-%m-%d %H:%M:%S")
        );

        let leads = if options.skip_scraping {
            tracing::info!("⏭️ STEP 1 skipped: reusing {}", table::LEADS_FILE);
            None
        } else {
            tracing::info!("===== STEP 1: COLLECTING LEADS =====");
            let leads =
                collect_leads(self.lead_source.as_ref(), &self.storage, options.num_leads).await?;
            self.monitor.log_stage("Lead collection");
            Some(leads)
        };
        let leads_collected = leads.as_ref().map(Vec::len);

        tracing::info!("===== STEP 2: GENERATING EMAILS =====");
        // 缺少 leads.csv 只讓這個階段沒有輸出，後續階段照常執行
        let generated = match self.generator.run(&self.storage, leads).await {
            Ok(report) => report,
            Err(OutreachError::MissingInputError { artifact }) => {
                tracing::error!(
                    "❌ '{}' not found, no emails generated. Run without --skip-scraping first",
                    artifact
                );
                GenerationReport::default()
            }
            Err(e) => return Err(e),
        };
        self.monitor.log_stage("Email generation");

        let dispatch = if options.skip_sending {
            tracing::info!("⏭️ STEP 3 skipped: no emails sent");
            None
        } else {
            tracing::info!("===== STEP 3: SENDING EMAILS =====");
            let report = self
                .dispatcher
                .run(&self.storage, Some(generated.messages.clone()))
                .await?;
            self.monitor.log_stage("Dispatch");
            Some(report)
        };

        tracing::info!("===== STEP 4: GENERATING COST ESTIMATE =====");
        let cost = self.estimate_costs(options.scale_to).await?;

        let summary = RunSummary {
            started_at,
            finished_at: Local::now(),
            duration: clock.elapsed(),
            leads_collected,
            messages_generated: generated.messages.len(),
            fallbacks_used: generated.fallbacks,
            dispatch,
            cost,
        };

        tracing::info!(
            "🏁 Pipeline completed in {:.2}s: {} emails generated, {} sent",
            summary.duration.as_secs_f64(),
            summary.messages_generated,
            summary.emails_sent()
        );
        Ok(summary)
    }

    /// 只跑一個階段，輸入一律從已保存的產物讀取
    pub async fn run_stage(&self, stage: Stage, options: &RunOptions) -> Result<StageReport> {
        tracing::info!("▶️ Running single stage: {:?}", stage);
        let report = match stage {
            Stage::Leads => StageReport::Leads(
                collect_leads(self.lead_source.as_ref(), &self.storage, options.num_leads).await?,
            ),
            Stage::Generate => StageReport::Generated(self.generator.run(&self.storage, None).await?),
            Stage::Send => StageReport::Dispatched(self.dispatcher.run(&self.storage, None).await?),
            Stage::Cost => StageReport::Cost(self.estimate_costs(options.scale_to).await?),
        };
        self.monitor.log_stage("Stage");
        Ok(report)
    }
}
