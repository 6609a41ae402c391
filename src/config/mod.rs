pub mod toml_config;

#[cfg(feature = "cli")]
use crate::core::pipeline::{RunOptions, Stage};
#[cfg(feature = "cli")]
use clap::Parser;

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Parser)]
#[command(name = "cold-outreach")]
#[command(about = "AI-powered cold outreach pipeline: leads, personalized emails, test send, cost estimate")]
pub struct CliArgs {
    /// Path to TOML configuration file
    #[arg(short, long, default_value = "outreach.toml")]
    pub config: String,

    /// Skip lead collection and reuse the persisted leads.csv
    #[arg(long)]
    pub skip_scraping: bool,

    /// Skip the dispatch stage
    #[arg(long)]
    pub skip_sending: bool,

    /// Number of leads to collect
    #[arg(long, default_value = "20")]
    pub num_leads: usize,

    /// Emails per day used for the cost estimate
    #[arg(long, default_value = "100")]
    pub scale_to: u32,

    /// Re-run a single stage off the persisted artifacts
    #[arg(long, value_enum)]
    pub only: Option<Stage>,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long)]
    pub json_logs: bool,

    /// Log CPU / memory usage after each stage
    #[arg(long)]
    pub monitor: bool,
}

#[cfg(feature = "cli")]
impl CliArgs {
    pub fn run_options(&self) -> RunOptions {
        RunOptions {
            skip_scraping: self.skip_scraping,
            skip_sending: self.skip_sending,
            num_leads: self.num_leads,
            scale_to: self.scale_to,
        }
    }
}
