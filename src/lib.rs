pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliArgs;

pub use adapters::{mail::EchoTransport, openai::OpenAiGenerator, storage::LocalStorage};
pub use config::toml_config::OutreachConfig;
pub use core::pipeline::{OutreachPipeline, RunOptions, RunSummary, Stage, StageReport};
pub use utils::error::{OutreachError, Result};
