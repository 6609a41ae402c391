use clap::Parser;
use cold_outreach::adapters::mail::transport_from_config;
use cold_outreach::core::CostEstimate;
use cold_outreach::utils::error::ErrorSeverity;
use cold_outreach::utils::logger;
use cold_outreach::{
    CliArgs, LocalStorage, OpenAiGenerator, OutreachConfig, OutreachError, OutreachPipeline,
    RunSummary, StageReport,
};
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = CliArgs::parse();

    // 初始化日誌
    if args.json_logs {
        logger::init_json_logger(args.verbose);
    } else {
        logger::init_cli_logger(args.verbose);
    }

    tracing::info!("🚀 Starting cold-outreach");
    tracing::info!("📁 Loading configuration from: {}", args.config);
    if args.verbose {
        tracing::debug!("CLI args: {:?}", args);
    }

    let config = match load_config(&args.config) {
        Ok(config) => config,
        Err(e) => exit_with(&e),
    };

    let template = match std::fs::read_to_string(config.template_path()) {
        Ok(template) => template,
        Err(e) => exit_with(&OutreachError::ConfigError {
            message: format!(
                "cannot read template '{}': {}",
                config.template_path().display(),
                e
            ),
        }),
    };

    let text_generator = match OpenAiGenerator::from_config(&config) {
        Ok(generator) => Arc::new(generator),
        Err(e) => exit_with(&e),
    };
    let transport = match transport_from_config(&config) {
        Ok(transport) => transport,
        Err(e) => exit_with(&e),
    };

    let storage = LocalStorage::new(config.data_dir());
    let pipeline =
        OutreachPipeline::from_config(storage, &config, text_generator, transport, template)
            .with_monitoring(args.monitor);

    if args.monitor {
        tracing::info!("🔍 System monitoring enabled");
    }

    let options = args.run_options();
    let outcome = match args.only {
        Some(stage) => pipeline
            .run_stage(stage, &options)
            .await
            .map(|report| print_stage_report(&report)),
        None => pipeline
            .run(&options)
            .await
            .map(|summary| print_summary(&summary, config.data_dir())),
    };

    if let Err(e) = outcome {
        exit_with(&e);
    }

    Ok(())
}

/// 任何階段執行前完成；缺少的設定由錯誤訊息一次列出
fn load_config(path: &str) -> cold_outreach::Result<OutreachConfig> {
    let config = OutreachConfig::from_file(path)?;
    config.preflight()?;

    tracing::info!("✅ Configuration loaded and validated successfully");
    Ok(config)
}

fn exit_with(e: &OutreachError) -> ! {
    tracing::error!(
        "❌ Pipeline failed: {} (Category: {:?}, Severity: {:?})",
        e,
        e.category(),
        e.severity()
    );
    tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 {}", e.recovery_suggestion());

    // 根據錯誤嚴重程度決定退出碼
    let exit_code = match e.severity() {
        ErrorSeverity::Low => 0,
        ErrorSeverity::Medium => 2,
        ErrorSeverity::High => 1,
        ErrorSeverity::Critical => 3,
    };
    std::process::exit(exit_code);
}

fn print_cost(scale_to: u32, cost: &CostEstimate) {
    println!("\nCost estimate for scaling to {} emails per day:", scale_to);
    println!("  - Monthly emails: {}", cost.emails_per_month);
    println!("  - Estimated token usage: {}", cost.estimated_token_usage);
    println!("  - LLM cost: €{:.2}", cost.estimated_monthly_llm_cost);
    println!("  - Other costs: €{:.2}", cost.other_costs.total());
    println!(
        "  - Total monthly cost: €{:.2}",
        cost.total_estimated_monthly_cost
    );
    match cost.cost_per_email() {
        Some(per_email) => println!("  - Cost per email: €{:.4}", per_email),
        None => println!("  - Cost per email: n/a"),
    }
}

fn print_summary(summary: &RunSummary, data_dir: &str) {
    print_cost(summary.cost.daily_volume, &summary.cost);

    println!("\n===== PIPELINE COMPLETED =====");
    println!("Started: {}", summary.started_at.format("%Y-%m-%d %H:%M:%S"));
    println!("Ended: {}", summary.finished_at.format("%Y-%m-%d %H:%M:%S"));
    println!("Duration: {:.2} seconds", summary.duration.as_secs_f64());
    println!("\nResults:");
    match summary.leads_collected {
        Some(count) => println!("  - Leads collected: {}", count),
        None => println!("  - Leads collected: reused existing leads"),
    }
    println!(
        "  - Emails generated: {} ({} from template)",
        summary.messages_generated, summary.fallbacks_used
    );
    match &summary.dispatch {
        Some(_) => println!(
            "  - Emails sent: {} ({} failed)",
            summary.emails_sent(),
            summary.send_failures()
        ),
        None => println!("  - Emails sent: skipped"),
    }
    println!("  - Cost estimate generated: Yes");
    println!("\nAll data saved in the '{}' directory", data_dir);
}

fn print_stage_report(report: &StageReport) {
    match report {
        StageReport::Leads(leads) => println!("✅ Collected {} leads", leads.len()),
        StageReport::Generated(generated) => println!(
            "✅ Generated {} emails ({} from template)",
            generated.messages.len(),
            generated.fallbacks
        ),
        StageReport::Dispatched(dispatch) => println!(
            "✅ Sent {} emails ({} failed)",
            dispatch.records.len(),
            dispatch.failures.len()
        ),
        StageReport::Cost(cost) => print_cost(cost.daily_volume, cost),
    }
}
