use anyhow::Result;
use cold_outreach::adapters::mail::transport_from_config;
use cold_outreach::core::generator::render_template;
use cold_outreach::core::{table, SendStatus};
use cold_outreach::{
    LocalStorage, OpenAiGenerator, OutreachConfig, OutreachError, OutreachPipeline, RunOptions,
    Stage, StageReport,
};
use httpmock::prelude::*;
use std::sync::Arc;
use tempfile::TempDir;

const TEMPLATE: &str = "Sehr geehrte/r {contact_name},\n\
    als {position} bei {company_name} in {city} betreuen Sie {properties_count} Objekte.";

fn write_config(temp_dir: &TempDir, endpoint: &str, test_mode: bool) -> Result<OutreachConfig> {
    let base = temp_dir.path().to_str().unwrap().replace('\\', "/");
    let template_path = format!("{}/email_template.txt", base);
    std::fs::write(&template_path, TEMPLATE)?;

    let config_content = format!(
        r#"
[campaign]
market = "Germany"
lead_sources = ["immobilienscout24", "linkedin", "gelbe_seiten"]
test_mode = {test_mode}

[generation]
endpoint = "{endpoint}"
api_key = "sk-integration"
template_path = "{template_path}"
timeout_seconds = 5

[email]
transport = "echo"
test_recipient = "qa@example.de"

[leads]
seed = 2024

[output]
data_dir = "{base}/data"
"#
    );

    let config_path = format!("{}/outreach.toml", base);
    std::fs::write(&config_path, config_content)?;
    let config = OutreachConfig::from_file(&config_path)?;
    config.preflight()?;
    Ok(config)
}

fn build_pipeline(config: &OutreachConfig) -> Result<OutreachPipeline<LocalStorage>> {
    let template = std::fs::read_to_string(config.template_path())?;
    let generator = Arc::new(OpenAiGenerator::from_config(config)?);
    let transport = transport_from_config(config)?;
    Ok(OutreachPipeline::from_config(
        LocalStorage::new(config.data_dir()),
        config,
        generator,
        transport,
        template,
    ))
}

#[tokio::test]
async fn test_end_to_end_with_generated_emails() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let server = MockServer::start();
    let api_mock = server.mock(|when, then| {
        when.method(POST).path("/v1/chat/completions");
        then.status(200)
            .header("Content-Type", "application/json")
            .json_body(serde_json::json!({
                "choices": [{"message": {"role": "assistant", "content": "\n  Guten Tag!  \n"}}]
            }));
    });

    let config = write_config(&temp_dir, &server.url("/v1/chat/completions"), true)?;
    let pipeline = build_pipeline(&config)?;

    let options = RunOptions {
        num_leads: 4,
        scale_to: 100,
        ..RunOptions::default()
    };
    let summary = pipeline.run(&options).await?;

    api_mock.assert_hits(4);
    assert_eq!(summary.leads_collected, Some(4));
    assert_eq!(summary.messages_generated, 4);
    assert_eq!(summary.fallbacks_used, 0);
    assert_eq!(summary.emails_sent(), 1);

    let storage = LocalStorage::new(config.data_dir());
    let leads = table::load_leads(&storage).await?;
    let messages = table::load_messages(&storage).await?;
    let sent = table::load_send_records(&storage).await?;

    assert_eq!(leads.len(), 4);
    assert_eq!(messages.len(), 4);
    for (message, lead) in messages.iter().zip(&leads) {
        assert_eq!(&message.lead, lead);
        assert_eq!(message.personalized_text, "Guten Tag!");
    }

    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].lead_id, 1);
    assert_eq!(sent[0].recipient, "qa@example.de");
    assert_eq!(sent[0].status, SendStatus::SentTest);

    let cost_path = temp_dir.path().join("data").join(table::COST_FILE);
    let cost: serde_json::Value = serde_json::from_slice(&std::fs::read(cost_path)?)?;
    assert_eq!(cost["emails_per_month"], 2200);
    assert_eq!(cost["estimated_token_usage"], 1_100_000);

    Ok(())
}

#[tokio::test]
async fn test_end_to_end_with_api_failure_uses_template() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let server = MockServer::start();
    let api_mock = server.mock(|when, then| {
        when.method(POST).path("/v1/chat/completions");
        then.status(500).body("upstream exploded");
    });

    let config = write_config(&temp_dir, &server.url("/v1/chat/completions"), false)?;
    let pipeline = build_pipeline(&config)?;

    let options = RunOptions {
        num_leads: 3,
        ..RunOptions::default()
    };
    let summary = pipeline.run(&options).await?;

    api_mock.assert_hits(3);
    assert_eq!(summary.messages_generated, 3);
    assert_eq!(summary.fallbacks_used, 3);
    // Live 模式搭配 echo transport：每封都算寄出
    assert_eq!(summary.emails_sent(), 3);

    let storage = LocalStorage::new(config.data_dir());
    let messages = table::load_messages(&storage).await?;
    for message in &messages {
        assert_eq!(
            message.personalized_text,
            render_template(TEMPLATE, &message.lead)
        );
    }

    let sent = table::load_send_records(&storage).await?;
    let recipients: Vec<&str> = sent.iter().map(|r| r.recipient.as_str()).collect();
    assert_eq!(
        recipients,
        vec![
            "contact1@example-1.de",
            "contact2@example-2.de",
            "contact3@example-3.de"
        ]
    );
    assert!(sent.iter().all(|r| r.status == SendStatus::Sent));

    Ok(())
}

#[tokio::test]
async fn test_skip_scraping_reuses_persisted_leads() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/v1/chat/completions");
        then.status(200)
            .header("Content-Type", "application/json")
            .json_body(serde_json::json!({
                "choices": [{"message": {"content": "Hallo"}}]
            }));
    });

    let config = write_config(&temp_dir, &server.url("/v1/chat/completions"), true)?;
    let pipeline = build_pipeline(&config)?;

    pipeline.run_stage(Stage::Leads, &RunOptions {
        num_leads: 2,
        ..RunOptions::default()
    })
    .await?;

    let options = RunOptions {
        skip_scraping: true,
        skip_sending: true,
        ..RunOptions::default()
    };
    let summary = pipeline.run(&options).await?;

    assert_eq!(summary.leads_collected, None);
    assert_eq!(summary.messages_generated, 2);
    assert!(summary.dispatch.is_none());
    assert!(!temp_dir.path().join("data").join(table::SENT_FILE).exists());

    Ok(())
}

#[tokio::test]
async fn test_generate_stage_without_leads_reports_missing_input() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let server = MockServer::start();

    let config = write_config(&temp_dir, &server.url("/v1/chat/completions"), true)?;
    let pipeline = build_pipeline(&config)?;

    let err = pipeline
        .run_stage(Stage::Generate, &RunOptions::default())
        .await
        .unwrap_err();

    assert!(matches!(err, OutreachError::MissingInputError { .. }));
    assert!(!temp_dir
        .path()
        .join("data")
        .join(table::MESSAGES_FILE)
        .exists());

    Ok(())
}

#[tokio::test]
async fn test_cost_stage_only() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let server = MockServer::start();

    let config = write_config(&temp_dir, &server.url("/v1/chat/completions"), true)?;
    let pipeline = build_pipeline(&config)?;

    let report = pipeline
        .run_stage(Stage::Cost, &RunOptions {
            scale_to: 50,
            ..RunOptions::default()
        })
        .await?;

    match report {
        StageReport::Cost(cost) => {
            assert_eq!(cost.emails_per_month, 1100);
            assert!((cost.estimated_monthly_llm_cost - 16.5).abs() < 1e-9);
            assert!((cost.total_estimated_monthly_cost - 31.5).abs() < 1e-9);
        }
        other => panic!("unexpected report: {other:?}"),
    }

    Ok(())
}
