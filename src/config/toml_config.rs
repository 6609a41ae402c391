use crate::core::dispatcher::DEFAULT_SUBJECT;
use crate::core::{cost, DispatchMode};
use crate::utils::error::{OutreachError, Result};
use crate::utils::validation::{self, Validate};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const API_KEY_ENV: &str = "OPENAI_API_KEY";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutreachConfig {
    pub campaign: CampaignConfig,
    #[serde(default)]
    pub generation: GenerationConfig,
    #[serde(default)]
    pub email: EmailConfig,
    #[serde(default)]
    pub leads: LeadsConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CampaignConfig {
    pub market: String,
    pub lead_sources: Vec<String>,
    #[serde(default = "default_true")]
    pub test_mode: bool,
    #[serde(default = "default_product")]
    pub product: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    pub endpoint: String,
    pub model: String,
    pub api_key: Option<String>,
    pub temperature: f32,
    pub max_tokens: u32,
    pub timeout_seconds: u64,
    pub language: String,
    pub max_words: u32,
    pub template_path: String,
    pub avg_tokens_per_email: u32,
    pub cost_per_1k_tokens: f64,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.openai.com/v1/chat/completions".to_string(),
            model: "gpt-3.5-turbo".to_string(),
            api_key: None,
            temperature: 0.7,
            max_tokens: 500,
            timeout_seconds: 30,
            language: "German".to_string(),
            max_words: 150,
            template_path: "templates/email_template.txt".to_string(),
            avg_tokens_per_email: cost::DEFAULT_AVG_TOKENS_PER_EMAIL,
            cost_per_1k_tokens: cost::DEFAULT_COST_PER_1K_TOKENS,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportKind {
    /// 只把郵件印出來，不真的寄送
    Echo,
    Smtp,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmailConfig {
    pub transport: TransportKind,
    pub smtp_server: Option<String>,
    pub smtp_port: u16,
    pub use_tls: bool,
    pub username: Option<String>,
    pub password: Option<String>,
    pub sender_name: String,
    pub sender_email: Option<String>,
    pub reply_to: Option<String>,
    pub test_recipient: Option<String>,
    pub subject: String,
    pub timeout_seconds: u64,
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            transport: TransportKind::Echo,
            smtp_server: None,
            smtp_port: 587,
            use_tls: true,
            username: None,
            password: None,
            sender_name: "Propertyvisualizer".to_string(),
            sender_email: None,
            reply_to: None,
            test_recipient: None,
            subject: DEFAULT_SUBJECT.to_string(),
            timeout_seconds: 30,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LeadsConfig {
    pub seed: Option<u64>,
    pub simulated_delay_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub data_dir: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            data_dir: "data".to_string(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_product() -> String {
    "property management software".to_string()
}

/// 仍是 ${VAR} 形式代表環境變數沒設定
fn is_unresolved(value: &str) -> bool {
    let value = value.trim();
    value.is_empty() || (value.starts_with("${") && value.ends_with('}'))
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !is_unresolved(v))
}

impl OutreachConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| OutreachError::ConfigError {
            message: format!("cannot read config file '{}': {}", path.display(), e),
        })?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| OutreachError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${OPENAI_API_KEY})，未設定的保持原樣
    fn substitute_env_vars(content: &str) -> Result<String> {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| OutreachError::ConfigError {
            message: format!("invalid substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    /// 設定檔的值優先，其次是 OPENAI_API_KEY 環境變數
    pub fn api_key(&self) -> Option<String> {
        non_blank(&self.generation.api_key)
            .map(str::to_string)
            .or_else(|| std::env::var(API_KEY_ENV).ok().filter(|v| !v.trim().is_empty()))
    }

    pub fn test_recipient(&self) -> Option<&str> {
        non_blank(&self.email.test_recipient)
    }

    pub fn smtp_server(&self) -> Option<&str> {
        non_blank(&self.email.smtp_server)
    }

    pub fn sender_email(&self) -> Option<&str> {
        non_blank(&self.email.sender_email)
    }

    /// 帳號密碼都有設定才回傳
    pub fn smtp_credentials(&self) -> Option<(String, String)> {
        match (non_blank(&self.email.username), non_blank(&self.email.password)) {
            (Some(username), Some(password)) => Some((username.to_string(), password.to_string())),
            _ => None,
        }
    }

    pub fn dispatch_mode(&self) -> DispatchMode {
        if self.campaign.test_mode {
            DispatchMode::Test
        } else {
            DispatchMode::Live
        }
    }

    pub fn data_dir(&self) -> &str {
        &self.output.data_dir
    }

    pub fn template_path(&self) -> PathBuf {
        PathBuf::from(&self.generation.template_path)
    }

    pub fn generation_timeout(&self) -> Duration {
        Duration::from_secs(self.generation.timeout_seconds)
    }

    pub fn email_timeout(&self) -> Duration {
        Duration::from_secs(self.email.timeout_seconds)
    }

    pub fn lead_seed(&self) -> Option<u64> {
        self.leads.seed
    }

    pub fn lead_delay(&self) -> Duration {
        Duration::from_millis(self.leads.simulated_delay_ms)
    }

    /// 列出所有缺少的必要設定，任何階段執行前呼叫
    pub fn missing_requirements(&self) -> Vec<String> {
        let mut missing = Vec::new();

        if !self.template_path().is_file() {
            missing.push(format!(
                "generation.template_path (file '{}' not found)",
                self.generation.template_path
            ));
        }

        if self.campaign.lead_sources.iter().all(|s| s.trim().is_empty()) {
            missing.push("campaign.lead_sources".to_string());
        }

        if self.campaign.test_mode && self.test_recipient().is_none() {
            missing.push("email.test_recipient".to_string());
        }

        if self.email.transport == TransportKind::Smtp {
            if self.smtp_server().is_none() {
                missing.push("email.smtp_server".to_string());
            }
            if self.sender_email().is_none() {
                missing.push("email.sender_email".to_string());
            }
        }

        missing
    }

    /// 先列出所有缺少的設定，全部齊全後才檢查各值是否合理
    pub fn preflight(&self) -> Result<()> {
        let missing = self.missing_requirements();
        if !missing.is_empty() {
            let list: Vec<String> = missing.iter().map(|item| format!("  - {}", item)).collect();
            return Err(OutreachError::ConfigError {
                message: format!("required configuration is missing:\n{}", list.join("\n")),
            });
        }

        self.validate_config()
    }

    /// 驗證配置的合理性
    pub fn validate_config(&self) -> Result<()> {
        validation::validate_non_empty_string("campaign.market", &self.campaign.market)?;
        validation::validate_url("generation.endpoint", &self.generation.endpoint)?;
        validation::validate_non_empty_string("generation.model", &self.generation.model)?;
        validation::validate_range("generation.temperature", self.generation.temperature, 0.0, 2.0)?;
        validation::validate_positive_number(
            "generation.max_tokens",
            u64::from(self.generation.max_tokens),
            1,
        )?;
        validation::validate_positive_number(
            "generation.timeout_seconds",
            self.generation.timeout_seconds,
            1,
        )?;
        validation::validate_positive_number(
            "generation.max_words",
            u64::from(self.generation.max_words),
            1,
        )?;
        validation::validate_path("generation.template_path", &self.generation.template_path)?;
        if self.generation.cost_per_1k_tokens < 0.0 {
            return Err(OutreachError::InvalidConfigValueError {
                field: "generation.cost_per_1k_tokens".to_string(),
                value: self.generation.cost_per_1k_tokens.to_string(),
                reason: "Cost cannot be negative".to_string(),
            });
        }

        validation::validate_positive_number(
            "email.timeout_seconds",
            self.email.timeout_seconds,
            1,
        )?;
        if let Some(recipient) = self.test_recipient() {
            validation::validate_email_address("email.test_recipient", recipient)?;
        }
        if let Some(sender) = self.sender_email() {
            validation::validate_email_address("email.sender_email", sender)?;
        }

        validation::validate_path("output.data_dir", &self.output.data_dir)?;
        Ok(())
    }
}

impl Validate for OutreachConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const MINIMAL: &str = r#"
[campaign]
market = "Germany"
lead_sources = ["immobilienscout24", "linkedin"]
"#;

    #[test]
    fn test_parse_minimal_config_uses_defaults() {
        let config = OutreachConfig::from_toml_str(MINIMAL).unwrap();

        assert_eq!(config.campaign.market, "Germany");
        assert!(config.campaign.test_mode);
        assert_eq!(config.dispatch_mode(), DispatchMode::Test);
        assert_eq!(config.generation.model, "gpt-3.5-turbo");
        assert_eq!(config.generation.max_tokens, 500);
        assert_eq!(config.generation.avg_tokens_per_email, 500);
        assert_eq!(config.generation.cost_per_1k_tokens, 0.03);
        assert_eq!(config.email.transport, TransportKind::Echo);
        assert_eq!(config.email.subject, DEFAULT_SUBJECT);
        assert_eq!(config.data_dir(), "data");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_full_config() {
        let toml_content = r#"
[campaign]
market = "Austria"
lead_sources = ["herold"]
test_mode = false
product = "Immobiliensoftware"

[generation]
endpoint = "http://localhost:9000/v1/chat/completions"
model = "gpt-4o-mini"
temperature = 0.2
max_tokens = 300
language = "English"

[email]
transport = "smtp"
smtp_server = "smtp.example.de"
smtp_port = 465
sender_email = "vertrieb@example.de"
subject = "Hallo"

[leads]
seed = 42
simulated_delay_ms = 100

[output]
data_dir = "./out"
"#;
        let config = OutreachConfig::from_toml_str(toml_content).unwrap();

        assert_eq!(config.dispatch_mode(), DispatchMode::Live);
        assert_eq!(config.email.transport, TransportKind::Smtp);
        assert_eq!(config.email.smtp_port, 465);
        assert_eq!(config.generation.language, "English");
        assert_eq!(config.lead_seed(), Some(42));
        assert_eq!(config.lead_delay(), Duration::from_millis(100));
        assert_eq!(config.data_dir(), "./out");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("OUTREACH_TEST_MARKET", "Schweiz");

        let toml_content = r#"
[campaign]
market = "${OUTREACH_TEST_MARKET}"
lead_sources = ["local.ch"]

[generation]
api_key = "${OUTREACH_TEST_UNSET_KEY}"
"#;
        let config = OutreachConfig::from_toml_str(toml_content).unwrap();
        assert_eq!(config.campaign.market, "Schweiz");
        assert_eq!(
            config.generation.api_key.as_deref(),
            Some("${OUTREACH_TEST_UNSET_KEY}")
        );

        std::env::remove_var("OUTREACH_TEST_MARKET");
    }

    #[test]
    fn test_explicit_api_key_wins() {
        let toml_content = r#"
[campaign]
market = "Germany"
lead_sources = ["x"]

[generation]
api_key = "sk-from-file"
"#;
        let config = OutreachConfig::from_toml_str(toml_content).unwrap();
        assert_eq!(config.api_key().as_deref(), Some("sk-from-file"));
    }

    #[test]
    fn test_unresolved_smtp_credentials_are_ignored() {
        let toml_content = r#"
[campaign]
market = "Germany"
lead_sources = ["x"]

[email]
username = "${OUTREACH_TEST_UNSET_USER}"
password = "secret"
"#;
        let config = OutreachConfig::from_toml_str(toml_content).unwrap();
        assert!(config.smtp_credentials().is_none());
    }

    #[test]
    fn test_config_validation_rejects_bad_endpoint() {
        let toml_content = r#"
[campaign]
market = "Germany"
lead_sources = ["x"]

[generation]
endpoint = "invalid-url"
"#;
        let config = OutreachConfig::from_toml_str(toml_content).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_missing_campaign_section_fails_to_parse() {
        let err = OutreachConfig::from_toml_str("[output]\ndata_dir = \"x\"\n").unwrap_err();
        assert!(matches!(err, OutreachError::ConfigValidationError { .. }));
    }

    #[test]
    fn test_missing_requirements_are_enumerated() {
        let toml_content = r#"
[campaign]
market = "Germany"
lead_sources = []

[generation]
template_path = "/definitely/not/here.txt"

[email]
transport = "smtp"
"#;
        let config = OutreachConfig::from_toml_str(toml_content).unwrap();
        let missing = config.missing_requirements();

        assert_eq!(missing.len(), 5);
        assert!(missing[0].starts_with("generation.template_path"));
        assert!(missing.contains(&"campaign.lead_sources".to_string()));
        assert!(missing.contains(&"email.test_recipient".to_string()));
        assert!(missing.contains(&"email.smtp_server".to_string()));
        assert!(missing.contains(&"email.sender_email".to_string()));
        assert!(matches!(
            config.preflight(),
            Err(OutreachError::ConfigError { .. })
        ));
    }

    #[test]
    fn test_preflight_reports_missing_items_before_invalid_values() {
        let toml_content = r#"
[campaign]
market = "Germany"
lead_sources = ["x"]

[generation]
endpoint = "invalid-url"
template_path = "/definitely/not/here.txt"
"#;
        let config = OutreachConfig::from_toml_str(toml_content).unwrap();

        match config.preflight() {
            Err(OutreachError::ConfigError { message }) => {
                assert_eq!(message.matches("  - ").count(), 2);
                assert!(message.contains("generation.template_path"));
                assert!(message.contains("email.test_recipient"));
            }
            other => panic!("unexpected preflight result: {other:?}"),
        }
    }

    #[test]
    fn test_preflight_validates_values_once_nothing_is_missing() {
        let mut template = NamedTempFile::new().unwrap();
        template.write_all(b"Hallo {contact_name}").unwrap();

        let toml_content = format!(
            r#"
[campaign]
market = "Germany"
lead_sources = ["x"]

[generation]
template_path = "{}"

[email]
test_recipient = "qa team@exa mple"
"#,
            template.path().display().to_string().replace('\\', "/")
        );
        let config = OutreachConfig::from_toml_str(&toml_content).unwrap();
        assert!(matches!(
            config.preflight(),
            Err(OutreachError::InvalidConfigValueError { .. })
        ));
    }

    #[test]
    fn test_preflight_passes_with_template_and_recipient() {
        let mut template = NamedTempFile::new().unwrap();
        template.write_all(b"Hallo {contact_name}").unwrap();

        let toml_content = format!(
            r#"
[campaign]
market = "Germany"
lead_sources = ["x"]

[generation]
template_path = "{}"

[email]
test_recipient = "qa@example.de"
"#,
            template.path().display().to_string().replace('\\', "/")
        );
        let config = OutreachConfig::from_toml_str(&toml_content).unwrap();
        assert!(config.preflight().is_ok());
    }

    #[test]
    fn test_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(MINIMAL.as_bytes()).unwrap();

        let config = OutreachConfig::from_file(temp_file.path()).unwrap();
        assert_eq!(config.campaign.lead_sources.len(), 2);
    }

    #[test]
    fn test_missing_config_file_is_config_error() {
        let err = OutreachConfig::from_file("/definitely/not/outreach.toml").unwrap_err();
        assert!(matches!(err, OutreachError::ConfigError { .. }));
    }
}
