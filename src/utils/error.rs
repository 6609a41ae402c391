use thiserror::Error;

#[derive(Error, Debug)]
pub enum OutreachError {
    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Configuration validation failed for {field}: {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Required input '{artifact}' not found")]
    MissingInputError { artifact: String },

    #[error("Text generation failed: {message}")]
    GenerationError { message: String },

    #[error("Sending to {recipient} failed: {message}")]
    DispatchError { recipient: String, message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Network,
    Data,
    Storage,
    Delivery,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl OutreachError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::ConfigError { .. }
            | Self::MissingConfigError { .. }
            | Self::InvalidConfigValueError { .. }
            | Self::ConfigValidationError { .. } => ErrorCategory::Configuration,
            Self::ApiError(_) | Self::GenerationError { .. } => ErrorCategory::Network,
            Self::CsvError(_) | Self::SerializationError(_) => ErrorCategory::Data,
            Self::IoError(_) | Self::MissingInputError { .. } => ErrorCategory::Storage,
            Self::DispatchError { .. } => ErrorCategory::Delivery,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            // 單筆失敗會在階段內被吸收，真的冒出來時只算警告
            Self::GenerationError { .. } | Self::DispatchError { .. } => ErrorSeverity::Low,
            Self::ApiError(_) => ErrorSeverity::Medium,
            Self::CsvError(_) | Self::SerializationError(_) | Self::MissingInputError { .. } => {
                ErrorSeverity::High
            }
            Self::IoError(_)
            | Self::ConfigError { .. }
            | Self::MissingConfigError { .. }
            | Self::InvalidConfigValueError { .. }
            | Self::ConfigValidationError { .. } => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> String {
        match self {
            Self::ConfigError { .. } | Self::ConfigValidationError { .. } => {
                "Check the configuration file and the files it references".to_string()
            }
            Self::MissingConfigError { field } => {
                format!("Add '{}' to the configuration file", field)
            }
            Self::InvalidConfigValueError { field, .. } => {
                format!("Correct the value of '{}' in the configuration file", field)
            }
            Self::MissingInputError { artifact } => format!(
                "Run the stage that produces '{}' first, or drop --skip-scraping / --only",
                artifact
            ),
            Self::ApiError(_) | Self::GenerationError { .. } => {
                "Check network connectivity and the generation endpoint / API key".to_string()
            }
            Self::DispatchError { .. } => {
                "Check the SMTP settings or switch the transport to 'echo'".to_string()
            }
            Self::CsvError(_) | Self::SerializationError(_) => {
                "The persisted artifact looks corrupted; regenerate it".to_string()
            }
            Self::IoError(_) => "Check that the data directory is writable".to_string(),
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Configuration => format!("Configuration problem: {}", self),
            ErrorCategory::Network => format!("Could not reach the language model: {}", self),
            ErrorCategory::Data => format!("Could not read or write pipeline data: {}", self),
            ErrorCategory::Storage => format!("Storage problem: {}", self),
            ErrorCategory::Delivery => format!("Email delivery problem: {}", self),
        }
    }
}

pub type Result<T> = std::result::Result<T, OutreachError>;
