use thiserror::Error;

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Configuration validation failed for '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("{kind} id '{id}' is already in use")]
    DuplicateIdError { kind: String, id: String },

    #[error("{kind} '{id}' not found")]
    NotFoundError { kind: String, id: String },

    #[error("Fetching {source_name} CSV failed with status {status}")]
    FetchError { source_name: String, status: u16 },

    #[error("Validation error: {message}")]
    ValidationError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Network,
    Storage,
    Data,
    Configuration,
    Input,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl CatalogError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            CatalogError::HttpError(_) | CatalogError::FetchError { .. } => ErrorCategory::Network,
            CatalogError::IoError(_) => ErrorCategory::Storage,
            CatalogError::CsvError(_) | CatalogError::SerializationError(_) => ErrorCategory::Data,
            CatalogError::ConfigError { .. }
            | CatalogError::ConfigValidationError { .. }
            | CatalogError::MissingConfigError { .. }
            | CatalogError::InvalidConfigValueError { .. } => ErrorCategory::Configuration,
            CatalogError::DuplicateIdError { .. }
            | CatalogError::NotFoundError { .. }
            | CatalogError::ValidationError { .. } => ErrorCategory::Input,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            // 操作被拒絕，狀態未變
            ErrorCategory::Input => ErrorSeverity::Low,
            ErrorCategory::Network => ErrorSeverity::Medium,
            ErrorCategory::Data | ErrorCategory::Configuration => ErrorSeverity::High,
            ErrorCategory::Storage => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            CatalogError::HttpError(_) => "Check the network connection and that the sheet URL is reachable",
            CatalogError::FetchError { .. } => {
                "Make sure the sheet is published to the web as CSV (File > Share > Publish to web)"
            }
            CatalogError::CsvError(_) => "Open the CSV in a spreadsheet and check for ragged or broken rows",
            CatalogError::SerializationError(_) => "The file is not valid JSON; export a fresh backup and retry",
            CatalogError::IoError(_) => "Check that the data directory exists and is writable",
            CatalogError::ConfigError { .. }
            | CatalogError::ConfigValidationError { .. }
            | CatalogError::MissingConfigError { .. }
            | CatalogError::InvalidConfigValueError { .. } => {
                "Review the configuration file and command line flags"
            }
            CatalogError::DuplicateIdError { .. } => "Pick a different id or delete the existing entry first",
            CatalogError::NotFoundError { .. } => "Run `pestes-config show` to list the existing ids",
            CatalogError::ValidationError { .. } => "Fill in both the id and the label",
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            CatalogError::FetchError {
                source_name,
                status,
            } => format!("Could not download the {} sheet (HTTP {})", source_name, status),
            CatalogError::HttpError(_) => "Fetching the published sheets failed".to_string(),
            CatalogError::SerializationError(_) => "Invalid JSON".to_string(),
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, CatalogError>;
