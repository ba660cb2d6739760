use thiserror::Error;

#[derive(Error, Debug)]
pub enum CardError {
    #[error("Zip operation failed: {0}")]
    ZipError(#[from] zip::result::ZipError),

    #[error("HTTP client error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Missing configuration field: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid value for '{field}' ({value}): {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Catalogue file '{path}' is corrupt: {source}")]
    CorruptCatalogue {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Column '{column}' not found in inventory header [{available}]")]
    MissingColumn { column: String, available: String },

    #[error("Template '{path}' is unusable: {reason}")]
    TemplateError { path: String, reason: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Config,
    Io,
    Network,
    Data,
    Template,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl CardError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            CardError::ConfigError { .. }
            | CardError::MissingConfigError { .. }
            | CardError::InvalidConfigValueError { .. } => ErrorCategory::Config,
            CardError::IoError(_) => ErrorCategory::Io,
            CardError::HttpError(_) => ErrorCategory::Network,
            CardError::CsvError(_)
            | CardError::SerializationError(_)
            | CardError::CorruptCatalogue { .. }
            | CardError::MissingColumn { .. } => ErrorCategory::Data,
            CardError::ZipError(_) | CardError::TemplateError { .. } => ErrorCategory::Template,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Network => ErrorSeverity::Medium,
            ErrorCategory::Template | ErrorCategory::Data => ErrorSeverity::High,
            ErrorCategory::Config | ErrorCategory::Io => ErrorSeverity::Critical,
        }
    }

    /// True when the error is an I/O "file not found".
    pub fn is_not_found(&self) -> bool {
        matches!(self, CardError::IoError(e) if e.kind() == std::io::ErrorKind::NotFound)
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            CardError::ConfigError { message } => format!("Configuration problem: {}", message),
            CardError::MissingConfigError { field } => {
                format!("The configuration is missing '{}'", field)
            }
            CardError::InvalidConfigValueError { field, reason, .. } => {
                format!("The configuration value '{}' is invalid: {}", field, reason)
            }
            CardError::CorruptCatalogue { path, .. } => {
                format!("The metadata cache at {} could not be read", path)
            }
            CardError::MissingColumn { column, .. } => {
                format!("The inventory file has no '{}' column", column)
            }
            CardError::TemplateError { path, reason } => {
                format!("The card template {} cannot be used: {}", path, reason)
            }
            CardError::IoError(e) => format!("A file operation failed: {}", e),
            CardError::HttpError(e) => format!("Could not talk to the lookup service: {}", e),
            CardError::CsvError(e) => format!("The inventory file could not be parsed: {}", e),
            CardError::SerializationError(e) => format!("JSON encoding failed: {}", e),
            CardError::ZipError(e) => format!("The document archive is invalid: {}", e),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            CardError::ConfigError { .. }
            | CardError::MissingConfigError { .. }
            | CardError::InvalidConfigValueError { .. } => {
                "Check the configuration file and any ${VAR} environment references"
            }
            CardError::CorruptCatalogue { .. } => {
                "Fix or remove the cache file; it is rebuilt from the inventory on the next run"
            }
            CardError::MissingColumn { .. } => {
                "Set [inventory] column and delimiter to match the CSV header"
            }
            CardError::TemplateError { .. } | CardError::ZipError(_) => {
                "Make sure the template is a .docx file containing the {{...}} placeholders"
            }
            CardError::HttpError(_) => "Check network access and retry; cached entries are kept",
            CardError::IoError(_) => "Check that the paths exist and are writable",
            CardError::CsvError(_) | CardError::SerializationError(_) => {
                "Inspect the input file for malformed rows"
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, CardError>;
