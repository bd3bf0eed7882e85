use thiserror::Error;

#[derive(Error, Debug)]
pub enum EtlError {
    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Spreadsheet export failed: {0}")]
    SpreadsheetError(#[from] rust_xlsxwriter::XlsxError),

    #[error("Image encoding failed: {0}")]
    ImageError(#[from] image::ImageError),

    #[error("Chart rendering failed: {message}")]
    ChartError { message: String },

    #[error("Missing field '{field}'{}", .row.map(|r| format!(" in product #{}", r)).unwrap_or_default())]
    MissingFieldError { field: String, row: Option<usize> },

    #[error("Cannot parse '{value}' in field '{field}' of product #{row}")]
    ParseError {
        field: String,
        value: String,
        row: usize,
    },

    #[error("Configuration error in '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration '{field}'")]
    MissingConfigError { field: String },

    #[error("Data processing error: {message}")]
    ProcessingError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Network,
    Data,
    Output,
    Configuration,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl EtlError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            EtlError::ApiError(_) => ErrorCategory::Network,
            EtlError::SerializationError(_)
            | EtlError::MissingFieldError { .. }
            | EtlError::ParseError { .. }
            | EtlError::ProcessingError { .. } => ErrorCategory::Data,
            EtlError::SpreadsheetError(_) | EtlError::ImageError(_) | EtlError::ChartError { .. } => {
                ErrorCategory::Output
            }
            EtlError::ConfigValidationError { .. }
            | EtlError::InvalidConfigValueError { .. }
            | EtlError::MissingConfigError { .. } => ErrorCategory::Configuration,
            EtlError::IoError(_) => ErrorCategory::System,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Network => ErrorSeverity::Medium,
            ErrorCategory::Data | ErrorCategory::Output | ErrorCategory::Configuration => {
                ErrorSeverity::High
            }
            ErrorCategory::System => ErrorSeverity::Critical,
        }
    }

    /// 程序結束碼，與錯誤嚴重程度對應
    pub fn exit_code(&self) -> i32 {
        match self.severity() {
            ErrorSeverity::Low => 0,
            ErrorSeverity::Medium => 2,
            ErrorSeverity::High => 1,
            ErrorSeverity::Critical => 3,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            EtlError::ApiError(_) => "Check the network connection and that the search endpoint is reachable",
            EtlError::SerializationError(_) => "The API did not return valid JSON; inspect the raw dump",
            EtlError::MissingFieldError { .. } => {
                "The product schema changed; compare the raw JSON dump with the expected fields"
            }
            EtlError::ParseError { .. } => "Inspect the formatted base price in the raw JSON dump",
            EtlError::SpreadsheetError(_) | EtlError::ImageError(_) | EtlError::ChartError { .. } => {
                "Make sure the output directory is writable and a system font is installed"
            }
            EtlError::ConfigValidationError { .. }
            | EtlError::InvalidConfigValueError { .. }
            | EtlError::MissingConfigError { .. } => "Fix the configuration file and run again",
            EtlError::IoError(_) => "Check file permissions and free disk space",
            EtlError::ProcessingError { .. } => "Re-run with --verbose to see which stage failed",
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Network => format!("Could not reach the product search API ({})", self),
            ErrorCategory::Data => format!("The product data could not be processed ({})", self),
            ErrorCategory::Output => format!("Writing the reports failed ({})", self),
            ErrorCategory::Configuration => format!("The configuration is invalid ({})", self),
            ErrorCategory::System => format!("A system error occurred ({})", self),
        }
    }
}

pub type Result<T> = std::result::Result<T, EtlError>;
