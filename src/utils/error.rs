use thiserror::Error;

#[derive(Error, Debug)]
pub enum GeocodeError {
    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Spreadsheet read error: {0}")]
    SpreadsheetReadError(#[from] calamine::Error),

    #[error("Spreadsheet write error: {0}")]
    SpreadsheetWriteError(#[from] rust_xlsxwriter::XlsxError),

    #[error("Input file is empty")]
    EmptyFile,

    #[error("Input file is missing required columns: {}", missing.join(", "))]
    MissingColumns { missing: Vec<String> },

    #[error("Unsupported file format: {extension}")]
    UnsupportedFormat { extension: String },

    #[error("Configuration validation failed for '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Data processing error: {message}")]
    ProcessingError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Network,
    Input,
    Output,
    Configuration,
    Processing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl ErrorSeverity {
    /// 依嚴重程度決定程式退出碼
    pub fn exit_code(&self) -> i32 {
        match self {
            ErrorSeverity::Low => 0,      // 警告，但成功
            ErrorSeverity::Medium => 2,   // 可重試
            ErrorSeverity::High => 1,     // 處理錯誤
            ErrorSeverity::Critical => 3, // 系統錯誤
        }
    }
}

impl GeocodeError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            GeocodeError::ApiError(_) => ErrorCategory::Network,
            GeocodeError::CsvError(_)
            | GeocodeError::SpreadsheetReadError(_)
            | GeocodeError::EmptyFile
            | GeocodeError::MissingColumns { .. }
            | GeocodeError::UnsupportedFormat { .. } => ErrorCategory::Input,
            GeocodeError::IoError(_) | GeocodeError::SpreadsheetWriteError(_) => {
                ErrorCategory::Output
            }
            GeocodeError::ConfigValidationError { .. }
            | GeocodeError::InvalidConfigValueError { .. }
            | GeocodeError::MissingConfigError { .. } => ErrorCategory::Configuration,
            GeocodeError::ProcessingError { .. } => ErrorCategory::Processing,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Network => ErrorSeverity::Medium,
            ErrorCategory::Input | ErrorCategory::Processing => ErrorSeverity::High,
            ErrorCategory::Configuration => ErrorSeverity::High,
            ErrorCategory::Output => ErrorSeverity::Critical,
        }
    }

    /// 給使用者的修復建議
    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            GeocodeError::ApiError(_) => "Check network connectivity and the geocoding endpoint",
            GeocodeError::EmptyFile => "Make sure the spreadsheet has at least one data row",
            GeocodeError::MissingColumns { .. } => {
                "The first sheet must contain the columns: id, name, address, city"
            }
            GeocodeError::UnsupportedFormat { .. } => "Use an .xlsx, .xlsm, .xls, .ods or .csv file",
            GeocodeError::CsvError(_) | GeocodeError::SpreadsheetReadError(_) => {
                "Make sure the input file is a valid spreadsheet"
            }
            GeocodeError::IoError(_) | GeocodeError::SpreadsheetWriteError(_) => {
                "Check that the output directory exists and is writable"
            }
            GeocodeError::MissingConfigError { .. } => {
                "Pass --api-key or set GEOCODING_API_KEY in the environment"
            }
            GeocodeError::ConfigValidationError { .. }
            | GeocodeError::InvalidConfigValueError { .. } => {
                "Review the command line arguments or the TOML configuration"
            }
            GeocodeError::ProcessingError { .. } => "Re-run with --verbose and inspect the logs",
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            GeocodeError::EmptyFile => "The spreadsheet is empty".to_string(),
            GeocodeError::MissingColumns { missing } => format!(
                "The spreadsheet must contain the columns id, name, address, city (missing: {})",
                missing.join(", ")
            ),
            GeocodeError::ApiError(e) => format!("Could not reach the geocoding service: {}", e),
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, GeocodeError>;
