use thiserror::Error;

#[derive(Error, Debug)]
pub enum CheckError {
    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Input file '{path}' was not found")]
    InputNotFound { path: String },

    #[error("Invalid appointment record at line {line}: {message}")]
    InvalidRecord { line: u64, message: String },

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Missing configuration field: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Input,
    Configuration,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    High,
    Critical,
}

impl CheckError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            CheckError::CsvError(_)
            | CheckError::InputNotFound { .. }
            | CheckError::InvalidRecord { .. } => ErrorCategory::Input,
            CheckError::ConfigError { .. }
            | CheckError::MissingConfigError { .. }
            | CheckError::InvalidConfigValueError { .. } => ErrorCategory::Configuration,
            CheckError::IoError(_) | CheckError::SerializationError(_) => ErrorCategory::System,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Input | ErrorCategory::Configuration => ErrorSeverity::High,
            ErrorCategory::System => ErrorSeverity::Critical,
        }
    }

    /// Process exit code for a failed run.
    pub fn exit_code(&self) -> i32 {
        match self.severity() {
            ErrorSeverity::High => 1,
            ErrorSeverity::Critical => 3,
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            CheckError::InputNotFound { path } => format!(
                "Error: The input file '{}' was not found. Please run an appointment generator first.",
                path
            ),
            CheckError::InvalidRecord { line, message } => {
                format!("Appointment file has a bad row at line {}: {}", line, message)
            }
            CheckError::CsvError(e) => format!("Could not read the appointment CSV: {}", e),
            CheckError::MissingConfigError { field } => {
                format!("Required setting '{}' is missing", field)
            }
            CheckError::InvalidConfigValueError { field, reason, .. } => {
                format!("Setting '{}' is invalid: {}", field, reason)
            }
            other => other.to_string(),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            CheckError::InputNotFound { .. } => {
                "Run `generate-appointments` or pass --input-file pointing to an existing CSV"
            }
            CheckError::InvalidRecord { .. } | CheckError::CsvError(_) => {
                "Check that the CSV has APPT_ID, PATIENT_MRN, APPT_TYPE, APPT_DTTM and SCHEDULER_ID columns"
            }
            CheckError::ConfigError { .. }
            | CheckError::MissingConfigError { .. }
            | CheckError::InvalidConfigValueError { .. } => {
                "Review the command line flags and the TOML config file"
            }
            CheckError::IoError(_) | CheckError::SerializationError(_) => {
                "Check file permissions and free disk space for the output directory"
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, CheckError>;
