use thiserror::Error;

#[derive(Error, Debug)]
pub enum BatchError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Missing configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Port overflow for scan '{scan}': {base} + {offset} exceeds 65535")]
    PortOverflow { scan: String, base: u16, offset: u16 },

    #[error("Failed to start '{program}': {source}")]
    SpawnError {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Scan '{scan}' failed with {}", describe_exit(.exit_code))]
    ScanFailed { scan: String, exit_code: Option<i32> },
}

fn describe_exit(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("exit code {}", code),
        None => "no exit code (killed by signal)".to_string(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Execution,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl BatchError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            BatchError::TomlError(_)
            | BatchError::ConfigError { .. }
            | BatchError::MissingConfigError { .. }
            | BatchError::InvalidConfigValueError { .. }
            | BatchError::PortOverflow { .. } => ErrorCategory::Configuration,
            BatchError::ScanFailed { .. } | BatchError::SpawnError { .. } => {
                ErrorCategory::Execution
            }
            BatchError::IoError(_) | BatchError::SerializationError(_) => ErrorCategory::System,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            // 外部流程失敗，重跑該 scan 通常即可
            BatchError::ScanFailed { .. } => ErrorSeverity::Medium,
            BatchError::IoError(_) | BatchError::SpawnError { .. } => ErrorSeverity::Critical,
            _ => ErrorSeverity::High,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            BatchError::TomlError(_) => "Check the configuration file for TOML syntax errors",
            BatchError::ConfigError { .. }
            | BatchError::MissingConfigError { .. }
            | BatchError::InvalidConfigValueError { .. } => {
                "Fix the reported option on the command line or in the config file"
            }
            BatchError::PortOverflow { .. } => "Use a lower --gs-port base value",
            BatchError::SpawnError { .. } => {
                "Make sure the runner program exists and is on PATH (see --program)"
            }
            BatchError::ScanFailed { .. } => {
                "Inspect the runner output above, then rerun with --scans limited to the failed scan"
            }
            BatchError::IoError(_) => "Check file permissions and available disk space",
            BatchError::SerializationError(_) => "Check that the report path is writable",
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            BatchError::ScanFailed { scan, .. } => {
                format!("Reconstruction of scan '{}' failed: {}", scan, self)
            }
            BatchError::SpawnError { program, .. } => {
                format!("Could not launch the single-scan runner '{}'", program)
            }
            other => other.to_string(),
        }
    }

    /// 依嚴重程度決定行程結束碼
    pub fn exit_code(&self) -> i32 {
        match self.severity() {
            ErrorSeverity::Low => 0,
            ErrorSeverity::Medium => 2,
            ErrorSeverity::High => 1,
            ErrorSeverity::Critical => 3,
        }
    }
}

pub type Result<T> = std::result::Result<T, BatchError>;
