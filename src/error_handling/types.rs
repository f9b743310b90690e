use std::fmt;

use uuid::Uuid;

#[derive(Debug)]
pub enum ConfigError {
    IoError(std::io::Error),
    TomlError(String),
    BadIPFormatting(String),
    BadPort(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::IoError(e) => write!(f, "IO error: {}", e),
            ConfigError::TomlError(e) => write!(f, "TOML parsing error: {}", e),
            ConfigError::BadIPFormatting(e) => write!(f, "IP formatting error: {}", e),
            ConfigError::BadPort(e) => write!(f, "Port error: {}", e),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<std::io::Error> for ConfigError {
    fn from(err: std::io::Error) -> Self {
        ConfigError::IoError(err)
    }
}

#[derive(Debug, PartialEq)]
pub enum StorageError {
    ConnectionFailed,
    WriteFailed,
    ReadFailed,
    Serialization(String),
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageError::ConnectionFailed => write!(f, "Storage connection failed"),
            StorageError::WriteFailed => write!(f, "Storage write failed"),
            StorageError::ReadFailed => write!(f, "Storage read failed"),
            StorageError::Serialization(e) => write!(f, "Storage serialization failed: {}", e),
        }
    }
}

impl std::error::Error for StorageError {}

#[derive(Debug, PartialEq)]
pub enum AuthError {
    InvalidCredentials,
    NotLoggedIn,
    Forbidden,
    StorageError(StorageError),
}

impl fmt::Display for AuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthError::InvalidCredentials => write!(f, "Invalid credentials"),
            AuthError::NotLoggedIn => write!(f, "Not logged in"),
            AuthError::Forbidden => write!(f, "Not allowed for the current role"),
            AuthError::StorageError(e) => write!(f, "Storage error: {}", e),
        }
    }
}

impl std::error::Error for AuthError {}

impl From<StorageError> for AuthError {
    fn from(err: StorageError) -> Self {
        AuthError::StorageError(err)
    }
}

#[derive(Debug, PartialEq)]
pub enum ValidationError {
    MissingFields(Vec<&'static str>),
    InvalidField { field: &'static str, reason: String },
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::MissingFields(fields) => {
                write!(f, "Please fill all required fields: {}", fields.join(", "))
            }
            ValidationError::InvalidField { field, reason } => {
                write!(f, "Invalid value for {}: {}", field, reason)
            }
        }
    }
}

impl std::error::Error for ValidationError {}

#[derive(Debug)]
pub enum ClinicError {
    Storage(StorageError),
    Auth(AuthError),
    Validation(ValidationError),
    PatientNotFound(Uuid),
    MissingEmail,
    NoRecords(Uuid),
}

impl fmt::Display for ClinicError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClinicError::Storage(e) => write!(f, "Storage error: {}", e),
            ClinicError::Auth(e) => write!(f, "{}", e),
            ClinicError::Validation(e) => write!(f, "{}", e),
            ClinicError::PatientNotFound(id) => write!(f, "Patient {} not found", id),
            ClinicError::MissingEmail => write!(f, "Patient has no email address"),
            ClinicError::NoRecords(id) => write!(f, "No medical record for patient {}", id),
        }
    }
}

impl std::error::Error for ClinicError {}

impl From<StorageError> for ClinicError {
    fn from(err: StorageError) -> Self {
        ClinicError::Storage(err)
    }
}

impl From<AuthError> for ClinicError {
    fn from(err: AuthError) -> Self {
        ClinicError::Auth(err)
    }
}

impl From<ValidationError> for ClinicError {
    fn from(err: ValidationError) -> Self {
        ClinicError::Validation(err)
    }
}

#[derive(Debug)]
pub enum WebError {
    BindFailed(String),
}

impl fmt::Display for WebError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WebError::BindFailed(e) => write!(f, "Web server bind failed: {}", e),
        }
    }
}

impl std::error::Error for WebError {}

#[derive(Debug)]
pub enum ControllerError {
    ConfigurationError(ConfigError),
    StorageError(StorageError),
    WebError(WebError),
    InitializationFailed(String),
}

impl fmt::Display for ControllerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ControllerError::ConfigurationError(e) => write!(f, "Configuration error: {}", e),
            ControllerError::StorageError(e) => write!(f, "Storage error: {}", e),
            ControllerError::WebError(e) => write!(f, "Web error: {}", e),
            ControllerError::InitializationFailed(e) => write!(f, "Initialization failed: {}", e),
        }
    }
}

impl std::error::Error for ControllerError {}

impl From<ConfigError> for ControllerError {
    fn from(err: ConfigError) -> Self {
        ControllerError::ConfigurationError(err)
    }
}

impl From<StorageError> for ControllerError {
    fn from(err: StorageError) -> Self {
        ControllerError::StorageError(err)
    }
}

impl From<WebError> for ControllerError {
    fn from(err: WebError) -> Self {
        ControllerError::WebError(err)
    }
}
