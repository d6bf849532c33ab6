use thiserror::Error;

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("io error: {0}")]
    Io(String),
    #[error("invalid settings: {0}")]
    Invalid(String),
    #[error("unsupported settings path: {0}")]
    UnsupportedPath(String),
    #[error("invalid value: {0}")]
    InvalidValue(String),
}

#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("schema compile: {0}")]
    Compile(String),
}
