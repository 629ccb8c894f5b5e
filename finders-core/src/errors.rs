use thiserror::Error;

/// Result type used across the finders crates.
pub type Result<T> = std::result::Result<T, FinderError>;

/// Canonical error representation shared by the finders crates.
///
/// Authorization denials and malformed filter values never show up here:
/// finders turn those into empty or unfiltered relations. What remains are
/// infrastructure failures, which callers receive unchanged.
#[derive(Debug, Error)]
pub enum FinderError {
    #[error("data store error: {0}")]
    Store(#[from] sqlx::Error),

    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("configuration error: {0}")]
    ConfigError(String),

    #[error("logging setup failed: {0}")]
    Logging(String),
}

/// Dedicated configuration error used by the configuration module.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for environment variable {key}: {value}")]
    InvalidValue { key: String, value: String },
}

impl From<ConfigError> for FinderError {
    fn from(value: ConfigError) -> Self {
        FinderError::ConfigError(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_errors_convert_into_finder_errors() {
        let err: FinderError = ConfigError::MissingEnvVar("DATABASE_URL".into()).into();
        assert!(matches!(err, FinderError::ConfigError(_)));
        assert!(err.to_string().contains("DATABASE_URL"));
    }

    #[test]
    fn store_errors_keep_their_source() {
        let err: FinderError = sqlx::Error::RowNotFound.into();
        assert!(matches!(err, FinderError::Store(sqlx::Error::RowNotFound)));
    }
}
