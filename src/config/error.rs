//! Configuration error types.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error when reading `{0}`")]
    Io(PathBuf, #[source] std::io::Error),

    #[error("Config file parsing error")]
    Toml(#[from] toml::de::Error),

    #[error("Config validation error: {0}")]
    Validation(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Error, ErrorKind};

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::Io(
            PathBuf::from("folio.toml"),
            Error::new(ErrorKind::PermissionDenied, "denied"),
        );
        assert!(format!("{err}").contains("folio.toml"));

        let err = ConfigError::Validation("[build.languages] must not be empty".into());
        assert!(format!("{err}").contains("[build.languages]"));
    }
}
