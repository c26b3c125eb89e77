//! Configuration loading errors.

/// Errors produced while loading or validating a `veril.toml` file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("cannot read configuration: {0}")]
    IoError(#[from] std::io::Error),
    /// The configuration file is not valid TOML or has wrong field types.
    #[error("cannot parse configuration: {0}")]
    ParseError(String),
    /// A required field is missing or empty.
    #[error("missing required field `{0}`")]
    MissingField(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_messages() {
        let err = ConfigError::MissingField("project.name".to_string());
        assert_eq!(format!("{err}"), "missing required field `project.name`");

        let err = ConfigError::ParseError("expected table".to_string());
        assert!(format!("{err}").contains("expected table"));
    }
}
