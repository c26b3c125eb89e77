//! Configuration file loading and validation.

use crate::error::ConfigError;
use crate::types::CompileConfig;
use std::path::Path;

/// Loads and validates a `veril.toml` configuration from a project directory.
pub fn load_config(project_dir: &Path) -> Result<CompileConfig, ConfigError> {
    let config_path = project_dir.join("veril.toml");
    let content = std::fs::read_to_string(&config_path)?;
    load_config_from_str(&content)
}

/// Parses and validates a `veril.toml` configuration from a string.
///
/// Useful for testing without filesystem dependencies.
pub fn load_config_from_str(content: &str) -> Result<CompileConfig, ConfigError> {
    let config: CompileConfig =
        toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
    validate_config(&config)?;
    Ok(config)
}

/// Validates that required fields are present and consistent.
fn validate_config(config: &CompileConfig) -> Result<(), ConfigError> {
    if config.project.name.is_empty() {
        return Err(ConfigError::MissingField("project.name".to_string()));
    }
    if config.project.sources.is_empty() {
        return Err(ConfigError::MissingField("project.sources".to_string()));
    }
    if config.project.library.is_empty() {
        return Err(ConfigError::MissingField("project.library".to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn parse_minimal_config() {
        let toml = r#"
[project]
name = "blinky"
sources = ["rtl/top.sv", "rtl/counter.sv"]
"#;
        let config = load_config_from_str(toml).unwrap();
        assert_eq!(config.project.name, "blinky");
        assert_eq!(config.project.sources.len(), 2);
        assert_eq!(config.project.library, "work");
    }

    #[test]
    fn parse_full_config() {
        let toml = r#"
include_dirs = ["rtl/include", "third_party"]

[project]
name = "soc"
sources = ["rtl/top.sv"]
library = "soc_lib"
top = ["top", "tb_top"]

[defines]
SYNTHESIS = "1"
WIDTH = "8"

[options]
complain_undefined_macro = true
"#;
        let config = load_config_from_str(toml).unwrap();
        assert_eq!(config.project.library, "soc_lib");
        assert_eq!(config.project.top, vec!["top", "tb_top"]);
        assert_eq!(config.defines["SYNTHESIS"], "1");
        assert_eq!(
            config.include_dirs,
            vec![PathBuf::from("rtl/include"), PathBuf::from("third_party")]
        );
        assert!(config.options.complain_undefined_macro);
    }

    #[test]
    fn missing_name_errors() {
        let toml = r#"
[project]
name = ""
sources = ["a.sv"]
"#;
        let err = load_config_from_str(toml).unwrap_err();
        assert!(matches!(err, ConfigError::MissingField(_)));
    }

    #[test]
    fn empty_sources_errors() {
        let toml = r#"
[project]
name = "test"
sources = []
"#;
        let err = load_config_from_str(toml).unwrap_err();
        assert!(matches!(err, ConfigError::MissingField(_)));
    }

    #[test]
    fn invalid_toml_errors() {
        let err = load_config_from_str("this is not valid toml {{{}}}").unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }

    #[test]
    fn io_error_from_nonexistent_dir() {
        let err = load_config(Path::new("/nonexistent/dir")).unwrap_err();
        assert!(matches!(err, ConfigError::IoError(_)));
    }

    #[test]
    fn load_from_project_dir() {
        let tmp = tempfile::TempDir::new().unwrap();
        std::fs::write(
            tmp.path().join("veril.toml"),
            "[project]\nname = \"t\"\nsources = [\"top.sv\"]\n",
        )
        .unwrap();
        let config = load_config(tmp.path()).unwrap();
        assert_eq!(config.project.name, "t");
    }
}
