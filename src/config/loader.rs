//! Settings loading from disk.

use std::fs;
use std::path::Path;

use crate::config::error::ConfigurationError;
use crate::config::schema::Settings;

/// Load a flat settings map from a TOML file.
///
/// Strings are taken as-is; integers and booleans are rendered back to
/// strings so the map looks exactly like the one a host framework supplies.
pub fn load_settings(path: &Path) -> Result<Settings, ConfigurationError> {
    let content = fs::read_to_string(path)?;
    parse_settings(&content)
}

/// Parse a flat settings map from TOML text.
pub fn parse_settings(content: &str) -> Result<Settings, ConfigurationError> {
    let table: toml::Table = toml::from_str(content)?;

    table
        .into_iter()
        .map(|(key, value)| {
            let value = match value {
                toml::Value::String(s) => s,
                toml::Value::Integer(i) => i.to_string(),
                toml::Value::Boolean(b) => b.to_string(),
                _ => return Err(ConfigurationError::UnsupportedValue { key }),
            };
            Ok((key, value))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_scalars_become_strings() {
        let settings = parse_settings(
            r#"
            siteKey = "public-key"
            maxHttpConnections = 4
            apiSocketTimeout = "750"
            "#,
        )
        .unwrap();

        assert_eq!(settings.get("siteKey").map(String::as_str), Some("public-key"));
        assert_eq!(settings.get("maxHttpConnections").map(String::as_str), Some("4"));
        assert_eq!(settings.get("apiSocketTimeout").map(String::as_str), Some("750"));
    }

    #[test]
    fn test_nested_table_rejected() {
        let err = parse_settings("[pool]\nmax = 3\n").unwrap_err();
        assert!(matches!(err, ConfigurationError::UnsupportedValue { key } if key == "pool"));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "httpStatsInterval = 0").unwrap();

        let settings = load_settings(file.path()).unwrap();
        assert_eq!(settings.get("httpStatsInterval").map(String::as_str), Some("0"));
    }

    #[test]
    fn test_missing_file() {
        let err = load_settings(Path::new("/nonexistent/recaptcha.toml")).unwrap_err();
        assert!(matches!(err, ConfigurationError::Io(_)));
    }
}
