//! Settings parser for loading and merging configuration sources.
//!
//! Settings come from an optional YAML file, then environment variables
//! (optionally seeded from a `.env` file) override individual fields.

use crate::error::{ConfigError, HalldyllError, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use super::settings::Settings;

/// Environment variable overriding the GraphQL endpoint.
pub const ENDPOINT_ENV: &str = "RUNPOD_API_URL";

/// Environment variable overriding the request timeout.
pub const TIMEOUT_ENV: &str = "HALLDYLL_TIMEOUT_SECS";

/// Environment variable overriding the stored key location.
pub const CREDENTIALS_PATH_ENV: &str = "HALLDYLL_CREDENTIALS_PATH";

/// Settings parser.
#[derive(Debug, Default)]
pub struct ConfigParser {
    /// Base path for resolving the `.env` file.
    base_path: Option<PathBuf>,
}

impl ConfigParser {
    /// Creates a new settings parser.
    #[must_use]
    pub const fn new() -> Self {
        Self { base_path: None }
    }

    /// Sets the base path for resolving relative paths.
    #[must_use]
    pub fn with_base_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.base_path = Some(path.into());
        self
    }

    /// Loads settings from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_file(&self, path: impl AsRef<Path>) -> Result<Settings> {
        let path = path.as_ref();
        info!("Loading settings from: {}", path.display());

        if !path.exists() {
            return Err(HalldyllError::Config(ConfigError::FileNotFound {
                path: path.to_path_buf(),
            }));
        }

        let content = std::fs::read_to_string(path).map_err(|e| {
            HalldyllError::Config(ConfigError::ParseError {
                message: format!("Failed to read file: {e}"),
                location: Some(path.display().to_string()),
            })
        })?;

        self.parse_yaml(&content, Some(path))
    }

    /// Parses settings from a YAML string.
    ///
    /// An empty document yields the default settings.
    ///
    /// # Errors
    ///
    /// Returns an error if the YAML is invalid.
    pub fn parse_yaml(&self, content: &str, source: Option<&Path>) -> Result<Settings> {
        debug!("Parsing YAML settings");

        if content.trim().is_empty() {
            return Ok(Settings::default());
        }

        serde_yaml::from_str(content).map_err(|e| {
            let location = source.map(|p| p.display().to_string());
            HalldyllError::Config(ConfigError::ParseError {
                message: format!("YAML parse error: {e}"),
                location,
            })
        })
    }

    /// Resolves the effective settings.
    ///
    /// Uses `path` when given, otherwise searches for a settings file from
    /// the current directory upwards and falls back to defaults when none
    /// exists. Environment overrides are applied last.
    ///
    /// # Errors
    ///
    /// Returns an error if an explicit or discovered file cannot be parsed.
    pub fn resolve(&self, path: Option<&Path>) -> Result<Settings> {
        let mut settings = match path {
            Some(path) => self.load_file(path)?,
            None => match find_config_file(std::env::current_dir()?) {
                Ok(found) => self.load_file(found)?,
                Err(_) => {
                    debug!("No settings file found, using defaults");
                    Settings::default()
                }
            },
        };

        Self::apply_env_overrides(&mut settings, |name| std::env::var(name).ok());
        Ok(settings)
    }

    /// Applies environment variable overrides to the settings.
    ///
    /// `lookup` resolves a variable name to its value.
    pub fn apply_env_overrides(settings: &mut Settings, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(endpoint) = lookup(ENDPOINT_ENV).filter(|v| !v.is_empty()) {
            debug!("Overriding api.endpoint from environment");
            settings.api.endpoint = endpoint;
        }

        if let Some(raw) = lookup(TIMEOUT_ENV) {
            match raw.trim().parse::<u64>() {
                Ok(timeout) => {
                    debug!("Overriding api.timeout_secs from environment");
                    settings.api.timeout_secs = timeout;
                }
                Err(e) => warn!("Ignoring {TIMEOUT_ENV}='{raw}': {e}"),
            }
        }

        if let Some(path) = lookup(CREDENTIALS_PATH_ENV).filter(|v| !v.is_empty()) {
            debug!("Overriding credentials.path from environment");
            settings.credentials.path = Some(PathBuf::from(path));
        }
    }

    /// Loads the .env file if present.
    ///
    /// # Errors
    ///
    /// Returns an error if the .env file exists but cannot be loaded.
    pub fn load_dotenv(&self) -> Result<()> {
        let env_path = self
            .base_path
            .as_ref()
            .map_or_else(|| PathBuf::from(".env"), |p| p.join(".env"));

        if env_path.exists() {
            info!("Loading environment from: {}", env_path.display());
            dotenvy::from_path(&env_path).map_err(|e| {
                HalldyllError::Config(ConfigError::ParseError {
                    message: format!("Failed to load .env file: {e}"),
                    location: Some(env_path.display().to_string()),
                })
            })?;
        } else {
            debug!(".env file not found at: {}", env_path.display());
        }

        Ok(())
    }

}

/// Default settings file names to search for.
pub const DEFAULT_CONFIG_FILES: &[&str] = &["halldyll.pods.yaml", "halldyll.pods.yml"];

/// Finds the settings file in the given directory or its parents.
///
/// A relative `start_dir` is resolved against the current directory first.
///
/// # Errors
///
/// Returns an error if no settings file is found or the current directory
/// cannot be determined.
pub fn find_config_file(start_dir: impl AsRef<Path>) -> Result<PathBuf> {
    let start = start_dir.as_ref();
    let mut current = std::path::absolute(start)?;

    loop {
        for filename in DEFAULT_CONFIG_FILES {
            let config_path = current.join(filename);
            if config_path.exists() {
                info!("Found settings file: {}", config_path.display());
                return Ok(config_path);
            }
        }

        if !current.pop() {
            break;
        }
    }

    Err(HalldyllError::Config(ConfigError::FileNotFound {
        path: start.join(DEFAULT_CONFIG_FILES[0]),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::settings::{DEFAULT_ENDPOINT, DEFAULT_TIMEOUT_SECS};
    use std::collections::HashMap;
    use tempfile::TempDir;

    #[test]
    fn test_parse_empty_document() {
        let settings = ConfigParser::new()
            .parse_yaml("", None)
            .expect("empty document should parse");
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn test_parse_partial_settings() {
        let yaml = r"
api:
  timeout_secs: 10
";
        let settings = ConfigParser::new()
            .parse_yaml(yaml, None)
            .expect("partial settings should parse");
        assert_eq!(settings.api.endpoint, DEFAULT_ENDPOINT);
        assert_eq!(settings.api.timeout_secs, 10);
    }

    #[test]
    fn test_parse_full_settings() {
        let yaml = r#"
api:
  endpoint: "http://localhost:4000/graphql"
  timeout_secs: 5
credentials:
  path: /tmp/halldyll/key
"#;
        let settings = ConfigParser::new()
            .parse_yaml(yaml, None)
            .expect("full settings should parse");
        assert_eq!(settings.api.endpoint, "http://localhost:4000/graphql");
        assert_eq!(settings.credentials.path, Some(PathBuf::from("/tmp/halldyll/key")));
    }

    #[test]
    fn test_parse_invalid_yaml() {
        let result = ConfigParser::new().parse_yaml("api: [unclosed", None);
        assert!(result.is_err());
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = HashMap::from([
            (ENDPOINT_ENV, "http://127.0.0.1:9999/graphql"),
            (TIMEOUT_ENV, "12"),
            (CREDENTIALS_PATH_ENV, "/tmp/key"),
        ]);

        let mut settings = Settings::default();
        ConfigParser::apply_env_overrides(&mut settings, |name| {
            env.get(name).map(|v| (*v).to_string())
        });

        assert_eq!(settings.api.endpoint, "http://127.0.0.1:9999/graphql");
        assert_eq!(settings.api.timeout_secs, 12);
        assert_eq!(settings.credentials.path, Some(PathBuf::from("/tmp/key")));
    }

    #[test]
    fn test_invalid_timeout_override_is_ignored() {
        let mut settings = Settings::default();
        ConfigParser::apply_env_overrides(&mut settings, |name| {
            (name == TIMEOUT_ENV).then(|| String::from("soon"))
        });
        assert_eq!(settings.api.timeout_secs, DEFAULT_TIMEOUT_SECS);
    }

    #[test]
    fn test_find_config_file_in_parent() {
        let temp = TempDir::new().expect("Failed to create temp dir");
        let nested = temp.path().join("a").join("b");
        std::fs::create_dir_all(&nested).expect("create dirs");
        std::fs::write(temp.path().join("halldyll.pods.yaml"), "api: {}\n").expect("write");

        let found = find_config_file(&nested).expect("file should be found");
        assert_eq!(found, temp.path().join("halldyll.pods.yaml"));
    }

    #[test]
    fn test_resolve_searches_parents_of_current_dir() {
        let temp = TempDir::new().expect("Failed to create temp dir");
        let nested = temp.path().join("a").join("b");
        std::fs::create_dir_all(&nested).expect("create dirs");
        std::fs::write(
            temp.path().join("halldyll.pods.yaml"),
            "api:\n  timeout_secs: 7\n",
        )
        .expect("write");

        let previous = std::env::current_dir().expect("current dir");
        std::env::set_current_dir(&nested).expect("enter nested dir");
        let resolved = ConfigParser::new().resolve(None);
        std::env::set_current_dir(previous).expect("restore current dir");

        let settings = resolved.expect("settings should resolve");
        assert_eq!(settings.api.timeout_secs, 7);
    }

    #[test]
    fn test_load_file_missing() {
        let temp = TempDir::new().expect("Failed to create temp dir");
        let result = ConfigParser::new().load_file(temp.path().join("nope.yaml"));
        assert!(matches!(
            result,
            Err(HalldyllError::Config(ConfigError::FileNotFound { .. }))
        ));
    }
}
