//! Configuration loading and validation.
//!
//! The configuration document is JSON by default (`data.json`) or YAML
//! when the file extension is `.yaml` / `.yml`. Loading is synchronous:
//! it happens once, before the server starts. Any failure here is fatal
//! for startup.

use std::path::{Path, PathBuf};

use mimic_types::{Config, HttpVerb};

use crate::repository::Collection;

/// Errors that can occur when loading or encoding configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file {}: {source}", path.display())]
    Io {
        /// The file that could not be read.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse or encode JSON.
    #[error("invalid config JSON: {source}")]
    Json {
        /// The underlying JSON error.
        #[from]
        source: serde_json::Error,
    },

    /// Failed to parse or encode YAML.
    #[error("invalid config YAML: {source}")]
    Yaml {
        /// The underlying YAML error.
        #[from]
        source: serde_yml::Error,
    },

    /// The file extension maps to no supported format.
    #[error("unsupported config format `{0}` (expected .json, .yaml or .yml)")]
    UnsupportedFormat(String),

    /// The document parsed but violates a semantic rule.
    #[error("invalid route `{route}`: {reason}")]
    Invalid {
        /// Path of the offending route (or section name).
        route: String,
        /// What is wrong with it.
        reason: String,
    },
}

/// On-disk encoding of the configuration document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    /// JSON, written back pretty-printed.
    Json,
    /// YAML.
    Yaml,
}

impl ConfigFormat {
    /// Pick the format from the file extension. A missing extension is
    /// treated as JSON.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnsupportedFormat`] for any other extension.
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        match ext.as_deref() {
            None | Some("json") => Ok(Self::Json),
            Some("yaml" | "yml") => Ok(Self::Yaml),
            Some(other) => Err(ConfigError::UnsupportedFormat(other.to_owned())),
        }
    }
}

/// Load and validate the configuration at `path`.
///
/// # Errors
///
/// Returns [`ConfigError`] if the file cannot be read, does not parse, or
/// fails validation.
pub fn load(path: &Path) -> Result<Config, ConfigError> {
    let format = ConfigFormat::from_path(path)?;
    let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse(&contents, format)
}

/// Parse and validate a configuration document.
///
/// # Errors
///
/// Returns [`ConfigError`] if the text does not parse or fails validation.
pub fn parse(text: &str, format: ConfigFormat) -> Result<Config, ConfigError> {
    let config: Config = match format {
        ConfigFormat::Json => serde_json::from_str(text)?,
        ConfigFormat::Yaml => serde_yml::from_str(text)?,
    };
    validate(&config)?;
    Ok(config)
}

/// Encode a configuration document.
///
/// # Errors
///
/// Returns [`ConfigError`] if serialization fails.
pub fn render(config: &Config, format: ConfigFormat) -> Result<String, ConfigError> {
    let mut text = match format {
        ConfigFormat::Json => serde_json::to_string_pretty(config)?,
        ConfigFormat::Yaml => serde_yml::to_string(config)?,
    };
    if !text.ends_with('\n') {
        text.push('\n');
    }
    Ok(text)
}

/// Check the semantic rules serde cannot express.
///
/// # Errors
///
/// Returns [`ConfigError::Invalid`] naming the first offending route.
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    for route in &config.routes {
        let invalid = |reason: &str| ConfigError::Invalid {
            route: route.path.clone(),
            reason: reason.to_owned(),
        };

        for (verb, method) in &route.methods {
            if method.active_pagination().is_some_and(|p| p.page_size == 0) {
                return Err(invalid(&format!("{verb} pagination.pageSize must be > 0")));
            }
        }

        if route.crud {
            let get = route
                .method(HttpVerb::Get)
                .ok_or_else(|| invalid("crud routes must declare a GET method"))?;
            if get.active_mock().is_some() {
                return Err(invalid("crud routes cannot enable a GET mock"));
            }
            Collection::from_value(get.static_response.as_ref())
                .map_err(|e| invalid(&e.to_string()))?;
        }
    }

    if let Some(ws) = &config.websocket {
        for (name, event) in &ws.events {
            if event.mock.interval_millis == Some(0) {
                return Err(ConfigError::Invalid {
                    route: ws.path.clone(),
                    reason: format!("event `{name}` intervalMillis must be > 0"),
                });
            }
        }
    }

    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use std::io::Write;

    use super::*;

    const MINIMAL: &str = r#"{
        "server": { "port": 8080, "basePath": "/api" },
        "routes": [
            { "path": "/users", "methods": { "get": { "staticResponse": [] } } }
        ]
    }"#;

    #[test]
    fn format_from_extension() {
        assert_eq!(
            ConfigFormat::from_path(Path::new("data.json")).unwrap(),
            ConfigFormat::Json
        );
        assert_eq!(
            ConfigFormat::from_path(Path::new("mock.YML")).unwrap(),
            ConfigFormat::Yaml
        );
        assert_eq!(
            ConfigFormat::from_path(Path::new("mockfile")).unwrap(),
            ConfigFormat::Json
        );
        assert!(matches!(
            ConfigFormat::from_path(Path::new("mock.toml")),
            Err(ConfigError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn parse_minimal_json() {
        let config = parse(MINIMAL, ConfigFormat::Json).unwrap();
        assert_eq!(config.server.base_path, "/api");
        assert_eq!(config.routes.len(), 1);
    }

    #[test]
    fn parse_yaml() {
        let yaml = r"
server:
  port: 9000
  basePath: /v1
routes:
  - path: /items
    methods:
      get:
        mock:
          enabled: true
          repeatCount: 3
          template:
            name: '@name'
";
        let config = parse(yaml, ConfigFormat::Yaml).unwrap();
        assert_eq!(config.server.port, 9000);
        let get = config.routes[0].method(HttpVerb::Get).unwrap();
        assert_eq!(get.active_mock().unwrap().repeat_count, Some(3));
    }

    #[test]
    fn malformed_json_fails() {
        assert!(matches!(
            parse("{ not json", ConfigFormat::Json),
            Err(ConfigError::Json { .. })
        ));
    }

    #[test]
    fn zero_page_size_is_invalid() {
        let json = r#"{
            "server": {},
            "routes": [{ "path": "/a", "methods": { "get": {
                "pagination": { "enabled": true, "pageSize": 0 }
            } } }]
        }"#;
        let err = parse(json, ConfigFormat::Json).unwrap_err();
        assert!(err.to_string().contains("pageSize"));
    }

    #[test]
    fn crud_route_rules() {
        let mocked = r#"{
            "server": {},
            "routes": [{ "path": "/users", "crud": true, "methods": { "get": {
                "mock": { "enabled": true, "template": { "a": 1 } }
            } } }]
        }"#;
        assert!(matches!(
            parse(mocked, ConfigFormat::Json),
            Err(ConfigError::Invalid { .. })
        ));

        let scalar = r#"{
            "server": {},
            "routes": [{ "path": "/users", "crud": true, "methods": { "get": {
                "staticResponse": 5
            } } }]
        }"#;
        assert!(parse(scalar, ConfigFormat::Json).is_err());

        let missing_get = r#"{
            "server": {},
            "routes": [{ "path": "/users", "crud": true, "methods": { "post": {} } }]
        }"#;
        assert!(parse(missing_get, ConfigFormat::Json).is_err());
    }

    #[test]
    fn zero_interval_is_invalid() {
        let json = r#"{
            "server": {},
            "websocket": { "enabled": true, "path": "/ws", "events": {
                "tick": { "mock": { "enabled": true, "template": {}, "intervalMillis": 0 } }
            } }
        }"#;
        assert!(parse(json, ConfigFormat::Json).is_err());
    }

    #[test]
    fn load_reads_file() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        file.write_all(MINIMAL.as_bytes()).unwrap();
        let config = load(file.path()).unwrap();
        assert_eq!(config.routes[0].path, "/users");
    }

    #[test]
    fn load_missing_file_is_io_error() {
        let err = load(Path::new("/nonexistent/mimic/data.json")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn bundled_sample_is_valid() {
        let config = parse(include_str!("../../../data.json"), ConfigFormat::Json).unwrap();
        assert!(config.routes.iter().any(|r| r.crud));
        assert!(config.websocket.is_some_and(|ws| ws.enabled));
    }

    #[test]
    fn render_round_trips() {
        let config = parse(MINIMAL, ConfigFormat::Json).unwrap();
        for format in [ConfigFormat::Json, ConfigFormat::Yaml] {
            let text = render(&config, format).unwrap();
            assert_eq!(parse(&text, format).unwrap(), config);
        }
    }
}
