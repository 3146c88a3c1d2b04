// Widget configuration: built-in defaults, merged with config/widget.toml and
// DAMSOLE_CHAT_* environment overrides.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use reqwest::Url;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("validation error for field `{field}`: {message}")]
    ValidationError { field: String, message: String },

    #[error("failed to initialize config from defaults: {message}")]
    DefaultsCopyError { message: String },
}

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

pub const DEFAULT_ENDPOINT: &str = "http://127.0.0.1:5000/chat";
pub const DEFAULT_AUTO_START_PAYLOAD: &str = "__damsole_auto_start__";
pub const DEFAULT_INITIAL_MESSAGE: &str = "Hello! How can I help you today?";
pub const DEFAULT_TITLE: &str = "Damsole AI Assistant";
pub const DEFAULT_SUGGESTION_TRIGGER: &str = "I'd be happy to help! You can ask me about:";
pub const DEFAULT_COMPOSER_MAX_LINES: u16 = 5;

pub const DEFAULT_SUGGESTIONS: [&str; 5] = [
    "I want to create website",
    "I want to create logo",
    "I want to create app",
    "I want marketing services",
    "Our services",
];

/// Environment variable overriding `endpoint`.
pub const ENV_ENDPOINT: &str = "DAMSOLE_CHAT_ENDPOINT";
/// Environment variable overriding `credentials`.
pub const ENV_CREDENTIALS: &str = "DAMSOLE_CHAT_CREDENTIALS";

const CONFIG_FILE: &str = "widget.toml";

// ---------------------------------------------------------------------------
// Credentials mode
// ---------------------------------------------------------------------------

/// Whether cookies travel with chat requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Credentials {
    /// Never store or send cookies.
    Omit,
    /// Send cookies, but only to the endpoint's own origin.
    #[default]
    SameOrigin,
    /// Send cookies wherever the request (or a redirect) goes.
    Include,
}

impl FromStr for Credentials {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "omit" => Ok(Credentials::Omit),
            "same-origin" => Ok(Credentials::SameOrigin),
            "include" => Ok(Credentials::Include),
            other => Err(format!(
                "expected one of \"omit\", \"same-origin\", \"include\", got {other:?}"
            )),
        }
    }
}

// ---------------------------------------------------------------------------
// WidgetConfig
// ---------------------------------------------------------------------------

/// Fully resolved widget configuration. Immutable once the widget is built.
#[derive(Debug, Clone, PartialEq)]
pub struct WidgetConfig {
    pub endpoint: Url,
    pub credentials: Credentials,
    /// Payload sent silently the first time the panel opens.
    pub auto_start_payload: String,
    /// Greeting rendered as the first bot message when the widget mounts.
    pub initial_message: String,
    pub title: String,
    /// Canned replies offered as suggestion chips.
    pub suggestions: Vec<String>,
    /// Reply phrase that enables chips when the backend sends no explicit
    /// `showSuggestions` flag. `None` disables the match.
    pub suggestion_trigger: Option<String>,
    pub composer_max_lines: u16,
}

impl Default for WidgetConfig {
    fn default() -> Self {
        WidgetConfig {
            endpoint: Url::parse(DEFAULT_ENDPOINT).expect("default endpoint is a valid URL"),
            credentials: Credentials::default(),
            auto_start_payload: DEFAULT_AUTO_START_PAYLOAD.to_string(),
            initial_message: DEFAULT_INITIAL_MESSAGE.to_string(),
            title: DEFAULT_TITLE.to_string(),
            suggestions: DEFAULT_SUGGESTIONS.iter().map(|s| s.to_string()).collect(),
            suggestion_trigger: Some(DEFAULT_SUGGESTION_TRIGGER.to_string()),
            composer_max_lines: DEFAULT_COMPOSER_MAX_LINES,
        }
    }
}

/// Raw deserialization target for config/widget.toml. Every key is optional;
/// present keys replace the matching default.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigOverrides {
    pub endpoint: Option<String>,
    pub credentials: Option<Credentials>,
    pub auto_start_payload: Option<String>,
    pub initial_message: Option<String>,
    pub title: Option<String>,
    pub suggestions: Option<Vec<String>>,
    pub suggestion_trigger: Option<String>,
    pub composer_max_lines: Option<u16>,
}

impl WidgetConfig {
    /// Merge `overrides` over the built-in defaults and validate the result.
    pub fn merged(overrides: ConfigOverrides) -> Result<Self, ConfigError> {
        let defaults = WidgetConfig::default();

        let endpoint = match overrides.endpoint {
            Some(raw) => parse_endpoint(&raw)?,
            None => defaults.endpoint,
        };

        // An empty trigger phrase switches the text match off entirely.
        let suggestion_trigger = match overrides.suggestion_trigger {
            Some(phrase) if phrase.trim().is_empty() => None,
            Some(phrase) => Some(phrase),
            None => defaults.suggestion_trigger,
        };

        let config = WidgetConfig {
            endpoint,
            credentials: overrides.credentials.unwrap_or(defaults.credentials),
            auto_start_payload: overrides
                .auto_start_payload
                .unwrap_or(defaults.auto_start_payload),
            initial_message: overrides.initial_message.unwrap_or(defaults.initial_message),
            title: overrides.title.unwrap_or(defaults.title),
            suggestions: overrides.suggestions.unwrap_or(defaults.suggestions),
            suggestion_trigger,
            composer_max_lines: overrides
                .composer_max_lines
                .unwrap_or(defaults.composer_max_lines),
        };

        validate(&config)?;
        Ok(config)
    }
}

// ---------------------------------------------------------------------------
// Loading logic
// ---------------------------------------------------------------------------

/// Load configuration from `config/widget.toml` under `base_dir` (optional),
/// then apply environment overrides read through `env`.
///
/// Does not seed missing files; `load_config()` does that first.
pub fn load_config_from<F>(base_dir: &Path, env: F) -> Result<WidgetConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let path = base_dir.join("config").join(CONFIG_FILE);

    let mut overrides = if path.exists() {
        let text = read_file(&path)?;
        toml::from_str::<ConfigOverrides>(&text).map_err(|e| ConfigError::ParseError {
            path: path.clone(),
            source: e,
        })?
    } else {
        debug!("no {} found, using built-in defaults", path.display());
        ConfigOverrides::default()
    };

    apply_env(&mut overrides, env)?;
    WidgetConfig::merged(overrides)
}

/// Ensure all config files exist by copying missing ones from `defaults/`.
/// Returns the list of files that were copied. Skips `.example` files.
pub fn ensure_config_files(base_dir: &Path) -> Result<Vec<PathBuf>, ConfigError> {
    let defaults_dir = base_dir.join("defaults");
    let config_dir = base_dir.join("config");

    // Without defaults/ there is nothing to seed; the widget falls back to
    // its built-in configuration.
    if !defaults_dir.exists() {
        return Ok(vec![]);
    }

    std::fs::create_dir_all(&config_dir).map_err(|e| ConfigError::DefaultsCopyError {
        message: format!("failed to create config directory: {e}"),
    })?;

    let mut copied = Vec::new();

    let entries = std::fs::read_dir(&defaults_dir).map_err(|e| ConfigError::DefaultsCopyError {
        message: format!("failed to read defaults directory: {e}"),
    })?;

    for entry in entries {
        let entry = entry.map_err(|e| ConfigError::DefaultsCopyError {
            message: format!("failed to read defaults entry: {e}"),
        })?;
        let path = entry.path();

        if !path.is_file() {
            continue;
        }
        let Some(file_name) = path.file_name() else {
            continue;
        };
        if file_name.to_str().is_some_and(|n| n.ends_with(".example")) {
            continue;
        }
        let target = config_dir.join(file_name);

        match std::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&target)
        {
            Ok(mut dest) => {
                let content = std::fs::read(&path).map_err(|e| ConfigError::DefaultsCopyError {
                    message: format!("failed to read {}: {e}", path.display()),
                })?;
                std::io::Write::write_all(&mut dest, &content).map_err(|e| {
                    ConfigError::DefaultsCopyError {
                        message: format!("failed to write {}: {e}", target.display()),
                    }
                })?;
                copied.push(target);
            }
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {}
            Err(e) => {
                return Err(ConfigError::DefaultsCopyError {
                    message: format!("failed to create {}: {e}", target.display()),
                });
            }
        }
    }

    Ok(copied)
}

/// Convenience wrapper: seeds defaults and loads config relative to the
/// current working directory, with overrides from the process environment.
pub fn load_config() -> Result<WidgetConfig, ConfigError> {
    let cwd = std::env::current_dir().map_err(|_| ConfigError::FileNotFound {
        path: PathBuf::from("."),
    })?;
    ensure_config_files(&cwd)?;
    load_config_from(&cwd, |key| std::env::var(key).ok())
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn read_file(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
        path: path.to_path_buf(),
    })
}

fn apply_env<F>(overrides: &mut ConfigOverrides, env: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(endpoint) = env(ENV_ENDPOINT).filter(|v| !v.trim().is_empty()) {
        overrides.endpoint = Some(endpoint);
    }
    if let Some(raw) = env(ENV_CREDENTIALS).filter(|v| !v.trim().is_empty()) {
        let credentials = raw
            .parse::<Credentials>()
            .map_err(|message| ConfigError::ValidationError {
                field: ENV_CREDENTIALS.into(),
                message,
            })?;
        overrides.credentials = Some(credentials);
    }
    Ok(())
}

fn parse_endpoint(raw: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(raw.trim()).map_err(|e| ConfigError::ValidationError {
        field: "endpoint".into(),
        message: format!("not an absolute URL ({e}): {raw:?}"),
    })?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(ConfigError::ValidationError {
            field: "endpoint".into(),
            message: format!("scheme must be http or https, got {other:?}"),
        }),
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn validate(config: &WidgetConfig) -> Result<(), ConfigError> {
    let required: &[(&str, &str)] = &[
        ("auto_start_payload", &config.auto_start_payload),
        ("initial_message", &config.initial_message),
        ("title", &config.title),
    ];
    for (name, value) in required {
        if value.trim().is_empty() {
            return Err(ConfigError::ValidationError {
                field: name.to_string(),
                message: "must not be empty".into(),
            });
        }
    }

    if let Some(i) = config.suggestions.iter().position(|s| s.trim().is_empty()) {
        return Err(ConfigError::ValidationError {
            field: format!("suggestions[{i}]"),
            message: "must not be blank".into(),
        });
    }

    if config.composer_max_lines == 0 {
        return Err(ConfigError::ValidationError {
            field: "composer_max_lines".into(),
            message: "must be greater than 0".into(),
        });
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::fs;

    /// Workspace-level defaults/ directory shipped with the binary.
    fn defaults_dir() -> PathBuf {
        Path::new(env!("CARGO_MANIFEST_DIR")).join("../../defaults")
    }

    fn no_env(_: &str) -> Option<String> {
        None
    }

    fn fresh_dir(name: &str) -> PathBuf {
        let tmp = std::env::temp_dir().join(name);
        let _ = fs::remove_dir_all(&tmp);
        fs::create_dir_all(tmp.join("config")).unwrap();
        tmp
    }

    #[test]
    fn shipped_defaults_load_to_builtin_config() {
        let tmp = fresh_dir("damsole_config_shipped_defaults");
        fs::copy(
            defaults_dir().join("widget.toml"),
            tmp.join("config/widget.toml"),
        )
        .unwrap();

        let config = load_config_from(&tmp, no_env).expect("shipped defaults should load");
        assert_eq!(config, WidgetConfig::default());

        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn missing_widget_toml_uses_defaults() {
        let tmp = fresh_dir("damsole_config_missing_file");

        let config = load_config_from(&tmp, no_env).expect("should load without widget.toml");
        assert_eq!(config.endpoint.as_str(), DEFAULT_ENDPOINT);
        assert_eq!(config.credentials, Credentials::SameOrigin);
        assert_eq!(config.auto_start_payload, "__damsole_auto_start__");
        assert_eq!(config.initial_message, "Hello! How can I help you today?");
        assert_eq!(config.suggestions.len(), 5);
        assert_eq!(
            config.suggestion_trigger.as_deref(),
            Some(DEFAULT_SUGGESTION_TRIGGER)
        );

        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn file_overrides_replace_only_present_keys() {
        let tmp = fresh_dir("damsole_config_partial_override");
        fs::write(
            tmp.join("config/widget.toml"),
            r#"
endpoint = "https://chat.example.com/api/chat"
credentials = "include"
initial_message = "Hi there!"
"#,
        )
        .unwrap();

        let config = load_config_from(&tmp, no_env).unwrap();
        assert_eq!(config.endpoint.as_str(), "https://chat.example.com/api/chat");
        assert_eq!(config.credentials, Credentials::Include);
        assert_eq!(config.initial_message, "Hi there!");
        // Untouched keys keep their defaults
        assert_eq!(config.auto_start_payload, DEFAULT_AUTO_START_PAYLOAD);
        assert_eq!(config.title, DEFAULT_TITLE);

        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn env_overrides_win_over_file() {
        let tmp = fresh_dir("damsole_config_env_override");
        fs::write(
            tmp.join("config/widget.toml"),
            "endpoint = \"https://file.example.com/chat\"\ncredentials = \"include\"\n",
        )
        .unwrap();

        let env: HashMap<&str, &str> = HashMap::from([
            (ENV_ENDPOINT, "http://localhost:8080/chat"),
            (ENV_CREDENTIALS, "omit"),
        ]);
        let config =
            load_config_from(&tmp, |k| env.get(k).map(|v| v.to_string())).unwrap();
        assert_eq!(config.endpoint.as_str(), "http://localhost:8080/chat");
        assert_eq!(config.credentials, Credentials::Omit);

        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn blank_env_values_are_ignored() {
        let tmp = fresh_dir("damsole_config_blank_env");
        let config = load_config_from(&tmp, |_| Some("  ".to_string())).unwrap();
        assert_eq!(config.endpoint.as_str(), DEFAULT_ENDPOINT);
        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn rejects_unknown_credentials_from_env() {
        let tmp = fresh_dir("damsole_config_bad_env_credentials");
        let err = load_config_from(&tmp, |k| {
            (k == ENV_CREDENTIALS).then(|| "cors".to_string())
        })
        .unwrap_err();
        match &err {
            ConfigError::ValidationError { field, .. } => assert_eq!(field, ENV_CREDENTIALS),
            other => panic!("expected ValidationError, got: {other}"),
        }
        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn rejects_relative_endpoint() {
        let overrides = ConfigOverrides {
            endpoint: Some("/chat".into()),
            ..Default::default()
        };
        match WidgetConfig::merged(overrides).unwrap_err() {
            ConfigError::ValidationError { field, .. } => assert_eq!(field, "endpoint"),
            other => panic!("expected ValidationError, got: {other}"),
        }
    }

    #[test]
    fn rejects_non_http_endpoint() {
        let overrides = ConfigOverrides {
            endpoint: Some("ftp://example.com/chat".into()),
            ..Default::default()
        };
        match WidgetConfig::merged(overrides).unwrap_err() {
            ConfigError::ValidationError { field, message } => {
                assert_eq!(field, "endpoint");
                assert!(message.contains("ftp"));
            }
            other => panic!("expected ValidationError, got: {other}"),
        }
    }

    #[test]
    fn rejects_empty_auto_start_payload() {
        let overrides = ConfigOverrides {
            auto_start_payload: Some("   ".into()),
            ..Default::default()
        };
        match WidgetConfig::merged(overrides).unwrap_err() {
            ConfigError::ValidationError { field, .. } => assert_eq!(field, "auto_start_payload"),
            other => panic!("expected ValidationError, got: {other}"),
        }
    }

    #[test]
    fn rejects_blank_suggestion() {
        let overrides = ConfigOverrides {
            suggestions: Some(vec!["Pricing".into(), "".into()]),
            ..Default::default()
        };
        match WidgetConfig::merged(overrides).unwrap_err() {
            ConfigError::ValidationError { field, .. } => assert_eq!(field, "suggestions[1]"),
            other => panic!("expected ValidationError, got: {other}"),
        }
    }

    #[test]
    fn rejects_zero_composer_lines() {
        let overrides = ConfigOverrides {
            composer_max_lines: Some(0),
            ..Default::default()
        };
        assert!(matches!(
            WidgetConfig::merged(overrides),
            Err(ConfigError::ValidationError { .. })
        ));
    }

    #[test]
    fn empty_trigger_disables_text_match() {
        let overrides = ConfigOverrides {
            suggestion_trigger: Some(String::new()),
            ..Default::default()
        };
        let config = WidgetConfig::merged(overrides).unwrap();
        assert!(config.suggestion_trigger.is_none());
    }

    #[test]
    fn parse_error_for_invalid_toml() {
        let tmp = fresh_dir("damsole_config_invalid_toml");
        fs::write(tmp.join("config/widget.toml"), "this is not valid [[[ toml").unwrap();

        match load_config_from(&tmp, no_env).unwrap_err() {
            ConfigError::ParseError { path, .. } => assert!(path.ends_with("widget.toml")),
            other => panic!("expected ParseError, got: {other}"),
        }

        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn parse_error_for_unknown_key() {
        let tmp = fresh_dir("damsole_config_unknown_key");
        fs::write(tmp.join("config/widget.toml"), "endpiont = \"http://x/chat\"\n").unwrap();
        assert!(matches!(
            load_config_from(&tmp, no_env),
            Err(ConfigError::ParseError { .. })
        ));
        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn credentials_from_str() {
        assert_eq!("omit".parse::<Credentials>(), Ok(Credentials::Omit));
        assert_eq!("same-origin".parse::<Credentials>(), Ok(Credentials::SameOrigin));
        assert_eq!(" include ".parse::<Credentials>(), Ok(Credentials::Include));
        assert!("same_origin".parse::<Credentials>().is_err());
    }

    #[test]
    fn ensure_config_files_copies_missing_files() {
        let tmp = std::env::temp_dir().join("damsole_config_ensure_copies");
        let _ = fs::remove_dir_all(&tmp);

        let defaults = tmp.join("defaults");
        fs::create_dir_all(&defaults).unwrap();
        fs::copy(defaults_dir().join("widget.toml"), defaults.join("widget.toml")).unwrap();
        fs::write(defaults.join("widget.toml.example"), "# example\n").unwrap();

        assert!(!tmp.join("config").exists());

        let copied = ensure_config_files(&tmp).expect("should succeed");
        assert_eq!(copied.len(), 1);
        assert!(tmp.join("config/widget.toml").exists());
        assert!(!tmp.join("config/widget.toml.example").exists());

        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn ensure_config_files_skips_existing() {
        let tmp = std::env::temp_dir().join("damsole_config_ensure_skips");
        let _ = fs::remove_dir_all(&tmp);

        fs::create_dir_all(tmp.join("defaults")).unwrap();
        fs::create_dir_all(tmp.join("config")).unwrap();
        fs::copy(defaults_dir().join("widget.toml"), tmp.join("defaults/widget.toml")).unwrap();
        fs::write(tmp.join("config/widget.toml"), "# custom\n").unwrap();

        let copied = ensure_config_files(&tmp).expect("should succeed");
        assert!(copied.is_empty());

        let content = fs::read_to_string(tmp.join("config/widget.toml")).unwrap();
        assert_eq!(content, "# custom\n");

        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn ensure_config_files_without_defaults_is_ok() {
        let tmp = std::env::temp_dir().join("damsole_config_no_defaults");
        let _ = fs::remove_dir_all(&tmp);
        fs::create_dir_all(&tmp).unwrap();

        let copied = ensure_config_files(&tmp).expect("should succeed");
        assert!(copied.is_empty());

        let _ = fs::remove_dir_all(&tmp);
    }
}
