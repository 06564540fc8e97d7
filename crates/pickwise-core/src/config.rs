// Configuration loading and parsing (league.toml, strategy.toml, credentials.toml).

use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::draft::slot::Slot;

/// Environment variable holding the completion API key.
pub const API_KEY_ENV: &str = "OPENAI_API_KEY";
/// Environment variable holding the completion organization identifier.
pub const ORGANIZATION_ENV: &str = "OPENAI_ORGANIZATION";

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
// Top-level assembled Config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Config {
    pub league: LeagueConfig,
    pub advisor: AdvisorConfig,
    pub llm: LlmConfig,
    pub credentials: CredentialsConfig,
    pub data_sources: Vec<DataSource>,
}

// ---------------------------------------------------------------------------
// league.toml structs
// ---------------------------------------------------------------------------

/// Wrapper for the top-level `[league]` table in league.toml.
#[derive(Debug, Clone, Deserialize)]
struct LeagueFile {
    league: LeagueConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LeagueConfig {
    pub name: String,
    pub num_teams: usize,
    /// Slot name -> capacity, e.g. `QB = 1`, `Bench = 7`.
    pub roster: HashMap<String, usize>,
}

// ---------------------------------------------------------------------------
// strategy.toml structs
// ---------------------------------------------------------------------------

/// Raw deserialization target for the entire strategy.toml file.
#[derive(Debug, Clone, Deserialize)]
struct StrategyFile {
    advisor: AdvisorConfig,
    llm: LlmConfig,
    data: DataSection,
}

#[derive(Debug, Clone, Deserialize)]
struct DataSection {
    sources: Vec<DataSource>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AdvisorConfig {
    /// Maximum number of candidates listed in each advisory prompt.
    pub candidate_limit: usize,
    /// Earlier advisory rounds replayed to the model; 0 disables history.
    #[serde(default = "default_history_rounds")]
    pub history_rounds: usize,
}

fn default_history_rounds() -> usize {
    3
}

#[derive(Debug, Clone, Deserialize)]
pub struct LlmConfig {
    pub model: String,
    pub api_base: String,
    #[serde(default)]
    pub max_tokens: Option<u32>,
    #[serde(default)]
    pub temperature: Option<f32>,
}

/// One projection provider: a display name and a CSV path.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct DataSource {
    pub name: String,
    pub path: String,
}

// ---------------------------------------------------------------------------
// credentials.toml structs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize, Default)]
pub struct CredentialsConfig {
    pub openai_api_key: Option<String>,
    pub openai_organization: Option<String>,
}

impl CredentialsConfig {
    /// Overlay values taken from the process environment. Non-empty
    /// environment values win over the credentials file.
    pub fn with_overrides(mut self, api_key: Option<String>, organization: Option<String>) -> Self {
        if let Some(key) = api_key.filter(|k| !k.trim().is_empty()) {
            self.openai_api_key = Some(key);
        }
        if let Some(org) = organization.filter(|o| !o.trim().is_empty()) {
            self.openai_organization = Some(org);
        }
        self
    }
}

// ---------------------------------------------------------------------------
// Loading logic
// ---------------------------------------------------------------------------

/// Load and validate configuration from `config/league.toml`,
/// `config/strategy.toml`, and (optionally) `config/credentials.toml`,
/// all relative to the given `base_dir`.
///
/// This is the lower-level loading primitive: it neither copies defaults nor
/// reads the environment. Prefer `load_config()`.
pub fn load_config_from(base_dir: &Path) -> Result<Config, ConfigError> {
    let config_dir = base_dir.join("config");

    // --- league.toml (required) ---
    let league_path = config_dir.join("league.toml");
    let league_text = read_file(&league_path)?;
    let league_file: LeagueFile =
        toml::from_str(&league_text).map_err(|e| ConfigError::ParseError {
            path: league_path.clone(),
            source: e,
        })?;

    // --- strategy.toml (required) ---
    let strategy_path = config_dir.join("strategy.toml");
    let strategy_text = read_file(&strategy_path)?;
    let strategy_file: StrategyFile =
        toml::from_str(&strategy_text).map_err(|e| ConfigError::ParseError {
            path: strategy_path.clone(),
            source: e,
        })?;

    // --- credentials.toml (optional) ---
    let credentials_path = config_dir.join("credentials.toml");
    let credentials = if credentials_path.exists() {
        let cred_text = read_file(&credentials_path)?;
        toml::from_str(&cred_text).map_err(|e| ConfigError::ParseError {
            path: credentials_path.clone(),
            source: e,
        })?
    } else {
        CredentialsConfig::default()
    };

    let config = Config {
        league: league_file.league,
        advisor: strategy_file.advisor,
        llm: strategy_file.llm,
        credentials,
        data_sources: strategy_file.data.sources,
    };

    validate(&config)?;

    Ok(config)
}

/// Ensure all config files exist by copying missing ones from `defaults/`.
/// Returns the list of files that were copied. Skips `.example` files.
pub fn ensure_config_files(base_dir: &Path) -> Result<Vec<PathBuf>, ConfigError> {
    let defaults_dir = base_dir.join("defaults");
    let config_dir = base_dir.join("config");

    if !defaults_dir.exists() {
        if !config_dir.exists() {
            return Err(ConfigError::DefaultsCopyError {
                message: format!(
                    "neither defaults/ nor config/ directory found in {}; \
                     run from the project root or ensure defaults/ is present",
                    base_dir.display()
                ),
            });
        }
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

/// Convenience wrapper: loads config relative to the current working
/// directory, copying defaults first and overlaying credentials from the
/// environment (`OPENAI_API_KEY`, `OPENAI_ORGANIZATION`).
pub fn load_config() -> Result<Config, ConfigError> {
    let cwd = std::env::current_dir().map_err(|_| ConfigError::FileNotFound {
        path: PathBuf::from("."),
    })?;
    ensure_config_files(&cwd)?;
    let mut config = load_config_from(&cwd)?;
    config.credentials = config.credentials.with_overrides(
        std::env::var(API_KEY_ENV).ok(),
        std::env::var(ORGANIZATION_ENV).ok(),
    );
    Ok(config)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn read_file(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
        path: path.to_path_buf(),
    })
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn validate(config: &Config) -> Result<(), ConfigError> {
    if config.league.num_teams == 0 {
        return Err(ConfigError::ValidationError {
            field: "league.num_teams".into(),
            message: "must be greater than 0".into(),
        });
    }

    // Every roster key must name a slot we know how to fill
    for slot_str in config.league.roster.keys() {
        if Slot::from_str_pos(slot_str).is_none() {
            return Err(ConfigError::ValidationError {
                field: format!("league.roster.{slot_str}"),
                message: "unknown roster slot".into(),
            });
        }
    }

    if !config
        .league
        .roster
        .keys()
        .any(|k| Slot::from_str_pos(k) == Some(Slot::Bench))
    {
        return Err(ConfigError::ValidationError {
            field: "league.roster".into(),
            message: "must define a Bench slot".into(),
        });
    }

    if config.advisor.candidate_limit == 0 {
        return Err(ConfigError::ValidationError {
            field: "advisor.candidate_limit".into(),
            message: "must be > 0".into(),
        });
    }

    if config.llm.model.trim().is_empty() {
        return Err(ConfigError::ValidationError {
            field: "llm.model".into(),
            message: "must not be empty".into(),
        });
    }

    if config.data_sources.is_empty() {
        return Err(ConfigError::ValidationError {
            field: "data.sources".into(),
            message: "at least one projection source is required".into(),
        });
    }

    for (i, source) in config.data_sources.iter().enumerate() {
        if source.path.trim().is_empty() {
            return Err(ConfigError::ValidationError {
                field: format!("data.sources[{i}].path"),
                message: "must not be empty".into(),
            });
        }
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    /// Workspace root, where `defaults/` lives.
    fn project_root() -> PathBuf {
        Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("../..")
            .canonicalize()
            .expect("workspace root should exist")
    }

    /// Fresh temp dir with `config/` holding copies of the default files.
    fn temp_config_dir(name: &str) -> PathBuf {
        let tmp = std::env::temp_dir().join(name);
        let _ = fs::remove_dir_all(&tmp);
        fs::create_dir_all(tmp.join("config")).unwrap();
        let root = project_root();
        fs::copy(root.join("defaults/league.toml"), tmp.join("config/league.toml")).unwrap();
        fs::copy(root.join("defaults/strategy.toml"), tmp.join("config/strategy.toml")).unwrap();
        tmp
    }

    fn expect_validation_field(err: ConfigError, expected: &str) {
        match &err {
            ConfigError::ValidationError { field, .. } => assert_eq!(field, expected),
            other => panic!("expected ValidationError, got: {other}"),
        }
    }

    #[test]
    fn load_valid_config_from_default_files() {
        let tmp = temp_config_dir("pickwise_config_defaults");
        let config = load_config_from(&tmp).expect("should load valid config");

        assert_eq!(config.league.num_teams, 12);
        assert_eq!(config.league.roster.get("QB"), Some(&1));
        assert_eq!(config.league.roster.get("WR"), Some(&3));
        assert_eq!(config.league.roster.get("RB"), Some(&2));
        assert_eq!(config.league.roster.get("TE"), Some(&1));
        assert_eq!(config.league.roster.get("Kicker"), Some(&1));
        assert_eq!(config.league.roster.get("Defense"), Some(&1));
        assert_eq!(config.league.roster.get("Bench"), Some(&7));

        assert_eq!(config.advisor.candidate_limit, 40);
        assert_eq!(config.advisor.history_rounds, 3);
        assert_eq!(config.llm.model, "gpt-4");
        assert_eq!(config.llm.api_base, "https://api.openai.com/v1");
        assert_eq!(config.data_sources.len(), 4);
        assert_eq!(config.data_sources[0].name, "espn");
        assert!(config.credentials.openai_api_key.is_none());

        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn credentials_toml_is_read() {
        let tmp = temp_config_dir("pickwise_config_with_creds");
        fs::write(
            tmp.join("config/credentials.toml"),
            "openai_api_key = \"sk-test\"\nopenai_organization = \"org-test\"\n",
        )
        .unwrap();

        let config = load_config_from(&tmp).expect("should load with credentials.toml");
        assert_eq!(config.credentials.openai_api_key.as_deref(), Some("sk-test"));
        assert_eq!(config.credentials.openai_organization.as_deref(), Some("org-test"));

        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn environment_overrides_win_when_non_empty() {
        let creds = CredentialsConfig {
            openai_api_key: Some("from-file".into()),
            openai_organization: Some("org-file".into()),
        };
        let merged = creds.with_overrides(Some("from-env".into()), Some("  ".into()));
        assert_eq!(merged.openai_api_key.as_deref(), Some("from-env"));
        assert_eq!(merged.openai_organization.as_deref(), Some("org-file"));

        let untouched = CredentialsConfig::default().with_overrides(None, None);
        assert!(untouched.openai_api_key.is_none());
    }

    #[test]
    fn rejects_num_teams_zero() {
        let tmp = temp_config_dir("pickwise_config_num_teams_zero");
        let league = fs::read_to_string(tmp.join("config/league.toml")).unwrap();
        fs::write(
            tmp.join("config/league.toml"),
            league.replace("num_teams = 12", "num_teams = 0"),
        )
        .unwrap();

        expect_validation_field(load_config_from(&tmp).unwrap_err(), "league.num_teams");
        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn rejects_unknown_roster_slot() {
        let tmp = temp_config_dir("pickwise_config_unknown_slot");
        let league = r#"
[league]
name = "Test"
num_teams = 10

[league.roster]
QB = 1
FLEX = 1
Bench = 5
"#;
        fs::write(tmp.join("config/league.toml"), league).unwrap();

        expect_validation_field(load_config_from(&tmp).unwrap_err(), "league.roster.FLEX");
        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn rejects_roster_without_bench() {
        let tmp = temp_config_dir("pickwise_config_no_bench");
        let league = r#"
[league]
name = "Test"
num_teams = 10

[league.roster]
QB = 1
WR = 2
"#;
        fs::write(tmp.join("config/league.toml"), league).unwrap();

        expect_validation_field(load_config_from(&tmp).unwrap_err(), "league.roster");
        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn rejects_zero_candidate_limit() {
        let tmp = temp_config_dir("pickwise_config_zero_limit");
        let strategy = fs::read_to_string(tmp.join("config/strategy.toml")).unwrap();
        fs::write(
            tmp.join("config/strategy.toml"),
            strategy.replace("candidate_limit = 40", "candidate_limit = 0"),
        )
        .unwrap();

        expect_validation_field(load_config_from(&tmp).unwrap_err(), "advisor.candidate_limit");
        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn history_rounds_defaults_when_omitted() {
        let tmp = temp_config_dir("pickwise_config_history_default");
        let strategy = fs::read_to_string(tmp.join("config/strategy.toml")).unwrap();
        assert!(strategy.contains("history_rounds = 3\n"));
        fs::write(
            tmp.join("config/strategy.toml"),
            strategy.replace("history_rounds = 3\n", ""),
        )
        .unwrap();

        let config = load_config_from(&tmp).unwrap();
        assert_eq!(config.advisor.history_rounds, 3);
        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn rejects_empty_model() {
        let tmp = temp_config_dir("pickwise_config_empty_model");
        let strategy = fs::read_to_string(tmp.join("config/strategy.toml")).unwrap();
        fs::write(
            tmp.join("config/strategy.toml"),
            strategy.replace("model = \"gpt-4\"", "model = \"\""),
        )
        .unwrap();

        expect_validation_field(load_config_from(&tmp).unwrap_err(), "llm.model");
        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn rejects_no_data_sources() {
        let tmp = temp_config_dir("pickwise_config_no_sources");
        let strategy = r#"
[advisor]
candidate_limit = 10

[llm]
model = "gpt-4"
api_base = "https://api.openai.com/v1"

[data]
sources = []
"#;
        fs::write(tmp.join("config/strategy.toml"), strategy).unwrap();

        expect_validation_field(load_config_from(&tmp).unwrap_err(), "data.sources");
        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn file_not_found_for_missing_league_toml() {
        let tmp = temp_config_dir("pickwise_config_missing_league");
        fs::remove_file(tmp.join("config/league.toml")).unwrap();

        match load_config_from(&tmp).unwrap_err() {
            ConfigError::FileNotFound { path } => assert!(path.ends_with("league.toml")),
            other => panic!("expected FileNotFound, got: {other}"),
        }
        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn parse_error_for_invalid_toml() {
        let tmp = temp_config_dir("pickwise_config_invalid_toml");
        fs::write(tmp.join("config/strategy.toml"), "this is not valid [[[ toml").unwrap();

        match load_config_from(&tmp).unwrap_err() {
            ConfigError::ParseError { path, .. } => assert!(path.ends_with("strategy.toml")),
            other => panic!("expected ParseError, got: {other}"),
        }
        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn ensure_config_files_copies_missing_files() {
        let tmp = std::env::temp_dir().join("pickwise_config_ensure_copies");
        let _ = fs::remove_dir_all(&tmp);
        let defaults_dir = tmp.join("defaults");
        fs::create_dir_all(&defaults_dir).unwrap();

        let root = project_root();
        fs::copy(root.join("defaults/league.toml"), defaults_dir.join("league.toml")).unwrap();
        fs::copy(root.join("defaults/strategy.toml"), defaults_dir.join("strategy.toml")).unwrap();
        fs::write(
            defaults_dir.join("credentials.toml.example"),
            "openai_api_key = \"sk-...\"\n",
        )
        .unwrap();

        let copied = ensure_config_files(&tmp).expect("should succeed");
        assert_eq!(copied.len(), 2);
        assert!(tmp.join("config/league.toml").exists());
        assert!(tmp.join("config/strategy.toml").exists());
        assert!(!tmp.join("config/credentials.toml.example").exists());

        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn ensure_config_files_skips_existing() {
        let tmp = std::env::temp_dir().join("pickwise_config_ensure_skips");
        let _ = fs::remove_dir_all(&tmp);
        let defaults_dir = tmp.join("defaults");
        let config_dir = tmp.join("config");
        fs::create_dir_all(&defaults_dir).unwrap();
        fs::create_dir_all(&config_dir).unwrap();

        let root = project_root();
        fs::copy(root.join("defaults/league.toml"), defaults_dir.join("league.toml")).unwrap();
        fs::copy(root.join("defaults/strategy.toml"), defaults_dir.join("strategy.toml")).unwrap();
        fs::write(config_dir.join("league.toml"), "# custom\n").unwrap();

        let copied = ensure_config_files(&tmp).expect("should succeed");
        assert_eq!(copied.len(), 1);
        assert!(copied[0].ends_with("strategy.toml"));
        assert_eq!(fs::read_to_string(config_dir.join("league.toml")).unwrap(), "# custom\n");

        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn ensure_config_files_errors_when_both_dirs_missing() {
        let tmp = std::env::temp_dir().join("pickwise_config_both_missing");
        let _ = fs::remove_dir_all(&tmp);
        fs::create_dir_all(&tmp).unwrap();

        match ensure_config_files(&tmp).unwrap_err() {
            ConfigError::DefaultsCopyError { message } => {
                assert!(message.contains("neither defaults/ nor config/"));
            }
            other => panic!("expected DefaultsCopyError, got: {other}"),
        }
        let _ = fs::remove_dir_all(&tmp);
    }
}
