use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

use thiserror::Error;

const DEFAULT_SECRETS_DIR: &str = "/run/secrets";
const DEFAULT_TABLE: &str = "candidate_evaluations";

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("Missing required configuration: {}", .0.join(", "))]
    Missing(Vec<String>),

    #[error("Invalid value for '{key}': {message}")]
    Invalid { key: String, message: String },
}

/// A place configuration values can come from.
/// Sources are consulted in order; the first non-empty value for a key wins.
pub trait ConfigSource {
    fn name(&self) -> &str;
    fn get(&self, key: &str) -> Option<String>;
}

/// Platform-provided secrets mounted as one file per key (Docker / Kubernetes style).
pub struct SecretsDir {
    root: PathBuf,
}

impl SecretsDir {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl ConfigSource for SecretsDir {
    fn name(&self) -> &str {
        "secrets"
    }

    fn get(&self, key: &str) -> Option<String> {
        std::fs::read_to_string(self.root.join(key))
            .ok()
            .map(|s| s.trim().to_string())
    }
}

pub struct ProcessEnv;

impl ConfigSource for ProcessEnv {
    fn name(&self) -> &str {
        "environment"
    }

    fn get(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

/// Fixed key/value pairs. Backs the `.env` file source and tests.
pub struct MapSource {
    name: String,
    values: HashMap<String, String>,
}

impl MapSource {
    pub fn new(name: &str, values: HashMap<String, String>) -> Self {
        Self {
            name: name.to_string(),
            values,
        }
    }

    /// Reads a dotenv file without touching the process environment.
    /// A missing or unreadable file yields an empty source.
    pub fn from_dotenv(path: &Path) -> Self {
        let values = match dotenvy::from_path_iter(path) {
            Ok(iter) => iter.filter_map(|item| item.ok()).collect(),
            Err(_) => HashMap::new(),
        };
        Self::new("dotenv", values)
    }
}

impl ConfigSource for MapSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LlmProvider {
    Ollama,
    OpenAi,
    Gemini,
}

impl LlmProvider {
    fn parse(raw: &str) -> Result<Self, ConfigError> {
        match raw.to_ascii_lowercase().as_str() {
            "ollama" => Ok(Self::Ollama),
            "openai" => Ok(Self::OpenAi),
            "gemini" => Ok(Self::Gemini),
            other => Err(ConfigError::Invalid {
                key: "LLM_PROVIDER".to_string(),
                message: format!("unknown provider '{other}' (expected ollama, openai or gemini)"),
            }),
        }
    }

    fn default_endpoint(self) -> &'static str {
        match self {
            Self::Ollama => "http://localhost:11434",
            Self::OpenAi => "https://api.openai.com/v1",
            Self::Gemini => "https://generativelanguage.googleapis.com/v1beta/openai",
        }
    }

    fn default_model(self) -> &'static str {
        match self {
            Self::Ollama => "gpt-oss:120b-cloud",
            Self::OpenAi => "gpt-4o-mini",
            Self::Gemini => "gemini-2.5-flash",
        }
    }

    fn requires_key(self) -> bool {
        !matches!(self, Self::Ollama)
    }
}

impl fmt::Display for LlmProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Ollama => "ollama",
            Self::OpenAi => "openai",
            Self::Gemini => "gemini",
        };
        f.write_str(name)
    }
}

#[derive(Clone, PartialEq)]
pub struct LlmConfig {
    pub provider: LlmProvider,
    pub endpoint: String,
    pub api_key: Option<String>,
    pub model: String,
}

impl fmt::Debug for LlmConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LlmConfig")
            .field("provider", &self.provider)
            .field("endpoint", &self.endpoint)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("model", &self.model)
            .finish()
    }
}

/// Where evaluation rows live. Chosen from the scheme of `STORE_URL`.
#[derive(Clone, PartialEq)]
pub enum StoreConfig {
    Postgrest {
        url: String,
        key: String,
        table: String,
    },
    Postgres {
        url: String,
        table: String,
    },
}

impl fmt::Debug for StoreConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Postgrest { url, table, .. } => f
                .debug_struct("Postgrest")
                .field("url", url)
                .field("key", &"<redacted>")
                .field("table", table)
                .finish(),
            Self::Postgres { table, .. } => f
                .debug_struct("Postgres")
                .field("url", &"<redacted>")
                .field("table", table)
                .finish(),
        }
    }
}

/// The default source chain: secrets directory, then process environment, then `.env`.
pub fn default_sources() -> Vec<Box<dyn ConfigSource>> {
    let secrets_dir =
        std::env::var("SECRETS_DIR").unwrap_or_else(|_| DEFAULT_SECRETS_DIR.to_string());
    vec![
        Box::new(SecretsDir::new(secrets_dir)),
        Box::new(ProcessEnv),
        Box::new(MapSource::from_dotenv(Path::new(".env"))),
    ]
}

/// Log level for the subscriber. Read before logging exists, so it is not traced.
pub fn log_level(sources: &[Box<dyn ConfigSource>]) -> String {
    sources
        .iter()
        .find_map(|source| non_empty(source.get("RUST_LOG")))
        .unwrap_or_else(|| "info".to_string())
}

/// Which keys the running command cannot start without.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigScope {
    /// Store and LLM credentials (serving and screening).
    Full,
    /// Store only; LLM credentials are not checked.
    StoreOnly,
}

/// Application configuration resolved from layered sources.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub store: StoreConfig,
    pub llm: LlmConfig,
    pub port: u16,
}

impl Config {
    /// Resolves every key against `sources` in order. Every missing required key
    /// for `scope` is reported in a single error.
    pub fn resolve_for(
        sources: &[Box<dyn ConfigSource>],
        scope: ConfigScope,
    ) -> Result<Self, ConfigError> {
        let lookup = Lookup { sources };
        let mut missing = Vec::new();

        let provider = match lookup.get("LLM_PROVIDER") {
            Some(raw) => LlmProvider::parse(&raw)?,
            None => LlmProvider::Ollama,
        };
        let api_key = lookup.get("LLM_API_KEY");
        if scope == ConfigScope::Full && provider.requires_key() && api_key.is_none() {
            missing.push("LLM_API_KEY".to_string());
        }
        let llm = LlmConfig {
            provider,
            endpoint: lookup
                .get("LLM_ENDPOINT")
                .unwrap_or_else(|| provider.default_endpoint().to_string()),
            api_key,
            model: lookup
                .get("LLM_MODEL")
                .unwrap_or_else(|| provider.default_model().to_string()),
        };

        let table = lookup
            .get("STORE_TABLE")
            .unwrap_or_else(|| DEFAULT_TABLE.to_string());
        let store = match lookup.get("STORE_URL") {
            Some(url) if url.starts_with("postgres://") || url.starts_with("postgresql://") => {
                Some(StoreConfig::Postgres { url, table })
            }
            Some(url) if url.starts_with("http://") || url.starts_with("https://") => {
                match lookup.get("STORE_KEY") {
                    Some(key) => Some(StoreConfig::Postgrest {
                        url: url.trim_end_matches('/').to_string(),
                        key,
                        table,
                    }),
                    None => {
                        missing.push("STORE_KEY".to_string());
                        None
                    }
                }
            }
            Some(url) => {
                return Err(ConfigError::Invalid {
                    key: "STORE_URL".to_string(),
                    message: format!("unsupported scheme in '{url}'"),
                })
            }
            None => {
                missing.push("STORE_URL".to_string());
                None
            }
        };

        let port = match lookup.get("PORT") {
            Some(raw) => raw.parse::<u16>().map_err(|_| ConfigError::Invalid {
                key: "PORT".to_string(),
                message: "PORT must be a valid port number".to_string(),
            })?,
            None => 8080,
        };

        match store {
            Some(store) if missing.is_empty() => Ok(Config {
                store,
                llm,
                port,
            }),
            _ => Err(ConfigError::Missing(missing)),
        }
    }
}

struct Lookup<'a> {
    sources: &'a [Box<dyn ConfigSource>],
}

impl Lookup<'_> {
    fn get(&self, key: &str) -> Option<String> {
        self.sources.iter().find_map(|source| {
            non_empty(source.get(key))
                .inspect(|_| tracing::debug!("config key {key} resolved from {}", source.name()))
        })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolve(sources: &[Box<dyn ConfigSource>]) -> Result<Config, ConfigError> {
        Config::resolve_for(sources, ConfigScope::Full)
    }

    fn source(name: &str, pairs: &[(&str, &str)]) -> Box<dyn ConfigSource> {
        let values = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Box::new(MapSource::new(name, values))
    }

    #[test]
    fn test_first_source_wins() {
        let sources = vec![
            source("secrets", &[("STORE_URL", "https://a.example"), ("STORE_KEY", "k1")]),
            source("env", &[("STORE_URL", "https://b.example"), ("STORE_KEY", "k2")]),
        ];
        let config = resolve(&sources).unwrap();
        assert_eq!(
            config.store,
            StoreConfig::Postgrest {
                url: "https://a.example".to_string(),
                key: "k1".to_string(),
                table: "candidate_evaluations".to_string(),
            }
        );
    }

    #[test]
    fn test_falls_through_to_later_sources_per_key() {
        let sources = vec![
            source("secrets", &[("STORE_URL", "https://a.example/")]),
            source("env", &[("STORE_KEY", "from-env")]),
        ];
        let config = resolve(&sources).unwrap();
        match config.store {
            StoreConfig::Postgrest { url, key, .. } => {
                assert_eq!(url, "https://a.example");
                assert_eq!(key, "from-env");
            }
            other => panic!("unexpected store {other:?}"),
        }
    }

    #[test]
    fn test_empty_values_count_as_missing() {
        let sources = vec![
            source("secrets", &[("STORE_URL", "  ")]),
            source("env", &[("STORE_URL", "postgres://localhost/db")]),
        ];
        let config = resolve(&sources).unwrap();
        assert!(matches!(config.store, StoreConfig::Postgres { .. }));
    }

    #[test]
    fn test_all_missing_keys_reported_together() {
        let sources = vec![source("env", &[("LLM_PROVIDER", "openai")])];
        let err = resolve(&sources).unwrap_err();
        assert_eq!(
            err,
            ConfigError::Missing(vec!["LLM_API_KEY".to_string(), "STORE_URL".to_string()])
        );
    }

    #[test]
    fn test_rest_store_requires_key() {
        let sources = vec![source("env", &[("STORE_URL", "https://a.example")])];
        let err = resolve(&sources).unwrap_err();
        assert_eq!(err, ConfigError::Missing(vec!["STORE_KEY".to_string()]));
    }

    #[test]
    fn test_postgres_store_needs_no_key() {
        let sources = vec![source(
            "env",
            &[("STORE_URL", "postgresql://u:p@localhost/db"), ("STORE_TABLE", "evals")],
        )];
        let config = resolve(&sources).unwrap();
        assert_eq!(
            config.store,
            StoreConfig::Postgres {
                url: "postgresql://u:p@localhost/db".to_string(),
                table: "evals".to_string(),
            }
        );
    }

    #[test]
    fn test_ollama_defaults() {
        let sources = vec![source("env", &[("STORE_URL", "postgres://localhost/db")])];
        let config = resolve(&sources).unwrap();
        assert_eq!(config.llm.provider, LlmProvider::Ollama);
        assert_eq!(config.llm.endpoint, "http://localhost:11434");
        assert_eq!(config.llm.model, "gpt-oss:120b-cloud");
        assert_eq!(config.llm.api_key, None);
        assert_eq!(config.port, 8080);
    }

    #[test]
    fn test_store_only_scope_skips_llm_key() {
        let sources = vec![source(
            "env",
            &[("STORE_URL", "postgres://localhost/db"), ("LLM_PROVIDER", "openai")],
        )];
        assert_eq!(
            resolve(&sources).unwrap_err(),
            ConfigError::Missing(vec!["LLM_API_KEY".to_string()])
        );
        let config = Config::resolve_for(&sources, ConfigScope::StoreOnly).unwrap();
        assert_eq!(config.llm.provider, LlmProvider::OpenAi);
        assert_eq!(config.llm.api_key, None);
    }

    #[test]
    fn test_store_only_scope_still_requires_store() {
        let sources = vec![source("env", &[("LLM_PROVIDER", "openai")])];
        assert_eq!(
            Config::resolve_for(&sources, ConfigScope::StoreOnly).unwrap_err(),
            ConfigError::Missing(vec!["STORE_URL".to_string()])
        );
    }

    #[test]
    fn test_log_level_first_non_empty_or_info() {
        let sources = vec![
            source("secrets", &[("RUST_LOG", " ")]),
            source("dotenv", &[("RUST_LOG", "debug")]),
        ];
        assert_eq!(log_level(&sources), "debug");
        assert_eq!(log_level(&[source("env", &[])]), "info");
    }

    #[test]
    fn test_unknown_provider_rejected() {
        let sources = vec![source(
            "env",
            &[("STORE_URL", "postgres://localhost/db"), ("LLM_PROVIDER", "bard")],
        )];
        assert!(matches!(
            resolve(&sources),
            Err(ConfigError::Invalid { key, .. }) if key == "LLM_PROVIDER"
        ));
    }

    #[test]
    fn test_invalid_port_rejected() {
        let sources = vec![source(
            "env",
            &[("STORE_URL", "postgres://localhost/db"), ("PORT", "eighty")],
        )];
        assert!(matches!(
            resolve(&sources),
            Err(ConfigError::Invalid { key, .. }) if key == "PORT"
        ));
    }

    #[test]
    fn test_secrets_dir_reads_trimmed_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("STORE_KEY"), "secret-key\n").unwrap();
        let secrets = SecretsDir::new(dir.path());
        assert_eq!(secrets.get("STORE_KEY").as_deref(), Some("secret-key"));
        assert_eq!(secrets.get("STORE_URL"), None);
    }

    #[test]
    fn test_dotenv_source_reads_file_without_exporting() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".env");
        std::fs::write(&path, "SCREENER_TEST_ONLY_KEY=from-file\n").unwrap();
        let dotenv = MapSource::from_dotenv(&path);
        assert_eq!(dotenv.get("SCREENER_TEST_ONLY_KEY").as_deref(), Some("from-file"));
        assert!(std::env::var("SCREENER_TEST_ONLY_KEY").is_err());
    }

    #[test]
    fn test_missing_dotenv_is_empty() {
        let dotenv = MapSource::from_dotenv(Path::new("/nonexistent/.env"));
        assert_eq!(dotenv.get("STORE_URL"), None);
    }
}
