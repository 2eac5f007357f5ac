// Runtime configuration for the evaluation pipeline
use crate::types::Language;
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_EXECUTION_ENDPOINT: &str = "https://api.jdoodle.com/v1/execute";
pub const DEFAULT_LANGUAGES_PATH: &str = "config/languages.json";

/// Settings for talking to the remote execution capability
///
/// Built once and handed to the client at construction.
#[derive(Debug, Clone)]
pub struct ExecutionConfig {
    pub endpoint: String,
    pub client_id: String,
    pub client_secret: String,
    pub timeout: Duration,
    pub connect_timeout: Duration,
    pub max_retries: u32,
    pub retry_backoff: Duration,
    /// Concurrent test cases per submission; 1 keeps evaluation sequential
    pub parallelism: usize,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_EXECUTION_ENDPOINT.to_string(),
            client_id: String::new(),
            client_secret: String::new(),
            timeout: Duration::from_millis(5000),
            connect_timeout: Duration::from_millis(2000),
            max_retries: 0,
            retry_backoff: Duration::from_millis(200),
            parallelism: 1,
        }
    }
}

impl ExecutionConfig {
    /// Load from the process environment (and `.env` if present)
    pub fn from_env() -> Result<Self> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup; unset keys keep their defaults
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let millis = |key: &str, default: Duration| -> Result<Duration> {
            match lookup(key) {
                Some(v) => Ok(Duration::from_millis(
                    v.parse().with_context(|| format!("{} must be an integer", key))?,
                )),
                None => Ok(default),
            }
        };

        let timeout = millis("EXECUTION_TIMEOUT_MS", defaults.timeout)?;
        if timeout.is_zero() {
            bail!("EXECUTION_TIMEOUT_MS must be greater than zero");
        }

        let max_retries: u32 = match lookup("EXECUTION_MAX_RETRIES") {
            Some(v) => v.parse().context("EXECUTION_MAX_RETRIES must be an integer")?,
            None => defaults.max_retries,
        };

        let parallelism: usize = match lookup("EVALUATION_PARALLELISM") {
            Some(v) => v.parse().context("EVALUATION_PARALLELISM must be an integer")?,
            None => defaults.parallelism,
        };

        Ok(Self {
            endpoint: lookup("EXECUTION_ENDPOINT").unwrap_or(defaults.endpoint),
            client_id: lookup("EXECUTION_CLIENT_ID").unwrap_or_default(),
            client_secret: lookup("EXECUTION_CLIENT_SECRET").unwrap_or_default(),
            timeout,
            connect_timeout: millis("EXECUTION_CONNECT_TIMEOUT_MS", defaults.connect_timeout)?,
            max_retries,
            retry_backoff: millis("EXECUTION_RETRY_BACKOFF_MS", defaults.retry_backoff)?,
            parallelism: parallelism.max(1),
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LanguageEntry {
    pub name: String,
    pub version_index: String,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_enabled() -> bool {
    true
}

#[derive(Debug, Serialize, Deserialize)]
struct LanguagesJson {
    languages: Vec<LanguageEntry>,
}

/// Language table loaded from languages.json
///
/// Languages missing from the file fall back to their built-in version index
/// and count as disabled.
#[derive(Debug, Clone, Default)]
pub struct LanguageTable {
    entries: HashMap<Language, LanguageEntry>,
}

impl LanguageTable {
    pub fn load(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            bail!("Language config file not found: {}", config_path.display());
        }

        let content = fs::read_to_string(config_path).context("Failed to read languages.json")?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self> {
        let languages_json: LanguagesJson =
            serde_json::from_str(content).context("Failed to parse languages.json")?;

        let mut entries = HashMap::new();
        for entry in languages_json.languages {
            let Some(language) = Language::from_str(&entry.name) else {
                bail!("Unknown language '{}' in languages.json", entry.name);
            };
            entries.insert(language, entry);
        }

        if entries.is_empty() {
            bail!("No languages configured in languages.json");
        }

        Ok(Self { entries })
    }

    /// Every supported language enabled with its default version index
    pub fn builtin() -> Self {
        let entries = Language::ALL
            .iter()
            .map(|lang| {
                (
                    *lang,
                    LanguageEntry {
                        name: lang.to_string(),
                        version_index: lang.default_version_index().to_string(),
                        enabled: true,
                    },
                )
            })
            .collect();
        Self { entries }
    }

    pub fn version_index(&self, language: Language) -> String {
        self.entries
            .get(&language)
            .map(|e| e.version_index.clone())
            .unwrap_or_else(|| language.default_version_index().to_string())
    }

    pub fn is_enabled(&self, language: Language) -> bool {
        self.entries.get(&language).map(|e| e.enabled).unwrap_or(false)
    }

    pub fn enabled_languages(&self) -> Vec<Language> {
        let mut langs: Vec<Language> = self
            .entries
            .iter()
            .filter(|(_, e)| e.enabled)
            .map(|(lang, _)| *lang)
            .collect();
        langs.sort_by_key(|l| l.to_string());
        langs
    }
}
