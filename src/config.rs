use std::collections::HashMap;
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::ConfigError;

/// Placeholder used when no token is configured anywhere. Requests made with it
/// are expected to be rejected upstream.
pub const DEFAULT_API_TOKEN: &str = "your_jina_api_token";
pub const DEFAULT_READER_URL: &str = "https://r.jina.ai/";
pub const DEFAULT_SEARCH_URL: &str = "https://s.jina.ai/";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Dotenv files in order of precedence, most specific first.
pub const ENV_FILES: [&str; 3] = [".env.local", ".env", ".env.example"];

pub mod keys {
    pub const API_TOKEN: &str = "JINA_API_TOKEN";
    pub const API_TOKEN_FALLBACK: &str = "API_TOKEN";
    pub const READER_URL: &str = "JINA_READER_URL";
    pub const SEARCH_URL: &str = "JINA_SEARCH_URL";
    pub const TIMEOUT_SECS: &str = "JINA_TIMEOUT_SECS";
}

#[derive(Debug, Clone)]
pub struct Config {
    pub api_token: String,
    pub reader_url: String,
    pub search_url: String,
    pub timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            api_token: DEFAULT_API_TOKEN.to_string(),
            reader_url: DEFAULT_READER_URL.to_string(),
            search_url: DEFAULT_SEARCH_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl Config {
    /// Load configuration from the process environment layered over the dotenv
    /// files found in `dir`.
    pub fn load(dir: impl AsRef<Path>) -> Result<Config, ConfigError> {
        let layers = EnvLayers::discover(dir)?;
        Config::from_sources(|key| env::var(key).ok(), &layers)
    }

    /// `env` over `layers`. An empty value in one source doesn't mask the next.
    pub fn from_sources<F>(env: F, layers: &EnvLayers) -> Result<Config, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        Config::from_lookup(|key| {
            env(key)
                .filter(|v| !v.trim().is_empty())
                .or_else(|| layers.get(key))
        })
    }

    /// Build a config from an arbitrary key lookup. Missing keys fall back to
    /// the defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Config, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let api_token = get(keys::API_TOKEN)
            .or_else(|| get(keys::API_TOKEN_FALLBACK))
            .unwrap_or_else(|| DEFAULT_API_TOKEN.to_string());

        let timeout = match get(keys::TIMEOUT_SECS) {
            Some(raw) => {
                let secs = raw
                    .trim()
                    .parse::<u64>()
                    .map_err(|_| ConfigError::InvalidValue {
                        key: keys::TIMEOUT_SECS.to_string(),
                        value: raw.clone(),
                    })?;
                Duration::from_secs(secs)
            }
            None => Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        };

        Ok(Config {
            api_token,
            reader_url: get(keys::READER_URL).unwrap_or_else(|| DEFAULT_READER_URL.to_string()),
            search_url: get(keys::SEARCH_URL).unwrap_or_else(|| DEFAULT_SEARCH_URL.to_string()),
            timeout,
        })
    }

    pub fn with_token(mut self, token: Option<String>) -> Config {
        if let Some(token) = token.filter(|t| !t.is_empty()) {
            self.api_token = token;
        }
        self
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Config {
        if let Some(timeout) = timeout {
            self.timeout = timeout;
        }
        self
    }

    pub fn has_placeholder_token(&self) -> bool {
        self.api_token.is_empty() || self.api_token == DEFAULT_API_TOKEN
    }
}

/// Key/value pairs read from the dotenv files, kept in precedence order.
/// Nothing is written back into the process environment.
#[derive(Debug, Default)]
pub struct EnvLayers {
    layers: Vec<(PathBuf, HashMap<String, String>)>,
}

impl EnvLayers {
    pub fn discover(dir: impl AsRef<Path>) -> Result<EnvLayers, ConfigError> {
        let dir = dir.as_ref();
        log::info!("Looking for environment files in {}: {:?}", dir.display(), ENV_FILES);

        let mut layers = Vec::new();
        for name in ENV_FILES {
            let path = dir.join(name);
            log::debug!("Checking {}", path.display());
            if !path.is_file() {
                continue;
            }
            let vars = read_env_file(&path)?;
            // keys only, values may hold secrets
            let mut keys: Vec<&String> = vars.keys().collect();
            keys.sort();
            log::info!("Loaded environment variables from {name}");
            log::debug!("Keys loaded from {name}: {:?}", keys);
            layers.push((path, vars));
        }

        if layers.is_empty() {
            log::warn!("No .env files found. Using system environment variables only.");
        }

        Ok(EnvLayers { layers })
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.layers
            .iter()
            .find_map(|(_, vars)| vars.get(key).filter(|v| !v.trim().is_empty()).cloned())
    }

    pub fn files(&self) -> impl Iterator<Item = &Path> {
        self.layers.iter().map(|(path, _)| path.as_path())
    }
}

fn read_env_file(path: &Path) -> Result<HashMap<String, String>, ConfigError> {
    let to_err = |source: dotenvy::Error| ConfigError::EnvFile {
        path: path.to_path_buf(),
        source,
    };
    let mut vars = HashMap::new();
    for item in dotenvy::from_path_iter(path).map_err(to_err)? {
        match item {
            Ok((key, value)) => {
                vars.insert(key, value);
            }
            Err(dotenvy::Error::Io(e)) => return Err(to_err(dotenvy::Error::Io(e))),
            Err(e) => log::warn!("Skipping unparseable line in {}: {e}", path.display()),
        }
    }
    Ok(vars)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_nothing_set() {
        let config = Config::from_lookup(|_| None).unwrap();
        assert_eq!(config.api_token, DEFAULT_API_TOKEN);
        assert_eq!(config.reader_url, DEFAULT_READER_URL);
        assert_eq!(config.search_url, DEFAULT_SEARCH_URL);
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert!(config.has_placeholder_token());
    }

    #[test]
    fn test_fallback_token_key() {
        let config = Config::from_lookup(lookup_from(&[("API_TOKEN", "abc")])).unwrap();
        assert_eq!(config.api_token, "abc");

        let config = Config::from_lookup(lookup_from(&[
            ("API_TOKEN", "abc"),
            ("JINA_API_TOKEN", "xyz"),
        ]))
        .unwrap();
        assert_eq!(config.api_token, "xyz");
        assert!(!config.has_placeholder_token());
    }

    #[test]
    fn test_empty_value_treated_as_unset() {
        let config = Config::from_lookup(lookup_from(&[("JINA_API_TOKEN", "  ")])).unwrap();
        assert_eq!(config.api_token, DEFAULT_API_TOKEN);
    }

    #[test]
    fn test_invalid_timeout() {
        let err = Config::from_lookup(lookup_from(&[("JINA_TIMEOUT_SECS", "soon")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }

    #[test]
    fn test_cli_overrides() {
        let config = Config::default()
            .with_token(Some("cli-token".to_string()))
            .with_timeout(Some(Duration::from_secs(5)));
        assert_eq!(config.api_token, "cli-token");
        assert_eq!(config.timeout, Duration::from_secs(5));

        let config = Config::default().with_token(None).with_timeout(None);
        assert_eq!(config.api_token, DEFAULT_API_TOKEN);
        assert_eq!(config.timeout, Duration::from_secs(30));
    }
}
