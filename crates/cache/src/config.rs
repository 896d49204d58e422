//! Repository configuration management with precedence and validation
use serde::{Deserialize, Serialize};
use std::io;
use std::path::{Path, PathBuf};
use tether_core::{
    Failure, Result, TETHER_BREAKER_FAILURE_THRESHOLD_VAR, TETHER_BREAKER_RECOVERY_TIMEOUT_MS_VAR,
    TETHER_CACHE_TTL_MS_VAR, TETHER_RETRY_INITIAL_DELAY_MS_VAR, TETHER_RETRY_MAX_ATTEMPTS_VAR,
};
use tether_utils::{storage_failure, CircuitBreakerConfig, RetryPolicy};

/// Default time-to-live for cached entries (5 minutes)
const DEFAULT_TTL_MS: u64 = 5 * 60 * 1_000;

/// Settings for one cacheable repository
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RepositoryConfig {
    /// How long an entry counts as fresh
    pub ttl_ms: u64,
    /// Retry remote fetches under this policy
    pub retry: Option<RetryPolicy>,
    /// Guard remote fetches with a circuit breaker
    pub circuit_breaker: Option<CircuitBreakerConfig>,
}

impl Default for RepositoryConfig {
    fn default() -> Self {
        Self {
            ttl_ms: DEFAULT_TTL_MS,
            retry: None,
            circuit_breaker: None,
        }
    }
}

impl RepositoryConfig {
    pub fn validate(&self) -> Result<()> {
        if self.ttl_ms == 0 {
            return Err(Failure::invalid_config("ttl_ms", "must be greater than zero"));
        }
        if let Some(retry) = &self.retry {
            retry.validate()?;
        }
        if let Some(breaker) = &self.circuit_breaker {
            breaker.validate()?;
        }
        Ok(())
    }
}

/// Loaded configuration together with where it came from
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RepositoryConfiguration {
    pub config: RepositoryConfig,
    /// Highest-precedence source that contributed a value
    pub source: ConfigSource,
}

/// Source of configuration for debugging and precedence tracking
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConfigSource {
    /// Built-in defaults
    #[default]
    Default,
    /// JSON configuration file
    ConfigFile(PathBuf),
    /// Environment variables, by name
    Environment(Vec<String>),
    /// Assembled in code through [`RepositoryConfigBuilder`]
    Builder,
}

/// Builder for creating repository configurations
#[derive(Debug, Default)]
pub struct RepositoryConfigBuilder {
    config: RepositoryConfig,
}

impl RepositoryConfigBuilder {
    /// Create a new builder with default configuration
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ttl_ms(mut self, ttl_ms: u64) -> Self {
        self.config.ttl_ms = ttl_ms;
        self
    }

    pub fn with_retry(mut self, policy: RetryPolicy) -> Self {
        self.config.retry = Some(policy);
        self
    }

    pub fn with_circuit_breaker(mut self, breaker: CircuitBreakerConfig) -> Self {
        self.config.circuit_breaker = Some(breaker);
        self
    }

    /// Validate and build the configuration
    pub fn build(self) -> Result<RepositoryConfiguration> {
        self.config.validate()?;
        Ok(RepositoryConfiguration {
            config: self.config,
            source: ConfigSource::Builder,
        })
    }
}

/// Configuration loader that handles precedence:
/// defaults, then the JSON file, then `TETHER_*` environment variables.
pub struct RepositoryConfigLoader;

impl RepositoryConfigLoader {
    /// Load configuration with full precedence handling.
    ///
    /// A missing file is skipped; a malformed one is an error.
    pub fn load(path: Option<&Path>) -> Result<RepositoryConfiguration> {
        Self::load_with_env(path, |name| std::env::var(name).ok())
    }

    /// Same as [`load`](Self::load), reading variables through `env`
    pub fn load_with_env<E>(path: Option<&Path>, env: E) -> Result<RepositoryConfiguration>
    where
        E: Fn(&str) -> Option<String>,
    {
        let mut configuration = RepositoryConfiguration::default();

        if let Some(path) = path {
            if let Some(config) = Self::load_from_config_file(path)? {
                configuration = RepositoryConfiguration {
                    config,
                    source: ConfigSource::ConfigFile(path.to_path_buf()),
                };
            }
        }

        let applied = Self::apply_env(&mut configuration.config, &env)?;
        if !applied.is_empty() {
            configuration.source = ConfigSource::Environment(applied);
        }

        configuration.config.validate()?;
        tracing::debug!(source = ?configuration.source, "Loaded repository configuration");
        Ok(configuration)
    }

    /// Load configuration from config file
    fn load_from_config_file(path: &Path) -> Result<Option<RepositoryConfig>> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(storage_failure(path, "read config file", e)),
        };

        serde_json::from_str(&content)
            .map(Some)
            .map_err(|e| Failure::invalid_config(path.display().to_string(), e.to_string()))
    }

    /// Override values from environment variables, returning the names applied
    fn apply_env<E>(config: &mut RepositoryConfig, env: &E) -> Result<Vec<String>>
    where
        E: Fn(&str) -> Option<String>,
    {
        let mut applied = Vec::new();

        if let Some(ttl_ms) = parse_var::<u64, _>(env, TETHER_CACHE_TTL_MS_VAR)? {
            config.ttl_ms = ttl_ms;
            applied.push(TETHER_CACHE_TTL_MS_VAR.to_string());
        }

        if let Some(max_attempts) = parse_var::<u32, _>(env, TETHER_RETRY_MAX_ATTEMPTS_VAR)? {
            config.retry.get_or_insert_with(RetryPolicy::default).max_attempts = max_attempts;
            applied.push(TETHER_RETRY_MAX_ATTEMPTS_VAR.to_string());
        }

        if let Some(delay_ms) = parse_var::<u64, _>(env, TETHER_RETRY_INITIAL_DELAY_MS_VAR)? {
            config.retry.get_or_insert_with(RetryPolicy::default).initial_delay_ms = delay_ms;
            applied.push(TETHER_RETRY_INITIAL_DELAY_MS_VAR.to_string());
        }

        if let Some(threshold) = parse_var::<u32, _>(env, TETHER_BREAKER_FAILURE_THRESHOLD_VAR)? {
            config
                .circuit_breaker
                .get_or_insert_with(CircuitBreakerConfig::default)
                .failure_threshold = threshold;
            applied.push(TETHER_BREAKER_FAILURE_THRESHOLD_VAR.to_string());
        }

        if let Some(timeout_ms) = parse_var::<u64, _>(env, TETHER_BREAKER_RECOVERY_TIMEOUT_MS_VAR)?
        {
            config
                .circuit_breaker
                .get_or_insert_with(CircuitBreakerConfig::default)
                .recovery_timeout_ms = timeout_ms;
            applied.push(TETHER_BREAKER_RECOVERY_TIMEOUT_MS_VAR.to_string());
        }

        Ok(applied)
    }
}

fn parse_var<N, E>(env: &E, name: &str) -> Result<Option<N>>
where
    N: std::str::FromStr,
    E: Fn(&str) -> Option<String>,
{
    let Some(raw) = env(name) else {
        return Ok(None);
    };
    raw.trim()
        .parse()
        .map(Some)
        .map_err(|_| Failure::invalid_config(name, format!("expected an unsigned integer, got '{raw}'")))
}
