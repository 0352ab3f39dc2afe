//! Layered client configuration.
//!
//! Sources, lowest precedence first:
//!
//! 1. Bundled defaults (`kra_connect.toml` shipped with the library)
//! 2. `~/.config/kra_connect/kra_connect.toml`
//! 3. `./kra_connect.toml`
//! 4. Environment variables prefixed `KRA_CONNECT__`, with `__` between
//!    section and key (e.g. `KRA_CONNECT__RATE_LIMIT__MAX_REQUESTS_PER_SECOND=5`)
//!
//! Files are optional; every field has a serde default so partial files are
//! valid.

use config::{Config, Environment, File, FileFormat};
use derive_getters::Getters;
use kra_connect_cache::{CacheConfig, CacheConfigBuilder};
use kra_connect_core::OperationKind;
use kra_connect_error::{ConfigError, KraError, KraResult};
use kra_connect_http::HttpConfig;
use kra_connect_rate_limit::{RateLimitConfig, RetryConfig};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, instrument};

/// Bundled default configuration.
const DEFAULT_CONFIG: &str = include_str!("../../../kra_connect.toml");

/// Prefix for environment overrides.
const ENV_PREFIX: &str = "KRA_CONNECT";

/// `[cache]` section: capacity plus per-operation lifetimes.
#[derive(
    Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters, derive_setters::Setters,
)]
#[setters(prefix = "with_")]
pub struct CacheSettings {
    /// Whether successful responses are cached
    #[serde(default = "default_cache_enabled")]
    enabled: bool,

    /// Maximum number of cached responses
    #[serde(default = "default_max_size")]
    max_size: usize,

    /// TTL for PIN verifications (seconds)
    #[serde(default = "default_pin_ttl_secs")]
    pin_verification_ttl_secs: u64,

    /// TTL for TCC verifications (seconds)
    #[serde(default = "default_tcc_ttl_secs")]
    tcc_verification_ttl_secs: u64,

    /// TTL for e-slip validations (seconds)
    #[serde(default = "default_eslip_ttl_secs")]
    eslip_validation_ttl_secs: u64,

    /// TTL for taxpayer detail lookups (seconds)
    #[serde(default = "default_details_ttl_secs")]
    taxpayer_details_ttl_secs: u64,
}

fn default_cache_enabled() -> bool {
    true
}

fn default_max_size() -> usize {
    1000
}

fn default_pin_ttl_secs() -> u64 {
    3600
}

fn default_tcc_ttl_secs() -> u64 {
    1800
}

fn default_eslip_ttl_secs() -> u64 {
    300
}

fn default_details_ttl_secs() -> u64 {
    7200
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            enabled: default_cache_enabled(),
            max_size: default_max_size(),
            pin_verification_ttl_secs: default_pin_ttl_secs(),
            tcc_verification_ttl_secs: default_tcc_ttl_secs(),
            eslip_validation_ttl_secs: default_eslip_ttl_secs(),
            taxpayer_details_ttl_secs: default_details_ttl_secs(),
        }
    }
}

impl CacheSettings {
    /// How long a successful response for `operation` stays servable.
    ///
    /// Zero for operations that are never cached.
    pub fn ttl_for(&self, operation: OperationKind) -> Duration {
        let secs = match operation {
            OperationKind::PinVerification => self.pin_verification_ttl_secs,
            OperationKind::TccVerification => self.tcc_verification_ttl_secs,
            OperationKind::EslipValidation => self.eslip_validation_ttl_secs,
            OperationKind::TaxpayerDetails => self.taxpayer_details_ttl_secs,
            OperationKind::NilReturnFiling => 0,
        };
        Duration::from_secs(secs)
    }

    /// Settings for the cache store itself.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the store configuration cannot be built.
    pub fn cache_config(&self) -> KraResult<CacheConfig> {
        CacheConfigBuilder::default()
            .enabled(self.enabled)
            .max_size(self.max_size)
            .build()
            .map_err(|e| KraError::from(ConfigError::new(format!("Invalid cache settings: {e}"))))
    }
}

/// `[batch]` section.
#[derive(
    Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters, derive_setters::Setters,
)]
#[setters(prefix = "with_")]
pub struct BatchConfig {
    /// Upper bound on in-flight calls from one batch
    #[serde(default = "default_max_concurrent")]
    max_concurrent: usize,
}

fn default_max_concurrent() -> usize {
    10
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            max_concurrent: default_max_concurrent(),
        }
    }
}

/// Complete client configuration.
///
/// # Example
///
/// ```no_run
/// use kra_connect::KraConnectConfig;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let config = KraConnectConfig::load()?;
/// println!("{} requests/s", config.rate_limit().max_requests_per_second());
/// # Ok(())
/// # }
/// ```
#[derive(
    Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Getters, derive_setters::Setters,
)]
#[setters(prefix = "with_")]
pub struct KraConnectConfig {
    /// Transport settings
    #[serde(default)]
    http: HttpConfig,
    /// Retry and backoff
    #[serde(default)]
    retry: RetryConfig,
    /// Outbound rate limit
    #[serde(default)]
    rate_limit: RateLimitConfig,
    /// Response cache
    #[serde(default)]
    cache: CacheSettings,
    /// Batch fan-out
    #[serde(default)]
    batch: BatchConfig,
}

impl KraConnectConfig {
    /// Load the bundled defaults only.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the bundled file fails to parse.
    pub fn bundled() -> KraResult<Self> {
        Self::deserialize_from(
            Config::builder().add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml)),
        )
    }

    /// Load configuration from a single file.
    ///
    /// Keys missing from the file take their built-in defaults.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the file is missing, unparseable, or fails
    /// validation.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn from_file(path: impl AsRef<Path>) -> KraResult<Self> {
        debug!("Loading configuration from file");
        let config =
            Self::deserialize_from(Config::builder().add_source(File::from(path.as_ref())))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from every layer.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if any present source fails to parse or the
    /// merged result fails validation.
    #[instrument]
    pub fn load() -> KraResult<Self> {
        debug!("Loading configuration: env > current dir > home dir > bundled defaults");

        let mut builder =
            Config::builder().add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml));

        if let Some(home) = dirs::home_dir() {
            let home_config = home.join(".config/kra_connect/kra_connect.toml");
            builder = builder.add_source(File::from(home_config).required(false));
        }

        builder = builder
            .add_source(File::with_name("kra_connect").required(false))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            );

        let config = Self::deserialize_from(builder)?;
        config.validate()?;
        Ok(config)
    }

    fn deserialize_from(
        builder: config::ConfigBuilder<config::builder::DefaultState>,
    ) -> KraResult<Self> {
        builder
            .build()
            .map_err(|e| {
                KraError::from(ConfigError::new(format!(
                    "Failed to build configuration: {e}"
                )))
            })?
            .try_deserialize()
            .map_err(|e| {
                KraError::from(ConfigError::new(format!(
                    "Failed to parse configuration: {e}"
                )))
            })
    }

    /// Check every section.
    ///
    /// # Errors
    ///
    /// Returns the first `ConfigError` found.
    pub fn validate(&self) -> KraResult<()> {
        self.http.validate()?;
        self.retry.validate()?;
        self.rate_limit.validate()?;
        if self.cache.enabled && self.cache.max_size == 0 {
            Err(ConfigError::new("cache.max_size must be at least 1 when caching is enabled"))?
        }
        if self.batch.max_concurrent == 0 {
            Err(ConfigError::new("batch.max_concurrent must be at least 1"))?
        }
        Ok(())
    }
}
