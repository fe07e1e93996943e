use serde::Deserialize;
use std::env;
use std::time::Duration;

#[derive(Debug, Deserialize, Clone, Default, PartialEq, Eq)]
pub struct Config {
    #[serde(default)]
    pub checkout: CheckoutConfig,
    #[serde(default)]
    pub tracking: TrackingConfig,
    #[serde(default)]
    pub store: StoreConfig,
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct CheckoutConfig {
    #[serde(default = "default_submission_timeout")]
    pub submission_timeout_secs: u64,
    /// Reject impossible months and expired cards on top of the MM/YY format check
    #[serde(default = "default_enforce_expiry")]
    pub enforce_card_expiry: bool,
}

fn default_submission_timeout() -> u64 { 30 }
fn default_enforce_expiry() -> bool { true }

impl Default for CheckoutConfig {
    fn default() -> Self {
        Self {
            submission_timeout_secs: default_submission_timeout(),
            enforce_card_expiry: default_enforce_expiry(),
        }
    }
}

impl CheckoutConfig {
    pub fn submission_timeout(&self) -> Duration {
        Duration::from_secs(self.submission_timeout_secs)
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct TrackingConfig {
    #[serde(default = "default_lookup_timeout")]
    pub lookup_timeout_secs: u64,
}

fn default_lookup_timeout() -> u64 { 10 }

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            lookup_timeout_secs: default_lookup_timeout(),
        }
    }
}

impl TrackingConfig {
    pub fn lookup_timeout(&self) -> Duration {
        Duration::from_secs(self.lookup_timeout_secs)
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    #[serde(default = "default_prefix")]
    pub order_number_prefix: String,
    /// Simulated backend latency for the in-memory order store
    #[serde(default)]
    pub processing_delay_ms: u64,
}

fn default_prefix() -> String { "SF".to_string() }

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            order_number_prefix: default_prefix(),
            processing_delay_ms: 0,
        }
    }
}

impl StoreConfig {
    pub fn processing_delay(&self) -> Duration {
        Duration::from_millis(self.processing_delay_ms)
    }
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = config::Config::builder()
            // Every key has a built-in default, so the files are all optional
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{}", run_mode)).required(false))
            // Not checked in
            .add_source(config::File::with_name("config/local").required(false))
            // e.g. `SHOPFRONT__CHECKOUT__SUBMISSION_TIMEOUT_SECS=5`
            .add_source(config::Environment::with_prefix("SHOPFRONT").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}
