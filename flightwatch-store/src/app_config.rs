use serde::Deserialize;
use std::env;
use std::time::Duration;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub amadeus: AmadeusConfig,
    #[serde(default)]
    pub pacing: PacingConfig,
    #[serde(default)]
    pub retry: RetryConfig,
    #[serde(default)]
    pub scheduler: SchedulerConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_max_connections() -> u32 { 5 }

#[derive(Debug, Deserialize, Clone)]
pub struct AmadeusConfig {
    pub base_url: String,
    pub client_id: String,
    /// Wrapped into a `SecretString` by the token issuer; never logged.
    pub client_secret: String,
    #[serde(default = "default_safety_margin")]
    pub token_safety_margin_secs: i64,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_max_results")]
    pub max_results: u32,
}

fn default_safety_margin() -> i64 { 60 }
fn default_request_timeout() -> u64 { 30 }
fn default_max_results() -> u32 { 50 }

impl AmadeusConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct PacingConfig {
    /// Minimum spacing between upstream calls. `0` turns pacing off.
    pub min_call_interval_ms: u64,
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self { min_call_interval_ms: 1100 }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 2000,
            max_delay_ms: 30_000,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct SchedulerConfig {
    pub enabled: bool,
    pub interval_secs: u64,
    /// Fire on wall-clock multiples of the interval (top of the hour for 3600).
    /// Intervals that do not divide a day run on a fixed delay instead.
    pub aligned: bool,
    /// Cap on the search phase of one watch run.
    pub watch_deadline_secs: Option<u64>,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_secs: 3600,
            aligned: true,
            watch_deadline_secs: None,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = config::Config::builder()
            .add_source(config::File::with_name("config/default"))
            // Per-environment overrides, optional
            .add_source(config::File::with_name(&format!("config/{}", run_mode)).required(false))
            // Machine-local overrides, not checked in
            .add_source(config::File::with_name("config/local").required(false))
            // e.g. `FLIGHTWATCH_AMADEUS__CLIENT_SECRET=...`
            .add_source(config::Environment::with_prefix("FLIGHTWATCH").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}
