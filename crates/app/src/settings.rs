//! Settings for the `conto` binary.
//!
//! Read from `config/conto.toml` (optional), then from `CONTO__*`
//! environment variables, e.g. `CONTO__SERVER__BASE_URL`.
use config::{Config, ConfigError, Environment, File};
use engine::{TaxPolicy, TaxRate};
use serde::Deserialize;

pub const DEFAULT_CONFIG_PATH: &str = "config/conto.toml";

#[derive(Debug, Deserialize)]
pub struct App {
    pub level: String,
}

impl Default for App {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Server {
    pub base_url: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    10
}

#[derive(Debug, Clone, Deserialize)]
pub struct Rate {
    pub name: String,
    pub basis_points: u32,
}

#[derive(Debug, Default, Deserialize)]
pub struct Tax {
    #[serde(default)]
    pub rates: Vec<Rate>,
}

impl Tax {
    pub fn policy(&self) -> TaxPolicy {
        TaxPolicy::new(
            self.rates
                .iter()
                .map(|rate| TaxRate::new(rate.name.clone(), rate.basis_points))
                .collect(),
        )
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct Split {
    pub mode: Option<String>,
    pub ways: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub app: App,
    pub server: Option<Server>,
    #[serde(default)]
    pub tax: Tax,
    #[serde(default)]
    pub split: Split,
}

impl Settings {
    pub fn new(path: Option<&str>) -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::with_name(path.unwrap_or(DEFAULT_CONFIG_PATH)).required(false))
            .add_source(Environment::with_prefix("CONTO").separator("__"))
            .build()?;

        settings.try_deserialize()
    }
}
