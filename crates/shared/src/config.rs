//! Application configuration management.

use std::path::PathBuf;

use rust_decimal::Decimal;
use serde::Deserialize;

/// Application configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Budget engine configuration.
    #[serde(default)]
    pub budget: BudgetConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

/// Budget engine configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct BudgetConfig {
    /// Reporting currency code shown alongside amounts.
    #[serde(default = "default_currency")]
    pub currency: String,
    /// Seed for the demo actual-spend generator. `None` seeds from OS entropy.
    #[serde(default)]
    pub seed: Option<u64>,
    /// JSON snapshot file. `None` keeps state in memory only.
    #[serde(default)]
    pub storage_path: Option<PathBuf>,
    /// Departmental split applied to every budget item.
    #[serde(default = "default_departments")]
    pub departments: Vec<DepartmentConfig>,
}

impl Default for BudgetConfig {
    fn default() -> Self {
        Self {
            currency: default_currency(),
            seed: None,
            storage_path: None,
            departments: default_departments(),
        }
    }
}

/// One department's share of each budget item.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DepartmentConfig {
    /// Department name.
    pub name: String,
    /// Share of the item budget, in percent.
    pub percentage: Decimal,
}

fn default_currency() -> String {
    "KES".to_string()
}

fn default_departments() -> Vec<DepartmentConfig> {
    [
        ("Head Office", Decimal::new(40, 0)),
        ("Branch Operations", Decimal::new(45, 0)),
        ("Field Lending", Decimal::new(15, 0)),
    ]
    .into_iter()
    .map(|(name, percentage)| DepartmentConfig {
        name: name.to_string(),
        percentage,
    })
    .collect()
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// Sources, later ones overriding earlier: `config/default`,
    /// `config/{RUN_MODE}`, then `OPEXA__SECTION__KEY` environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(config::Environment::with_prefix("OPEXA").separator("__"))
            .build()?;

        config.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_defaults_without_sources() {
        temp_env::with_vars_unset(
            [
                "OPEXA__SERVER__PORT",
                "OPEXA__SERVER__HOST",
                "OPEXA__BUDGET__SEED",
                "OPEXA__BUDGET__CURRENCY",
                "OPEXA__BUDGET__STORAGE_PATH",
            ],
            || {
                let config = AppConfig::load().unwrap();

                assert_eq!(config.server.host, "0.0.0.0");
                assert_eq!(config.server.port, 8080);
                assert_eq!(config.budget.currency, "KES");
                assert!(config.budget.seed.is_none());
                assert!(config.budget.storage_path.is_none());
            },
        );
    }

    #[test]
    fn test_env_overrides() {
        temp_env::with_vars(
            [
                ("OPEXA__SERVER__PORT", Some("9090")),
                ("OPEXA__BUDGET__SEED", Some("42")),
                ("OPEXA__BUDGET__STORAGE_PATH", Some("/tmp/opexa.json")),
            ],
            || {
                let config = AppConfig::load().unwrap();

                assert_eq!(config.server.port, 9090);
                assert_eq!(config.budget.seed, Some(42));
                assert_eq!(
                    config.budget.storage_path,
                    Some(PathBuf::from("/tmp/opexa.json"))
                );
            },
        );
    }

    #[test]
    fn test_default_departments_cover_whole_budget() {
        let total: Decimal = default_departments().iter().map(|d| d.percentage).sum();
        assert_eq!(total, dec!(100));
    }
}
