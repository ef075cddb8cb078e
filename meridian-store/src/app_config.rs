use meridian_trip::intent::HeuristicRules;
use serde::Deserialize;
use std::env;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub redis: RedisConfig,
    pub auth: AuthConfig,
    #[serde(default)]
    pub heuristics: HeuristicRulesConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RedisConfig {
    pub url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub jwt_expiration_seconds: u64,
}

/// Budget-heuristic factors as they appear in the config files.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct HeuristicRulesConfig {
    #[serde(default)]
    pub budget_min_factor: Option<f64>,
    #[serde(default)]
    pub budget_max_factor: Option<f64>,
}

impl HeuristicRulesConfig {
    pub fn into_rules(self) -> HeuristicRules {
        let defaults = HeuristicRules::default();
        HeuristicRules {
            budget_min_factor: self.budget_min_factor.unwrap_or(defaults.budget_min_factor),
            budget_max_factor: self.budget_max_factor.unwrap_or(defaults.budget_max_factor),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = config::Config::builder()
            // Start off by merging in the "default" configuration file
            .add_source(config::File::with_name("config/default"))
            // Environment-specific file, optional
            .add_source(config::File::with_name(&format!("config/{}", run_mode)).required(false))
            // Local overrides, not checked in
            .add_source(config::File::with_name("config/local").required(false))
            // Eg. `MERIDIAN__SERVER__PORT=8080`
            .add_source(config::Environment::with_prefix("MERIDIAN").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}
