mod basic;
mod board;
mod database;

pub use basic::BasicConfig;
pub use board::BoardConfig;
pub use database::DatabaseConfig;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Application configuration managed by Figment.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct Config {
    /// Core server configuration (see `basic` table in config.toml).
    #[serde(default)]
    pub basic: BasicConfig,

    /// Storage settings (see `database` table in config.toml).
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Presentation settings (see `board` table in config.toml).
    #[serde(default)]
    pub board: BoardConfig,
}

const DEFAULT_CONFIG_FILE: &str = "config.toml";
const ENV_PREFIX: &str = "QUOTEBOARD_";

impl Config {
    /// Builds a Figment that merges defaults, an optional config TOML file and
    /// `QUOTEBOARD_`-prefixed environment variables (`__` separates nested keys).
    pub fn figment() -> Figment {
        let mut figment = Figment::new().merge(Serialized::defaults(Config::default()));
        if PathBuf::from(DEFAULT_CONFIG_FILE).is_file() {
            figment = figment.merge(Toml::file(DEFAULT_CONFIG_FILE));
        }
        figment.merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Loads configuration from every layer of [`Config::figment`].
    pub fn load() -> Result<Self, figment::Error> {
        Self::from_figment(&Self::figment())
    }

    /// Extracts configuration from an explicit figment.
    pub fn from_figment(figment: &Figment) -> Result<Self, figment::Error> {
        figment.extract()
    }
}
