//! Configuration with layered resolution using figment.
//!
//! Resolution order (highest priority last):
//! 1. User config: `~/.config/graphqbe/config.toml` (XDG) or platform config dir
//! 2. Project config: `.graphqbe.toml`
//! 3. Environment variables: `GRAPHQBE_*`, nested keys separated by `__`
//!    (e.g. `GRAPHQBE_NEO4J__PASSWORD`)
//!
//! # Intended Usage
//!
//! **Global config** (`~/.config/graphqbe/config.toml`):
//! ```toml
//! [neo4j]
//! uri = "bolt://localhost:7687"
//! user = "neo4j"
//! database = "people"
//! ```
//!
//! **Project config** (`.graphqbe.toml`):
//! ```toml
//! [[mapping.entities]]
//! name = "Person"
//! id = "id"
//! properties = [
//!     { name = "id" },
//!     { name = "lastName", graph_name = "last_name" },
//!     { name = "address", composite = "Address" },
//! ]
//!
//! [[mapping.entities]]
//! name = "Address"
//! properties = [{ name = "city" }]
//! ```

use std::ops::Deref;

use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::Deserialize;

use crate::error::AppError;
use crate::mapping::{EntityDescriptor, SchemaMappingContext};

/// Boxed wrapper for figment::Error to reduce Result size on the stack.
#[derive(Debug)]
pub struct ConfigError(Box<figment::Error>);

impl Deref for ConfigError {
    type Target = figment::Error;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.0.source()
    }
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self(Box::new(err))
    }
}

/// Root configuration structure.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub neo4j: Neo4jConfig,
    #[serde(default)]
    pub mapping: MappingConfig,
}

/// Neo4j connection settings.
#[derive(Debug, Clone, Deserialize)]
pub struct Neo4jConfig {
    /// Bolt URI, e.g. `bolt://localhost:7687`.
    #[serde(default = "default_uri")]
    pub uri: String,
    #[serde(default = "default_user")]
    pub user: String,
    #[serde(default)]
    pub password: Option<String>,
    /// Database name; the server default when unset.
    #[serde(default)]
    pub database: Option<String>,
    /// Upper bound of the driver's connection pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: usize,
}

fn default_uri() -> String {
    "bolt://localhost:7687".to_string()
}

fn default_user() -> String {
    "neo4j".to_string()
}

fn default_max_connections() -> usize {
    16
}

impl Default for Neo4jConfig {
    fn default() -> Self {
        Self {
            uri: default_uri(),
            user: default_user(),
            password: None,
            database: None,
            max_connections: default_max_connections(),
        }
    }
}

/// Entity mappings known to the CLI.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MappingConfig {
    #[serde(default)]
    pub entities: Vec<EntityDescriptor>,
}

impl MappingConfig {
    /// Builds a validated mapping context from the configured entities.
    pub fn context(&self) -> Result<SchemaMappingContext, AppError> {
        SchemaMappingContext::new(self.entities.iter().cloned())
    }
}

impl Config {
    /// Load config with layered resolution (user → project → env).
    pub fn load() -> Result<Self, ConfigError> {
        Self::figment().extract().map_err(ConfigError::from)
    }

    /// The layered provider chain behind [`Config::load`].
    pub fn figment() -> Figment {
        Figment::new()
            // Layer 1: User config (lowest priority)
            .merge(Toml::file(Self::user_config_path()))
            // Layer 2: Project config
            .merge(Toml::file(".graphqbe.toml"))
            // Layer 3: Environment variables (highest priority)
            .merge(Env::prefixed("GRAPHQBE_").split("__"))
    }

    /// User config path: ~/.config/graphqbe/config.toml (XDG) or platform config dir.
    fn user_config_path() -> std::path::PathBuf {
        // Prefer XDG config location (~/.config) on all platforms
        if let Some(home) = dirs::home_dir() {
            let xdg_path = home.join(".config").join("graphqbe").join("config.toml");
            if xdg_path.exists() {
                return xdg_path;
            }
        }
        dirs::config_dir()
            .map(|p| p.join("graphqbe").join("config.toml"))
            .unwrap_or_default()
    }
}
