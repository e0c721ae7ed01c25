//! # Application Configuration
//!
//! `config.yaml` describes the navigation strategy, the resource graph and
//! which bundled interceptors to install:
//!
//! ```yaml
//! navigation: tree          # flat | tree
//! resources:
//!   articles:
//!     authors: {}
//!   authors:
//!     articles: ~           # link back to the top-level entry
//! session: cookie           # none | cookie
//! authentication:
//!   realm: crud
//!   users:
//!     ada: lovelace
//! caching:
//!   prefix: crud
//! serialization:
//!   default_charset: utf-8
//! ```
//!
//! `CRUDR_NAVIGATION` overrides `navigation` when set. DAOs are not part of
//! the file; they are bound in code through a [`DaoRegistry`](crate::dao::DaoRegistry).

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use crate::error::ConfigError;
use crate::middleware::{BasicAuthentication, CookieSession, EtagCache, Pipeline};
use crate::negotiation::Serialization;
use crate::router::{GraphSpec, Navigation};

/// Environment variable overriding [`AppConfig::navigation`].
pub const NAVIGATION_ENV: &str = "CRUDR_NAVIGATION";

fn default_navigation() -> String {
    "flat".to_string()
}

fn default_realm() -> String {
    "crud".to_string()
}

fn default_prefix() -> String {
    "crud".to_string()
}

fn default_charset() -> String {
    "utf-8".to_string()
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionKind {
    #[default]
    None,
    Cookie,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthenticationConfig {
    #[serde(default = "default_realm")]
    pub realm: String,
    /// user name → password
    #[serde(default)]
    pub users: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachingConfig {
    #[serde(default = "default_prefix")]
    pub prefix: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerializationConfig {
    #[serde(default = "default_charset")]
    pub default_charset: String,
}

impl Default for SerializationConfig {
    fn default() -> Self {
        Self {
            default_charset: default_charset(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    /// `flat` or `tree`; validated when the router is built
    #[serde(default = "default_navigation")]
    pub navigation: String,
    #[serde(default)]
    pub resources: GraphSpec,
    #[serde(default)]
    pub session: SessionKind,
    #[serde(default)]
    pub authentication: Option<AuthenticationConfig>,
    #[serde(default)]
    pub caching: Option<CachingConfig>,
    #[serde(default)]
    pub serialization: SerializationConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            navigation: default_navigation(),
            resources: GraphSpec::default(),
            session: SessionKind::default(),
            authentication: None,
            caching: None,
            serialization: SerializationConfig::default(),
        }
    }
}

impl AppConfig {
    /// Read `path`, parse it and apply environment overrides.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let mut config = Self::from_yaml(&raw)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Parse YAML without consulting the environment.
    pub fn from_yaml(raw: &str) -> Result<Self> {
        serde_yaml::from_str(raw).context("Invalid configuration")
    }

    pub fn apply_env_overrides(&mut self) {
        if let Ok(navigation) = std::env::var(NAVIGATION_ENV) {
            if !navigation.trim().is_empty() {
                self.navigation = navigation.trim().to_string();
            }
        }
    }

    pub fn navigation(&self) -> Result<Navigation, ConfigError> {
        self.navigation.parse()
    }

    /// Pipeline with the configured bundled layers; unset slots stay
    /// pass-through.
    #[must_use]
    pub fn pipeline(&self) -> Pipeline {
        let mut pipeline = Pipeline::new();
        if self.session == SessionKind::Cookie {
            pipeline = pipeline.with_session(CookieSession);
        }
        if let Some(auth) = &self.authentication {
            let layer = auth
                .users
                .iter()
                .fold(BasicAuthentication::new(auth.realm.as_str()), |layer, (user, password)| {
                    layer.with_user(user.as_str(), password.as_str())
                });
            pipeline = pipeline.with_authentication(layer);
        }
        if let Some(caching) = &self.caching {
            pipeline = pipeline.with_caching(EtagCache::new(caching.prefix.as_str()));
        }
        pipeline
    }

    #[must_use]
    pub fn serialization(&self) -> Serialization {
        Serialization::with_charset(&self.serialization.default_charset)
    }
}
