//! Configuration loading and credential resolution.
//!
//! The config file is YAML with top-level keys `host`, `port`, `vhost`,
//! optional `username`/`password` and a `queues` mapping from queue name to
//! `{warning, critical}` thresholds. Credentials missing from the file are
//! taken from the [`USERNAME_ENV`]/[`PASSWORD_ENV`] environment variables.

use std::fs;
use std::path::Path;

use indexmap::IndexMap;
use serde::Deserialize;

/// Environment variable supplying the management API username when the
/// config file does not.
pub const USERNAME_ENV: &str = "CHECK_RABBITMQ_QUEUES_USERNAME";

/// Environment variable supplying the management API password when the
/// config file does not.
pub const PASSWORD_ENV: &str = "CHECK_RABBITMQ_QUEUES_PASSWORD";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("unable to read config file {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("malformed config file: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("no queues configured")]
    NoQueues,
    #[error("missing credential: set `{field}` in the config file or the {env} environment variable")]
    MissingCredential {
        field: &'static str,
        env: &'static str,
    },
}

/// Warning and critical message-count thresholds for one queue.
///
/// A threshold of zero trips on any nonzero depth; a depth equal to the
/// threshold is still within it.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Eq)]
pub struct Threshold {
    pub warning: u64,
    pub critical: u64,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

/// The raw shape of the YAML document. Field names are part of the external
/// contract and must not change.
#[derive(Debug, Deserialize)]
struct Document {
    #[serde(default = "default_host")]
    host: String,
    #[serde(default = "default_port")]
    port: u16,
    #[serde(default = "default_vhost")]
    vhost: String,
    username: Option<String>,
    password: Option<String>,
    queues: IndexMap<String, Threshold>,
}

fn default_host() -> String {
    "localhost".to_owned()
}

fn default_port() -> u16 {
    15672
}

fn default_vhost() -> String {
    "/".to_owned()
}

/// One invocation's immutable configuration.
///
/// The queue map keeps the enumeration order of the file, which is also the
/// order queues are polled and reported in.
#[derive(Debug)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub vhost: String,
    pub credentials: Credentials,
    pub queues: IndexMap<String, Threshold>,
}

impl Config {
    /// Loads the configuration from `path`, resolving credentials against
    /// the process environment.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        Self::load_with_env(path, |name| std::env::var(name).ok())
    }

    /// Same as [`Config::load`] with an injected environment lookup, so a
    /// fake environment can stand in for the process one.
    pub fn load_with_env(
        path: &Path,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let document: Document = serde_yaml::from_str(&raw)?;
        Self::from_document(document, env)
    }

    fn from_document(
        document: Document,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        if document.queues.is_empty() {
            return Err(ConfigError::NoQueues);
        }

        // The file wins over the environment.
        let username = document.username.or_else(|| env(USERNAME_ENV)).ok_or(
            ConfigError::MissingCredential {
                field: "username",
                env: USERNAME_ENV,
            },
        )?;
        let password = document.password.or_else(|| env(PASSWORD_ENV)).ok_or(
            ConfigError::MissingCredential {
                field: "password",
                env: PASSWORD_ENV,
            },
        )?;

        Ok(Config {
            host: document.host,
            port: document.port,
            vhost: document.vhost,
            credentials: Credentials { username, password },
            queues: document.queues,
        })
    }
}
