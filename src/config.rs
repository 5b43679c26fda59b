//! Configuration management
//!
//! All configuration comes from the environment. Directory settings have
//! defaults only in debug builds, so a release deployment has to name them
//! explicitly (systemd provides `STATE_DIRECTORY`).


use std::env::{self, VarError};
use std::path::PathBuf;

use log::warn;

use crate::error::Result;


/// Credentials and secrets compared against what an operator types
///
/// These are deploy-time constants. The comparison happens in this process
/// and nothing here is a real identity backend.
#[derive(Clone, Debug)]
pub struct AuthConfig {
    pub admin_username: String,
    pub admin_password: String,

    /// Privacy password in effect until an operator changes it
    pub default_privacy_password: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        AuthConfig {
            admin_username: String::from("admin"),
            admin_password: String::from("admin123"),
            default_privacy_password: String::from("privacy123"),
        }
    }
}


/// Complete service configuration
#[derive(Clone, Debug)]
pub struct Config {

    /// Address on which CamViewer listens for HTTP requests
    pub listen: String,

    /// Directory holding the database
    pub state_dir: PathBuf,

    /// Directory holding HTML templates
    pub templates_dir: PathBuf,

    /// Directory of stylesheets served under */static*, if any
    pub static_dir: Option<PathBuf>,

    pub auth: AuthConfig,
}

impl Config {

    /// Reads configuration from the process environment
    pub fn from_env() -> Result<Config> {
        Self::from_lookup(|name| env::var(name))
    }

    /// Reads configuration through `lookup`
    ///
    /// `lookup` behaves like `std::env::var`.
    pub fn from_lookup<F>(lookup: F) -> Result<Config>
    where F: Fn(&str) -> std::result::Result<String, VarError>
    {
        let optional = |name: &str| -> Result<Option<String>> {
            match lookup(name) {
                Ok(value) => Ok(Some(value)),
                Err(VarError::NotPresent) => Ok(None),
                Err(err) => Err(err.into()),
            }
        };

        let directory = |name: &str, debug_default: &str| -> Result<PathBuf> {
            match optional(name)? {
                Some(dir) => Ok(PathBuf::from(dir)),
                None if cfg!(debug_assertions) => Ok(PathBuf::from(debug_default)),
                None => Err(VarError::NotPresent.into()),
            }
        };

        let defaults = AuthConfig::default();
        let auth = AuthConfig {
            admin_username: optional("CV_ADMIN_USERNAME")?
                .unwrap_or(defaults.admin_username),
            admin_password: optional("CV_ADMIN_PASSWORD")?
                .unwrap_or(defaults.admin_password),
            default_privacy_password: optional("CV_PRIVACY_PASSWORD")?
                .unwrap_or(defaults.default_privacy_password),
        };

        if optional("CV_ADMIN_PASSWORD")?.is_none() {
            warn!("CV_ADMIN_PASSWORD is not set, using the default admin password");
        }

        let static_dir = match optional("CV_STATIC")? {
            Some(dir) => Some(PathBuf::from(dir)),
            None if cfg!(debug_assertions) => Some(PathBuf::from("static")),
            None => None,
        };

        Ok(Config {
            listen: optional("CV_LISTEN")?
                .unwrap_or_else(|| String::from("127.0.0.1:9351")),
            state_dir: directory("STATE_DIRECTORY", ".")?,
            templates_dir: directory("CV_TEMPLATES", "templates")?,
            static_dir,
            auth,
        })
    }
}
