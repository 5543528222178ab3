use std::fmt;
use std::path::Path;

use anyhow::{Context, Result, bail};
use serde::Deserialize;

const DEFAULT_SHOKO_PORT: u16 = 8111;
const DEFAULT_CLIENT_IDENTIFIER: &str = "shoko-watched-sync";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub plex: PlexConfig,
    pub shoko: ShokoConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlexConfig {
    #[serde(default)]
    pub token: Option<Secret>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<Secret>,
    pub server_name: String,
    pub library_names: Vec<String>,
    #[serde(default)]
    pub extra_users: Vec<String>,
    #[serde(default = "default_client_identifier")]
    pub client_identifier: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ShokoConfig {
    pub hostname: String,
    #[serde(default = "default_shoko_port")]
    pub port: u16,
    pub username: String,
    #[serde(default)]
    pub password: Secret,
}

/// String that never shows up in `Debug` output.
#[derive(Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret(***)")
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlexCredentials {
    Token(Secret),
    Password { username: String, password: Secret },
}

fn default_shoko_port() -> u16 {
    DEFAULT_SHOKO_PORT
}

fn default_client_identifier() -> String {
    DEFAULT_CLIENT_IDENTIFIER.to_string()
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        Self::parse(&raw).with_context(|| format!("invalid config file {}", path.display()))
    }

    pub fn parse(raw: &str) -> Result<Self> {
        let config: Config = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        self.plex.credentials()?;
        if self.plex.server_name.trim().is_empty() {
            bail!("plex.server_name must not be empty");
        }
        if self.plex.library_names.is_empty() {
            bail!("plex.library_names must list at least one library");
        }
        if self.shoko.hostname.trim().is_empty() {
            bail!("shoko.hostname must not be empty");
        }
        Ok(())
    }
}

impl PlexConfig {
    /// A non-empty token wins over username/password.
    pub fn credentials(&self) -> Result<PlexCredentials> {
        if let Some(token) = self.token.as_ref().filter(|token| !token.is_blank()) {
            return Ok(PlexCredentials::Token(token.clone()));
        }

        let username = self
            .username
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty());
        match (username, self.password.as_ref()) {
            (Some(username), Some(password)) if !password.is_blank() => {
                Ok(PlexCredentials::Password {
                    username: username.to_string(),
                    password: password.clone(),
                })
            }
            _ => bail!("plex needs either a token or both username and password"),
        }
    }
}
