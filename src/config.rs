use std::env;
use std::fmt;

use tonic::metadata::{Ascii, MetadataValue};
use url::Url;

pub const TOKEN_VAR: &str = "TOKEN";
pub const LOCAL_VAR: &str = "LOCAL";

// Plaintext: a dev server on this machine does not terminate TLS. The bearer
// token is still attached to every call.
pub const LOCAL_ENDPOINT: &str = "http://localhost:8080";
pub const PRODUCTION_ENDPOINT: &str = "https://api.grpco.in:443";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error(
        "create a permissionless Personal Access Token on GitHub \
         (https://github.com/settings/tokens) and set it to the TOKEN environment variable"
    )]
    MissingToken,
    #[error("TOKEN contains characters that cannot be sent as gRPC metadata")]
    InvalidToken,
    #[error("invalid endpoint {address:?}: {source}")]
    InvalidEndpoint {
        address: String,
        #[source]
        source: url::ParseError,
    },
    #[error("endpoint {0} has no host")]
    MissingHost(String),
}

/// Bearer credential. Never printed, not even through `Debug`.
#[derive(Clone, PartialEq, Eq)]
pub struct Token(String);

impl Token {
    pub fn new(raw: impl Into<String>) -> Result<Self, ConfigError> {
        let raw = raw.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(ConfigError::MissingToken);
        }
        // reject now rather than on the first call
        format!("Bearer {trimmed}")
            .parse::<MetadataValue<Ascii>>()
            .map_err(|_| ConfigError::InvalidToken)?;
        Ok(Self(trimmed.to_string()))
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Token(<redacted>)")
    }
}

/// Which deployment of the service to talk to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    Local,
    Production,
    Custom(Url),
}

impl Target {
    /// `LOCAL` set to anything non-empty selects the local server.
    pub fn from_local_flag(local: Option<&str>) -> Self {
        match local {
            Some(v) if !v.is_empty() => Target::Local,
            _ => Target::Production,
        }
    }

    pub fn custom(address: &str) -> Result<Self, ConfigError> {
        Ok(Target::Custom(parse_endpoint(address)?))
    }

    pub fn url(&self) -> Result<Url, ConfigError> {
        match self {
            Target::Local => parse_endpoint(LOCAL_ENDPOINT),
            Target::Production => parse_endpoint(PRODUCTION_ENDPOINT),
            Target::Custom(url) => Ok(url.clone()),
        }
    }
}

fn parse_endpoint(address: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(address).map_err(|source| ConfigError::InvalidEndpoint {
        address: address.to_string(),
        source,
    })?;
    if url.host_str().is_none() {
        return Err(ConfigError::MissingHost(address.to_string()));
    }
    Ok(url)
}

#[derive(Debug, Clone)]
pub struct Config {
    pub token: Token,
    pub target: Target,
}

impl Config {
    pub fn new(token: Token, target: Target) -> Self {
        Self { token, target }
    }

    /// Reads `TOKEN` and `LOCAL` from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let token = Token::new(lookup(TOKEN_VAR).unwrap_or_default())?;
        let target = Target::from_local_flag(lookup(LOCAL_VAR).as_deref());
        Ok(Self { token, target })
    }
}
