use std::env;
use std::fmt;

/// Process configuration read from the environment at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Listen port (`PORT`, required).
    pub port: u16,
    /// Shared credential for the basic-auth gate (`DEFAULT_PASSWORD`, required).
    pub password: String,
    /// Trust `X-Forwarded-For` for client identities (`REVERSE_PROXY=TRUE`).
    pub trust_proxy: bool,
}

#[derive(Debug)]
pub enum ConfigError {
    MissingPort,
    InvalidPort(String),
    MissingPassword,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::MissingPort => {
                write!(f, "no port set, please set the PORT environment variable")
            }
            ConfigError::InvalidPort(value) => {
                write!(f, "PORT is not a valid port number: {value}")
            }
            ConfigError::MissingPassword => write!(
                f,
                "no default password set, please set the DEFAULT_PASSWORD environment variable"
            ),
        }
    }
}

impl std::error::Error for ConfigError {}

impl Config {
    /// Reads the configuration, failing fast when a required variable is
    /// absent or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        let port_value = env::var("PORT").map_err(|_| ConfigError::MissingPort)?;
        let port = port_value
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort(port_value))?;

        let password = env::var("DEFAULT_PASSWORD").map_err(|_| ConfigError::MissingPassword)?;
        if password.is_empty() {
            return Err(ConfigError::MissingPassword);
        }

        let trust_proxy = matches!(env::var("REVERSE_PROXY").as_deref(), Ok("TRUE"));

        Ok(Self {
            port,
            password,
            trust_proxy,
        })
    }
}
