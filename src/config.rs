use thiserror::Error;

use crate::constants::*;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{name} is invalid: {reason}")]
    Invalid { name: &'static str, reason: String },
}

/// Where the relay reads and writes user data.
#[derive(Debug, Clone, PartialEq)]
pub enum Mode {
    /// Local libsql store seeded with the demo account.
    Demo { demo_password: String },
    /// Supabase auth and REST endpoints.
    Live {
        supabase_url: String,
        service_role_key: String,
    },
}

impl Mode {
    pub fn name(&self) -> &'static str {
        match self {
            Mode::Demo { .. } => "demo",
            Mode::Live { .. } => "live",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub data_path: String,
    pub session_secret: String,
    pub production: bool,
    pub frontend_origins: Vec<String>,
    pub mode: Mode,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let host = lookup("HOST").unwrap_or_else(|| DEFAULT_HOST.to_string());
        let port_raw = lookup("PORT").unwrap_or_else(|| DEFAULT_PORT.to_string());
        let port = port_raw.parse::<u16>().map_err(|e| ConfigError::Invalid {
            name: "PORT",
            reason: e.to_string(),
        })?;

        let data_path = lookup("DATA_PATH").unwrap_or_else(|| DEFAULT_DATA_PATH.to_string());

        let session_secret = lookup("SESSION_SECRET")
            .or_else(|| lookup("JWT_SECRET"))
            .ok_or(ConfigError::Missing("SESSION_SECRET"))?;
        if session_secret.len() < MIN_SESSION_SECRET_LENGTH {
            return Err(ConfigError::Invalid {
                name: "SESSION_SECRET",
                reason: format!("must be at least {} bytes", MIN_SESSION_SECRET_LENGTH),
            });
        }

        let production = flag(lookup("PRODUCTION"));

        let frontend_origins: Vec<String> = lookup("FRONTEND_ORIGIN")
            .unwrap_or_else(|| DEFAULT_FRONTEND_ORIGIN.to_string())
            .split(',')
            .map(str::trim)
            .filter(|origin| !origin.is_empty())
            .map(str::to_string)
            .collect();

        let mode = if flag(lookup("DEMO_MODE")) {
            Mode::Demo {
                demo_password: lookup("DEMO_PASSWORD")
                    .unwrap_or_else(|| DEFAULT_DEMO_PASSWORD.to_string()),
            }
        } else {
            let supabase_url = lookup("SUPABASE_URL").ok_or(ConfigError::Missing("SUPABASE_URL"))?;
            let service_role_key = lookup("SUPABASE_SERVICE_ROLE_KEY")
                .ok_or(ConfigError::Missing("SUPABASE_SERVICE_ROLE_KEY"))?;
            Mode::Live {
                supabase_url: supabase_url.trim_end_matches('/').to_string(),
                service_role_key,
            }
        };

        Ok(Self {
            host,
            port,
            data_path,
            session_secret,
            production,
            frontend_origins,
            mode,
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn flag(value: Option<String>) -> bool {
    value
        .map(|val| val.trim().eq_ignore_ascii_case("true"))
        .unwrap_or(false)
}
