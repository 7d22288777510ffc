use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{DashboardError, Result};

pub const DEFAULT_API_BASE: &str = "http://localhost:5000";
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

pub const API_BASE_VAR: &str = "TAXI_API_BASE";
pub const TIMEOUT_VAR: &str = "TAXI_TIMEOUT_SECS";

/// De dónde salen los viajes.
#[derive(Debug, Clone, PartialEq)]
pub enum TripSource {
    Http { base_url: String },
    File(PathBuf),
}

impl TripSource {
    /// Un argumento con esquema http(s) es un servidor, cualquier otra cosa se trata como archivo.
    pub fn from_arg(arg: &str) -> Self {
        if arg.starts_with("http://") || arg.starts_with("https://") {
            TripSource::Http {
                base_url: arg.to_string(),
            }
        } else {
            TripSource::File(Path::new(arg).to_path_buf())
        }
    }

    pub fn describe(&self) -> String {
        match self {
            TripSource::Http { base_url } => format!("{}/trips", base_url.trim_end_matches('/')),
            TripSource::File(path) => path.display().to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct DashboardConfig {
    pub source: TripSource,
    pub request_timeout: Duration,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            source: TripSource::Http {
                base_url: DEFAULT_API_BASE.to_string(),
            },
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl DashboardConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Defaults, luego variables de entorno (`lookup`).
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(base) = lookup(API_BASE_VAR).filter(|v| !v.trim().is_empty()) {
            config.source = TripSource::Http {
                base_url: base.trim().to_string(),
            };
        }

        if let Some(raw) = lookup(TIMEOUT_VAR) {
            let secs = raw.trim().parse::<u64>().map_err(|_| {
                DashboardError::Config(format!("{} debe ser un entero, no '{}'", TIMEOUT_VAR, raw))
            })?;
            config.request_timeout = Duration::from_secs(secs);
        }

        Ok(config)
    }

    /// El argumento posicional de la línea de comandos gana sobre el entorno.
    pub fn with_source_arg(mut self, arg: Option<&str>) -> Self {
        if let Some(arg) = arg.filter(|a| !a.is_empty()) {
            self.source = TripSource::from_arg(arg);
        }
        self
    }
}
