// src/config.rs
use anyhow::{ensure, Context, Result};
use std::{env, path::PathBuf};

pub const DEFAULT_BASE_URL: &str = "https://vahan.parivahan.gov.in/vahan4dashboard/";
const DEFAULT_OUTPUT: &str = "vahan_registrations.xlsx";
const DEFAULT_WORKERS: usize = 5;

/// Runtime settings, compile-time defaults overridable through `VAHAN_*`
/// environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    pub base_url: String,
    pub output: PathBuf,
    /// Upper bound on concurrently scraped states; each worker owns its own
    /// browser for the whole state.
    pub workers: usize,
    /// Run the browsers with a visible window instead of headless.
    pub headful: bool,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let workers = match env::var("VAHAN_WORKERS") {
            Ok(raw) => raw
                .parse::<usize>()
                .context("VAHAN_WORKERS must be an integer")?,
            Err(_) => DEFAULT_WORKERS,
        };
        ensure!(workers > 0, "VAHAN_WORKERS must be at least 1");

        Ok(Self {
            base_url: env::var("VAHAN_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string()),
            output: env::var("VAHAN_OUTPUT")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(DEFAULT_OUTPUT)),
            workers,
            headful: matches!(
                env::var("VAHAN_HEADFUL").as_deref(),
                Ok("1") | Ok("true") | Ok("TRUE")
            ),
        })
    }
}
