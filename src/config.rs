use dotenvy::dotenv;
use eyre::{Result, WrapErr};
use std::env;
use std::path::PathBuf;

const DEFAULT_PRICES_PATH: &str = "data/prices.csv";
const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 8000;
const DEFAULT_CORS_ORIGIN: &str = "http://localhost:3000";
const DEFAULT_MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub prices_path: PathBuf,
    pub server_host: String,
    pub server_port: u16,
    pub cors_allowed_origin: String,
    pub max_upload_bytes: usize,
}

impl Config {
    /// Load from the process environment, after reading `.env` if present.
    pub fn load() -> Result<Self> {
        dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let prices_path = lookup("PRICES_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_PRICES_PATH));

        let server_host = lookup("SERVER_HOST").unwrap_or_else(|| DEFAULT_HOST.to_string());

        let server_port = match lookup("SERVER_PORT") {
            Some(raw) => raw
                .trim()
                .parse::<u16>()
                .wrap_err_with(|| format!("SERVER_PORT must be a port number, got '{raw}'"))?,
            None => DEFAULT_PORT,
        };

        let cors_allowed_origin = lookup("CORS_ALLOWED_ORIGIN").unwrap_or_else(|| DEFAULT_CORS_ORIGIN.to_string());

        let max_upload_bytes = match lookup("MAX_UPLOAD_BYTES") {
            Some(raw) => raw
                .trim()
                .parse::<usize>()
                .wrap_err_with(|| format!("MAX_UPLOAD_BYTES must be a byte count, got '{raw}'"))?,
            None => DEFAULT_MAX_UPLOAD_BYTES,
        };

        Ok(Config {
            prices_path,
            server_host,
            server_port,
            cors_allowed_origin,
            max_upload_bytes,
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }
}
