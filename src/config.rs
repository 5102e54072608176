use std::env;
use std::str::FromStr;

use anyhow::{Context, bail};
use dotenvy::dotenv;

use crate::model::organization::OrgTable;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreKind {
    MySql,
    Memory,
}

impl FromStr for StoreKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "mysql" => Ok(StoreKind::MySql),
            "memory" => Ok(StoreKind::Memory),
            other => bail!("unknown STORE {other:?}, expected mysql or memory"),
        }
    }
}

#[derive(Clone)]
pub struct Config {
    pub server_addr: String,
    pub store: StoreKind,
    pub database_url: Option<String>,
    pub jwt_secret: String,

    // Rate limiting
    pub rate_protected_per_min: u32,

    pub api_prefix: String,
    pub log_dir: String,
    pub org_config_path: Option<String>,
}

fn required(key: &str) -> anyhow::Result<String> {
    env::var(key).with_context(|| format!("{key} must be set"))
}

fn parsed_or<T>(key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw
            .parse()
            .map_err(|e| anyhow::anyhow!("{key}={raw:?} is invalid: {e}")),
        Err(_) => Ok(default),
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenv().ok();

        let store: StoreKind = parsed_or("STORE", StoreKind::MySql)?;
        let database_url = env::var("DATABASE_URL").ok();
        if store == StoreKind::MySql && database_url.is_none() {
            bail!("DATABASE_URL must be set when STORE=mysql");
        }

        Ok(Self {
            server_addr: required("SERVER_ADDR")?,
            store,
            database_url,
            jwt_secret: required("JWT_SECRET")?,
            rate_protected_per_min: parsed_or("RATE_PROTECTED_PER_MIN", 1000)?,
            api_prefix: env::var("API_PREFIX").unwrap_or_else(|_| "/api".to_string()),
            log_dir: env::var("LOG_DIR").unwrap_or_else(|_| "logs".to_string()),
            org_config_path: env::var("ORG_CONFIG_PATH").ok(),
        })
    }

    /// Organization code table: the configured file, or the built-in defaults.
    pub fn org_table(&self) -> anyhow::Result<OrgTable> {
        match &self.org_config_path {
            Some(path) => OrgTable::from_file(path),
            None => Ok(OrgTable::default()),
        }
    }
}
