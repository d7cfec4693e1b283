use anyhow::{Context, Result};
use serde::Deserialize;
use std::env;
use std::num::NonZeroUsize;
use std::str::FromStr;
use std::thread;
use std::time::Duration;

use crate::hh::{MAX_REACHABLE_RESULTS, PAGE_SIZE};
use crate::search::PageRounding;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub hh: HhConfig,
    pub search: SearchConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
    pub host: String,
    pub cors_allowed_origins: Vec<String>,
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HhConfig {
    pub api_url: String,
    pub user_agent: String,
    pub timeout_secs: u64,
    /// Experience bucket id (e.g. `between1And3`) applied to every search
    pub experience: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchConfig {
    pub page_rounding: PageRounding,
    pub max_pages: Option<u32>,
    pub workers: usize,
    /// Time one request may spend on upstream calls before returning what it
    /// has. Must stay below the server request timeout.
    pub budget_secs: u64,
}

impl Default for HhConfig {
    fn default() -> Self {
        Self {
            api_url: "https://api.hh.ru".to_string(),
            user_agent: "JobSearch/0.1".to_string(),
            timeout_secs: 10,
            experience: None,
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            page_rounding: PageRounding::default(),
            max_pages: None,
            workers: default_workers(),
            budget_secs: 25,
        }
    }
}

impl SearchConfig {
    pub fn budget(&self) -> Duration {
        Duration::from_secs(self.budget_secs)
    }

    /// Pages past the upstream result limit are refused by hh, so an uncapped
    /// broad query spends its budget on requests that can only fail.
    pub fn pagination_warning(&self) -> Option<String> {
        let reachable = MAX_REACHABLE_RESULTS / PAGE_SIZE;
        match self.max_pages {
            None => Some(format!(
                "SEARCH_MAX_PAGES is unset; hh serves at most {} pages per query, consider SEARCH_MAX_PAGES={}",
                reachable, reachable
            )),
            Some(max) if max > reachable => Some(format!(
                "SEARCH_MAX_PAGES={} exceeds the {} pages hh serves per query",
                max, reachable
            )),
            Some(_) => None,
        }
    }
}

/// Worker count used when `DETAIL_WORKERS` is not set
pub fn default_workers() -> usize {
    thread::available_parallelism().map_or(1, NonZeroUsize::get)
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let config = Self {
            server: ServerConfig {
                port: parse_var("PORT", 8080)?,
                host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                cors_allowed_origins: env::var("ALLOWED_ORIGINS")
                    .unwrap_or_else(|_| "http://localhost:3000".to_string())
                    .split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect(),
                request_timeout_secs: parse_var("REQUEST_TIMEOUT_SECS", 30)?,
            },
            hh: HhConfig {
                api_url: env::var("HH_API_URL")
                    .unwrap_or_else(|_| "https://api.hh.ru".to_string())
                    .trim_end_matches('/')
                    .to_string(),
                user_agent: env::var("HH_USER_AGENT").unwrap_or_else(|_| "JobSearch/0.1".to_string()),
                timeout_secs: parse_var("HH_TIMEOUT_SECS", 10)?,
                experience: env::var("HH_EXPERIENCE").ok().filter(|s| !s.is_empty()),
            },
            search: SearchConfig {
                page_rounding: parse_var("SEARCH_PAGE_ROUNDING", PageRounding::default())?,
                max_pages: parse_optional_var("SEARCH_MAX_PAGES")?,
                workers: parse_var("DETAIL_WORKERS", default_workers())?.max(1),
                budget_secs: parse_var("SEARCH_BUDGET_SECS", 25)?,
            },
        };
        config.validate()?;
        Ok(config)
    }

    /// The request budget has to expire before the server timeout, otherwise
    /// the timeout layer discards partial results the budget would return.
    pub fn validate(&self) -> Result<()> {
        let budget = self.search.budget_secs;
        let timeout = self.server.request_timeout_secs;
        if budget == 0 {
            anyhow::bail!("SEARCH_BUDGET_SECS must be at least 1");
        }
        if budget >= timeout {
            anyhow::bail!(
                "SEARCH_BUDGET_SECS ({}) must be less than REQUEST_TIMEOUT_SECS ({})",
                budget,
                timeout
            );
        }
        Ok(())
    }
}

fn parse_var<T>(name: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(name) {
        Ok(raw) => parse_value(name, &raw),
        Err(_) => Ok(default),
    }
}

fn parse_optional_var<T>(name: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(name) {
        Ok(raw) if !raw.trim().is_empty() => parse_value(name, &raw).map(Some),
        _ => Ok(None),
    }
}

fn parse_value<T>(name: &str, raw: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    raw.trim()
        .parse()
        .with_context(|| format!("invalid value for {}: {:?}", name, raw))
}
