use advisory::ChatConfig;
use anyhow::Context;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Server configuration derived from environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub watchlist_path: PathBuf,
    pub static_dir: PathBuf,
    /// Optional JSON file replacing the built-in hot list and index table.
    pub market_universe_path: Option<PathBuf>,
    pub quote_batch_concurrency: usize,
    /// Yahoo requests per minute
    pub yahoo_rate_limit: usize,
    pub yahoo_timeout: Duration,
    /// `None` when no API key is set; advisory then runs on local rules only.
    pub advisory: Option<ChatConfig>,
}

impl ServerConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| {
            lookup(name)
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
        };
        let str_or = |name: &str, default: &str| get(name).unwrap_or_else(|| default.to_string());

        let api_key = get("ADVISORY_API_KEY")
            .or_else(|| get("DEEPSEEK_API_KEY"))
            .or_else(|| get("OPENAI_API_KEY"));
        let advisory = match api_key {
            Some(key) => {
                let mut chat = ChatConfig::new(key);
                chat.base_url = str_or("ADVISORY_BASE_URL", &chat.base_url);
                chat.model = str_or("ADVISORY_MODEL", &chat.model);
                chat.timeout = Duration::from_secs(parse_or(get("ADVISORY_TIMEOUT_SECS"), "ADVISORY_TIMEOUT_SECS", 15)?);
                Some(chat)
            }
            None => None,
        };

        Ok(Self {
            host: str_or("HOST", "0.0.0.0"),
            port: parse_or(get("PORT"), "PORT", 5000)?,
            watchlist_path: PathBuf::from(str_or("WATCHLIST_PATH", "watchlist.json")),
            static_dir: PathBuf::from(str_or("STATIC_DIR", "static")),
            market_universe_path: get("MARKET_UNIVERSE_PATH").map(PathBuf::from),
            quote_batch_concurrency: parse_or(get("QUOTE_BATCH_CONCURRENCY"), "QUOTE_BATCH_CONCURRENCY", 1)?,
            yahoo_rate_limit: parse_or(get("YAHOO_RATE_LIMIT"), "YAHOO_RATE_LIMIT", 120)?,
            yahoo_timeout: Duration::from_secs(parse_or(get("YAHOO_TIMEOUT_SECS"), "YAHOO_TIMEOUT_SECS", 20)?),
            advisory,
        })
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_or<T>(value: Option<String>, name: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match value {
        Some(raw) => raw
            .parse()
            .with_context(|| format!("invalid value for {}: {:?}", name, raw)),
        None => Ok(default),
    }
}
