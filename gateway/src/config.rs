use anyhow::{Context, Result};
use shoe_core::DEFAULT_MAX_TURNS;

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 8080;

/// Server-level settings. The Brain and the FAQ client read their own.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub host: String,
    pub port: u16,
    pub max_turns: usize,
    /// Ping the model backend once at startup.
    pub startup_check: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            max_turns: DEFAULT_MAX_TURNS,
            startup_check: true,
        }
    }
}

impl Settings {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let read = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        let mut settings = Self::default();

        if let Some(host) = read("HOST") {
            settings.host = host.trim().to_string();
        }
        if let Some(port) = read("PORT") {
            settings.port = parse("PORT", &port)?;
        }
        if let Some(turns) = read("AGENT_MAX_TURNS") {
            settings.max_turns = parse("AGENT_MAX_TURNS", &turns)?;
        }
        if let Some(check) = read("STARTUP_CHECK") {
            settings.startup_check = parse("STARTUP_CHECK", &check)?;
        }

        Ok(settings)
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse<T>(key: &str, value: &str) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    value
        .trim()
        .parse::<T>()
        .with_context(|| format!("invalid value for {key}: {value:?}"))
}
