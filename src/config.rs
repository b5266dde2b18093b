use clap::Parser;
use reqwest::Url;
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid webhook url {url:?}: {reason}")]
    InvalidWebhookUrl { url: String, reason: String },

    #[error("at least one course is required")]
    NoCourses,
}

// CLI argument structure, every flag can also come from the environment
#[derive(Parser, Debug, Clone)]
#[command(name = "contact-relay")]
#[command(about = "Validates contact-form submissions and relays them to a webhook")]
pub struct Args {
    // Port to run the server on
    #[arg(short, long, env = "PORT", default_value_t = 8080)]
    pub port: u16,

    // Destination webhook (http or https)
    #[arg(short, long, env = "WEBHOOK_URL", value_parser = parse_webhook_url)]
    pub webhook_url: Url,

    // Accepted course tags (comma-separated)
    // Example: "general,ielts,cefr,sat"
    #[arg(short, long, env = "VALID_COURSES", default_value = "general,ielts,cefr,sat")]
    pub courses: CourseSet,

    // Rate limit max requests per window
    #[arg(long, env = "RATE_LIMIT", default_value_t = 5)]
    pub rate_limit: u32,

    // Rate limit window in seconds
    #[arg(long, env = "RATE_WINDOW", default_value_t = 3600)]
    pub rate_window: u64,

    // Turn quota enforcement off entirely
    #[arg(long, env = "NO_RATE_LIMIT")]
    pub no_rate_limit: bool,

    // Upstream call timeout in seconds
    #[arg(long, env = "UPSTREAM_TIMEOUT", default_value_t = 10)]
    pub upstream_timeout: u64,

    // Idle rate window sweep interval in seconds
    #[arg(long, env = "SWEEP_INTERVAL", default_value_t = 300)]
    pub sweep_interval: u64,
}

// Quota settings; absent when the relay runs without rate limiting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuotaConfig {
    pub limit: u32,
    pub window: Duration,
    pub sweep_interval: Duration,
}

// Runtime configuration derived from [`Args`].
#[derive(Debug, Clone)]
pub struct RelayConfig {
    pub webhook_url: Url,
    pub courses: CourseSet,
    pub upstream_timeout: Duration,
    pub quota: Option<QuotaConfig>,
}

impl Args {
    pub fn relay_config(&self) -> RelayConfig {
        let quota = (!self.no_rate_limit).then(|| QuotaConfig {
            limit: self.rate_limit,
            window: Duration::from_secs(self.rate_window),
            sweep_interval: Duration::from_secs(self.sweep_interval.max(1)),
        });

        RelayConfig {
            webhook_url: self.webhook_url.clone(),
            courses: self.courses.clone(),
            upstream_timeout: Duration::from_secs(self.upstream_timeout),
            quota,
        }
    }
}

pub fn parse_webhook_url(raw: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(raw.trim()).map_err(|e| ConfigError::InvalidWebhookUrl {
        url: raw.to_string(),
        reason: e.to_string(),
    })?;

    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(ConfigError::InvalidWebhookUrl {
            url: raw.to_string(),
            reason: format!("unsupported scheme {other}"),
        }),
    }
}

// The set of course tags a deployment accepts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CourseSet(BTreeSet<String>);

impl CourseSet {
    pub fn contains(&self, course: &str) -> bool {
        self.0.contains(course)
    }
}

impl Default for CourseSet {
    fn default() -> Self {
        ["general", "ielts", "cefr", "sat"]
            .into_iter()
            .map(String::from)
            .collect::<BTreeSet<_>>()
            .into()
    }
}

impl From<BTreeSet<String>> for CourseSet {
    fn from(courses: BTreeSet<String>) -> Self {
        Self(courses)
    }
}

// Parse from comma-separated tags "general, ielts,cefr"
impl FromStr for CourseSet {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let courses: BTreeSet<String> = s
            .split(',')
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(String::from)
            .collect();

        if courses.is_empty() {
            return Err(ConfigError::NoCourses);
        }
        Ok(Self(courses))
    }
}

impl fmt::Display for CourseSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let joined: Vec<&str> = self.0.iter().map(String::as_str).collect();
        write!(f, "{}", joined.join(","))
    }
}
