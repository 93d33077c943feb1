use anyhow::Context;
use rand::distributions::{Alphanumeric, DistString};
use serde::Deserialize;

const GENERATED_SECRET_LEN: usize = 48;
const DEFAULT_TTL_MINUTES: i64 = 60 * 24;
/// One year.
pub const MAX_TTL_MINUTES: i64 = 525_600;

#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_minutes: i64,
    pub secure_cookie: bool,
}

/// SMTP relay used to deliver verification codes.
#[derive(Debug, Clone, Deserialize)]
pub struct MailConfig {
    pub server: String,
    pub port: u16,
    pub use_tls: bool,
    pub username: String,
    pub password: String,
    pub sender: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub session: SessionConfig,
    pub mail: MailConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL is not set")?;
        Ok(Self {
            database_url,
            session: SessionConfig::from_env()?,
            mail: MailConfig::from_env()?,
        })
    }
}

impl SessionConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let secret = match std::env::var("SESSION_SECRET") {
            Ok(s) if !s.is_empty() => s,
            _ => {
                tracing::warn!("SESSION_SECRET not set; sessions will not survive a restart");
                Alphanumeric.sample_string(&mut rand::thread_rng(), GENERATED_SECRET_LEN)
            }
        };
        let ttl_minutes = parse_ttl_minutes(std::env::var("SESSION_TTL_MINUTES").ok().as_deref())?;
        Ok(Self {
            secret,
            issuer: std::env::var("SESSION_ISSUER").unwrap_or_else(|_| "rivalteamfinder".into()),
            audience: std::env::var("SESSION_AUDIENCE")
                .unwrap_or_else(|_| "rivalteamfinder-web".into()),
            ttl_minutes,
            secure_cookie: std::env::var("SESSION_COOKIE_SECURE")
                .map(|v| parse_flag(&v))
                .unwrap_or(false),
        })
    }

    /// Cookie `Max-Age` matching the session lifetime.
    pub fn max_age_secs(&self) -> anyhow::Result<i64> {
        self.ttl_minutes
            .checked_mul(60)
            .context("SESSION_TTL_MINUTES overflows the cookie max-age")
    }
}

/// Unset means one day; anything else must be a whole number of minutes in
/// `1..=MAX_TTL_MINUTES`.
fn parse_ttl_minutes(raw: Option<&str>) -> anyhow::Result<i64> {
    let Some(raw) = raw else {
        return Ok(DEFAULT_TTL_MINUTES);
    };
    let minutes = raw
        .trim()
        .parse::<i64>()
        .with_context(|| format!("SESSION_TTL_MINUTES is not a number: {raw:?}"))?;
    if !(1..=MAX_TTL_MINUTES).contains(&minutes) {
        anyhow::bail!("SESSION_TTL_MINUTES must be between 1 and {MAX_TTL_MINUTES}, got {minutes}");
    }
    Ok(minutes)
}

impl MailConfig {
    /// Mail settings are mandatory: registration cannot work without a relay.
    pub fn from_env() -> anyhow::Result<Self> {
        let server = std::env::var("MAIL_SERVER").context("MAIL_SERVER is not set")?;
        let port = std::env::var("MAIL_PORT")
            .context("MAIL_PORT is not set")?
            .parse::<u16>()
            .context("MAIL_PORT is not a valid port")?;
        let use_tls = parse_flag(&std::env::var("MAIL_USE_TLS").context("MAIL_USE_TLS is not set")?);
        let username = std::env::var("MAIL_USERNAME").context("MAIL_USERNAME is not set")?;
        let password = std::env::var("MAIL_PASSWORD").context("MAIL_PASSWORD is not set")?;
        let sender = std::env::var("MAIL_SENDER").unwrap_or_else(|_| username.clone());
        Ok(Self {
            server,
            port,
            use_tls,
            username,
            password,
            sender,
        })
    }
}

fn parse_flag(v: &str) -> bool {
    matches!(v.trim().to_ascii_lowercase().as_str(), "true" | "1" | "yes")
}
