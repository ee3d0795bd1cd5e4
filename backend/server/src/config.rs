use std::{env, fmt::Display, fs::read_to_string, str::FromStr, time::Duration};

use tracing::{info, warn};

use crate::error::StartupError;

pub struct Config {
    pub port: u16,
    pub database_path: String,
    pub production: bool,
    pub session_ttl: Duration,
    pub google: Option<GoogleConfig>,
}

#[derive(Clone)]
pub struct GoogleConfig {
    pub client_id: String,
    pub client_secret: String,
    pub callback_url: String,
}

impl Config {
    pub fn load() -> Result<Self, StartupError> {
        let port: u16 = try_load("RUST_PORT", "3000")?;
        let app_env: String = try_load("APP_ENV", "development")?;
        let ttl_hours: u64 = try_load("SESSION_TTL_HOURS", "24")?;

        let google = match (read_secret("GOOGLE_CLIENT_ID"), read_secret("GOOGLE_CLIENT_SECRET")) {
            (Some(client_id), Some(client_secret)) => Some(GoogleConfig {
                client_id,
                client_secret,
                callback_url: try_load(
                    "GOOGLE_CALLBACK_URL",
                    &format!("http://localhost:{port}/auth/google/callback"),
                )?,
            }),
            _ => {
                warn!("Google OAuth credentials missing, /auth/google is disabled");
                None
            }
        };

        Ok(Self {
            port,
            database_path: try_load("DATABASE_PATH", "kost.db")?,
            production: app_env == "production",
            session_ttl: session_ttl(ttl_hours)?,
            google,
        })
    }
}

fn session_ttl(hours: u64) -> Result<Duration, StartupError> {
    hours
        .checked_mul(60 * 60)
        .map(Duration::from_secs)
        .ok_or_else(|| StartupError::Config {
            key: "SESSION_TTL_HOURS".to_string(),
            reason: format!("{hours} hours is out of range"),
        })
}

fn var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn try_load<T: FromStr>(key: &str, default: &str) -> Result<T, StartupError>
where
    T::Err: Display,
{
    var(key)
        .unwrap_or_else(|| {
            info!("{key} not set, using default: {default}");
            default.to_string()
        })
        .parse()
        .map_err(|e: T::Err| StartupError::Config {
            key: key.to_string(),
            reason: e.to_string(),
        })
}

/// Docker secrets win over plain environment variables.
fn read_secret(secret_name: &str) -> Option<String> {
    let path = format!("/run/secrets/{secret_name}");

    match read_to_string(&path) {
        Ok(secret) => Some(secret.trim().to_string()),
        Err(_) => var(secret_name),
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::{session_ttl, try_load};

    #[test]
    fn falls_back_to_default_when_unset() {
        let port: u16 = try_load("KOST_TEST_UNSET_PORT", "3000").unwrap();
        assert_eq!(port, 3000);
    }

    #[test]
    fn rejects_unparseable_default() {
        let result: Result<u16, _> = try_load("KOST_TEST_UNSET_PORT", "not-a-port");
        assert!(result.is_err());
    }

    #[test]
    fn session_ttl_rejects_overflowing_hours() {
        assert_eq!(session_ttl(24).unwrap(), Duration::from_secs(86_400));
        assert!(session_ttl(u64::MAX).is_err());
    }
}
