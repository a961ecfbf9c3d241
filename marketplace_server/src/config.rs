use std::{env, io::Write};

use chrono::Duration;
use log::*;
use mkp_common::{
    helpers::{parse_boolean_flag, parse_list},
    Secret,
};
use rand::{distributions::Alphanumeric, thread_rng, Rng};
use serde_json::json;
use tempfile::NamedTempFile;

use crate::errors::ServerError;

const DEFAULT_MKP_HOST: &str = "127.0.0.1";
const DEFAULT_MKP_PORT: u16 = 8370;
const DEFAULT_DATABASE_URL: &str = "sqlite://data/marketplace.db";
const DEFAULT_DB_MAX_CONNECTIONS: u32 = 25;
const DEFAULT_ACCESS_TOKEN_LIFETIME: Duration = Duration::minutes(60);
const DEFAULT_REFRESH_TOKEN_LIFETIME: Duration = Duration::hours(168);
const MIN_JWT_SECRET_LENGTH: usize = 32;

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub db_max_connections: u32,
    pub auth: AuthConfig,
    /// Users with these email addresses are granted the admin role when the server starts.
    pub admin_emails: Vec<String>,
    /// If true, outstanding database migrations are applied when the server starts.
    pub run_migrations: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_MKP_HOST.to_string(),
            port: DEFAULT_MKP_PORT,
            database_url: DEFAULT_DATABASE_URL.to_string(),
            db_max_connections: DEFAULT_DB_MAX_CONNECTIONS,
            auth: AuthConfig::default(),
            admin_emails: Vec::new(),
            run_migrations: true,
        }
    }
}

impl ServerConfig {
    pub fn new(host: &str, port: u16) -> Self {
        Self { host: host.to_string(), port, ..Default::default() }
    }

    pub fn from_env_or_default() -> Self {
        let host = env::var("MKP_HOST").ok().unwrap_or_else(|| DEFAULT_MKP_HOST.into());
        let port = env::var("MKP_PORT")
            .map(|s| {
                s.parse::<u16>().unwrap_or_else(|e| {
                    error!(
                        "🪛️ {s} is not a valid port for MKP_PORT. {e} Using the default, {DEFAULT_MKP_PORT}, instead."
                    );
                    DEFAULT_MKP_PORT
                })
            })
            .ok()
            .unwrap_or(DEFAULT_MKP_PORT);
        let database_url = env::var("MKP_DATABASE_URL").ok().unwrap_or_else(|| {
            info!("🪛️ MKP_DATABASE_URL is not set. Using the default, {DEFAULT_DATABASE_URL}.");
            DEFAULT_DATABASE_URL.to_string()
        });
        let db_max_connections = env::var("MKP_DB_MAX_CONNECTIONS")
            .ok()
            .and_then(|s| {
                s.parse::<u32>()
                    .map_err(|e| warn!("🪛️ Invalid configuration value for MKP_DB_MAX_CONNECTIONS. {e}"))
                    .ok()
            })
            .unwrap_or(DEFAULT_DB_MAX_CONNECTIONS);
        let auth = AuthConfig::try_from_env().unwrap_or_else(|e| {
            warn!(
                "🪛️ Could not load the authentication configuration from environment variables. {e}. Reverting to the \
                 default configuration."
            );
            AuthConfig::default()
        });
        let admin_emails = env::var("MKP_ADMIN_EMAILS").map(|s| parse_list(&s)).unwrap_or_default();
        if !admin_emails.is_empty() {
            info!("🪛️ {} admin email(s) configured", admin_emails.len());
        }
        let run_migrations = parse_boolean_flag(env::var("MKP_RUN_MIGRATIONS").ok(), true);
        Self { host, port, database_url, db_max_connections, auth, admin_emails, run_migrations }
    }
}

/// Reads a lifetime in `unit`s from the environment variable `var`.
fn lifetime_from_env(var: &str, default: Duration, unit: fn(i64) -> Duration, unit_name: &str) -> Duration {
    env::var(var)
        .map_err(|_| info!("🪛️ {var} is not set. Using the default value of {} {unit_name}.", to_units(default, unit)))
        .and_then(|s| {
            s.parse::<i64>()
                .map_err(|e| warn!("🪛️ Invalid configuration value for {var}. {e}"))
                .and_then(|v| if v > 0 { Ok(unit(v)) } else { Err(warn!("🪛️ {var} must be positive.")) })
        })
        .ok()
        .unwrap_or(default)
}

fn to_units(d: Duration, unit: fn(i64) -> Duration) -> i64 {
    d.num_seconds() / unit(1).num_seconds()
}

//-------------------------------------------------  AuthConfig  -------------------------------------------------------
#[derive(Clone, Debug)]
pub struct AuthConfig {
    /// The HMAC secret used to sign and verify JWTs.
    pub jwt_secret: Secret<String>,
    pub access_token_lifetime: Duration,
    pub refresh_token_lifetime: Duration,
}

impl Default for AuthConfig {
    fn default() -> Self {
        let mut tmpfile = NamedTempFile::new().ok().and_then(|f| f.keep().ok());
        warn!(
            "🚨️🚨️🚨️ The JWT secret has not been set. I'm using a random value for this session. DO NOT operate in \
             production like this, since every token will be invalidated when the server restarts. 🚨️🚨️🚨️"
        );
        let secret = thread_rng().sample_iter(&Alphanumeric).take(64).map(char::from).collect::<String>();
        match &mut tmpfile {
            Some((f, p)) => {
                let key_data = json!({ "jwt_secret": secret }).to_string();
                match writeln!(f, "{key_data}") {
                    Ok(()) => warn!(
                        "🚨️🚨️🚨️ The JWT secret for this session was written to {}. If this is a production instance, \
                         you are doing it wrong! Set the MKP_JWT_SECRET environment variable instead. 🚨️🚨️🚨️",
                        p.to_str().unwrap_or("???")
                    ),
                    Err(e) => warn!("🪛️ Could not write the JWT secret to the temporary file. {e}"),
                }
            },
            None => {
                warn!("🪛️ Could not create a temporary file to store the JWT secret.");
            },
        }
        Self {
            jwt_secret: Secret::new(secret),
            access_token_lifetime: DEFAULT_ACCESS_TOKEN_LIFETIME,
            refresh_token_lifetime: DEFAULT_REFRESH_TOKEN_LIFETIME,
        }
    }
}

impl AuthConfig {
    pub fn new(jwt_secret: &str, access_token_lifetime: Duration, refresh_token_lifetime: Duration) -> Self {
        Self { jwt_secret: Secret::new(jwt_secret.to_string()), access_token_lifetime, refresh_token_lifetime }
    }

    pub fn try_from_env() -> Result<Self, ServerError> {
        let jwt_secret =
            env::var("MKP_JWT_SECRET").map_err(|e| ServerError::ConfigurationError(format!("{e} [MKP_JWT_SECRET]")))?;
        if jwt_secret.len() < MIN_JWT_SECRET_LENGTH {
            return Err(ServerError::ConfigurationError(format!(
                "MKP_JWT_SECRET must be at least {MIN_JWT_SECRET_LENGTH} characters long"
            )));
        }
        let access_token_lifetime =
            lifetime_from_env("MKP_ACCESS_TOKEN_LIFETIME", DEFAULT_ACCESS_TOKEN_LIFETIME, Duration::minutes, "minutes");
        let refresh_token_lifetime =
            lifetime_from_env("MKP_REFRESH_TOKEN_LIFETIME", DEFAULT_REFRESH_TOKEN_LIFETIME, Duration::hours, "hours");
        Ok(Self::new(&jwt_secret, access_token_lifetime, refresh_token_lifetime))
    }
}
