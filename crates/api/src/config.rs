use std::str::FromStr;

use biblio_core::circulation::CirculationPolicy;

use crate::auth::jwt::JwtConfig;

/// Server configuration loaded from environment variables.
///
/// All fields except the JWT secret have defaults suitable for local
/// development. In production, override via environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// How long to wait for background jobs after the server stops (default: `30`).
    pub shutdown_timeout_secs: u64,
    /// How often the due-reminder job runs (default: `3600`).
    pub due_reminder_interval_secs: u64,
    /// JWT token configuration (secret, expiry durations).
    pub jwt: JwtConfig,
    /// Loan durations, caps and fees.
    pub policy: CirculationPolicy,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                      | Default                    |
    /// |------------------------------|----------------------------|
    /// | `HOST`                       | `0.0.0.0`                  |
    /// | `PORT`                       | `3000`                     |
    /// | `CORS_ORIGINS`               | `http://localhost:5173`    |
    /// | `REQUEST_TIMEOUT_SECS`       | `30`                       |
    /// | `SHUTDOWN_TIMEOUT_SECS`      | `30`                       |
    /// | `DUE_REMINDER_INTERVAL_SECS` | `3600`                     |
    ///
    /// JWT settings are read by [`JwtConfig::from_env`] and the circulation
    /// policy by [`policy_from_lookup`].
    ///
    /// # Panics
    ///
    /// Panics on unparsable values so misconfiguration fails at startup.
    pub fn from_env() -> Self {
        let lookup = |key: &str| std::env::var(key).ok();

        let host = lookup("HOST").unwrap_or_else(|| "0.0.0.0".into());
        let port: u16 = parse_or("PORT", lookup("PORT"), 3000);

        let cors_origins = parse_origins(
            &lookup("CORS_ORIGINS").unwrap_or_else(|| "http://localhost:5173".into()),
        );

        let request_timeout_secs = parse_or("REQUEST_TIMEOUT_SECS", lookup("REQUEST_TIMEOUT_SECS"), 30);
        let shutdown_timeout_secs =
            parse_or("SHUTDOWN_TIMEOUT_SECS", lookup("SHUTDOWN_TIMEOUT_SECS"), 30);
        let due_reminder_interval_secs = parse_or(
            "DUE_REMINDER_INTERVAL_SECS",
            lookup("DUE_REMINDER_INTERVAL_SECS"),
            3600,
        );
        assert!(
            due_reminder_interval_secs > 0,
            "DUE_REMINDER_INTERVAL_SECS must be positive"
        );

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            shutdown_timeout_secs,
            due_reminder_interval_secs,
            jwt: JwtConfig::from_env(),
            policy: policy_from_lookup(lookup),
        }
    }
}

/// Build a [`CirculationPolicy`] from a key lookup, falling back to the
/// defaults for absent keys.
///
/// | Env Var                  | Default |
/// |--------------------------|---------|
/// | `LOAN_DURATION_DAYS`     | `14`    |
/// | `MAX_RENEWALS`           | `2`     |
/// | `MAX_ACTIVE_LOANS`       | `5`     |
/// | `LATE_FEE_CENTS_PER_DAY` | `50`    |
/// | `LOST_ITEM_FEE_CENTS`    | `2500`  |
/// | `DUE_REMINDER_DAYS`      | `2`     |
///
/// # Panics
///
/// Panics when a value does not parse or is out of range.
pub fn policy_from_lookup<F>(lookup: F) -> CirculationPolicy
where
    F: Fn(&str) -> Option<String>,
{
    let defaults = CirculationPolicy::default();

    let policy = CirculationPolicy {
        loan_duration_days: parse_or(
            "LOAN_DURATION_DAYS",
            lookup("LOAN_DURATION_DAYS"),
            defaults.loan_duration_days,
        ),
        max_renewals: parse_or("MAX_RENEWALS", lookup("MAX_RENEWALS"), defaults.max_renewals),
        max_active_loans: parse_or(
            "MAX_ACTIVE_LOANS",
            lookup("MAX_ACTIVE_LOANS"),
            defaults.max_active_loans,
        ),
        late_fee_cents_per_day: parse_or(
            "LATE_FEE_CENTS_PER_DAY",
            lookup("LATE_FEE_CENTS_PER_DAY"),
            defaults.late_fee_cents_per_day,
        ),
        lost_item_fee_cents: parse_or(
            "LOST_ITEM_FEE_CENTS",
            lookup("LOST_ITEM_FEE_CENTS"),
            defaults.lost_item_fee_cents,
        ),
        due_reminder_days: parse_or(
            "DUE_REMINDER_DAYS",
            lookup("DUE_REMINDER_DAYS"),
            defaults.due_reminder_days,
        ),
    };

    assert!(policy.loan_duration_days > 0, "LOAN_DURATION_DAYS must be positive");
    assert!(policy.max_renewals >= 0, "MAX_RENEWALS must not be negative");
    assert!(policy.max_active_loans > 0, "MAX_ACTIVE_LOANS must be positive");
    assert!(
        policy.late_fee_cents_per_day >= 0,
        "LATE_FEE_CENTS_PER_DAY must not be negative"
    );
    assert!(
        policy.lost_item_fee_cents >= 0,
        "LOST_ITEM_FEE_CENTS must not be negative"
    );
    assert!(policy.due_reminder_days >= 0, "DUE_REMINDER_DAYS must not be negative");

    policy
}

/// Split a comma-separated origin list, dropping blanks.
fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn parse_or<T: FromStr>(key: &str, raw: Option<String>, default: T) -> T {
    match raw {
        Some(value) => value
            .trim()
            .parse()
            .unwrap_or_else(|_| panic!("{key} must be a valid {}", std::any::type_name::<T>())),
        None => default,
    }
}
