use serde::Deserialize;

/// Global application configuration loaded from environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// PostgreSQL connection string for the recipient store
    pub database_url: String,

    /// Maximum number of PostgreSQL connections in the pool (default: 10)
    pub db_max_connections: u32,

    /// Seconds to wait for a pooled connection before a listing fails (default: 5)
    pub db_acquire_timeout_secs: u64,

    /// HTTP listen port (default: 5000)
    pub port: u16,

    /// Twilio account SID
    pub twilio_account_sid: String,

    /// Twilio auth token
    pub twilio_auth_token: String,

    /// Sender ID / phone number SMS messages are sent from
    pub twilio_phone_number: String,

    /// Twilio REST base URL (overridable for tests and proxies)
    pub twilio_api_base: String,

    /// Resend API key for email delivery
    pub resend_api_key: String,

    /// Email sender address
    pub email_from: String,

    /// Resend REST base URL
    pub resend_api_base: String,

    /// International calling code substituted for a leading trunk `0` (default: +94)
    pub default_calling_code: String,

    /// Upper bound on in-flight sends within one broadcast (default: 32)
    pub dispatch_max_concurrency: usize,

    /// Per-send deadline in seconds, 0 disables it (default: 30)
    pub dispatch_send_timeout_secs: u64,
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| anyhow::anyhow!("{key} environment variable is required"))
        };
        let or_default =
            |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let config = Self {
            database_url: required("DATABASE_URL")?,
            db_max_connections: or_default("DB_MAX_CONNECTIONS", "10")
                .parse()
                .map_err(|_| anyhow::anyhow!("DB_MAX_CONNECTIONS must be a valid u32"))?,
            db_acquire_timeout_secs: or_default("DB_ACQUIRE_TIMEOUT_SECS", "5")
                .parse()
                .map_err(|_| anyhow::anyhow!("DB_ACQUIRE_TIMEOUT_SECS must be a valid u64"))?,
            port: or_default("PORT", "5000")
                .parse()
                .map_err(|_| anyhow::anyhow!("PORT must be a valid u16"))?,
            twilio_account_sid: required("TWILIO_ACCOUNT_SID")?,
            twilio_auth_token: required("TWILIO_AUTH_TOKEN")?,
            twilio_phone_number: required("TWILIO_PHONE_NUMBER")?,
            twilio_api_base: or_default("TWILIO_API_BASE", "https://api.twilio.com"),
            resend_api_key: required("RESEND_API_KEY")?,
            email_from: required("EMAIL_FROM")?,
            resend_api_base: or_default("RESEND_API_BASE", "https://api.resend.com"),
            default_calling_code: or_default("DEFAULT_CALLING_CODE", "+94"),
            dispatch_max_concurrency: or_default("DISPATCH_MAX_CONCURRENCY", "32")
                .parse()
                .map_err(|_| anyhow::anyhow!("DISPATCH_MAX_CONCURRENCY must be a valid usize"))?,
            dispatch_send_timeout_secs: or_default("DISPATCH_SEND_TIMEOUT_SECS", "30")
                .parse()
                .map_err(|_| anyhow::anyhow!("DISPATCH_SEND_TIMEOUT_SECS must be a valid u64"))?,
        };

        if !is_valid_calling_code(&config.default_calling_code) {
            return Err(anyhow::anyhow!(
                "DEFAULT_CALLING_CODE must look like +<1-3 digits>, got '{}'",
                config.default_calling_code
            ));
        }
        if config.db_acquire_timeout_secs == 0 {
            return Err(anyhow::anyhow!("DB_ACQUIRE_TIMEOUT_SECS must be at least 1"));
        }
        if config.dispatch_max_concurrency == 0 {
            return Err(anyhow::anyhow!("DISPATCH_MAX_CONCURRENCY must be at least 1"));
        }

        Ok(config)
    }
}

fn is_valid_calling_code(code: &str) -> bool {
    code.strip_prefix('+').is_some_and(|digits| {
        (1..=3).contains(&digits.len()) && digits.bytes().all(|b| b.is_ascii_digit())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn base_env() -> HashMap<&'static str, &'static str> {
        HashMap::from([
            ("DATABASE_URL", "postgres://localhost/broadcast"),
            ("TWILIO_ACCOUNT_SID", "AC123"),
            ("TWILIO_AUTH_TOKEN", "secret"),
            ("TWILIO_PHONE_NUMBER", "+15550001111"),
            ("RESEND_API_KEY", "re_test"),
            ("EMAIL_FROM", "news@example.com"),
        ])
    }

    fn load(env: &HashMap<&'static str, &'static str>) -> anyhow::Result<AppConfig> {
        AppConfig::from_lookup(|key| env.get(key).map(|v| v.to_string()))
    }

    #[test]
    fn test_defaults_applied() {
        let config = load(&base_env()).unwrap();
        assert_eq!(config.port, 5000);
        assert_eq!(config.db_max_connections, 10);
        assert_eq!(config.db_acquire_timeout_secs, 5);
        assert_eq!(config.default_calling_code, "+94");
        assert_eq!(config.dispatch_max_concurrency, 32);
        assert_eq!(config.dispatch_send_timeout_secs, 30);
        assert_eq!(config.twilio_api_base, "https://api.twilio.com");
        assert_eq!(config.resend_api_base, "https://api.resend.com");
    }

    #[test]
    fn test_missing_required_var_rejected() {
        let mut env = base_env();
        env.remove("TWILIO_AUTH_TOKEN");
        let err = load(&env).unwrap_err();
        assert!(err.to_string().contains("TWILIO_AUTH_TOKEN"));
    }

    #[test]
    fn test_blank_required_var_rejected() {
        let mut env = base_env();
        env.insert("EMAIL_FROM", "   ");
        assert!(load(&env).is_err());
    }

    #[test]
    fn test_invalid_port_rejected() {
        let mut env = base_env();
        env.insert("PORT", "not-a-port");
        let err = load(&env).unwrap_err();
        assert!(err.to_string().contains("PORT"));
    }

    #[test]
    fn test_calling_code_validation() {
        let mut env = base_env();
        env.insert("DEFAULT_CALLING_CODE", "+1");
        assert_eq!(load(&env).unwrap().default_calling_code, "+1");

        env.insert("DEFAULT_CALLING_CODE", "94");
        assert!(load(&env).is_err());

        env.insert("DEFAULT_CALLING_CODE", "+9412");
        assert!(load(&env).is_err());
    }

    #[test]
    fn test_acquire_timeout_override_and_zero_rejected() {
        let mut env = base_env();
        env.insert("DB_ACQUIRE_TIMEOUT_SECS", "12");
        assert_eq!(load(&env).unwrap().db_acquire_timeout_secs, 12);

        env.insert("DB_ACQUIRE_TIMEOUT_SECS", "0");
        let err = load(&env).unwrap_err();
        assert!(err.to_string().contains("DB_ACQUIRE_TIMEOUT_SECS"));
    }

    #[test]
    fn test_zero_concurrency_rejected() {
        let mut env = base_env();
        env.insert("DISPATCH_MAX_CONCURRENCY", "0");
        assert!(load(&env).is_err());
    }
}
