/// Room API configuration, loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// PostgreSQL connection string.
    pub database_url: String,
    /// Expected `iss` claim on identity tokens.
    pub identity_issuer: String,
    /// HS256 secret shared with the identity provider.
    pub identity_secret: String,
    /// Port the HTTP server binds to.
    pub port: u16,
    /// Fallback UI language for new profiles (`en` or `vi`).
    pub default_language: String,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Panics with a descriptive message if a required variable is missing.
    pub fn from_env() -> Self {
        Self {
            database_url: required_var("DATABASE_URL"),
            identity_issuer: required_var("IDENTITY_ISSUER"),
            identity_secret: required_var("IDENTITY_SECRET"),
            port: std::env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(4100),
            default_language: std::env::var("DEFAULT_LANGUAGE")
                .ok()
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| "en".to_string()),
        }
    }
}

fn required_var(name: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| panic!("{name} env var is required"))
}
