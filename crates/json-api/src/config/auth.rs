//! Auth Config

use clap::Args;

/// Bearer token settings.
#[derive(Debug, Args)]
pub struct AuthConfig {
    /// HS256 signing secret for bearer tokens
    #[arg(long, env = "JWT_SECRET", hide_env_values = true)]
    pub jwt_secret: String,

    /// Lifetime of issued tokens in hours
    #[arg(long, env = "JWT_TTL_HOURS", default_value_t = 720)]
    pub jwt_ttl_hours: i64,
}
