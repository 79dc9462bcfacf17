use clap::Args;
use jiff::SignedDuration;
use storefront_app::{
    auth::{JwtCodec, PgAuthService},
    database::{self, Db},
    domain::users::{PgUsersService, UsersService, records::UserUuid},
};

#[derive(Debug, Args)]
pub(crate) struct IssueTokenArgs {
    /// PostgreSQL connection string
    #[arg(long, env = "DATABASE_URL", hide_env_values = true)]
    database_url: String,

    /// Secret used to sign bearer tokens
    #[arg(long, env = "JWT_SECRET", hide_env_values = true)]
    jwt_secret: String,

    /// User the token authenticates as
    #[arg(long)]
    user_uuid: UserUuid,

    /// Token lifetime in hours
    #[arg(long, env = "JWT_TTL_HOURS", default_value_t = 720)]
    ttl_hours: u32,
}

pub(crate) async fn run(args: IssueTokenArgs) -> Result<(), String> {
    if args.jwt_secret.trim().is_empty() {
        return Err("jwt-secret cannot be empty".to_string());
    }

    if args.ttl_hours == 0 {
        return Err("ttl-hours must be at least 1".to_string());
    }

    let pool = database::connect(&args.database_url)
        .await
        .map_err(|error| format!("failed to connect to database: {error}"))?;

    let db = Db::new(pool);

    let user = PgUsersService::new(db.clone())
        .get_user(args.user_uuid)
        .await
        .map_err(|error| format!("failed to load user: {error}"))?;

    let codec = JwtCodec::new(
        &args.jwt_secret,
        SignedDuration::from_hours(i64::from(args.ttl_hours)),
    );

    let token = PgAuthService::new(db, codec)
        .issue_token(&user)
        .map_err(|error| format!("failed to issue token: {error}"))?;

    println!("user_uuid: {}", user.uuid);
    println!("role: {}", user.role);
    println!("token: {token}");

    Ok(())
}
