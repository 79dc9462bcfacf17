use clap::Args;
use storefront_app::{
    database::{self, Db},
    domain::users::{
        PgUsersService, UsersService,
        data::NewUser,
        records::{Role, UserUuid},
    },
};

#[derive(Debug, Args)]
pub(crate) struct CreateUserArgs {
    /// PostgreSQL connection string
    #[arg(long, env = "DATABASE_URL", hide_env_values = true)]
    database_url: String,

    /// Login email, stored lower-cased
    #[arg(long)]
    email: String,

    /// Display name
    #[arg(long)]
    name: String,

    /// `customer` or `admin`
    #[arg(long, default_value = "customer")]
    role: Role,
}

pub(crate) async fn run(args: CreateUserArgs) -> Result<(), String> {
    let pool = database::connect(&args.database_url)
        .await
        .map_err(|error| format!("failed to connect to database: {error}"))?;

    let user = PgUsersService::new(Db::new(pool))
        .create_user(NewUser {
            uuid: UserUuid::new(),
            email: args.email,
            name: args.name,
            role: args.role,
        })
        .await
        .map_err(|error| format!("failed to create user: {error}"))?;

    println!("user_uuid: {}", user.uuid);
    println!("email: {}", user.email);
    println!("role: {}", user.role);

    Ok(())
}
