use clap::Args;
use storefront_app::{
    database::{self, Db},
    domain::users::{
        PgUsersService, UsersService,
        records::{Role, UserUuid},
    },
};

#[derive(Debug, Args)]
pub(crate) struct PromoteUserArgs {
    /// PostgreSQL connection string
    #[arg(long, env = "DATABASE_URL", hide_env_values = true)]
    database_url: String,

    /// User to grant the admin role
    #[arg(long)]
    uuid: UserUuid,
}

pub(crate) async fn run(args: PromoteUserArgs) -> Result<(), String> {
    let pool = database::connect(&args.database_url)
        .await
        .map_err(|error| format!("failed to connect to database: {error}"))?;

    let user = PgUsersService::new(Db::new(pool))
        .set_role(args.uuid, Role::Admin)
        .await
        .map_err(|error| format!("failed to promote user: {error}"))?;

    println!("user_uuid: {}", user.uuid);
    println!("role: {}", user.role);

    Ok(())
}
