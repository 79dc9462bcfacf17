//! Throwaway Postgres databases for service tests.
//!
//! One container is started per test binary. Migrations run once into a
//! template database and every [`TestDb`] is a fresh copy of it, so a test
//! sees the full schema without paying for the migrations again.

use once_cell::sync::Lazy;
use sqlx::{Connection, PgConnection, PgPool, postgres::PgPoolOptions};
use testcontainers::{ContainerAsync, ImageExt, runners::AsyncRunner};
use testcontainers_modules::postgres::Postgres as PostgresImage;
use tokio::sync::{Mutex, OnceCell};
use uuid::Uuid;

const USER: &str = "storefront";
const PASSWORD: &str = "storefront";
const TEMPLATE: &str = "storefront_template";

/// Connections per test database. Services under test hold at most a few.
const MAX_CONNECTIONS: u32 = 5;

static HOST: Lazy<String> = Lazy::new(|| {
    std::env::var("TESTCONTAINERS_HOST_OVERRIDE").unwrap_or_else(|_| "localhost".to_string())
});

static SERVER: OnceCell<Server> = OnceCell::const_new();

/// Postgres refuses to copy a template that another copy is reading from.
static COPY_LOCK: Mutex<()> = Mutex::const_new(());

struct Server {
    // Held so the container outlives every test in the binary.
    _container: ContainerAsync<PostgresImage>,
    port: u16,
}

impl Server {
    async fn start() -> Self {
        let container = PostgresImage::default()
            .with_user(USER)
            .with_password(PASSWORD)
            .with_db_name(TEMPLATE)
            .start()
            .await
            .expect("postgres container should start");

        let port = container
            .get_host_port_ipv4(5432)
            .await
            .expect("postgres port should be mapped");

        let server = Self {
            _container: container,
            port,
        };

        let template = PgPool::connect(&server.url(TEMPLATE))
            .await
            .expect("template database should accept connections");

        sqlx::migrate!("../../migrations")
            .run(&template)
            .await
            .expect("migrations should apply to the template");

        template.close().await;

        server
    }

    fn url(&self, database: &str) -> String {
        format!(
            "postgresql://{USER}:{PASSWORD}@{host}:{port}/{database}",
            host = *HOST,
            port = self.port,
        )
    }

    async fn copy_template(&self, database: &str) -> Result<(), sqlx::Error> {
        let _guard = COPY_LOCK.lock().await;

        let mut admin = PgConnection::connect(&self.url("postgres")).await?;

        sqlx::query(&format!(r#"CREATE DATABASE "{database}" TEMPLATE {TEMPLATE}"#))
            .execute(&mut admin)
            .await?;

        admin.close().await
    }
}

/// A migrated database of its own, left behind in the container when the
/// test ends.
#[derive(Debug, Clone)]
pub struct TestDb {
    pool: PgPool,
    name: String,
}

impl TestDb {
    pub async fn new() -> Self {
        let server = SERVER.get_or_init(Server::start).await;
        let name = database_name(Uuid::now_v7());

        server
            .copy_template(&name)
            .await
            .expect("template copy should succeed");

        let pool = PgPoolOptions::new()
            .max_connections(MAX_CONNECTIONS)
            .connect(&server.url(&name))
            .await
            .expect("test database should accept connections");

        Self { pool, name }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Names are interpolated into DDL, so they are built only from a uuid.
fn database_name(id: Uuid) -> String {
    format!("storefront_{}", id.simple())
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;

    #[test]
    fn database_names_are_plain_identifiers() {
        let name = database_name(Uuid::now_v7());

        assert!(name.starts_with("storefront_"));
        assert!(name.len() <= 63, "postgres truncates longer identifiers");
        assert!(name.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_'));
    }

    #[tokio::test]
    async fn copies_carry_the_schema_but_not_the_data() -> TestResult {
        let first = TestDb::new().await;
        let second = TestDb::new().await;

        assert_ne!(first.name(), second.name());

        sqlx::query("INSERT INTO users (uuid, email, name) VALUES ($1, 'nami@example.com', 'Nami')")
            .bind(Uuid::now_v7())
            .execute(first.pool())
            .await?;

        let users: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(second.pool())
            .await?;

        assert_eq!(users, 0);

        Ok(())
    }
}
