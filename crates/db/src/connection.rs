use std::time::Duration;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use anyhow::Result;
use tracing::info;

pub struct DatabaseConnection {
    pool: PgPool,
}

impl DatabaseConnection {
    pub async fn new(database_url: &str, max_connections: u32) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(Duration::from_secs(5))
            .connect(database_url)
            .await?;
        info!("🗄️ Connected to PostgreSQL (max {} connections)", max_connections);
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub async fn health_check(&self) -> Result<bool> {
        let one: i32 = sqlx::query_scalar("SELECT 1").fetch_one(&self.pool).await?;
        Ok(one == 1)
    }

    /// Applies the embedded scoring schema migrations.
    pub async fn run_migrations(&self) -> Result<()> {
        let migrator = sqlx::migrate!("./migrations");
        migrator.run(&self.pool).await?;
        info!("🗄️ Applied {} scoring schema migrations", migrator.iter().count());
        Ok(())
    }
}
