use std::env;

use dotenv::dotenv;
use sqlx::{Executor, Pool, Postgres};

pub async fn establish_connection() -> anyhow::Result<Pool<Postgres>> {
    dotenv().ok();

    let db_url = env::var("DATABASE_URL")?;

    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(10)
        .connect(&db_url)
        .await?;

    Ok(pool)
}

/// Applies the embedded schema. Statements are idempotent so this is safe to
/// run on every deploy (`server migrate`).
pub async fn apply_schema(pool: &Pool<Postgres>) -> anyhow::Result<()> {
    pool.execute(include_str!("../schema.sql")).await?;
    Ok(())
}
