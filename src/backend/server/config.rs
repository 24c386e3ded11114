/**
 * Database Setup
 *
 * Opens the PostgreSQL pool named by `DATABASE_URL` and brings the schema up
 * to date. Without a URL the server runs on the in-memory stores.
 *
 * # Error Handling
 *
 * A connection failure is fatal: falling back to memory would silently drop
 * every write. A failed migration is logged and startup continues, since the
 * schema may already be current.
 */

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

const MAX_CONNECTIONS: u32 = 10;

/// Connect to PostgreSQL and run pending migrations
///
/// # Example
///
/// ```rust,no_run
/// use noteshare::backend::server::config::load_database;
///
/// # async fn example() -> Result<(), sqlx::Error> {
/// let pool = load_database("postgres://localhost/noteshare").await?;
/// # Ok(())
/// # }
/// ```
pub async fn load_database(database_url: &str) -> Result<PgPool, sqlx::Error> {
    tracing::info!("Connecting to database...");

    let pool = PgPoolOptions::new()
        .max_connections(MAX_CONNECTIONS)
        .connect(database_url)
        .await
        .map_err(|e| {
            tracing::error!("Failed to create database connection pool: {:?}", e);
            e
        })?;

    tracing::info!("Database connection pool created successfully");

    tracing::info!("Running database migrations...");
    match sqlx::migrate!().run(&pool).await {
        Ok(()) => tracing::info!("Database migrations completed successfully"),
        Err(e) => {
            tracing::error!("Failed to run database migrations: {}", e);
            tracing::warn!("Continuing without migrations - database might not be up to date");
        }
    }

    Ok(pool)
}
