//! Embedded schema migrations applied at startup.

use diesel::Connection;
use diesel::pg::PgConnection;
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};
use tracing::info;

use crate::domain::ports::RepositoryError;

const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// Apply every pending migration. Idempotent: a migrated database is left
/// untouched.
///
/// Diesel's migration harness is synchronous, so the work runs on the
/// blocking pool.
///
/// # Errors
/// [`RepositoryError::Connection`] when the database is unreachable and
/// [`RepositoryError::Query`] when a migration fails.
pub async fn run_pending_migrations(database_url: &str) -> Result<usize, RepositoryError> {
    let url = database_url.to_owned();
    let applied = tokio::task::spawn_blocking(move || -> Result<usize, RepositoryError> {
        let mut conn = PgConnection::establish(&url)
            .map_err(|err| RepositoryError::connection(err.to_string()))?;
        let versions = conn
            .run_pending_migrations(MIGRATIONS)
            .map_err(|err| RepositoryError::query(format!("migration failed: {err}")))?;
        Ok(versions.len())
    })
    .await
    .map_err(|err| RepositoryError::query(format!("migration task failed: {err}")))??;
    info!(applied, "database migrations complete");
    Ok(applied)
}
