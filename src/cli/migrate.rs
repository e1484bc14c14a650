use crate::config::{BootstrapSettings, init_database, migrate_database};

/// Connect to the configured database and apply every pending migration
///
/// Does not build AppData, so application secrets are not required.
pub async fn run_migrations(bootstrap_settings: &BootstrapSettings) -> Result<(), Box<dyn std::error::Error>> {
    tracing::info!("Running database migrations...");

    let db = init_database(bootstrap_settings).await?;
    migrate_database(&db).await?;

    tracing::info!("All migrations completed successfully");
    Ok(())
}
