use std::sync::Arc;

use clap::Parser;
use poem::Server;
use poem::listener::TcpListener;

use ramen_backend::api::build_routes;
use ramen_backend::app_data::AppData;
use ramen_backend::cli::{Cli, Commands, execute_command, migrate};
use ramen_backend::config::{
    ApplicationSettings, BootstrapSettings, init_database, init_logging, migrate_database,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();

    init_logging()?;

    let cli = Cli::parse();
    let bootstrap_settings = BootstrapSettings::from_env()?;
    tracing::debug!("Bootstrap settings: {:?}", bootstrap_settings);

    let command = cli.command();
    if let Commands::Migrate = command {
        return migrate::run_migrations(&bootstrap_settings).await;
    }

    let settings = ApplicationSettings::from_env()?;
    tracing::debug!("Application settings: {:?}", settings);

    let db = init_database(&bootstrap_settings).await?;
    migrate_database(&db).await?;

    let app_data = Arc::new(AppData::init(db, settings));

    if let Commands::Serve = command {
        let address = bootstrap_settings.server_address();
        let app = build_routes(app_data);

        tracing::info!("Starting server on http://{}", address);
        tracing::info!("Swagger UI available at http://{}/swagger", address);

        Server::new(TcpListener::bind(address)).run(app).await?;
        return Ok(());
    }

    execute_command(command, &app_data).await
}
