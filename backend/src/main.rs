use std::net::SocketAddr;
use std::sync::Arc;

use tracing::{info, Level};

use party_signup_backend::config::ServerConfig;
use party_signup_backend::domain::RegistrationService;
use party_signup_backend::rest::{self, AppState};
use party_signup_backend::storage::json::{JsonConnection, RegistrationRepository};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(Level::INFO)
        .init();

    let config = ServerConfig::from_env();
    info!("Using data directory: {}", config.data_dir.display());

    let connection = JsonConnection::new(&config.data_dir)?;
    let repository = RegistrationRepository::new(connection);
    let service = RegistrationService::new(Arc::new(repository));

    let app = rest::router(AppState::new(service));

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Server is running on http://{}", addr);
    info!("Registration endpoint: http://{}/api/register", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
