use lumina_currency::{api::start_server, config::Settings, gemini::GeminiClient};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables
    let settings = Settings::from_env();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    if lumina_currency::config::api_key_from_env().is_none() {
        warn!("GEMINI_API_KEY not set; requests will fail until it is provided");
    }

    info!("Lumina Currency - API Server");
    info!(port = settings.port, model = %settings.model, "Configuration loaded");

    let generator = Arc::new(GeminiClient::new(&settings)?);

    start_server(generator, settings.port).await?;

    Ok(())
}
