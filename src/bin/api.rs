use multi_agent_assistant::{
    api::{start_server, ApiState},
    MultiAgentSystem, Settings,
};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables
    dotenv::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let settings = Settings::from_env()?;

    if !settings.has_api_key() {
        warn!("⚠️  GROQ_API_KEY not set in .env; agent answers will report the missing key");
    }

    info!("🚀 Multi-Agent AI Assistant - API Server");
    info!("📍 Port: {}", settings.port);

    let system = Arc::new(MultiAgentSystem::from_settings(&settings)?);
    let state = ApiState::new(system, settings.has_api_key());

    info!("✅ Agents initialized");
    info!("📡 Starting API server...");

    start_server(state, settings.port).await?;

    Ok(())
}
