use anyhow::Result;
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use magpie::agent::Agent;
use magpie::concierge::{RecordUnknownQuestion, RecordUserDetails};
use magpie::notify::{NotificationSink, PushoverSink};
use magpie::persona::Persona;
use magpie::providers::configs::OpenAiProviderConfig;
use magpie::providers::openai::OpenAiProvider;
use magpie::registry::ToolRegistry;

mod routes;
mod state;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();
    dotenv::dotenv().ok();

    let config = OpenAiProviderConfig::from_env()?;
    let provider = Box::new(OpenAiProvider::new(config)?);

    let resources = std::env::var("MAGPIE_RESOURCES").unwrap_or_else(|_| "resources".to_string());
    let name = std::env::var("MAGPIE_PERSONA").unwrap_or_else(|_| "Sora".to_string());
    let persona = Persona::load(&PathBuf::from(resources), &name)?;
    let system_prompt = persona.system_prompt()?;

    let sink: Arc<dyn NotificationSink> = Arc::new(PushoverSink::from_env()?);
    let mut registry = ToolRegistry::new();
    registry.register(Box::new(RecordUserDetails::new(sink.clone())))?;
    registry.register(Box::new(RecordUnknownQuestion::new(sink)))?;

    let agent = Agent::new(provider, Arc::new(registry), system_prompt);
    let state = state::AppState {
        agent: Arc::new(agent),
    };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = routes::configure(state).layer(cors);

    let bind = std::env::var("MAGPIE_BIND").unwrap_or_else(|_| "127.0.0.1:3000".to_string());
    let listener = tokio::net::TcpListener::bind(&bind).await?;
    info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;
    Ok(())
}
