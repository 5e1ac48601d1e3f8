use gemchat::ai::GeminiProvider;
use gemchat::config::{ProviderConfig, ServerConfig, init_tracing, load_dotenv};
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    load_dotenv();
    init_tracing();

    let provider = ProviderConfig::from_env()?;
    let server = ServerConfig::from_env()?;
    tracing::info!(model = %provider.model, "starting gemchat proxy");

    gemchat::server::serve(Arc::new(GeminiProvider::new(provider)), server).await
}
