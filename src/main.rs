mod config;
mod llm;
mod search;
mod state;
mod verify;
mod web;

use std::sync::Arc;

use tracing::info;

use config::Config;
use llm::LlmClient;
use search::SearchClient;
use state::AppState;
use verify::Pipeline;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load env
    let _ = dotenv::dotenv();
    let config = Config::from_env()?;

    tracing_subscriber::fmt()
        .with_max_level(config.log_level)
        .init();

    // Client handles are built once and shared by every run
    let llm = Arc::new(LlmClient::new(&config)?);
    info!(model = %config.llm_model, "LLM client initialized");

    let search = Arc::new(SearchClient::new(&config)?);
    info!(max_results = config.search_max_results, "Search client initialized");

    let pipeline = Pipeline::new(llm, search, config.eval_delay);
    let state = AppState::new(pipeline, config.max_concurrent_runs);

    info!(
        eval_delay_ms = config.eval_delay.as_millis() as u64,
        max_concurrent_runs = config.max_concurrent_runs,
        "Starting news verification server..."
    );
    web::run_server(&config.bind_addr, state).await
}
