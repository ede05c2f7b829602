use clap::Parser; // for cli
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use selection_explainer::analyzer::Analyzer;
use selection_explainer::clock::SystemClock;
use selection_explainer::config::Args;
use selection_explainer::gemini::GeminiClient;
use selection_explainer::rate_limit::RateLimiter;
use selection_explainer::settings;
use selection_explainer::state::AppState;
use selection_explainer::store::{CounterStore, JsonFileStore};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("selection_explainer=info")),
        )
        .init();

    if let Err(e) = run(Args::parse()).await {
        error!(error = %e, "selection-explainer stopped");
        std::process::exit(1);
    }
}

async fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    let limiter_config = args.limiter_config()?;

    let file_store = JsonFileStore::new(&args.state_file);
    info!(path = %file_store.path().display(), "using state file");
    let store: Arc<dyn CounterStore> = Arc::new(file_store);

    if let Some(key) = args.api_key.as_deref() {
        settings::save_api_key(store.as_ref(), key).await?;
        info!("api key seeded from the command line");
    }

    let gemini = GeminiClient::new(reqwest::Client::new(), &args.api_base, &args.model);
    let analyzer = Analyzer::new(
        store.clone(),
        RateLimiter::new(store.clone(), limiter_config),
        gemini,
        Arc::new(SystemClock),
    );
    let state = Arc::new(AppState { analyzer, store });

    let addr = format!("0.0.0.0:{}", args.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!(port = args.port, "gateway running on http://localhost:{}", args.port);
    info!(model = %args.model, api_base = %args.api_base, "forwarding to Gemini");
    info!(
        "Rate limit: {} requests {}",
        limiter_config.max_requests,
        limiter_config.window_phrase()
    );
    axum::serve(listener, selection_explainer::router(state)).await?;
    Ok(())
}
