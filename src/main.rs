// Main entry point - Dependency injection and server setup
use std::{net::SocketAddr, sync::Arc};

use anyhow::Context;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use fit_compare::application::chart_synchronizer::ChartSynchronizer;
use fit_compare::application::comparison_service::ComparisonService;
use fit_compare::application::constants_source::BaseConstantSource;
use fit_compare::infrastructure::config::{
    load_analysis_config, load_server_config, ConstantsConfig, ConstantsSourceKind,
};
use fit_compare::infrastructure::constants::{HttpBaseConstants, StaticBaseConstants};
use fit_compare::presentation::{app_state::AppState, router};

fn constants_source(config: &ConstantsConfig) -> anyhow::Result<Arc<dyn BaseConstantSource>> {
    match config.source {
        ConstantsSourceKind::Static => Ok(Arc::new(StaticBaseConstants::new(
            config.r#static.into(),
        ))),
        ConstantsSourceKind::Http => {
            let url = config
                .url
                .clone()
                .context("constants.url is required when constants.source = \"http\"")?;
            Ok(Arc::new(HttpBaseConstants::new(url, config.profile.clone())))
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // Load configuration
    let analysis_config = load_analysis_config().context("Failed to load config/analysis")?;
    let server_config = load_server_config().context("Failed to load config/server")?;

    // Create constant source (infrastructure layer)
    let constants = constants_source(&analysis_config.constants)?;

    // Create services (application layer)
    let comparison_service = ComparisonService::new(
        constants,
        analysis_config.thresholds,
        ChartSynchronizer::new(analysis_config.axes.title_table()),
    );

    // Create application state
    let state = Arc::new(AppState { comparison_service });

    // Build router (presentation layer)
    let app = router(state).layer(TraceLayer::new_for_http());

    // Start server
    let addr: SocketAddr = server_config
        .bind_addr
        .parse()
        .with_context(|| format!("Invalid bind address {}", server_config.bind_addr))?;
    tracing::info!("Starting fit-compare service on {}", addr);

    axum::serve(tokio::net::TcpListener::bind(addr).await?, app).await?;

    Ok(())
}
