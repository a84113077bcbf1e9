use anyhow::Result;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use hotjar::api::{self, AppState, SNIPPET_PATH};
use hotjar::config::Config;
use hotjar::snippet::SnippetAsset;
use hotjar::visibility::VisibilityMatcher;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("hotjar=info,tower_http=info")),
        )
        .init();

    // Load configuration
    let config = Config::from_env()?;
    info!(
        account = %config.tracking.account_id,
        snippet_version = %config.tracking.snippet_version,
        "Loaded configuration"
    );
    info!(
        page_visibility = %config.tracking.page_visibility,
        pages = config.tracking.pages.len(),
        role_visibility = %config.tracking.role_visibility,
        roles = config.tracking.roles.len(),
        "Visibility rules"
    );

    // Build the snippet once; it only changes with the configuration
    let asset = SnippetAsset::new(&config.tracking, config.performance.compact_policy());
    info!(compact = asset.is_compact(), etag = %asset.etag(), "Built snippet");

    let state = Arc::new(AppState::new(
        config.tracking.clone(),
        VisibilityMatcher::new(config.site.front_path.clone()),
        asset,
        config.snippet.max_age_secs,
    ));
    let router = api::create_router(state);

    let addr = format!("{}:{}", config.api_server.host, config.api_server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("🚀 Snippet server listening on http://{}", addr);
    info!("   - Snippet available at http://{}{}", addr, SNIPPET_PATH);
    info!("   - Tracking decisions at http://{}/api/tracking", addr);

    axum::serve(listener, router).await?;

    Ok(())
}
