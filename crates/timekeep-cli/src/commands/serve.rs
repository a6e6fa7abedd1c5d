use std::path::PathBuf;
use std::sync::Arc;

use clap::Args;
use timekeep_core::api::{create_router, ApiState};
use timekeep_core::Config;
use tracing::info;

#[derive(Args)]
pub struct ServeArgs {
    /// Directory of static assets (index.html, scripts, icons)
    #[arg(long)]
    assets: Option<PathBuf>,
    /// Port; overrides `server.port`
    #[arg(long)]
    port: Option<u16>,
}

pub fn run(args: ServeArgs) -> Result<(), Box<dyn std::error::Error>> {
    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(serve(args))
}

async fn serve(args: ServeArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load_or_default();
    let mut state = ApiState::new();
    if let Some(root) = args.assets {
        state = state.with_assets(root);
    }
    let app = create_router(Arc::new(state));

    let addr = format!(
        "{}:{}",
        config.server.host,
        args.port.unwrap_or(config.server.port)
    );
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await?;
    Ok(())
}
