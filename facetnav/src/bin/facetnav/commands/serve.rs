use anyhow::{Context, Result};
use clap::Args;
use log::info;
use tokio::net::TcpListener;

use crate::context::ProjectContext;
use crate::output::OutputManager;

pub const EXAMPLES: &str = "\
Examples:
  facetnav serve                          Serve routes from ./facetnav.toml
  facetnav serve --bind 0.0.0.0:9000      Override the listen address
  facetnav --config shop.toml serve       Use another config file
";

#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Address to listen on (overrides [server] bind)
    #[arg(long)]
    pub bind: Option<String>,
}

pub async fn handle_serve(args: ServeArgs, ctx: &ProjectContext, output: &OutputManager) -> Result<()> {
    let bind = args.bind.unwrap_or_else(|| ctx.config.server.bind.clone());

    output.verbose(&format!("config: {}", ctx.config_path.display()));
    output.verbose(&format!("fixture: {}", ctx.fixture_path().display()));

    let api = ctx.build_api()?;
    for route in api.routes() {
        output.info(&format!("{} -> [{}]", route.pattern(), route.indices().join(", ")));
    }
    let router = api.into_router()?;

    let listener = TcpListener::bind(&bind)
        .await
        .with_context(|| format!("Failed to bind {bind}"))?;
    let addr = listener.local_addr()?;
    output.success(&format!("Listening on http://{addr}"));
    info!("listening on {addr}");

    axum::serve(listener, router).await.context("Server error")?;
    Ok(())
}
