use std::sync::Arc;

use anyhow::{Result, bail};
use clap::Args;
use facetnav::{Endpoint, SearchResponse, parse_query_string};

use crate::context::ProjectContext;
use crate::output::OutputManager;

pub const EXAMPLES: &str = "\
Examples:
  facetnav links 'q=boots&brand=acme'              Links for the first route
  facetnav links 'price.min=10' --route /products  Links for a configured route
  facetnav --output json links 'offset=25'         Full response document
";

#[derive(Args, Debug)]
pub struct LinksArgs {
    /// Query string to search with, without the leading '?'
    #[arg(default_value = "")]
    pub query: String,

    /// Route pattern whose indices are searched (defaults to the first route)
    #[arg(long)]
    pub route: Option<String>,
}

pub async fn handle_links(args: LinksArgs, ctx: &ProjectContext, output: &OutputManager) -> Result<()> {
    let routes = &ctx.config.routes;
    let route = match args.route.as_deref() {
        Some(pattern) => routes.iter().find(|route| route.pattern == pattern),
        None => routes.first(),
    };
    let Some(route) = route else {
        bail!("No route matches {}", args.route.as_deref().unwrap_or("(none configured)"));
    };

    let query = args.query.trim_start_matches('?');
    let request = parse_query_string(query);
    output.verbose(&format!("{} parameter(s) parsed from '{query}'", request.len()));

    let backend = ctx.build_backend()?;
    let endpoint = Endpoint::new(Arc::new(backend), route.indices.clone());
    let result = endpoint.execute(request).await?;

    let response = SearchResponse::from_result(result);
    output.heading(&format!("{} ?{query}", route.pattern));
    output.display(&response)?;
    Ok(())
}
