mod commands;
mod context;
mod output;

use std::path::PathBuf;

use anyhow::Result;
use clap::{
    Parser, Subcommand,
    builder::{Styles, styling::AnsiColor},
};
use colored::Colorize;

use commands::{
    links::{self, LinksArgs, handle_links},
    serve::{self, ServeArgs, handle_serve},
};
use context::ProjectContext;
use output::{GlobalOptions, OutputFormat, OutputManager};

#[derive(Parser)]
#[command(name = "facetnav", version, styles = help_styles())]
#[command(
    about = "Faceted search API with navigation links",
    long_about = "Serves search routes whose responses carry ready-made navigation links: \
                  facet buckets that narrow the search, previous/next pages and sort options."
)]
#[command(subcommand_required = true, arg_required_else_help = true)]
struct Cli {
    /// Output format
    #[arg(long, value_enum, default_value = "table")]
    output: OutputFormat,

    /// Suppress output (only errors will be shown)
    #[arg(short = 'q', long)]
    quiet: bool,

    /// Enable verbose output and debug logging (RUST_LOG overrides)
    #[arg(short = 'v', long)]
    verbose: bool,

    /// Disable colored output
    #[arg(long)]
    no_color: bool,

    /// Config file (default ./facetnav.toml)
    #[arg(long, env = "FACETNAV_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the configured search routes over HTTP
    #[command(after_long_help = serve::EXAMPLES)]
    Serve(ServeArgs),

    /// Run one query and print its navigation links
    #[command(after_long_help = links::EXAMPLES)]
    Links(LinksArgs),
}

fn help_styles() -> Styles {
    Styles::styled()
        .header(AnsiColor::Cyan.on_default().bold())
        .usage(AnsiColor::BrightBlue.on_default().bold())
        .literal(AnsiColor::Magenta.on_default())
        .placeholder(AnsiColor::BrightBlack.on_default())
        .error(AnsiColor::Red.on_default().bold())
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "facetnav=debug" } else { "facetnav=info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter)).init();

    if let Err(err) = execute(cli).await {
        eprintln!("{} {err:#}", "error:".red().bold());
        std::process::exit(1);
    }
}

async fn execute(cli: Cli) -> Result<()> {
    let output = OutputManager::new(GlobalOptions {
        output_format: cli.output,
        quiet: cli.quiet,
        verbose: cli.verbose,
        no_color: cli.no_color,
    });
    let ctx = ProjectContext::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Serve(args) => handle_serve(args, &ctx, &output).await,
        Commands::Links(args) => handle_links(args, &ctx, &output).await,
    }
}
