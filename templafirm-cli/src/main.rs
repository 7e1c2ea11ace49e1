//! Templafirm: render infrastructure-as-code snippets from provider templates.
//!
//! # Usage
//!
//! ```text
//! templafirm providers [--json]
//! templafirm templates [PROVIDER] [--json]
//! templafirm render <RESOURCE> [--provider <key>] [--input KEY=VALUE]...
//!                   [--inputs-file <path>] [--output <path>] [--lock-timeout <secs>]
//! ```
//!
//! Every subcommand accepts `--register KEY=METADATA_PATH` (repeatable) to add
//! providers from metadata files on top of the built-in ones.

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::{
    providers::ProvidersArgs, render::RenderArgs, templates::TemplatesArgs, Registration,
};

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "templafirm",
    version,
    about = "Render infrastructure snippets from versioned provider templates",
    long_about = None,
)]
struct Cli {
    /// Register an extra provider from a metadata file (KEY=METADATA_PATH).
    /// Overrides a built-in provider with the same key.
    #[arg(long = "register", value_name = "KEY=PATH", global = true)]
    register: Vec<Registration>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List registered providers.
    Providers(ProvidersArgs),

    /// List the resource templates of a provider.
    Templates(TemplatesArgs),

    /// Render a resource template to stdout or to a file.
    Render(RenderArgs),
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let registry = commands::build_registry(&cli.register).await?;
    match cli.command {
        Commands::Providers(args) => args.run(registry).await,
        Commands::Templates(args) => args.run(registry).await,
        Commands::Render(args) => args.run(registry).await,
    }
}
