//! Mortalidad Dashboard - Colombia 2019 mortality statistics
//!
//! Loads the DANE death-certificate tables, computes the summary views and
//! serves them as a single tabbed web page.

mod charts;
mod cli;
mod data;
mod geo;
mod pipeline;
mod stats;
mod web;

use anyhow::Context;
use tracing::error;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use cli::CommandLineArgs;
use data::SourceTables;
use pipeline::DashboardContext;
use web::DashboardPage;

#[tokio::main]
async fn main() {
    let args = CommandLineArgs::parse_args();
    init_tracing();

    if let Err(e) = run(args).await {
        error!("fatal: {e:#}");
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

async fn run(args: CommandLineArgs) -> anyhow::Result<()> {
    let tables = SourceTables::load(&args.data_dir)
        .with_context(|| format!("loading sources from {}", args.data_dir.display()))?;
    let ctx = DashboardContext::build(tables).context("building summary tables")?;
    let page = DashboardPage::render(&ctx).context("rendering dashboard page")?;
    web::serve(&args, page).await
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("mortalidad_dashboard=info,tower_http=info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}
