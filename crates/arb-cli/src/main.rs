use clap::{ArgAction, Args, Parser, Subcommand};
use color_eyre::eyre::Result;
use comfy_table::presets::UTF8_BORDERS_ONLY;
use comfy_table::Table;
use tracing::{info, Level};
use tracing_subscriber::EnvFilter;

use alloy::primitives::U256;

mod config;
mod liveness;
mod scheduler;

use crate::config::AppConfig;
use crate::scheduler::ScanReport;

#[derive(Parser, Debug)]
#[command(name = "arb-scanner")]
#[command(about = "Multi-network cyclic arbitrage scanner with endpoint rotation")]
#[command(version)]
struct Cli {
    #[arg(long, short = 'v', action = ArgAction::Count, global = true)]
    verbose: u8,

    #[arg(long, short = 'q', global = true)]
    quiet: bool,

    #[arg(long, global = true, default_value = "config/networks.json")]
    config: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the scan loop until the process is stopped.
    Run(RunArgs),
    /// Execute a single pass over all networks and print a report.
    Scan,
    /// Load and validate the configuration, then print it.
    CheckConfig,
}

#[derive(Args, Debug)]
struct RunArgs {
    /// Enable transaction submission (requires ARB_PRIVATE_KEY).
    #[arg(long)]
    execute: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.quiet)?;

    match cli.command {
        Commands::Run(args) => handle_run(&cli.config, args).await,
        Commands::Scan => handle_scan(&cli.config).await,
        Commands::CheckConfig => handle_check_config(&cli.config),
    }
}

fn init_tracing(verbose: u8, quiet: bool) -> Result<()> {
    let level = if quiet {
        Level::WARN
    } else {
        match verbose {
            0 => Level::INFO,
            1 => Level::DEBUG,
            _ => Level::TRACE,
        }
    };

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level.as_str()))
        .map_err(|e| color_eyre::eyre::eyre!("failed to initialize tracing filter: {e}"))?;

    tracing_subscriber::fmt().with_env_filter(filter).init();
    Ok(())
}

async fn handle_run(config_path: &str, args: RunArgs) -> Result<()> {
    let config: AppConfig = config::load(config_path, args.execute)?;

    if let Some(port) = config.liveness_port {
        tokio::spawn(async move {
            if let Err(e) = liveness::serve(port).await {
                tracing::error!("liveness responder stopped: {e}");
            }
        });
    }

    if config.signer.is_none() {
        info!("no credential bound, running in watch mode");
    }
    scheduler::run_forever(config).await
}

async fn handle_scan(config_path: &str) -> Result<()> {
    let config = config::load(config_path, false)?;
    let reports = scheduler::run_once(config).await?;
    print_scan_report(&reports);
    Ok(())
}

fn handle_check_config(config_path: &str) -> Result<()> {
    let config = config::load(config_path, false)?;

    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    table.set_header(vec![
        "Network", "Chain", "Endpoints", "Pools", "Cycle", "Moat", "Strikes",
    ]);
    for net in &config.networks {
        table.add_row(vec![
            net.name.clone(),
            net.chain_id.to_string(),
            net.endpoints.len().to_string(),
            net.pools.len().to_string(),
            net.cycle.len().to_string(),
            format_native(net.moat_wei),
            if net.can_strike() { "yes" } else { "watch-only" }.to_string(),
        ]);
    }
    println!("{table}");
    Ok(())
}

fn print_scan_report(reports: &[ScanReport]) {
    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    table.set_header(vec!["Network", "Outcome", "Alive", "Balance", "Profit (wei)"]);
    for report in reports {
        table.add_row(vec![
            report.network.clone(),
            if report.ok { "ok" } else { "failed" }.to_string(),
            format!("{}/{}", report.alive, report.total_pools),
            report
                .balance
                .map(format_native)
                .unwrap_or_else(|| "-".to_string()),
            report
                .profit
                .map(|p| p.to_string())
                .unwrap_or_else(|| "-".to_string()),
        ]);
    }
    println!("{table}");
}

/// Renders a wei amount as native units with six decimals.
fn format_native(wei: U256) -> String {
    let unit = U256::from(1_000_000_000_000_000_000u64);
    let whole = wei / unit;
    let micros = ((wei % unit) / U256::from(1_000_000_000_000u64)).to::<u64>();
    format!("{whole}.{micros:06}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_native_pads_fraction() {
        assert_eq!(
            format_native(U256::from(985_000_000_000_000_000u64)),
            "0.985000"
        );
        assert_eq!(format_native(U256::from(1_000_000_000_000u64)), "0.000001");
        assert_eq!(format_native(U256::ZERO), "0.000000");
    }
}
