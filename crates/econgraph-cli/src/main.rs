//! EconGraph CLI tool.
//!
//! Runs relationship network analyses over snapshot files and lists the
//! available kernels and configuration.

use anyhow::Context;
use clap::{Parser, Subcommand};
use econgraph::catalog::domains;
use econgraph::prelude::*;
use econgraph_core::logging::LogLevel;
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "econgraph")]
#[command(version, about = "Transaction graph fraud analysis", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze the relationship network of one account
    Analyze {
        /// Snapshot JSON file
        #[arg(short, long)]
        snapshot: PathBuf,

        /// Target account ID
        #[arg(short, long)]
        target: String,

        /// Guild to correlate, most used first (repeatable)
        #[arg(short, long = "guild")]
        guilds: Vec<String>,

        /// TOML configuration file (defaults to environment configuration)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Pretty-print the JSON result
        #[arg(long)]
        pretty: bool,
    },

    /// List available kernels
    Kernels {
        /// Filter by domain (graph, compliance)
        #[arg(short, long)]
        domain: Option<String>,
    },

    /// Print or write the default configuration
    Config {
        /// Write to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Analyze {
            snapshot,
            target,
            guilds,
            config,
            pretty,
        } => {
            let config = match config {
                Some(path) => AnalysisConfig::from_file(&path)
                    .with_context(|| format!("loading config {}", path.display()))?,
                None => AnalysisConfig::from_env()?,
            };
            init_logging(&config, cli.verbose)?;
            cmd_analyze(config, &snapshot, &target, &guilds, pretty).await?;
        }

        Commands::Kernels { domain } => {
            init_logging(&AnalysisConfig::default(), cli.verbose)?;
            cmd_kernels(domain.as_deref())?;
        }

        Commands::Config { output } => {
            init_logging(&AnalysisConfig::default(), cli.verbose)?;
            cmd_config(output)?;
        }
    }

    Ok(())
}

fn init_logging(config: &AnalysisConfig, verbose: bool) -> anyhow::Result<()> {
    let mut logging = config.logging.clone();
    if verbose {
        logging = logging.with_level(LogLevel::Debug);
    }
    logging.init()?;
    Ok(())
}

async fn cmd_analyze(
    config: AnalysisConfig,
    snapshot: &Path,
    target: &str,
    guilds: &[String],
    pretty: bool,
) -> anyhow::Result<()> {
    let provider = InMemoryProvider::from_file(snapshot)
        .with_context(|| format!("loading snapshot {}", snapshot.display()))?;
    let as_of = provider.as_of();
    let analyzer = NetworkAnalyzer::with_config(Arc::new(provider), config);

    let top_guilds = (!guilds.is_empty()).then_some(guilds);
    let network = analyzer
        .analyze_at(target, top_guilds, as_of)
        .await
        .with_context(|| format!("analyzing {}", target))?;

    let json = if pretty {
        serde_json::to_string_pretty(&network)?
    } else {
        serde_json::to_string(&network)?
    };
    println!("{}", json);

    tracing::info!(
        target_user = target,
        clusters = network.suspicious_clusters.len(),
        "Analysis written to stdout"
    );
    Ok(())
}

fn cmd_kernels(domain_filter: Option<&str>) -> anyhow::Result<()> {
    let registry = KernelRegistry::new();
    econgraph::register_all(&registry)?;

    let filter = match domain_filter {
        Some(name) => Some(
            Domain::parse(name)
                .with_context(|| format!("unknown domain '{}' (expected graph or compliance)", name))?,
        ),
        None => None,
    };

    println!("╔══════════════════════════════════════════════════════════════════╗");
    println!("║              EconGraph Kernel Catalogue                          ║");
    println!("╚══════════════════════════════════════════════════════════════════╝\n");

    for info in domains() {
        if filter.is_some_and(|d| d != info.domain) {
            continue;
        }
        println!("┌─────────────────────────────────────────────────────────────────┐");
        println!("│ {} ({} kernels)", info.name, info.kernel_count);
        println!("│ {}", info.description);
        println!("├─────────────────────────────────────────────────────────────────┤");
        for kernel in registry.by_domain(info.domain) {
            println!(
                "│  {:<32} {:<24} {}",
                kernel.id, kernel.complexity, kernel.description
            );
        }
        println!("└─────────────────────────────────────────────────────────────────┘\n");
    }

    let stats = registry.stats();
    println!("Total: {} kernels", stats.total);
    Ok(())
}

fn cmd_config(output: Option<PathBuf>) -> anyhow::Result<()> {
    let config = AnalysisConfig::default();
    match output {
        Some(path) => {
            config
                .to_file(&path)
                .with_context(|| format!("writing {}", path.display()))?;
            println!("Wrote default configuration to {}", path.display());
        }
        None => print!("{}", config.to_toml()?),
    }
    Ok(())
}
