//! Bedrock install CLI
//!
//! Runs the install sequencer from the command line, reports migration status,
//! or serves `GET /install` over HTTP.

use anyhow::Context;
use bedrock::config::DEFAULT_CONFIG_PATH;
use bedrock::{BedrockConfig, InstallationReport, MigrationRegistry, MigrationStatus, StepOutcome};
use clap::{Parser, Subcommand, ValueEnum};
use colored::{ColoredString, Colorize};
use std::path::PathBuf;
use std::process;

#[derive(Parser)]
#[command(name = "bedrock-install")]
#[command(about = "Idempotent database install/bootstrap for Bedrock applications")]
#[command(version)]
struct Cli {
    /// Database connection URL (overrides config and BEDROCK__DATABASE__URL)
    #[arg(long, global = true)]
    database_url: Option<String>,

    /// Configuration file path
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Quiet output (errors only)
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the installer and print its report
    Install {
        #[arg(long, value_enum, default_value = "text")]
        format: Format,
    },

    /// Show applied and pending migrations
    Status,

    /// Serve GET /install over HTTP
    Serve {
        /// Listen address (overrides server.bind)
        #[arg(long)]
        bind: Option<String>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Text,
    Json,
    Html,
}

fn main() {
    let cli = Cli::parse();

    let filter = if cli.quiet {
        "error"
    } else if cli.verbose {
        "debug"
    } else {
        "info"
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(filter)).init();

    match run(cli) {
        Ok(true) => process::exit(0),
        Ok(false) => process::exit(1),
        Err(e) => {
            eprintln!("{} {:#}", "Error:".red().bold(), e);
            process::exit(1);
        }
    }
}

/// Returns whether the command succeeded.
fn run(cli: Cli) -> anyhow::Result<bool> {
    dotenv::dotenv().ok();

    let mut config = BedrockConfig::load_from(&cli.config)
        .with_context(|| format!("failed to load configuration from {}", cli.config.display()))?;
    if let Some(url) = cli.database_url {
        config.database.url = url;
    }

    let catalog = MigrationRegistry::builtin().context("invalid built-in migration catalog")?;

    match cli.command {
        Commands::Install { format } => {
            let report = bedrock::install(&config, &catalog);
            print_report(&report, format, cli.quiet)?;
            Ok(report.is_success())
        }
        Commands::Status => {
            let status = bedrock::status(&config, &catalog)?;
            print_status(&status);
            Ok(true)
        }
        Commands::Serve { bind } => {
            if let Some(bind) = bind {
                config.server.bind = bind;
            }
            bedrock::server::serve(config, catalog).context("install server failed")?;
            Ok(true)
        }
    }
}

fn badge(outcome: StepOutcome) -> ColoredString {
    let text = format!("[{:>7}]", outcome.as_str());
    match outcome {
        StepOutcome::Success => text.green(),
        StepOutcome::Error => text.red().bold(),
        StepOutcome::Running => text.blue(),
        StepOutcome::Skipped => text.dimmed(),
        StepOutcome::Info => text.cyan(),
    }
}

fn print_report(report: &InstallationReport, format: Format, quiet: bool) -> anyhow::Result<()> {
    match format {
        Format::Json => println!("{}", report.to_json()?),
        Format::Html => println!("{}", bedrock::view::render_install_page(report)),
        Format::Text => {
            if !quiet {
                for step in &report.steps {
                    println!("{} {}: {}", badge(step.outcome), step.label.bold(), step.message);
                }
                println!();
            }
            if report.is_success() {
                println!("{}", report.summary.green().bold());
            } else {
                eprintln!("{}", report.summary.red().bold());
            }
        }
    }
    Ok(())
}

fn print_status(status: &MigrationStatus) {
    println!("\n{}\n", "Migration Status".bold());

    if status.applied.is_empty() {
        println!("Applied Migrations: None");
    } else {
        println!("Applied Migrations ({}):", status.applied.len());
        for record in &status.applied {
            let when = record
                .applied_at()
                .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
                .unwrap_or_else(|| "N/A".to_string());
            println!(
                "  {} {} (batch {}, {})",
                "✓".green(),
                record.identifier(),
                record.batch,
                when
            );
        }
    }

    println!();

    if status.pending.is_empty() {
        println!("Pending Migrations: None");
    } else {
        println!("Pending Migrations ({}):", status.pending.len());
        for id in &status.pending {
            println!("  {} {}", "…".yellow(), id);
        }
    }

    if !status.unknown.is_empty() {
        println!(
            "\n{} recorded without a definition: {}",
            "warning:".yellow().bold(),
            status.unknown.join(", ")
        );
    }

    println!(
        "\nSummary: {} applied, {} pending",
        status.applied.len(),
        status.pending.len()
    );
}
