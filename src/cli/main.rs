// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * ReconHub - Reconnaissance Scan CLI
 * Runs single scans and administers the per-type scan toggles
 *
 * (c) 2026 Bountyy Oy
 */

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

use reconhub::config::{load_config_with_overrides, JsonFileConfigStore, ScanGate};
use reconhub::persistence::{JsonlScanSink, ScanService};
use reconhub::{AppConfig, DispatchError, ScanDispatcher, ScanRequest, ScanType, ScannerRegistry};

/// ReconHub - reconnaissance scan orchestration
#[derive(Parser)]
#[command(name = "reconhub")]
#[command(author = "Bountyy Oy <info@bountyy.fi>")]
#[command(version)]
#[command(about = "Recon scans behind one dispatcher: IP, ports, WHOIS, DNS, subdomains, ASN, phishing, tech stack, usernames.", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Quiet mode - only show errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Configuration file (toml, yaml or json)
    #[arg(short, long, global = true, env = "RECONHUB_CONFIG")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a scan against one or more targets
    Scan {
        /// Scan type, e.g. dns_lookup or nmap
        scan_type: String,

        /// Target(s): host, IP, domain, URL, ASN or username depending on the scan type
        #[arg(required = true)]
        targets: Vec<String>,

        /// Identity recorded with the scan
        #[arg(short, long, env = "RECONHUB_REQUESTER")]
        requester: Option<String>,

        /// Do not append results to the scan log
        #[arg(long)]
        no_record: bool,
    },

    /// List scan types with their enabled state
    List {
        /// Show detailed information
        #[arg(short, long)]
        verbose: bool,
    },

    /// Show or change the scan type toggles
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Show recorded scans
    History {
        /// Number of most recent records to show
        #[arg(short, long, default_value = "20")]
        limit: usize,

        /// Only show this scan type
        #[arg(short = 't', long)]
        scan_type: Option<String>,
    },

    /// Generate sample configuration file
    Init {
        /// Output path for config file
        #[arg(short, long, default_value = "reconhub.toml")]
        output: PathBuf,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the effective toggle values
    Show,
    /// Store raw key=value pairs, e.g. scan_nmap=false
    Set {
        #[arg(required = true)]
        pairs: Vec<String>,
    },
    /// Enable a scan type
    Enable { scan_type: String },
    /// Disable a scan type
    Disable { scan_type: String },
}

fn init_logging(cli: &Cli, config: &AppConfig) {
    let default_level = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        config.observability.log_level.as_str()
    };

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(config.observability.log_target)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = load_config_with_overrides(cli.config.as_deref())
        .context("Failed to load configuration")?;
    init_logging(&cli, &config);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .thread_name("reconhub-worker")
        .enable_all()
        .build()?;

    runtime.block_on(async_main(cli, config))
}

async fn async_main(cli: Cli, config: AppConfig) -> Result<()> {
    match cli.command {
        Commands::Scan {
            scan_type,
            targets,
            requester,
            no_record,
        } => run_scans(&config, scan_type, targets, requester, no_record).await,
        Commands::List { verbose } => list_scan_types(&config, verbose).await,
        Commands::Config { action } => manage_config(&config, action).await,
        Commands::History { limit, scan_type } => show_history(&config, limit, scan_type).await,
        Commands::Init { output } => generate_config(output),
    }
}

fn build_registry(config: &AppConfig) -> Result<Arc<ScannerRegistry>> {
    let registry = ScannerRegistry::with_defaults(&config.scanners)?;
    Ok(Arc::new(registry))
}

fn build_gate(config: &AppConfig) -> ScanGate {
    ScanGate::new(Arc::new(JsonFileConfigStore::new(
        &config.storage.config_store_path,
    )))
}

async fn run_scans(
    config: &AppConfig,
    scan_type: String,
    targets: Vec<String>,
    requester: Option<String>,
    no_record: bool,
) -> Result<()> {
    let dispatcher = ScanDispatcher::new(build_registry(config)?, build_gate(config));
    let service = ScanService::new(
        dispatcher,
        JsonlScanSink::new(&config.storage.scan_log_path),
    );

    let requested = targets.len();
    let targets = unique_targets(targets);
    if targets.len() < requested {
        debug!("Dropped {} duplicate target(s)", requested - targets.len());
    }

    info!("Running {} scan against {} target(s)", scan_type, targets.len());

    let runs = targets.iter().map(|target| {
        let mut request = ScanRequest::new(scan_type.clone(), target.clone());
        if let Some(requester) = &requester {
            request = request.with_requester(requester.clone());
        }
        let service = &service;
        async move {
            let outcome = if no_record {
                service.dispatcher().dispatch(&request).await.map_err(anyhow::Error::from)
            } else {
                service.run(&request).await.map(|(_, result)| result)
            };
            (request, outcome)
        }
    });

    let mut report = serde_json::Map::new();
    let mut rejected = 0;

    for (request, outcome) in futures::future::join_all(runs).await {
        match outcome {
            Ok(result) => {
                report.insert(request.target, result.into_value());
            }
            Err(e) => {
                rejected += 1;
                match e.downcast_ref::<DispatchError>() {
                    Some(rejection) => error!(
                        "{} rejected ({}): {}",
                        request.target,
                        rejection.status_code(),
                        rejection
                    ),
                    None => error!("{}: {:#}", request.target, e),
                }
            }
        }
    }

    if report.len() == 1 && targets.len() == 1 {
        if let Some((_, result)) = report.into_iter().next() {
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
    } else if !report.is_empty() {
        println!("{}", serde_json::to_string_pretty(&Value::Object(report))?);
    }

    if rejected > 0 {
        bail!("{} of {} scan(s) rejected", rejected, targets.len());
    }
    Ok(())
}

/// Targets in first-seen order, each once; the report is keyed by target
fn unique_targets(targets: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    targets
        .into_iter()
        .filter(|target| seen.insert(target.trim().to_string()))
        .collect()
}

async fn list_scan_types(config: &AppConfig, verbose: bool) -> Result<()> {
    let registry = build_registry(config)?;
    let snapshot = build_gate(config).snapshot(&registry).await?;

    println!("Available Scan Types ({} total)", registry.count());
    println!("{}", "=".repeat(70));

    for metadata in registry.all_metadata() {
        let enabled = snapshot.get(&metadata.scan_type).copied().unwrap_or(true);
        let state = if enabled { "enabled" } else { "disabled" };

        if verbose {
            println!("\n[{}] {}", metadata.scan_type, metadata.display_name);
            println!("  State:       {}", state);
            println!("  Description: {}", metadata.description);
            println!("  Strategy:    {:?}", metadata.strategy);
            println!("  Target:      {:?}", metadata.target_kind);
            if let Some(budget) = metadata.budget_secs {
                println!("  Budget:      {}s", budget);
            }
            if !metadata.dependencies.is_empty() {
                println!("  Requires:    {}", metadata.dependencies.join(", "));
            }
        } else {
            println!("{:12} {:9} {}", metadata.scan_type.as_str(), state, metadata.description);
        }
    }

    println!("\n{}", "=".repeat(70));
    println!("Use `reconhub config enable|disable <scan_type>` to change a toggle");

    Ok(())
}

fn parse_scan_type(name: &str) -> Result<ScanType> {
    name.parse::<ScanType>().map_err(anyhow::Error::msg)
}

async fn manage_config(config: &AppConfig, action: ConfigAction) -> Result<()> {
    let gate = build_gate(config);

    match action {
        ConfigAction::Show => {
            let registry = build_registry(config)?;
            let effective = gate.effective_config(&registry).await?;
            println!("{}", serde_json::to_string_pretty(&effective)?);
        }
        ConfigAction::Set { pairs } => {
            let mut updates = HashMap::new();
            for pair in pairs {
                let Some((key, value)) = pair.split_once('=') else {
                    bail!("Expected key=value, got {:?}", pair);
                };
                updates.insert(key.trim().to_string(), Value::String(value.trim().to_string()));
            }
            gate.apply_updates(&updates).await?;
            println!("Configuration updated");
        }
        ConfigAction::Enable { scan_type } => {
            let scan_type = parse_scan_type(&scan_type)?;
            gate.set_enabled(scan_type, true).await?;
            println!("{} enabled", scan_type);
        }
        ConfigAction::Disable { scan_type } => {
            let scan_type = parse_scan_type(&scan_type)?;
            gate.set_enabled(scan_type, false).await?;
            println!("{} disabled", scan_type);
        }
    }

    debug!(
        "Config store at {}",
        config.storage.config_store_path.display()
    );
    Ok(())
}

async fn show_history(config: &AppConfig, limit: usize, scan_type: Option<String>) -> Result<()> {
    let sink = JsonlScanSink::new(&config.storage.scan_log_path);
    let records = sink.read_all().await?;

    let selected: Vec<_> = records
        .iter()
        .filter(|r| scan_type.as_deref().map_or(true, |t| r.scan_type == t))
        .collect();
    let skip = selected.len().saturating_sub(limit);

    if selected.is_empty() {
        println!("No recorded scans in {}", sink.path().display());
        return Ok(());
    }

    for record in selected.into_iter().skip(skip) {
        let status = match record.envelope() {
            Ok(envelope) => match envelope.error() {
                Some(message) => format!("error: {}", message),
                None => "ok".to_string(),
            },
            Err(_) => "unreadable".to_string(),
        };
        println!(
            "{}  {:11} {:30} {:12} {}",
            record.created_at.format("%Y-%m-%d %H:%M:%S"),
            record.scan_type,
            record.target,
            record.requester.as_deref().unwrap_or("-"),
            status
        );
    }

    Ok(())
}

fn generate_config(output: PathBuf) -> Result<()> {
    if output.exists() {
        bail!("{} already exists", output.display());
    }

    let config = r#"# ReconHub Configuration

[scanners]
ip_api_base = "http://ip-api.com"
hackertarget_base = "https://api.hackertarget.com"
checkphish_base = "https://developers.checkphish.ai/api/neo"
# The API key is read from CHECKPHISH_API_KEY
whois_server = "whois.iana.org:43"

# External tools (name on PATH or absolute path)
nmap_path = "nmap"
subfinder_path = "subfinder"
sherlock_path = "sherlock"

# Budgets in seconds
ip_lookup_timeout_secs = 5
asn_timeout_secs = 10
checkphish_submit_timeout_secs = 15
checkphish_poll_timeout_secs = 10
checkphish_poll_attempts = 10
checkphish_poll_interval_secs = 3
nmap_timeout_secs = 180
subfinder_timeout_secs = 120
sherlock_timeout_secs = 300
dns_timeout_secs = 5
whois_timeout_secs = 10
wappalyzer_timeout_secs = 15

[storage]
config_store_path = "reconhub-config.json"
scan_log_path = "reconhub-scans.jsonl"

[observability]
log_level = "info"
log_target = false
"#;

    std::fs::write(&output, config)
        .with_context(|| format!("Failed to write {}", output.display()))?;
    println!("Configuration file generated: {}", output.display());
    println!("\nEdit this file and run: reconhub --config {} list", output.display());

    Ok(())
}
