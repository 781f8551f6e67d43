use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tabled::{settings::Style, Table, Tabled};
use tracing_subscriber::EnvFilter;

use settlement::config::{
    config_dir, load_config, load_env, resolve_api_base, resolve_output_dir, ApiEndpoint,
    API_URL_ENV, CONFIG_TEMPLATE,
};
use settlement::error::{Result, SettlementError};
use settlement::report::{format_amount, HttpReportService, Query, Reconciliation, Report};
use settlement::view::ReportViewModel;
use settlement::TypstExporter;

#[derive(Parser)]
#[command(name = "settlement")]
#[command(version, about = "Settlement reports: invoices per user and directory, reconciled against an advance", long_about = None)]
struct Cli {
    /// Path to config directory (default: ~/.settlement or XDG config)
    #[arg(short = 'C', long, global = true)]
    config_dir: Option<PathBuf>,

    /// Increase log verbosity (-v debug, -vv trace). RUST_LOG overrides.
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize config directory with a template config.toml
    Init,

    /// Fetch the settlement report for a user and directory
    Report(ReportArgs),

    /// Show the effective configuration
    Config,
}

#[derive(Args)]
struct ReportArgs {
    /// User identifier (e.g., "elio villalobos")
    #[arg(short, long)]
    user: Option<String>,

    /// Directory identifier (e.g., liquidacion-abril25)
    #[arg(short, long)]
    directory: Option<String>,

    /// Advance payment to reconcile against the invoice total (default: 0)
    #[arg(short, long, allow_hyphen_values = true)]
    advance: Option<String>,

    /// Report API base URL (overrides SETTLEMENT_API_URL and config.toml)
    #[arg(long)]
    api_url: Option<String>,

    /// Export the report as reporte-<directory>.pdf
    #[arg(long)]
    pdf: bool,

    /// Custom PDF output path (implies --pdf)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Open the exported PDF with the system default viewer (implies --pdf)
    #[arg(long)]
    open: bool,

    /// Print the report as JSON instead of tables
    #[arg(long)]
    json: bool,
}

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    // Determine config directory
    let cfg_dir = match cli.config_dir {
        Some(p) => p,
        None => config_dir()?,
    };
    load_env(&cfg_dir);

    match cli.command {
        Commands::Init => cmd_init(&cfg_dir),
        Commands::Report(args) => cmd_report(&cfg_dir, args),
        Commands::Config => cmd_config(&cfg_dir),
    }
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("settlement={level}")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Initialize config directory with template files
fn cmd_init(cfg_dir: &Path) -> Result<()> {
    use std::fs;

    if cfg_dir.exists() {
        return Err(SettlementError::AlreadyInitialized(cfg_dir.to_path_buf()));
    }

    fs::create_dir_all(cfg_dir)?;
    fs::create_dir_all(cfg_dir.join("output"))?;
    fs::write(cfg_dir.join("config.toml"), CONFIG_TEMPLATE)?;

    println!("Initialized settlement config at: {}", cfg_dir.display());
    println!();
    println!("Next steps:");
    println!(
        "  1. Point it at your report service:  $EDITOR {}/config.toml",
        cfg_dir.display()
    );
    println!("     (or export {API_URL_ENV}=https://host/api)");
    println!();
    println!("Then fetch your first report:");
    println!("  settlement report --user <user> --directory <directory> --advance <amount>");

    Ok(())
}

fn current_endpoint(flag: Option<&str>, config: &settlement::Config) -> ApiEndpoint {
    let env_url = std::env::var(API_URL_ENV).ok();
    resolve_api_base(flag, env_url.as_deref(), config)
}

/// Parse the advance the user typed. Blank means no advance.
fn parse_advance(input: Option<&str>) -> Result<Option<f64>> {
    let Some(raw) = input.map(str::trim).filter(|s| !s.is_empty()) else {
        return Ok(None);
    };

    match raw.parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(Some(value)),
        _ => Err(SettlementError::InvalidAdvance(raw.to_string())),
    }
}

// Table row struct for tabled
#[derive(Tabled)]
struct InvoiceRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "AMOUNT")]
    amount: String,
    #[tabled(rename = "DATE")]
    date: String,
}

#[derive(Serialize)]
struct JsonOutput<'a> {
    report: &'a Report,
    reconciliation: Reconciliation,
}

/// Fetch the report, print it and optionally export it
fn cmd_report(cfg_dir: &Path, args: ReportArgs) -> Result<()> {
    let advance = parse_advance(args.advance.as_deref())?;
    let config = load_config(cfg_dir)?;
    let endpoint = current_endpoint(args.api_url.as_deref(), &config);
    tracing::debug!(base_url = %endpoint.base_url, source = %endpoint.source, "using report API");

    let service = HttpReportService::new(
        &endpoint.base_url,
        Duration::from_secs(config.api.timeout_secs),
    );

    let mut view = ReportViewModel::new(config.report.currency_symbol.clone());
    view.set_query(
        Query::new(
            args.user.unwrap_or_default(),
            args.directory.unwrap_or_default(),
        )
        .with_advance(advance),
    );
    view.submit(&service)?;

    if args.json {
        print_json(&view)?;
    } else {
        print_report(&view);
    }

    if args.pdf || args.output.is_some() || args.open {
        let output_dir = resolve_output_dir(&config.pdf.output_dir, cfg_dir);
        let exporter = TypstExporter::new(output_dir, args.output);
        if let Some(path) = view.export(&exporter)? {
            // Keep stdout parseable in JSON mode
            if args.json {
                eprintln!("Saved: {}", path.display());
            } else {
                println!();
                println!("Saved: {}", path.display());
            }
            if args.open {
                open_path(&path)?;
            }
        }
    }

    Ok(())
}

fn print_report(view: &ReportViewModel) {
    let Some(summary) = view.summary() else {
        return;
    };
    let symbol = view.currency_symbol();
    let reconciliation = summary.reconciliation;

    println!("Settlement Report");
    println!("{}", "-".repeat(50));
    println!("User:          {}", summary.user);
    println!("Directory:     {}", summary.directory);
    println!("Invoices:      {}", summary.invoice_count);
    println!(
        "Total amount:  {}{}",
        symbol,
        format_amount(summary.total_amount)
    );
    println!(
        "Advance:       {}{}",
        symbol,
        format_amount(reconciliation.advance)
    );
    println!(
        "{}: {}{}",
        reconciliation.balance.label(),
        symbol,
        format_amount(reconciliation.display_amount())
    );
    println!();

    let rows: Vec<InvoiceRow> = view
        .rows()
        .into_iter()
        .map(|row| InvoiceRow {
            id: row.id,
            amount: row.amount,
            date: row.date,
        })
        .collect();

    if rows.is_empty() {
        println!("No invoices found for this period.");
        return;
    }

    let table = Table::new(rows).with(Style::rounded()).to_string();
    println!("{table}");
}

fn print_json(view: &ReportViewModel) -> Result<()> {
    let (Some(report), Some(reconciliation)) = (view.report(), view.reconciliation()) else {
        return Ok(());
    };

    let output = JsonOutput {
        report,
        reconciliation,
    };
    let json = serde_json::to_string_pretty(&output).map_err(|e| {
        SettlementError::Io(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            e.to_string(),
        ))
    })?;
    println!("{json}");
    Ok(())
}

/// Show the effective configuration and where each value came from
fn cmd_config(cfg_dir: &Path) -> Result<()> {
    let config_file = cfg_dir.join("config.toml");
    let config = load_config(cfg_dir)?;
    let endpoint = current_endpoint(None, &config);

    println!("Settlement Config");
    println!("{}", "-".repeat(50));
    println!("Config directory: {}", cfg_dir.display());
    if config_file.exists() {
        println!("Config file:      {}", config_file.display());
    } else {
        println!("Config file:      {} (not found, using defaults)", config_file.display());
    }
    println!(
        "API base URL:     {} (from {})",
        endpoint.base_url, endpoint.source
    );
    println!("Timeout:          {}s", config.api.timeout_secs);
    println!("Currency symbol:  {:?}", config.report.currency_symbol);
    println!(
        "PDF output dir:   {}",
        resolve_output_dir(&config.pdf.output_dir, cfg_dir).display()
    );

    Ok(())
}

fn open_path(pdf_path: &Path) -> Result<()> {
    // Open with system default viewer
    #[cfg(target_os = "macos")]
    {
        std::process::Command::new("open").arg(pdf_path).spawn()?;
    }

    #[cfg(target_os = "linux")]
    {
        std::process::Command::new("xdg-open").arg(pdf_path).spawn()?;
    }

    #[cfg(target_os = "windows")]
    {
        std::process::Command::new("cmd")
            .args(["/C", "start", ""])
            .arg(pdf_path)
            .spawn()?;
    }
    Ok(())
}
