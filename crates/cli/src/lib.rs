use anyhow::{Context as AnyhowContext, Result};
use clap::{Args, Parser, Subcommand};
use cmc_auth::{hash_password, CredentialStore};
use cmc_protocol::serialize_json;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

pub mod config;
pub mod http_api;
mod server_security;
pub mod workbench;

pub use config::AppConfig;
pub use http_api::{build_router, AppState};
pub use workbench::{IngestSummary, ServiceError, Workbench};

fn print_stdout(text: &str) -> Result<()> {
    write_stdout(text.as_bytes(), true)
}

fn write_stdout(bytes: &[u8], newline: bool) -> Result<()> {
    let mut stdout = io::stdout().lock();
    if let Err(err) = stdout
        .write_all(bytes)
        .and_then(|_| if newline { stdout.write_all(b"\n") } else { Ok(()) })
        .and_then(|_| stdout.flush())
    {
        if err.kind() == io::ErrorKind::BrokenPipe {
            return Ok(());
        }
        return Err(err.into());
    }
    Ok(())
}

#[derive(Parser)]
#[command(name = "cmc")]
#[command(about = "CMC knowledge workbench: regulatory PDF ingestion, CQA reasoning and reports", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file (defaults to $CMC_CONFIG, then ./cmc.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Quiet mode: log only warnings/errors
    #[arg(long, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP API
    Serve(ServeArgs),

    /// Create the knowledge base file if it does not exist
    Init,

    /// Extract CQA candidates from a PDF and append them to the knowledge base
    Ingest(IngestArgs),

    /// Aggregate the knowledge base for one modality and phase
    Query(QueryArgs),

    /// List the modalities and phases present in the knowledge base
    Options(OptionsArgs),

    /// Write the full knowledge base as CSV
    Export(ExportArgs),

    /// Print a password_hash value for the credentials file
    HashPassword(HashPasswordArgs),
}

#[derive(Args)]
struct ServeArgs {
    /// Address to bind (overrides the config file)
    #[arg(long)]
    bind: Option<String>,

    /// Allow binding to non-loopback addresses
    #[arg(long)]
    public: bool,
}

#[derive(Args)]
struct IngestArgs {
    /// PDF document to ingest
    pdf: PathBuf,

    #[arg(long)]
    modality: String,

    #[arg(long)]
    phase: String,

    /// Output JSON
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct QueryArgs {
    #[arg(long)]
    modality: String,

    #[arg(long)]
    phase: String,

    /// Also write the results as a PDF report
    #[arg(long)]
    pdf: Option<PathBuf>,

    /// Report title (overrides the config file)
    #[arg(long)]
    title: Option<String>,

    /// Output JSON
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct OptionsArgs {
    /// Output JSON
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct ExportArgs {
    /// Destination file (stdout when omitted)
    #[arg(long)]
    out: Option<PathBuf>,
}

#[derive(Args)]
struct HashPasswordArgs {
    /// Password to hash (read from stdin when omitted)
    password: Option<String>,
}

pub async fn main_entry() -> Result<()> {
    let mut cli = Cli::parse();

    // Keep stdout clean for JSON consumers.
    let json_output = match &cli.command {
        Commands::Ingest(args) => args.json,
        Commands::Query(args) => args.json,
        Commands::Options(args) => args.json,
        _ => false,
    };
    if json_output {
        cli.quiet = true;
    }

    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if cli.quiet {
        builder.filter_level(log::LevelFilter::Warn);
    } else if cli.verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.target(env_logger::Target::Stderr).init();

    let config_path = cli.config.as_deref();
    match cli.command {
        Commands::HashPassword(args) => run_hash_password(args)?,
        Commands::Serve(args) => serve_http(args, load_config(config_path)?).await?,
        Commands::Init => run_init(load_config(config_path)?)?,
        Commands::Ingest(args) => run_ingest(args, load_config(config_path)?)?,
        Commands::Query(args) => run_query(args, load_config(config_path)?)?,
        Commands::Options(args) => run_options(args, load_config(config_path)?)?,
        Commands::Export(args) => run_export(args, load_config(config_path)?)?,
    }

    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<AppConfig> {
    let config = AppConfig::load(path).context("Failed to load configuration")?;
    log::debug!(
        "Config: knowledge_base={} users={} layout={} window_chars={}",
        config.knowledge_base_path.display(),
        config.users_path.display(),
        config.report.layout.as_str(),
        config.extractor.window_chars
    );
    Ok(config)
}

fn open_workbench(config: AppConfig) -> Result<Workbench> {
    let path = config.knowledge_base_path.clone();
    Workbench::open(config)
        .with_context(|| format!("Failed to open knowledge base {}", path.display()))
}

fn run_init(config: AppConfig) -> Result<()> {
    let workbench = open_workbench(config)?;
    let rows = workbench.records()?.len();
    print_stdout(&format!(
        "Knowledge base ready: {} ({rows} rows)",
        workbench.knowledge_base().path().display()
    ))
}

fn run_ingest(args: IngestArgs, config: AppConfig) -> Result<()> {
    let document = std::fs::read(&args.pdf)
        .with_context(|| format!("Failed to read {}", args.pdf.display()))?;
    let workbench = open_workbench(config)?;
    let summary = workbench.ingest(&document, &args.modality, &args.phase)?;

    if args.json {
        print_stdout(&serialize_json(&summary)?)
    } else {
        print_stdout(&summary.message)
    }
}

fn run_query(args: QueryArgs, config: AppConfig) -> Result<()> {
    let workbench = open_workbench(config)?;
    let rows = workbench.query(&args.modality, &args.phase)?;

    if let Some(out) = &args.pdf {
        let pdf = workbench.query_pdf(&args.modality, &args.phase, args.title.as_deref())?;
        std::fs::write(out, pdf).with_context(|| format!("Failed to write {}", out.display()))?;
        log::info!("Wrote report to {}", out.display());
    }

    if args.json {
        return print_stdout(&serialize_json(&http_api::RowsPayload { rows })?);
    }

    let table = cmc_protocol::Table::from_reasoning(&rows);
    print_stdout(&table.columns.join(" | "))?;
    for row in &table.rows {
        print_stdout(&row.join(" | "))?;
    }
    Ok(())
}

fn run_options(args: OptionsArgs, config: AppConfig) -> Result<()> {
    let options = open_workbench(config)?.options()?;
    if args.json {
        return print_stdout(&serialize_json(&options)?);
    }
    print_stdout(&format!("Modalities: {}", options.modalities.join(", ")))?;
    print_stdout(&format!("Phases: {}", options.phases.join(", ")))
}

fn run_export(args: ExportArgs, config: AppConfig) -> Result<()> {
    let csv = open_workbench(config)?.export_csv()?;
    match &args.out {
        Some(out) => {
            std::fs::write(out, &csv)
                .with_context(|| format!("Failed to write {}", out.display()))?;
            log::info!("Exported knowledge base to {}", out.display());
            Ok(())
        }
        None => write_stdout(&csv, false),
    }
}

fn run_hash_password(args: HashPasswordArgs) -> Result<()> {
    let password = match args.password {
        Some(password) => password,
        None => {
            let mut input = String::new();
            io::stdin()
                .read_to_string(&mut input)
                .context("Failed to read password from stdin")?;
            input.trim_end_matches(['\r', '\n']).to_string()
        }
    };
    if password.is_empty() {
        anyhow::bail!("password must be non-empty")
    }
    print_stdout(&hash_password(&password))
}

async fn serve_http(args: ServeArgs, config: AppConfig) -> Result<()> {
    let bind = args.bind.clone().unwrap_or_else(|| config.bind.clone());
    let addrs = server_security::resolve_guarded_bind_addrs(&bind, args.public).await?;

    let credentials = CredentialStore::load(&config.users_path).with_context(|| {
        format!(
            "Failed to load credentials from {}",
            config.users_path.display()
        )
    })?;
    if credentials.is_empty() {
        log::warn!("No users configured; every login will fail");
    }
    let workbench = open_workbench(config)?;
    log::info!(
        "Knowledge base: {} ({} rows)",
        workbench.knowledge_base().path().display(),
        workbench.records()?.len()
    );

    let app = build_router(AppState::new(workbench, credentials));
    let listener = tokio::net::TcpListener::bind(&bind).await?;
    let local_addr = listener.local_addr()?;
    let base_url = format!("http://{local_addr}");

    print_stdout(&format!("Serving CMC workbench API: {base_url}/api"))?;
    print_stdout(&format!("Health endpoint: {base_url}/health"))?;
    if args.public {
        let addrs = addrs
            .iter()
            .map(|a| a.to_string())
            .collect::<Vec<_>>()
            .join(", ");
        print_stdout(&format!(
            "Public bind enabled (--public). Resolved addresses: {addrs}"
        ))?;
    }
    print_stdout(&format!(
        "Try: curl -X POST {base_url}/api/login -H 'Content-Type: application/json' -d '{{\"username\":\"...\",\"password\":\"...\"}}'"
    ))?;

    axum::serve(listener, app).await?;
    Ok(())
}
