//! bank-etl CLI - run the largest-banks pipeline and query its table
//!
//! ## Example Usage
//!
//! ```bash
//! # Full run against the archived Wikipedia page
//! bank-etl run
//!
//! # Full run against a saved copy of the page
//! bank-etl run --source-file largest_banks.html --rates exchange_rate.csv
//!
//! # Query the persisted table
//! bank-etl query "SELECT Name, MC_EUR_Billion FROM Largest_banks LIMIT 3" --format json
//!
//! # Show the effective configuration
//! bank-etl config
//! ```

use anyhow::{bail, Context};
use bank_etl::config::EtlConfig;
use bank_etl::error::EtlError;
use bank_etl::extract::{DocumentSource, FileSource};
use bank_etl::load::Store;
use bank_etl::pipeline::EtlPipeline;
use bank_etl::query::QueryResult;
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::io;
use std::path::{Path, PathBuf};
use std::process;

/// bank-etl: extract, normalize and load the largest banks by market cap
#[derive(Parser)]
#[command(name = "bank-etl")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Extract, normalize and load the largest banks by market capitalization", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Configuration file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full extract, transform and load pipeline
    Run {
        /// Read the document from a local file instead of fetching data_url
        #[arg(short = 's', long)]
        source_file: Option<PathBuf>,

        /// Document URL (overrides data_url)
        #[arg(short = 'u', long)]
        url: Option<String>,

        /// Exchange rate CSV (overrides rates_path)
        #[arg(short = 'r', long)]
        rates: Option<PathBuf>,

        /// Output CSV file (overrides csv_path)
        #[arg(long)]
        csv: Option<PathBuf>,

        /// SQLite database (overrides db_path)
        #[arg(long)]
        db: Option<PathBuf>,

        /// Table name (overrides table_name)
        #[arg(short = 't', long)]
        table: Option<String>,

        /// Do not write the progress log file
        #[arg(long)]
        no_log_file: bool,

        /// Output format for query results
        #[arg(short = 'f', long, value_enum, default_value = "table")]
        format: OutputFormat,
    },

    /// Run a read-only statement against the persisted table
    Query {
        /// SQL statement; `{table}` expands to the configured table name
        #[arg(value_name = "SQL")]
        statement: String,

        /// SQLite database (overrides db_path)
        #[arg(long)]
        db: Option<PathBuf>,

        /// Table name used for `{table}` (overrides table_name)
        #[arg(short = 't', long)]
        table: Option<String>,

        /// Output format
        #[arg(short = 'f', long, value_enum, default_value = "table")]
        format: OutputFormat,
    },

    /// Print the effective configuration as TOML
    Config,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
    Csv,
}

fn main() {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter)).init();

    let result = load_config(cli.config.as_deref()).and_then(|config| match cli.command {
        Commands::Run {
            source_file,
            url,
            rates,
            csv,
            db,
            table,
            no_log_file,
            format,
        } => {
            let mut config = config;
            if let Some(url) = url {
                config.data_url = url;
            }
            if let Some(rates) = rates {
                config.rates_path = rates;
            }
            if let Some(csv) = csv {
                config.csv_path = csv;
            }
            if let Some(db) = db {
                config.db_path = db;
            }
            if let Some(table) = table {
                config.table_name = table;
            }
            if no_log_file {
                config.log_path = None;
            }
            run_pipeline(config, source_file, format, cli.verbose)
        }

        Commands::Query {
            statement,
            db,
            table,
            format,
        } => {
            let mut config = config;
            if let Some(db) = db {
                config.db_path = db;
            }
            if let Some(table) = table {
                config.table_name = table;
            }
            run_statement(&config, &statement, format)
        }

        Commands::Config => {
            print!("{}", config.to_toml()?);
            Ok(())
        }
    });

    if let Err(e) = result {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        if let Some(stage) = e.downcast_ref::<EtlError>().and_then(EtlError::stage) {
            eprintln!("  {} {}", "Failed stage:".bold(), stage.to_string().yellow());
        }
        process::exit(1);
    }
}

fn load_config(path: Option<&Path>) -> anyhow::Result<EtlConfig> {
    if let Some(config_path) = path {
        return EtlConfig::from_file(config_path)
            .with_context(|| format!("loading {}", config_path.display()));
    }

    // Try default location
    if let Some(home) = dirs::home_dir() {
        let default_config = home.join(".bank-etl").join("config.toml");
        if default_config.exists() {
            return EtlConfig::from_file(&default_config)
                .with_context(|| format!("loading {}", default_config.display()));
        }
    }

    Ok(EtlConfig::default())
}

fn run_pipeline(
    mut config: EtlConfig,
    source_file: Option<PathBuf>,
    format: OutputFormat,
    verbose: bool,
) -> anyhow::Result<()> {
    let source: Box<dyn DocumentSource> = match source_file {
        Some(path) => {
            config.data_url = path.display().to_string();
            Box::new(FileSource)
        }
        None => http_source()?,
    };

    if verbose {
        println!("{} v{}", "bank-etl".cyan().bold(), env!("CARGO_PKG_VERSION"));
        println!("  {} {}", "Source:".bold(), config.data_url);
        println!("  {} {}", "Rates:".bold(), config.rates_path.display());
        println!("  {} {}", "CSV:".bold(), config.csv_path.display());
        println!(
            "  {} {} ({})",
            "Database:".bold(),
            config.db_path.display(),
            config.table_name
        );
        println!();
    }

    let pipeline = EtlPipeline::new(config)?;
    let report = pipeline.run(source.as_ref())?;

    println!(
        "{} Loaded {} banks into {}",
        "✓".green().bold(),
        report.dataset.len(),
        pipeline.config().table_name.bright_green()
    );
    println!();

    for (statement, result) in &report.queries {
        println!("{}", statement.cyan());
        print_result(result, format)?;
        println!();
    }

    Ok(())
}

#[cfg(feature = "http")]
fn http_source() -> anyhow::Result<Box<dyn DocumentSource>> {
    Ok(Box::new(bank_etl::extract::HttpSource::new()?))
}

#[cfg(not(feature = "http"))]
fn http_source() -> anyhow::Result<Box<dyn DocumentSource>> {
    bail!("built without the `http` feature; pass --source-file to read a saved page")
}

fn run_statement(config: &EtlConfig, statement: &str, format: OutputFormat) -> anyhow::Result<()> {
    if !config.db_path.exists() {
        bail!(
            "database {} does not exist; run the pipeline first",
            config.db_path.display()
        );
    }

    let statement = statement.replace(bank_etl::config::TABLE_PLACEHOLDER, &config.table_name);
    let store = Store::open(&config.db_path)?;
    let result = store.query(&statement);
    store.close()?;

    print_result(&result?, format)
}

fn print_result(result: &QueryResult, format: OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Table => println!("{}", result),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(result)?),
        OutputFormat::Csv => result.write_csv(io::stdout().lock())?,
    }
    Ok(())
}
