// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// BSQ NODE - Derived-ledger full node CLI
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

use clap::{Parser, Subcommand};
use colored::*;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use bsq_core::dao_config::DaoConfig;

mod commands;

#[derive(Parser)]
#[command(name = "bsq-node")]
#[command(about = "BSQ derived-ledger node - replay, sync and inspect the token ledger", long_about = None)]
#[command(version)]
struct Cli {
    /// TOML config file (falls back to BSQ_* environment variables)
    #[arg(short, long, env = "BSQ_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply raw chain blocks (JSON array) to the ledger
    Replay {
        /// Raw blocks file
        #[arg(short, long)]
        blocks: PathBuf,
    },

    /// List unspent BSQ outputs and the state root
    Utxos,

    /// Answer a block request: prints the hex response envelope
    Serve {
        /// First block height to include
        #[arg(short, long)]
        from: u64,

        /// Nonce of the request being answered
        #[arg(short, long, allow_hyphen_values = true)]
        nonce: i32,
    },

    /// Apply a peer's hex response envelope after re-deriving every block
    Sync {
        /// File holding the hex envelope
        #[arg(short, long)]
        response: PathBuf,

        /// Nonce the request was sent with
        #[arg(short, long, allow_hyphen_values = true)]
        nonce: i32,

        /// Height the request asked from (default: next block)
        #[arg(short, long)]
        from: Option<u64>,
    },

    /// Look up the fee a transaction paid, with retries
    Fee {
        /// Transaction id
        tx_id: String,

        /// Only use this provider
        #[arg(short, long)]
        provider: Option<String>,
    },

    /// Encode a compensation request OP_RETURN payload
    OpReturn {
        /// Input text (hashed into the payload)
        text: String,
    },
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(path: Option<&PathBuf>) -> Result<DaoConfig, Box<dyn std::error::Error>> {
    let config = match path {
        Some(p) => DaoConfig::load_from_file(p)?,
        None => DaoConfig::load_from_env()?,
    };
    config.validate()?;
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logging();
    let cli = Cli::parse();
    let config = load_config(cli.config.as_ref())?;

    match cli.command {
        Commands::Replay { blocks } => commands::ledger::replay(&config, &blocks)?,
        Commands::Utxos => commands::ledger::list_utxos(&config)?,
        Commands::Serve { from, nonce } => commands::sync::serve(&config, from, nonce)?,
        Commands::Sync {
            response,
            nonce,
            from,
        } => commands::sync::sync(&config, &response, nonce, from)?,
        Commands::Fee { tx_id, provider } => {
            commands::fee::lookup(&config, &tx_id, provider.as_deref()).await?
        }
        Commands::OpReturn { text } => commands::op_return::encode(&text),
    }

    Ok(())
}

fn print_success(msg: &str) {
    println!("{} {}", "✓".green().bold(), msg);
}

fn print_error(msg: &str) {
    eprintln!("{} {}", "✗".red().bold(), msg);
}

fn print_info(msg: &str) {
    println!("{} {}", "ℹ".blue().bold(), msg);
}
