//! CLI entry point for the loregraph tool host.
//!
//! `serve` reads one JSON request per stdin line and writes one JSON result
//! per stdout line. Logs go to stderr so stdout stays machine-readable.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tokio::io::BufReader;
use tracing_subscriber::{fmt, EnvFilter};

use loregraph_core::LoreConfig;
use loregraph_store::GraphStore;
use loregraph_tools::serve::serve_lines;
use loregraph_tools::ToolRegistry;

#[derive(Parser)]
#[command(name = "loregraph")]
#[command(about = "Schema-driven knowledge graph tools over a JSONL store")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Config file prefix (default: loregraph).
    #[arg(short, long, default_value = "loregraph", global = true)]
    config: String,

    /// Override the graph file path.
    #[arg(long, global = true)]
    memory_file: Option<PathBuf>,

    /// Override the schema directory.
    #[arg(long, global = true)]
    schema_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Command {
    /// Answer JSON tool requests from stdin, one per line.
    Serve,
    /// Invoke a single tool and print its result.
    Call {
        /// Tool name, e.g. add_nodes or add_npc.
        name: String,
        /// Arguments as a JSON object.
        #[arg(long, default_value = "{}")]
        args: String,
    },
    /// Print every registered tool with its input schema.
    ListTools,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt()
        .with_env_filter(filter)
        .json()
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut config = LoreConfig::load(&cli.config)?;
    if let Some(path) = cli.memory_file {
        config.memory_file_path = path;
    }
    if let Some(dir) = cli.schema_dir {
        config.schema_dir = dir;
    }

    let registry = ToolRegistry::new(&config.schema_dir);
    registry.initialize().await?;

    match cli.command {
        Command::ListTools => {
            let tools = registry.list_tools()?;
            println!("{}", serde_json::to_string_pretty(&tools)?);
        }
        Command::Call { name, args } => {
            let store = GraphStore::open(&config.memory_file_path)?;
            let args: serde_json::Value = serde_json::from_str(&args)
                .map_err(|e| anyhow::anyhow!("--args is not valid JSON: {e}"))?;
            let result = registry.dispatch(&name, &args, &store).await;
            println!("{}", serde_json::to_string(&result)?);
            if result.is_error() {
                std::process::exit(1);
            }
        }
        Command::Serve => {
            let store = GraphStore::open(&config.memory_file_path)?;
            tracing::info!(
                memory_file = %store.path().display(),
                "Serving tool requests on stdin"
            );
            let stdin = BufReader::new(tokio::io::stdin());
            serve_lines(&registry, &store, stdin, tokio::io::stdout()).await?;
        }
    }

    Ok(())
}
