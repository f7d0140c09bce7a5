//! # paperchat CLI
//!
//! ```bash
//! paperchat ingest ~/papers
//! paperchat ask "What optimizer did the authors use?"
//! paperchat chat --model mistral
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `paperchat init` | Create the index directory and schema |
//! | `paperchat ingest <PATH>...` | Add PDF files or directories to the index |
//! | `paperchat search "<query>"` | Show the closest chunks without generating an answer |
//! | `paperchat ask "<question>"` | Answer one question with sources |
//! | `paperchat chat` | Interactive conversation on stdin |
//! | `paperchat documents` | List processed documents |
//! | `paperchat models` | List answer models |
//! | `paperchat clear` | Delete all indexed data |
//! | `paperchat completions <shell>` | Print a shell completion script |

use std::path::PathBuf;

use clap::{ArgAction, CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use tracing_subscriber::EnvFilter;

use paperchat::{ask, chat, clear, config, documents, ingest, models_cmd, search};

/// paperchat: ask questions about your PDF papers, answered by a local LLM.
///
/// Settings are read from `./config/paperchat.toml` when it exists, or from
/// the file given with `--config`. See `config/paperchat.example.toml`.
#[derive(Parser)]
#[command(name = "paperchat", version)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Increase log output (-v info, -vv debug). RUST_LOG takes precedence.
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the index directory and schema.
    ///
    /// Idempotent; running it on an existing index changes nothing.
    Init,

    /// Add PDF documents to the index.
    ///
    /// Directories are walked recursively for `*.pdf`. Documents whose file
    /// name was already processed are skipped.
    Ingest {
        /// PDF files or directories.
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },

    /// Show the chunks closest to a query, without generating an answer.
    Search {
        query: String,

        /// Number of chunks to return (defaults to `retrieval.k`).
        #[arg(long)]
        k: Option<usize>,

        /// Print results as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Answer a single question from the indexed documents.
    Ask {
        question: String,

        /// Answer model to use instead of `answer.model`.
        #[arg(long)]
        model: Option<String>,
    },

    /// Start an interactive conversation. Type /help inside for commands.
    Chat {
        /// Answer model to start with.
        #[arg(long)]
        model: Option<String>,
    },

    /// List processed documents and where the index lives.
    Documents,

    /// List the answer models that can be selected.
    Models,

    /// Delete all indexed documents and chunks.
    Clear,

    /// Print a shell completion script to stdout.
    Completions {
        shell: Shell,
    },
}

fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    // Commands that don't require config
    if let Commands::Completions { shell } = cli.command {
        let mut cmd = Cli::command();
        clap_complete::generate(shell, &mut cmd, "paperchat", &mut std::io::stdout());
        return Ok(());
    }

    let cfg = config::resolve_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Init => {
            clear::run_init(&cfg).await?;
        }
        Commands::Ingest { paths } => {
            ingest::run_ingest(&cfg, &paths).await?;
        }
        Commands::Search { query, k, json } => {
            search::run_search(&cfg, &query, k, json).await?;
        }
        Commands::Ask { question, model } => {
            ask::run_ask(&cfg, &question, model.as_deref()).await?;
        }
        Commands::Chat { model } => {
            chat::run_chat(&cfg, model.as_deref()).await?;
        }
        Commands::Documents => {
            documents::run_documents(&cfg).await?;
        }
        Commands::Models => {
            models_cmd::run_models(&cfg);
        }
        Commands::Clear => {
            clear::run_clear(&cfg).await?;
        }
        Commands::Completions { .. } => {}
    }

    Ok(())
}
