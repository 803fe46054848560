use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::{Parser, Subcommand};

use finagent::extract::{extract_tool_usage, get_documents, DEFAULT_TARGET_TOOL};

mod dataset;
mod eval;
mod printer;
mod transcripts;

#[derive(Parser)]
#[command(author, version, about = "Financial research agent evaluation pipeline", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Stage an evaluation dataset from a ground-truth JSON file
    Dataset {
        /// Path to the ground-truth JSON array
        #[arg(long)]
        input: PathBuf,

        /// Where to write the staged dataset
        #[arg(long)]
        output: PathBuf,

        /// Keep only the first N samples
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },

    /// Run the agent over a staged dataset and extract grounding
    /// documents and tool-usage summaries for scoring
    Run {
        /// Path to the staged dataset
        #[arg(long)]
        dataset: PathBuf,

        /// JSON corpus file for the offline fixture retriever
        #[arg(long)]
        corpus: Option<PathBuf>,

        /// Base URL of a remote document-store service
        #[arg(long)]
        retriever_url: Option<String>,

        /// Base URL of the web-search service (or FINAGENT_SEARCH_URL)
        #[arg(long)]
        search_url: Option<String>,

        /// Where to write the eval records
        #[arg(long, default_value = "eval_results.json")]
        output: PathBuf,

        /// Directory for per-question transcripts
        #[arg(long)]
        transcripts: Option<PathBuf>,

        /// Run only the first N samples
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Pretty-print a recorded transcript and its extraction summary
    Replay {
        /// Path to a JSONL transcript or a JSON transcript object
        #[arg(long)]
        transcript: PathBuf,
    },
}

fn replay(path: &Path) -> Result<()> {
    let transcript = transcripts::load_any(path)?;

    let printer = printer::ChatMessagePrinter::new();
    printer.print_transcript(&transcript);

    println!("Tool usage: {}", extract_tool_usage(&transcript));
    let documents = get_documents(&transcript, DEFAULT_TARGET_TOOL);
    println!("Grounding documents: {}", documents.len());
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Dataset {
            input,
            output,
            limit,
        } => dataset::stage(&input, &output, limit),
        Commands::Run {
            dataset,
            corpus,
            retriever_url,
            search_url,
            output,
            transcripts,
            limit,
        } => {
            eval::run(eval::RunConfig {
                dataset,
                corpus,
                retriever_url,
                search_url,
                output,
                transcript_dir: transcripts,
                limit,
            })
            .await
        }
        Commands::Replay { transcript } => replay(&transcript),
    }
}
