use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use switchyard_agents::{ResultWriter, Switchboard};
use switchyard_observability::{init_tracing, AppMetrics};

const DEFAULT_REQUEST: &str = "Write a poem about artificial intelligence";

const DEMO_INPUTS: [&str; 6] = [
    "What is artificial intelligence?",
    "Calculate 15 + 27 * 3",
    "What is two plus three times five?",
    "Write a poem about the ocean",
    "Explain quantum computing",
    "Solve: twenty-five divided by five",
];

#[derive(Debug, Parser)]
#[command(name = "switchyard")]
#[command(about = "Routes requests to the RAG, math or poem pipeline")]
struct Cli {
    /// Directory for `<pipeline>_result.txt` files.
    #[arg(long, env = "SWITCHYARD_OUT_DIR", default_value = ".")]
    out_dir: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Route one request, run its pipeline and save the result.
    Run {
        text: Option<String>,
        #[arg(long)]
        sentences: Option<u8>,
    },
    /// Print the routing decision as JSON.
    Route { text: String },
    /// Evaluate an arithmetic expression.
    Eval { expression: String },
    /// Replace English or Italian number words with digits.
    Convert { text: String },
    /// Route the built-in demonstration inputs.
    Demo,
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing("switchyard_cli");
    let cli = Cli::parse();

    let switchboard = Switchboard::load_default(AppMetrics::shared());

    match cli.command {
        Command::Run { text, sentences } => {
            let text = match text {
                Some(text) => text,
                None => prompt_request()?,
            };
            let outcome = switchboard.handle(&text, sentences).await?;
            println!("Routing decision: {}", serde_json::to_string(&outcome.decision)?);
            println!("{}", outcome.result);

            let path = ResultWriter::new(&cli.out_dir).write(&outcome)?;
            println!("Saved result to {}", path.display());
        }
        Command::Route { text } => {
            let decision = switchboard.route(&text).await?;
            println!("{}", serde_json::to_string_pretty(&decision)?);
        }
        Command::Eval { expression } => {
            let value = switchboard
                .evaluate(&expression)
                .with_context(|| format!("cannot evaluate {expression:?}"))?;
            println!("{value}");
        }
        Command::Convert { text } => {
            println!("{}", switchboard.convert(&text));
        }
        Command::Demo => {
            println!("=== ROUTING DEMO ===");
            for input in DEMO_INPUTS {
                let decision = switchboard.route(input).await?;
                println!("\nInput: {input}");
                println!("Route: {}", serde_json::to_string(&decision)?);
                println!("Pipeline: {}", decision.pipeline());
            }
        }
    }

    Ok(())
}

fn prompt_request() -> Result<String> {
    print!("Enter your request (default: '{DEFAULT_REQUEST}'): ");
    io::stdout().flush()?;

    let mut line = String::new();
    io::stdin()
        .lock()
        .read_line(&mut line)
        .context("failed reading request from stdin")?;

    let line = line.trim();
    Ok(if line.is_empty() {
        DEFAULT_REQUEST.to_string()
    } else {
        line.to_string()
    })
}
