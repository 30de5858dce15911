use clap::{Parser, Subcommand};
use doc_agent::Result;
use doc_agent::commands::{ask, build_index, chat, show_status};
use doc_agent::config::{run_interactive_config, show_config};
use doc_agent::llm::Provider;

#[derive(Parser)]
#[command(name = "doc-agent")]
#[command(about = "Question answering over GDPR articles with retrieval-augmented generation")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Configure the embedding server, providers and retrieval settings
    Config {
        /// Show current configuration
        #[arg(long)]
        show: bool,
    },
    /// Embed the corpus and (re)build the vector index
    Build,
    /// Ask a single question
    Ask {
        /// The question to answer
        query: String,
        /// Provider to answer with: gemini, claude-haiku or claude-opus
        #[arg(long, default_value = "gemini")]
        provider: Provider,
        /// Number of passages to retrieve as context
        #[arg(long)]
        top_k: Option<usize>,
    },
    /// Start an interactive conversation
    Chat {
        /// Provider to answer with: gemini, claude-haiku or claude-opus
        #[arg(long, default_value = "gemini")]
        provider: Provider,
    },
    /// Show the state of the embedding server, corpus and index
    Status,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Config { show } => {
            if show {
                show_config()?;
            } else {
                run_interactive_config()?;
            }
        }
        Commands::Build => {
            build_index()?;
        }
        Commands::Ask {
            query,
            provider,
            top_k,
        } => {
            ask(&query, provider, top_k)?;
        }
        Commands::Chat { provider } => {
            chat(provider)?;
        }
        Commands::Status => {
            show_status()?;
        }
    }

    Ok(())
}
