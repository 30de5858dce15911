#[cfg(test)]
mod tests;

use anyhow::{Context, Result};
use console::style;
use dialoguer::{Confirm, Input, Select};

use super::{Config, ConfigError, ConversationConfig, Credentials, EmbeddingConfig};

#[inline]
pub fn run_interactive_config() -> Result<()> {
    eprintln!("{}", style("🔧 Doc Agent Configuration Setup").bold().cyan());
    eprintln!();

    let mut config = load_existing_config()?;

    eprintln!("{}", style("Embedding Server").bold().yellow());
    eprintln!("Configure the Ollama instance that serves the sentence-embedding model.");
    eprintln!();

    configure_embedding(&mut config.embedding)?;

    eprintln!();
    eprintln!("{}", style("Answer Generation").bold().yellow());
    configure_generation(&mut config)?;

    eprintln!();
    eprintln!("{}", style("Conversation").bold().yellow());
    configure_conversation(&mut config.conversation)?;

    eprintln!();
    eprintln!("{}", style("Testing configuration...").yellow());

    if test_embedding_connection(&config.embedding)? {
        eprintln!("{}", style("✓ Embedding server connection successful!").green());
    } else {
        eprintln!(
            "{}",
            style("⚠ Warning: Could not connect to the embedding server").yellow()
        );
        eprintln!("You can continue, but make sure Ollama is running before building the index.");
    }

    eprintln!();
    if Confirm::new()
        .with_prompt("Save configuration?")
        .default(true)
        .interact()?
    {
        config.save().context("Failed to save configuration")?;
        eprintln!("{}", style("✓ Configuration saved successfully!").green());
        eprintln!(
            "Configuration saved to: {}",
            style(config.config_file_path().display()).cyan()
        );
    } else {
        eprintln!("Configuration not saved.");
    }

    Ok(())
}

#[inline]
pub fn show_config() -> Result<()> {
    let config = Config::load_default().context("Failed to load configuration")?;

    eprintln!("{}", style("📋 Current Configuration").bold().cyan());
    eprintln!();

    eprintln!("{}", style("Embedding Settings:").bold().yellow());
    eprintln!("  Host: {}", style(&config.embedding.host).cyan());
    eprintln!("  Port: {}", style(config.embedding.port).cyan());
    eprintln!("  Model: {}", style(&config.embedding.model).cyan());
    eprintln!("  Batch Size: {}", style(config.embedding.batch_size).cyan());
    eprintln!(
        "  Dimension: {}",
        style(config.embedding.embedding_dimension).cyan()
    );
    match config.embedding_url() {
        Ok(url) => eprintln!("  Ollama URL: {}", style(url).cyan()),
        Err(e) => eprintln!("  Ollama URL: {} ({})", style("Invalid").red(), e),
    }

    eprintln!();
    eprintln!("{}", style("Provider Settings:").bold().yellow());
    eprintln!("  Gemini Model: {}", style(&config.providers.gemini_model).cyan());
    eprintln!(
        "  Claude Max Tokens: {}",
        style(config.providers.claude_max_tokens).cyan()
    );
    eprintln!(
        "  Request Timeout: {}s",
        style(config.providers.request_timeout_secs).cyan()
    );

    eprintln!();
    eprintln!("{}", style("Retrieval Settings:").bold().yellow());
    eprintln!("  Top K: {}", style(config.retrieval.top_k).cyan());
    eprintln!(
        "  Cache TTL: {}s",
        style(config.retrieval.cache_ttl_secs).cyan()
    );
    eprintln!(
        "  History Window: {}",
        style(
            config
                .conversation
                .history_window
                .map_or_else(|| "unbounded".to_string(), |w| format!("{w} turns"))
        )
        .cyan()
    );
    eprintln!(
        "  Record Failed Turns: {}",
        style(config.conversation.record_failed_turns).cyan()
    );

    eprintln!();
    eprintln!("{}", style("Data Files:").bold().yellow());
    eprintln!("  Corpus: {}", style(config.corpus_path().display()).cyan());
    eprintln!("  Index: {}", style(config.index_path().display()).cyan());

    eprintln!();
    eprintln!("{}", style("Credentials:").bold().yellow());
    match Credentials::load() {
        Ok(credentials) => {
            eprintln!("  GOOGLE_API_KEY: {}", style("set").green());
            eprintln!(
                "  CLAUDE_API_KEY: {}",
                if credentials.claude_api_key().is_some() {
                    style("set").green()
                } else {
                    style("not set").yellow()
                }
            );
        }
        Err(e) => eprintln!("  {}", style(e).red()),
    }

    eprintln!();
    eprintln!(
        "Config file: {}",
        style(config.config_file_path().display()).dim()
    );

    Ok(())
}

fn load_existing_config() -> Result<Config> {
    match Config::load_default() {
        Ok(config) => {
            eprintln!("{}", style("Found existing configuration.").green());
            Ok(config)
        }
        Err(_) => {
            eprintln!(
                "{}",
                style("No existing configuration found. Using defaults.").yellow()
            );
            Ok(Config {
                base_dir: Config::config_dir()?,
                ..Config::default()
            })
        }
    }
}

fn configure_embedding(embedding: &mut EmbeddingConfig) -> Result<()> {
    let protocols = &["http", "https"];
    let default_index = protocols
        .iter()
        .position(|&p| p == embedding.protocol)
        .unwrap_or(0);

    let protocol_index = Select::new()
        .with_prompt("Ollama protocol")
        .default(default_index)
        .items(protocols)
        .interact()?;

    let protocol = protocols[protocol_index].to_string();

    let host: String = Input::new()
        .with_prompt("Ollama host")
        .default(embedding.host.clone())
        .validate_with(|input: &String| -> Result<(), ConfigError> {
            let temp_config = EmbeddingConfig {
                protocol: protocol.clone(),
                host: input.clone(),
                ..EmbeddingConfig::default()
            };
            temp_config.validate()?;
            Ok(())
        })
        .interact_text()?;

    let port: u16 = Input::new()
        .with_prompt("Ollama port")
        .default(embedding.port)
        .validate_with(|input: &u16| -> Result<(), &str> {
            if *input == 0 {
                Err("Port must be greater than 0")
            } else {
                Ok(())
            }
        })
        .interact_text()?;

    let model: String = Input::new()
        .with_prompt("Embedding model")
        .default(embedding.model.clone())
        .validate_with(|input: &String| -> Result<(), &str> {
            if input.trim().is_empty() {
                Err("Model name cannot be empty")
            } else {
                Ok(())
            }
        })
        .interact_text()?;

    let dimension: u32 = Input::new()
        .with_prompt("Embedding dimension")
        .default(embedding.embedding_dimension)
        .validate_with(|input: &u32| -> Result<(), &str> {
            if (8..=4096).contains(input) {
                Ok(())
            } else {
                Err("Dimension must be between 8 and 4096")
            }
        })
        .interact_text()?;

    let batch_size: u32 = Input::new()
        .with_prompt("Batch size for embedding generation")
        .default(embedding.batch_size)
        .validate_with(|input: &u32| -> Result<(), &str> {
            if *input == 0 {
                Err("Batch size must be greater than 0")
            } else if *input > 1000 {
                Err("Batch size must be 1000 or less")
            } else {
                Ok(())
            }
        })
        .interact_text()?;

    embedding.set_protocol(protocol)?;
    embedding.set_host(host)?;
    embedding.set_port(port)?;
    embedding.set_model(model)?;
    embedding.set_embedding_dimension(dimension)?;
    embedding.set_batch_size(batch_size)?;

    Ok(())
}

fn configure_generation(config: &mut Config) -> Result<()> {
    let gemini_model: String = Input::new()
        .with_prompt("Gemini model")
        .default(config.providers.gemini_model.clone())
        .interact_text()?;

    let max_tokens: u32 = Input::new()
        .with_prompt("Claude max output tokens")
        .default(config.providers.claude_max_tokens)
        .validate_with(|input: &u32| -> Result<(), &str> {
            if (1..=8192).contains(input) {
                Ok(())
            } else {
                Err("Max tokens must be between 1 and 8192")
            }
        })
        .interact_text()?;

    let top_k: usize = Input::new()
        .with_prompt("Passages retrieved per question")
        .default(config.retrieval.top_k)
        .validate_with(|input: &usize| -> Result<(), &str> {
            if (1..=100).contains(input) {
                Ok(())
            } else {
                Err("Top K must be between 1 and 100")
            }
        })
        .interact_text()?;

    config.providers.set_gemini_model(gemini_model)?;
    config.providers.set_claude_max_tokens(max_tokens)?;
    config.retrieval.set_top_k(top_k)?;

    Ok(())
}

fn configure_conversation(conversation: &mut ConversationConfig) -> Result<()> {
    // 0 keeps the whole history
    let window: usize = Input::new()
        .with_prompt("Turns of history sent with each question (0 = all)")
        .default(conversation.history_window.unwrap_or(0))
        .interact_text()?;

    let record_failed_turns = Confirm::new()
        .with_prompt("Keep failed answers in the conversation history?")
        .default(conversation.record_failed_turns)
        .interact()?;

    conversation.set_history_window((window > 0).then_some(window))?;
    conversation.record_failed_turns = record_failed_turns;

    Ok(())
}

fn test_embedding_connection(embedding: &EmbeddingConfig) -> Result<bool> {
    let url = format!(
        "{}://{}:{}/api/version",
        embedding.protocol, embedding.host, embedding.port
    );

    let agent: ureq::Agent = ureq::Agent::config_builder()
        .timeout_global(Some(std::time::Duration::from_secs(5)))
        .build()
        .into();

    match agent.get(&url).call() {
        Ok(_) => Ok(true),
        Err(ureq::Error::StatusCode(code)) if (400..500).contains(&code) => Ok(true),
        Err(_) => Ok(false),
    }
}
