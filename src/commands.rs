use anyhow::{Context, Result};
use console::style;
use dialoguer::{Input, Select};
use std::fmt::Write as _;
use tracing::{error, info, warn};

use crate::AgentError;
use crate::config::{Config, Credentials};
use crate::corpus::{Corpus, Fingerprint};
use crate::embeddings::OllamaClient;
use crate::index::FlatL2Index;
use crate::indexer::IndexBuilder;
use crate::llm::Provider;
use crate::session::{Agent, Exchange, Session};

const ASK_SOMETHING_ELSE: &str = "Ask something else";

/// Embed the corpus and write a fresh index, replacing any previous one
#[inline]
pub fn build_index() -> Result<()> {
    let config = Config::load_default().context("Failed to load configuration")?;
    let corpus_path = config.corpus_path();
    let index_path = config.index_path();

    let corpus =
        Corpus::load(&corpus_path).map_err(|e| AgentError::Corpus(format!("{e:#}")))?;
    println!(
        "📄 Corpus: {} chunks from {}",
        corpus.len(),
        corpus_path.display()
    );

    let client = OllamaClient::new(&config.embedding)?;
    client
        .health_check()
        .map_err(|e| AgentError::Embedding(format!("{e:#}")))?;
    println!(
        "🤖 Embedding model: {} ({} dimensions)",
        client.model(),
        config.embedding.embedding_dimension
    );

    let stats = IndexBuilder::new(&client)
        .with_progress(true)
        .build_and_persist(&corpus, &index_path)
        .map_err(|e| AgentError::Index(format!("{e:#}")))?;

    println!(
        "{}",
        style(format!(
            "✓ Indexed {} chunks in {:.1?}",
            stats.chunks_indexed, stats.duration
        ))
        .green()
    );
    println!("   Index file: {}", index_path.display());

    Ok(())
}

/// Answer a single question and print the answer, its sources and follow-ups
#[inline]
pub fn ask(query: &str, provider: Provider, top_k: Option<usize>) -> Result<()> {
    let mut agent = load_agent(top_k)?;
    let mut session = Session::new();

    let exchange = agent.ask(&mut session, query, provider)?;
    print_exchange(&exchange, provider);

    Ok(())
}

/// Interactive session. Follow-up suggestions can be picked to ask them next.
#[inline]
pub fn chat(provider: Provider) -> Result<()> {
    let mut agent = load_agent(None)?;
    agent.warm_up().context("Failed to load knowledge base")?;

    let mut session = Session::new();
    let mut provider = provider;
    let mut pending: Option<String> = None;
    info!("Started chat session {}", session.id());

    println!("{}", style("💬 GDPR assistant").bold().cyan());
    println!(
        "Answering with {}. Commands: {}, {}, {}",
        style(provider.label()).cyan(),
        style("/provider").bold(),
        style("/history").bold(),
        style("/quit").bold()
    );
    println!();

    loop {
        let query = match pending.take() {
            Some(query) => {
                println!("{} {}", style("You:").bold(), query);
                query
            }
            None => Input::<String>::new()
                .with_prompt("You")
                .allow_empty(true)
                .interact_text()?,
        };

        match query.trim() {
            "/quit" | "/exit" => break,
            "/provider" => {
                provider = select_provider(&agent, provider)?;
                println!("Answering with {}.", style(provider.label()).cyan());
                continue;
            }
            "/history" => {
                print_history(&session);
                continue;
            }
            _ => {}
        }

        let exchange = match agent.ask(&mut session, &query, provider) {
            Ok(exchange) => exchange,
            Err(e) => {
                error!("Query failed: {:#}", e);
                println!("{}", style(format!("❌ {e:#}")).red());
                continue;
            }
        };
        print_exchange(&exchange, provider);

        if let Exchange::Answered { follow_ups, .. } = &exchange {
            pending = choose_follow_up(follow_ups)?;
        }
    }

    Ok(())
}

/// Report whether the embedding server, credentials, corpus and index are usable together
#[inline]
pub fn show_status() -> Result<()> {
    let config = Config::load_default().unwrap_or_default();

    println!("📊 Doc Agent Status Report");
    println!("{}", "=".repeat(50));
    println!();

    println!("🤖 Embedding Server:");
    match OllamaClient::new(&config.embedding) {
        Ok(client) => match client.health_check() {
            Ok(()) => {
                println!(
                    "   ✅ Ollama: Connected ({}:{})",
                    config.embedding.host, config.embedding.port
                );
                println!("   📋 Model: {}", config.embedding.model);
                println!("   🔢 Batch Size: {}", config.embedding.batch_size);
            }
            Err(e) => println!("   ⚠️  Ollama: Unavailable or model missing - {e:#}"),
        },
        Err(e) => println!("   ❌ Ollama: Invalid configuration - {e:#}"),
    }

    println!();
    println!("🔑 Credentials:");
    match Credentials::load() {
        Ok(credentials) => {
            println!("   ✅ GOOGLE_API_KEY: set");
            if credentials.claude_api_key().is_some() {
                println!("   ✅ CLAUDE_API_KEY: set");
            } else {
                println!("   ⚠️  CLAUDE_API_KEY: not set (Claude models unavailable)");
            }
        }
        Err(e) => println!("   ❌ {e}"),
    }

    println!();
    println!("📄 Corpus:");
    let corpus = match Corpus::load(config.corpus_path()) {
        Ok(corpus) => {
            println!("   ✅ {} chunks", corpus.len());
            println!("   🔏 Fingerprint: {}", hex(&corpus.fingerprint()));
            Some(corpus)
        }
        Err(e) => {
            println!("   ❌ {e:#}");
            None
        }
    };

    println!();
    println!("🔍 Vector Index:");
    let index = match FlatL2Index::load(config.index_path()) {
        Ok(index) => {
            println!(
                "   ✅ {} rows, {} dimensions",
                index.len(),
                index.dimension()
            );
            println!("   🔏 Fingerprint: {}", hex(&index.fingerprint()));
            Some(index)
        }
        Err(e) => {
            println!("   ❌ {} ({})", e, config.index_path().display());
            None
        }
    };

    if let (Some(corpus), Some(index)) = (&corpus, &index) {
        println!();
        println!("🔗 Consistency:");
        match index.verify_corpus(corpus) {
            Ok(()) => println!("   ✅ Index rows match the corpus"),
            Err(e) => {
                warn!("Index and corpus disagree: {}", e);
                println!("   ⚠️  {e}");
                println!("   Run 'doc-agent build' to rebuild the index.");
            }
        }
        if index.dimension() != config.embedding.embedding_dimension as usize {
            println!(
                "   ⚠️  Index has {} dimensions but the embedding model is configured for {}",
                index.dimension(),
                config.embedding.embedding_dimension
            );
        }
    }

    println!();
    println!("💡 Next Steps:");
    println!("   • Use 'doc-agent build' to (re)build the index from the corpus");
    println!("   • Use 'doc-agent ask \"<question>\"' for a one-off answer");
    println!("   • Use 'doc-agent chat' to start a conversation");

    Ok(())
}

fn load_agent(top_k: Option<usize>) -> Result<Agent> {
    let mut config = Config::load_default().context("Failed to load configuration")?;
    if let Some(top_k) = top_k {
        config
            .retrieval
            .set_top_k(top_k)
            .map_err(|e| AgentError::Config(e.to_string()))?;
    }

    let credentials = Credentials::load().map_err(|e| AgentError::Credentials(e.to_string()))?;
    Agent::from_config(&config, &credentials)
}

fn print_exchange(exchange: &Exchange, provider: Provider) {
    match exchange {
        Exchange::EmptyQuery => {}
        Exchange::NoResults => println!("{}", style(exchange.message()).yellow()),
        Exchange::Answered {
            answer,
            sources,
            follow_ups,
        } => {
            println!();
            if answer.failed {
                println!("{}", style(&answer.text).red());
            } else {
                println!("{} {}", style("Bot:").bold().green(), answer.text);
            }

            let cited: Vec<String> = sources
                .iter()
                .map(|source| {
                    source.label.as_ref().map_or_else(
                        || format!("#{}", source.id),
                        |label| format!("#{} {}", source.id, label),
                    )
                })
                .collect();
            println!(
                "{}",
                style(format!("Sources: {} · {}", cited.join(", "), provider.label())).dim()
            );

            if !follow_ups.is_empty() {
                println!();
                println!("{}", style("🔎 Suggested Follow-up Questions:").bold());
                for question in follow_ups {
                    println!("   • {question}");
                }
            }
            println!();
        }
    }
}

fn print_history(session: &Session) {
    if session.history().is_empty() {
        println!("{}", style("No conversation yet.").dim());
    } else {
        println!("{}", session.history().render());
    }
    println!();
}

fn select_provider(agent: &Agent, current: Provider) -> Result<Provider> {
    let items: Vec<String> = Provider::ALL
        .iter()
        .map(|provider| {
            if agent.is_available(*provider) {
                provider.label()
            } else {
                format!("{} (no API key)", provider.label())
            }
        })
        .collect();
    let default = Provider::ALL
        .iter()
        .position(|p| *p == current)
        .unwrap_or(0);

    let selected = Select::new()
        .with_prompt("Select provider")
        .items(&items)
        .default(default)
        .interact()?;

    Ok(Provider::ALL.get(selected).copied().unwrap_or(current))
}

fn choose_follow_up(follow_ups: &[String]) -> Result<Option<String>> {
    // A failed suggestion request comes back as one error line; nothing to pick then
    let questions: Vec<&str> = follow_ups
        .iter()
        .map(String::as_str)
        .filter(|line| !line.starts_with('❌'))
        .collect();
    if questions.is_empty() {
        return Ok(None);
    }

    let mut items = questions.clone();
    items.push(ASK_SOMETHING_ELSE);

    let selected = Select::new()
        .with_prompt("Pick a follow-up")
        .items(&items)
        .default(questions.len())
        .interact()?;

    Ok(questions.get(selected).map(|q| (*q).to_string()))
}

fn hex(fingerprint: &Fingerprint) -> String {
    fingerprint.iter().fold(String::with_capacity(32), |mut out, b| {
        let _ = write!(out, "{b:02x}");
        out
    })
}
