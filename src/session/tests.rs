use super::*;
use crate::corpus::Corpus;
use crate::indexer::IndexBuilder;
use crate::llm::{ClaudeModel, GenerationError, TextGenerator};
use std::sync::Mutex;

const VOCABULARY: [&str; 8] = [
    "scope", "definitions", "consent", "erasure", "breach", "controller", "processor", "article",
];

/// Counts vocabulary words; enough to tell the test articles apart
struct VocabularyEmbedder;

impl Embedder for VocabularyEmbedder {
    fn dimension(&self) -> usize {
        VOCABULARY.len()
    }

    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts
            .iter()
            .map(|text| {
                let text = text.to_lowercase();
                VOCABULARY
                    .iter()
                    .map(|word| text.matches(word).count() as f32)
                    .collect()
            })
            .collect())
    }
}

/// Answers questions with a fixed reply and follow-up requests with a bullet list
struct Scripted {
    answer: Option<&'static str>,
    prompts: Arc<Mutex<Vec<String>>>,
}

impl TextGenerator for Scripted {
    fn model(&self) -> &str {
        "scripted"
    }

    fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        self.prompts
            .lock()
            .expect("prompt log lock")
            .push(prompt.to_string());

        if prompt.starts_with("Based on this answer") {
            return Ok("• What is Article 5?\n• How is consent defined?".to_string());
        }
        self.answer
            .map(str::to_string)
            .ok_or_else(|| GenerationError::Transport("connection refused".to_string()))
    }
}

fn corpus() -> Corpus {
    Corpus::from_contents([
        "Article 1: scope of the regulation",
        "Article 4: definitions of controller and processor",
        "Article 7: conditions for consent",
        "Article 17: right to erasure",
    ])
}

fn agent_with(answer: Option<&'static str>, config: &Config) -> (Agent, Arc<Mutex<Vec<String>>>) {
    let corpus = corpus();
    let index = IndexBuilder::new(&VocabularyEmbedder)
        .build(&corpus)
        .expect("index builds");
    let knowledge = KnowledgeBaseCache::new(Duration::from_secs(3600), move || {
        KnowledgeBase::new(corpus.clone(), index.clone(), Arc::new(VocabularyEmbedder))
    });

    let prompts = Arc::new(Mutex::new(Vec::new()));
    let registry = ProviderRegistry::new(Box::new(Scripted {
        answer,
        prompts: Arc::clone(&prompts),
    }));

    (Agent::new(knowledge, Arc::new(registry), config), prompts)
}

#[test]
fn successful_answer_is_recorded_with_follow_ups() {
    let (mut agent, prompts) = agent_with(Some("Consent must be freely given."), &Config::default());
    let mut session = Session::new();

    let exchange = agent
        .ask(&mut session, "What are the conditions for consent?", Provider::Gemini)
        .expect("ask");

    let Exchange::Answered {
        answer,
        sources,
        follow_ups,
    } = exchange
    else {
        panic!("expected an answer");
    };
    assert_eq!(answer.text, "Consent must be freely given.");
    assert!(!answer.failed);
    assert_eq!(sources.first().map(|s| s.id), Some(2));
    assert!(sources.len() <= Config::default().retrieval.top_k);
    assert_eq!(follow_ups, vec!["What is Article 5?", "How is consent defined?"]);

    assert_eq!(session.history().len(), 1);
    assert_eq!(
        session.history().render(),
        "User: What are the conditions for consent?\nBot: Consent must be freely given."
    );

    let prompts = prompts.lock().expect("prompt log lock");
    assert_eq!(prompts.len(), 2);
    assert!(prompts[0].contains("Article 7: conditions for consent"));
}

#[test]
fn history_flows_into_later_prompts() {
    let (mut agent, prompts) = agent_with(Some("answer"), &Config::default());
    let mut session = Session::new();

    agent
        .ask(&mut session, "What is the scope?", Provider::Gemini)
        .expect("first ask");
    agent
        .ask(&mut session, "And erasure?", Provider::Gemini)
        .expect("second ask");

    assert_eq!(session.history().len(), 2);
    let prompts = prompts.lock().expect("prompt log lock");
    let second_answer_prompt = prompts
        .iter()
        .filter(|p| p.starts_with("Using the following document parts"))
        .nth(1)
        .expect("second answer prompt");
    assert!(second_answer_prompt.contains("User: What is the scope?\nBot: answer\nUser: And erasure?\nBot:"));
}

#[test]
fn blank_query_does_nothing() {
    let (mut agent, prompts) = agent_with(Some("answer"), &Config::default());
    let mut session = Session::new();

    let exchange = agent.ask(&mut session, "   \n", Provider::Gemini).expect("ask");

    assert_eq!(exchange, Exchange::EmptyQuery);
    assert!(session.history().is_empty());
    assert!(prompts.lock().expect("prompt log lock").is_empty());
}

#[test]
fn no_results_skips_generation() {
    let (agent, prompts) = agent_with(Some("answer"), &Config::default());
    let mut agent = agent.with_top_k(0);
    let mut session = Session::new();

    let exchange = agent.ask(&mut session, "consent", Provider::Gemini).expect("ask");

    assert_eq!(exchange, Exchange::NoResults);
    assert_eq!(exchange.message(), NO_RESULTS_MESSAGE);
    assert!(session.history().is_empty());
    assert!(prompts.lock().expect("prompt log lock").is_empty());
}

#[test]
fn failed_turn_is_not_recorded_by_default() {
    let (mut agent, prompts) = agent_with(None, &Config::default());
    let mut session = Session::new();

    let exchange = agent.ask(&mut session, "consent", Provider::Gemini).expect("ask");

    let Exchange::Answered {
        answer, follow_ups, ..
    } = exchange
    else {
        panic!("expected an answer");
    };
    assert!(answer.failed);
    assert_eq!(answer.text, "❌ Gemini API error: connection refused");
    assert!(follow_ups.is_empty());
    assert!(session.history().is_empty());
    assert_eq!(prompts.lock().expect("prompt log lock").len(), 1);
}

#[test]
fn failed_turn_is_recorded_when_configured() {
    let mut config = Config::default();
    config.conversation.record_failed_turns = true;
    let (mut agent, _) = agent_with(None, &config);
    let mut session = Session::new();

    agent.ask(&mut session, "consent", Provider::Gemini).expect("ask");

    assert_eq!(session.history().len(), 1);
    assert_eq!(
        session.history().turns()[0].answer,
        "❌ Gemini API error: connection refused"
    );
}

#[test]
fn unavailable_provider_yields_sentinel_answer() {
    let (mut agent, prompts) = agent_with(Some("answer"), &Config::default());
    let mut session = Session::new();
    let haiku = Provider::Claude(ClaudeModel::Haiku);

    assert!(!agent.is_available(haiku));
    let exchange = agent.ask(&mut session, "consent", haiku).expect("ask");

    assert_eq!(exchange.message(), crate::answer::MISSING_CLAUDE_KEY);
    assert!(prompts.lock().expect("prompt log lock").is_empty());
}

#[test]
fn knowledge_base_failure_is_an_error() {
    let knowledge = KnowledgeBaseCache::new(Duration::from_secs(60), || {
        Err(anyhow::anyhow!("index file missing"))
    });
    let registry = ProviderRegistry::new(Box::new(Scripted {
        answer: Some("answer"),
        prompts: Arc::new(Mutex::new(Vec::new())),
    }));
    let mut agent = Agent::new(knowledge, Arc::new(registry), &Config::default());

    assert!(agent.warm_up().is_err());
    assert!(agent
        .ask(&mut Session::new(), "consent", Provider::Gemini)
        .is_err());
}

#[test]
fn sessions_have_distinct_ids() {
    assert_ne!(Session::new().id(), Session::new().id());
}

#[test]
fn from_config_rejects_unreachable_embedder() {
    let mut config = Config::default();
    config.embedding.host = "127.0.0.1".to_string();
    config.embedding.port = 1;
    let credentials = Credentials::new("g-key", None).expect("credentials");

    let error = match Agent::from_config(&config, &credentials) {
        Ok(_) => panic!("agent should not start without an embedder"),
        Err(e) => e,
    };

    assert!(matches!(
        error.downcast_ref::<crate::AgentError>(),
        Some(crate::AgentError::Embedding(_))
    ));
}

#[tokio::test]
async fn from_config_rejects_embedder_with_wrong_dimension() {
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/embed"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({ "embeddings": [[0.1, 0.2, 0.3]] })),
        )
        .mount(&server)
        .await;

    let mut config = Config::default();
    config.embedding.host = "127.0.0.1".to_string();
    config.embedding.port = server.address().port();
    config.embedding.embedding_dimension = 8;
    let credentials = Credentials::new("g-key", None).expect("credentials");

    let result = tokio::task::spawn_blocking(move || Agent::from_config(&config, &credentials).map(|_| ()))
        .await
        .expect("blocking task joins");

    let error = result.expect_err("dimension mismatch should stop startup");
    assert!(matches!(
        error.downcast_ref::<crate::AgentError>(),
        Some(crate::AgentError::Embedding(_))
    ));
}
