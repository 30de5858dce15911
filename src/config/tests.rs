use super::*;
use std::fs;
use tempfile::TempDir;

#[cfg(test)]
mod integration_tests {
    use super::*;

    #[test]
    fn config_file_persistence() {
        let temp_dir = TempDir::new().expect("should create TempDir successfully");
        let config_path = temp_dir.path().join("config.toml");

        let mut original_config = Config::default();
        original_config.embedding = EmbeddingConfig {
            protocol: "https".to_string(),
            host: "test-host".to_string(),
            port: 8080,
            model: "test-model".to_string(),
            batch_size: 32,
            embedding_dimension: 768,
        };
        original_config.providers.claude_max_tokens = 512;

        let toml_content = toml::to_string_pretty(&original_config)
            .expect("config should convert to toml string successfully");
        fs::write(&config_path, toml_content).expect("should write to config_path successfully");

        let content =
            fs::read_to_string(&config_path).expect("should read from config_path successfully");
        let loaded_config: Config = toml::from_str(&content).expect("should parse toml correctly");

        assert_eq!(original_config, loaded_config);
    }

    #[test]
    fn invalid_toml_handling() {
        let invalid_toml = r#"
            [embedding
            host = "localhost"
            port = "invalid_port"
        "#;

        let result: Result<Config, toml::de::Error> = toml::from_str(invalid_toml);
        assert!(result.is_err());
    }

    #[test]
    fn partial_config_with_defaults() {
        let partial_toml = r#"
            [embedding]
            host = "custom-host"

            [retrieval]
            top_k = 8
        "#;

        let config: Config = toml::from_str(partial_toml).expect("partial config parses");
        assert_eq!(config.embedding.host, "custom-host");
        assert_eq!(config.embedding.port, 11434);
        assert_eq!(config.retrieval.top_k, 8);
        assert_eq!(config.retrieval.cache_ttl_secs, 3600);
        assert_eq!(config.providers, ProviderConfig::default());
    }

    #[test]
    fn complete_valid_config() {
        let valid_toml = r#"
            [embedding]
            protocol = "http"
            host = "localhost"
            port = 11434
            model = "all-minilm"
            batch_size = 64
            embedding_dimension = 384

            [providers]
            gemini_base_url = "https://generativelanguage.googleapis.com"
            gemini_model = "gemini-1.5-pro"
            claude_base_url = "https://api.anthropic.com"
            anthropic_version = "2023-06-01"
            claude_max_tokens = 1000
            request_timeout_secs = 60

            [retrieval]
            top_k = 5
            cache_ttl_secs = 600

            [conversation]
            history_window = 6
            record_failed_turns = true

            [data]
            corpus_path = "data/gdpr_articles.json"
        "#;

        let config: Config = toml::from_str(valid_toml).expect("should parse toml successfully");
        assert!(config.validate().is_ok());
        assert_eq!(config.providers.request_timeout_secs, 60);
        assert_eq!(config.conversation.history_window, Some(6));
        assert!(config.conversation.record_failed_turns);
        assert_eq!(config.data.index_path, None);
    }

    #[test]
    fn config_validation_edge_cases() {
        let mut config = Config::default();
        config.embedding.host = String::new();

        let result = config.validate();
        assert!(result.is_err()); // Empty host should be invalid
    }

    #[test]
    fn invalid_file_fails_load() {
        let temp_dir = TempDir::new().expect("should create TempDir successfully");
        fs::write(
            temp_dir.path().join("config.toml"),
            "[retrieval]\ntop_k = 0\n",
        )
        .expect("should write config");

        assert!(Config::load(temp_dir.path()).is_err());
    }

    #[test]
    fn port_boundary_validation() {
        let mut config = EmbeddingConfig::default();

        assert!(config.set_port(1).is_ok());
        assert!(config.set_port(65535).is_ok());
        assert!(config.set_port(0).is_err());
    }

    #[test]
    fn batch_size_boundary_validation() {
        let mut config = EmbeddingConfig::default();

        assert!(config.set_batch_size(1).is_ok());
        assert!(config.set_batch_size(1000).is_ok());
        assert!(config.set_batch_size(0).is_err());
        assert!(config.set_batch_size(1001).is_err());
    }

    #[test]
    fn error_display_messages() {
        let errors = vec![
            ConfigError::InvalidProtocol("ftp".to_string()),
            ConfigError::InvalidPort(0),
            ConfigError::InvalidBatchSize(0),
            ConfigError::InvalidModel(String::new()),
            ConfigError::InvalidUrl("invalid-url".to_string()),
            ConfigError::InvalidTopK(0),
            ConfigError::InvalidHistoryWindow(0),
        ];

        for error in errors {
            let message = format!("{error}");
            assert!(!message.is_empty());
            assert!(message.len() > 10);
        }
    }
}
