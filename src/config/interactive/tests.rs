use super::test_embedding_connection;
use crate::config::EmbeddingConfig;

#[test]
fn unreachable_embedding_server_reports_false() {
    let embedding = EmbeddingConfig {
        host: "127.0.0.1".to_string(),
        port: 1,
        ..EmbeddingConfig::default()
    };

    let reachable = test_embedding_connection(&embedding).expect("connection check does not error");
    assert!(!reachable);
}
