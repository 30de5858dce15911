use super::*;
use serial_test::serial;
use std::collections::HashMap;

fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let vars: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
        .collect();
    move |name| vars.get(name).cloned()
}

#[test]
fn both_keys_present() {
    let credentials = Credentials::from_lookup(lookup_from(&[
        (GOOGLE_API_KEY_VAR, "g-key"),
        (CLAUDE_API_KEY_VAR, "c-key"),
    ]))
    .expect("credentials load");

    assert_eq!(credentials.google_api_key(), "g-key");
    assert_eq!(credentials.claude_api_key(), Some("c-key"));
}

#[test]
fn missing_primary_key_is_fatal() {
    let result = Credentials::from_lookup(lookup_from(&[(CLAUDE_API_KEY_VAR, "c-key")]));

    match result {
        Err(CredentialError::Missing(name)) => assert_eq!(name, GOOGLE_API_KEY_VAR),
        other => panic!("expected missing GOOGLE_API_KEY, got {other:?}"),
    }
}

#[test]
fn blank_keys_count_as_missing() {
    assert!(Credentials::from_lookup(lookup_from(&[(GOOGLE_API_KEY_VAR, "   ")])).is_err());

    let credentials = Credentials::from_lookup(lookup_from(&[
        (GOOGLE_API_KEY_VAR, "g-key"),
        (CLAUDE_API_KEY_VAR, ""),
    ]))
    .expect("credentials load");
    assert_eq!(credentials.claude_api_key(), None);
}

#[test]
fn secondary_key_is_optional() {
    let credentials = Credentials::new("g-key", None).expect("credentials build");
    assert_eq!(credentials.claude_api_key(), None);
}

#[test]
fn debug_output_redacts_keys() {
    let credentials =
        Credentials::new("super-secret", Some("also-secret".to_string())).expect("build");
    let rendered = format!("{credentials:?}");

    assert!(!rendered.contains("super-secret"));
    assert!(!rendered.contains("also-secret"));
    assert!(rendered.contains("<redacted>"));
}

#[test]
#[serial]
fn reads_process_environment() {
    // SAFETY: serialised with every other test that touches the process environment
    unsafe {
        std::env::set_var(GOOGLE_API_KEY_VAR, "env-g-key");
        std::env::remove_var(CLAUDE_API_KEY_VAR);
    }

    let credentials = Credentials::from_env().expect("credentials load from env");
    assert_eq!(credentials.google_api_key(), "env-g-key");
    assert_eq!(credentials.claude_api_key(), None);

    // SAFETY: see above
    unsafe {
        std::env::remove_var(GOOGLE_API_KEY_VAR);
    }
}
