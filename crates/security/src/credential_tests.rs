// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use serial_test::serial;

#[test]
#[serial]
fn get_credential_resolves_from_environment() {
    std::env::set_var("RN_TEST_CRED_A", "supersecretvalue123");
    let store = CredentialStore::new();
    assert_eq!(
        store.get_credential("cred_a", Some("RN_TEST_CRED_A")),
        Some("supersecretvalue123".to_string())
    );
    std::env::remove_var("RN_TEST_CRED_A");
}

#[test]
#[serial]
fn get_credential_falls_back_to_name_as_env_var() {
    std::env::set_var("CRED_B", "value-b");
    let store = CredentialStore::new();
    assert_eq!(
        store.get_credential("CRED_B", None),
        Some("value-b".to_string())
    );
    std::env::remove_var("CRED_B");
}

#[test]
#[serial]
fn get_credential_falls_back_to_file_mount() {
    std::env::remove_var("RN_TEST_CRED_FILE");
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("secret.txt");
    std::fs::write(&path, "file-secret-value\n").unwrap();
    let store = CredentialStore::new();
    store.register_file_mount("cred_file", path);
    assert_eq!(
        store.get_credential("cred_file", Some("RN_TEST_CRED_FILE")),
        Some("file-secret-value".to_string())
    );
}

#[test]
#[serial]
fn get_credential_rejects_empty_file() {
    std::env::remove_var("RN_TEST_CRED_EMPTY");
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("empty.txt");
    std::fs::write(&path, "   \n").unwrap();
    let store = CredentialStore::new();
    store.register_file_mount("cred_empty", path);
    assert_eq!(store.get_credential("cred_empty", Some("RN_TEST_CRED_EMPTY")), None);
}

#[test]
#[serial]
fn get_credential_returns_none_without_raising_when_missing() {
    std::env::remove_var("RN_TEST_CRED_MISSING");
    let store = CredentialStore::new();
    assert_eq!(store.get_credential("missing", Some("RN_TEST_CRED_MISSING")), None);
}

#[test]
#[serial]
fn validate_raises_for_missing_required_credential() {
    std::env::remove_var("RN_TEST_CRED_REQ");
    let store = CredentialStore::new();
    assert!(store.validate(&["required_cred"]).is_err());
}

#[test]
#[serial]
fn validate_passes_once_credential_resolved() {
    std::env::set_var("RN_TEST_CRED_REQ2", "x");
    let store = CredentialStore::new();
    store.get_credential("required_cred", Some("RN_TEST_CRED_REQ2"));
    assert!(store.validate(&["required_cred"]).is_ok());
    std::env::remove_var("RN_TEST_CRED_REQ2");
}

#[test]
#[serial]
fn mask_replaces_known_long_secret_with_first4_last4() {
    std::env::set_var("RN_TEST_CRED_LONG", "abcdefghijklmnopqrstuvwxyz");
    let store = CredentialStore::new();
    store.get_credential("long", Some("RN_TEST_CRED_LONG"));
    let masked = store.mask("log line contains abcdefghijklmnopqrstuvwxyz inline");
    assert!(masked.contains("abcd***wxyz"));
    assert!(!masked.contains("abcdefghijklmnopqrstuvwxyz"));
    std::env::remove_var("RN_TEST_CRED_LONG");
}

#[test]
#[serial]
fn mask_replaces_known_short_secret_with_bare_stars() {
    std::env::set_var("RN_TEST_CRED_SHORT", "short1");
    let store = CredentialStore::new();
    store.get_credential("short", Some("RN_TEST_CRED_SHORT"));
    let masked = store.mask("token is short1 here");
    assert!(masked.contains("***"));
    assert!(!masked.contains("short1"));
    std::env::remove_var("RN_TEST_CRED_SHORT");
}

#[test]
fn mask_redacts_bearer_token_pattern() {
    let store = CredentialStore::new();
    let masked = store.mask("Authorization: Bearer abcd1234.efgh5678");
    assert!(masked.contains("Bearer ***"));
    assert!(!masked.contains("abcd1234"));
}

#[test]
fn mask_redacts_api_key_assignment() {
    let store = CredentialStore::new();
    let masked = store.mask("config: api_key=sk_live_abcdefgh1234");
    assert!(masked.contains("api_key=***"));
}

#[test]
fn mask_redacts_github_token_prefix_per_scenario_s6() {
    let store = CredentialStore::new();
    let token = format!("ghp_{}", "a".repeat(36));
    let line = format!("using token {token} to clone");
    let masked = store.mask(&line);
    assert!(masked.contains("gh*_***"));
    assert!(!masked.contains(&token));
}

#[test]
fn mask_is_idempotent_per_scenario_s6() {
    let store = CredentialStore::new();
    let token = format!("ghp_{}", "b".repeat(36));
    let line = format!("token={token}");
    let once = store.mask(&line);
    let twice = store.mask(&once);
    assert_eq!(once, twice);
}

#[test]
fn mask_redacts_quoted_base64_like_run() {
    let store = CredentialStore::new();
    let blob = "A".repeat(40);
    let masked = store.mask(&format!("payload: \"{blob}\""));
    assert!(!masked.contains(&blob));
}

#[test]
#[serial]
fn mask_structured_replaces_sensitive_keys_regardless_of_content() {
    std::env::remove_var("RN_TEST_UNUSED");
    let store = CredentialStore::new();
    let input = serde_json::json!({
        "username": "alice",
        "api_token": "plain-value-not-registered",
        "nested": {"password": "hunter2"},
    });
    let masked = store.mask_structured(&input);
    assert_eq!(masked["api_token"], "***");
    assert_eq!(masked["nested"]["password"], "***");
    assert_eq!(masked["username"], "alice");
}

#[test]
fn mask_structured_recurses_into_arrays() {
    let store = CredentialStore::new();
    let input = serde_json::json!({"secrets": ["password=abc", "plain"]});
    let masked = store.mask_structured(&input);
    assert_eq!(masked["secrets"][1], "plain");
}

#[test]
#[serial]
fn clear_removes_all_secrets_and_mask_set() {
    std::env::set_var("RN_TEST_CRED_CLEAR", "clearable-secret-value");
    let store = CredentialStore::new();
    store.get_credential("clearable", Some("RN_TEST_CRED_CLEAR"));
    store.clear();
    assert!(store.validate(&["clearable"]).is_err());
    let masked = store.mask("clearable-secret-value still here");
    assert!(masked.contains("clearable-secret-value"));
    std::env::remove_var("RN_TEST_CRED_CLEAR");
}
