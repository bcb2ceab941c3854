use assert_cmd::Command;
use assert_cmd::cargo;
use mockito::{Matcher, Server};
use predicates::prelude::*;
use serde_json::json;
use tempfile::tempdir;

fn datacite(url: &str) -> Command {
    let mut cmd = Command::new(cargo::cargo_bin!("datacite"));
    cmd.env("DATACITE_USER", "DC")
        .env("DATACITE_PW", "pw")
        .env_remove("DATACITE_URL")
        .env_remove("DATACITE_TEST_MODE")
        .env_remove("DATACITE_TIMEOUT")
        .arg("--prefix")
        .arg("10.5072")
        .arg("--api-url")
        .arg(url);
    cmd
}

fn record(doi: &str, url: &str) -> String {
    json!({"data": {"id": doi, "type": "dois", "attributes": {"doi": doi, "url": url}}})
        .to_string()
}

#[test]
fn test_resolve_prints_url() {
    let mut server = Server::new();
    let url = server.url();

    let mock = server
        .mock("GET", "/dois/10.5072/1")
        .match_header("authorization", Matcher::Regex("^Basic ".to_string()))
        .with_status(200)
        .with_body(record("10.5072/1", "https://example.org/landing"))
        .create();

    datacite(&url)
        .arg("resolve")
        .arg("10.5072/1")
        .assert()
        .success()
        .stdout("https://example.org/landing\n");

    mock.assert();
}

#[test]
fn test_resolve_not_found_fails() {
    let mut server = Server::new();
    let url = server.url();

    let _mock = server
        .mock("GET", "/dois/10.5072/missing")
        .with_status(404)
        .with_body("The resource you are looking for doesn't exist.")
        .create();

    datacite(&url)
        .arg("resolve")
        .arg("10.5072/missing")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Not found"));
}

#[test]
fn test_draft_prints_new_doi() {
    let mut server = Server::new();
    let url = server.url();

    let mock = server
        .mock("POST", "/dois")
        .match_body(Matcher::Json(
            json!({"data": {"attributes": {"prefix": "10.5072"}}}),
        ))
        .with_status(201)
        .with_body(record("10.5072/x7k2-9p", ""))
        .create();

    datacite(&url)
        .arg("draft")
        .assert()
        .success()
        .stdout("10.5072/x7k2-9p\n");

    mock.assert();
}

#[test]
fn test_publish_reads_metadata_file() {
    let mut server = Server::new();
    let url = server.url();

    let mock = server
        .mock("POST", "/dois")
        .match_body(Matcher::Json(json!({"data": {"attributes": {
            "titles": [{"title": "Test dataset"}],
            "url": "https://example.org/ds",
            "prefix": "10.5072",
            "event": "publish",
            "doi": "10.5072/ds-1"
        }}})))
        .with_status(201)
        .with_body(record("10.5072/ds-1", "https://example.org/ds"))
        .create();

    let dir = tempdir().unwrap();
    let metadata = dir.path().join("metadata.json");
    std::fs::write(
        &metadata,
        r#"{"titles": [{"title": "Test dataset"}], "url": "https://example.org/ds"}"#,
    )
    .unwrap();

    datacite(&url)
        .arg("publish")
        .arg("--metadata")
        .arg(&metadata)
        .arg("ds-1")
        .assert()
        .success()
        .stdout("10.5072/ds-1\n");

    mock.assert();
}

#[test]
fn test_set_url_with_foreign_prefix_fails() {
    let server = Server::new();

    datacite(&server.url())
        .arg("set-url")
        .arg("10.9999/1")
        .arg("https://example.org")
        .assert()
        .failure()
        .stderr(predicate::str::contains("does not match the configured prefix"));
}

#[test]
fn test_missing_credentials_fails() {
    let server = Server::new();

    datacite(&server.url())
        .env_remove("DATACITE_PW")
        .arg("hide")
        .arg("10.5072/1")
        .assert()
        .failure()
        .stderr(predicate::str::contains("DATACITE_PW"));
}

#[test]
fn test_validate_normalizes() {
    Command::new(cargo::cargo_bin!("datacite"))
        .env_remove("DATACITE_USER")
        .env_remove("DATACITE_PW")
        .arg("--prefix")
        .arg("10.5072")
        .arg("validate")
        .arg("https://doi.org/10.5072/ABC")
        .assert()
        .success()
        .stdout("10.5072/ABC\n");
}

#[test]
fn test_resolve_draft_prints_nothing() {
    let mut server = Server::new();
    let url = server.url();

    let _mock = server
        .mock("GET", "/dois/10.5072/draft")
        .with_status(200)
        .with_body(r#"{"data": {"id": "10.5072/draft", "attributes": {"url": null}}}"#)
        .create();

    datacite(&url)
        .arg("resolve")
        .arg("10.5072/draft")
        .assert()
        .success()
        .stdout("");
}

#[test]
fn test_test_mode_and_timeout_read_from_env() {
    let mut server = Server::new();
    let url = server.url();

    let mock = server
        .mock("GET", "/dois/10.5072/1")
        .with_status(200)
        .with_body(record("10.5072/1", "https://example.org/landing"))
        .create();

    // An explicit "off" keeps the custom API URL
    datacite(&url)
        .env("DATACITE_TEST_MODE", "off")
        .env("DATACITE_TIMEOUT", "10")
        .arg("resolve")
        .arg("10.5072/1")
        .assert()
        .success()
        .stdout("https://example.org/landing\n");

    mock.assert();

    datacite(&url)
        .env("DATACITE_TIMEOUT", "soon")
        .arg("resolve")
        .arg("10.5072/1")
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid value"));

    datacite(&url)
        .env("DATACITE_TEST_MODE", "maybe")
        .arg("resolve")
        .arg("10.5072/1")
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid value"));
}
