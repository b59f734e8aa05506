//! End-to-end runs of the `vectory` binary

use assert_cmd::Command;
use predicates::prelude::*;
use std::io::{BufRead, BufReader, Read, Write};
use std::net::TcpListener;
use std::thread;
use tempfile::TempDir;

/// Command isolated from the caller's config and environment
fn vectory(config_dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("vectory").unwrap();
    cmd.current_dir(config_dir.path())
        .env("VECTORY_CONFIG", config_dir.path().join("config.yml"))
        .env_remove("WEAVIATE_HTTP_HOST")
        .env_remove("WEAVIATE_HTTP_PORT")
        .env_remove("WEAVIATE_API_KEY")
        .env_remove("RUST_LOG");
    cmd
}

/// Answer each connection with the next JSON body
fn serve(bodies: Vec<&'static str>) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port().to_string();

    thread::spawn(move || {
        for body in bodies {
            let (stream, _) = listener.accept().unwrap();
            let mut reader = BufReader::new(stream.try_clone().unwrap());
            let mut content_length = 0usize;
            loop {
                let mut line = String::new();
                reader.read_line(&mut line).unwrap();
                let line = line.trim_end().to_ascii_lowercase();
                if line.is_empty() {
                    break;
                }
                if let Some(value) = line.strip_prefix("content-length:") {
                    content_length = value.trim().parse().unwrap();
                }
            }
            let mut request_body = vec![0u8; content_length];
            reader.read_exact(&mut request_body).unwrap();

            let mut stream = stream;
            write!(
                stream,
                "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                body.len(),
                body
            )
            .unwrap();
        }
    });

    port
}

#[test]
fn test_version() {
    let dir = TempDir::new().unwrap();
    vectory(&dir)
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("vectory"));
}

#[test]
fn test_missing_subcommand_is_a_usage_error() {
    let dir = TempDir::new().unwrap();
    vectory(&dir).assert().failure();
}

#[test]
fn test_health_against_unreachable_server() {
    let dir = TempDir::new().unwrap();
    vectory(&dir)
        .args(["--http-host", "127.0.0.1", "--http-port", "1", "health", "live"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Vector database is not live"));
}

#[test]
fn test_health_status_as_json() {
    let dir = TempDir::new().unwrap();
    vectory(&dir)
        .args([
            "--http-host",
            "127.0.0.1",
            "--http-port",
            "1",
            "--format",
            "json",
            "health",
            "status",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""live": false"#))
        .stdout(predicate::str::contains("Checking").not());
}

#[test]
fn test_config_file_sets_connection() {
    let dir = TempDir::new().unwrap();
    std::fs::write(
        dir.path().join("config.yml"),
        "http_host: 127.0.0.1\nhttp_port: \"1\"\n",
    )
    .unwrap();

    vectory(&dir)
        .arg("health")
        .assert()
        .success()
        .stdout(predicate::str::contains("at http://127.0.0.1:1/v1"));
}

#[test]
fn test_dotenv_in_working_directory() {
    let dir = TempDir::new().unwrap();
    std::fs::write(
        dir.path().join(".env"),
        "WEAVIATE_HTTP_HOST=127.0.0.1\nWEAVIATE_HTTP_PORT=1\n",
    )
    .unwrap();

    vectory(&dir)
        .arg("health")
        .assert()
        .success()
        .stdout(predicate::str::contains("at http://127.0.0.1:1/v1"));
}

#[test]
fn test_invalid_fusion_type_is_reported() {
    let dir = TempDir::new().unwrap();
    vectory(&dir)
        .args([
            "--http-port",
            "1",
            "search",
            "hybrid",
            "Docs",
            "cats",
            "--fusion-type",
            "bogus",
        ])
        .assert()
        .success()
        .stderr(predicate::str::contains("Error:"))
        .stderr(predicate::str::contains("rankedFusion"));
}

#[test]
fn test_create_rejects_non_object_properties() {
    let dir = TempDir::new().unwrap();
    vectory(&dir)
        .args(["--http-port", "1", "objects", "create", "Docs", "-p", "[1, 2]"])
        .assert()
        .success()
        .stderr(predicate::str::contains("must be a JSON object"));
}

#[test]
fn test_count_from_server() {
    let dir = TempDir::new().unwrap();
    let port = serve(vec![r#"{"data": {"Aggregate": {"Docs": [{"meta": {"count": 7}}]}}}"#]);

    vectory(&dir)
        .args(["--http-host", "127.0.0.1", "--http-port", &port, "objects", "count", "Docs"])
        .assert()
        .success()
        .stdout(predicate::str::contains("7 objects in 'Docs'"));
}

#[test]
fn test_client_side_search_from_server() {
    let dir = TempDir::new().unwrap();
    let port = serve(vec![
        r#"{"classes": [{"class": "Docs", "vectorizer": "none", "properties": [{"name": "text", "dataType": ["text"]}]}]}"#,
        r#"{"objects": [
            {"id": "id-1", "class": "Docs", "properties": {"text": "cats"}},
            {"id": "id-2", "class": "Docs", "properties": {"text": "dogs"}}
        ]}"#,
    ]);

    vectory(&dir)
        .args([
            "--http-host",
            "127.0.0.1",
            "--http-port",
            &port,
            "--format",
            "json",
            "search",
            "text",
            "Docs",
            "CATS",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""strategy": "client_side""#))
        .stdout(predicate::str::contains("id-1"))
        .stdout(predicate::str::contains("id-2").not());
}
