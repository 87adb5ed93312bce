use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// "ID3" header followed by an MPEG frame sync
const MP3: &str = "SUQzBAAAAAAAI1RTU0UAAAAPAAADTGF2ZjU4Ljc2LjEwMAD/+5DEAAAAAAAAAAAAAAAAAA==";

fn vocalize_cmd(config_dir: &Path) -> Command {
    let mut cmd: Command = cargo_bin_cmd!("vocalize").into();
    cmd.env("VOCALIZE_CONFIG_DIR", config_dir)
        .env_remove("VOCALIZE_ENDPOINT")
        .env_remove("RUST_LOG");
    cmd
}

fn write_config(dir: &Path, content: &str) {
    fs::write(dir.join("vocalize.toml"), content).unwrap();
}

async fn server_returning(response: ResponseTemplate) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/polly"))
        .respond_with(response)
        .mount(&server)
        .await;
    server
}

// ============================================================================
// Help, version, voices
// ============================================================================

#[test]
fn test_help_displays_usage() {
    let temp_dir = TempDir::new().unwrap();
    vocalize_cmd(temp_dir.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Speak text with Amazon Polly voices"))
        .stdout(predicate::str::contains("speak"))
        .stdout(predicate::str::contains("interactive"))
        .stdout(predicate::str::contains("voices"))
        .stdout(predicate::str::contains("config"));
}

#[test]
fn test_version_displays() {
    let temp_dir = TempDir::new().unwrap();
    vocalize_cmd(temp_dir.path())
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("vocalize"));
}

#[test]
fn test_voices_lists_all_four() {
    let temp_dir = TempDir::new().unwrap();
    vocalize_cmd(temp_dir.path())
        .arg("voices")
        .assert()
        .success()
        .stdout(predicate::str::contains("Joanna (Female) (default)"))
        .stdout(predicate::str::contains("Matthew (Male)"))
        .stdout(predicate::str::contains("Nicole (Female)"))
        .stdout(predicate::str::contains("Russell (Male)"));
}

// ============================================================================
// Config
// ============================================================================

#[test]
fn test_config_show_defaults() {
    let temp_dir = TempDir::new().unwrap();
    vocalize_cmd(temp_dir.path())
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("endpoint = (not set)"))
        .stdout(predicate::str::contains("voice = \"Joanna\""))
        .stdout(predicate::str::contains("player = (auto-detect)"))
        .stdout(predicate::str::contains("timeout_secs = 30"));
}

#[test]
fn test_config_set_voice_persists() {
    let temp_dir = TempDir::new().unwrap();
    vocalize_cmd(temp_dir.path())
        .args(["config", "set-voice", "matthew"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Matthew (Male)"));

    let saved = fs::read_to_string(temp_dir.path().join("vocalize.toml")).unwrap();
    assert!(saved.contains("voice = \"Matthew\""));

    vocalize_cmd(temp_dir.path())
        .arg("voices")
        .assert()
        .success()
        .stdout(predicate::str::contains("Matthew (Male) (default)"));
}

#[test]
fn test_config_set_voice_rejects_unknown() {
    let temp_dir = TempDir::new().unwrap();
    vocalize_cmd(temp_dir.path())
        .args(["config", "set-voice", "Brian"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown voice: Brian"));
}

#[test]
fn test_config_set_endpoint_validates_url() {
    let temp_dir = TempDir::new().unwrap();
    vocalize_cmd(temp_dir.path())
        .args(["config", "set-endpoint", "not-a-url"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("http://"));

    vocalize_cmd(temp_dir.path())
        .args(["config", "set-endpoint", "https://abc.execute-api.us-east-2.amazonaws.com/dev/"])
        .assert()
        .success();

    vocalize_cmd(temp_dir.path())
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "endpoint = \"https://abc.execute-api.us-east-2.amazonaws.com/dev\"",
        ));
}

#[test]
fn test_config_set_timeout_rejects_zero() {
    let temp_dir = TempDir::new().unwrap();
    vocalize_cmd(temp_dir.path())
        .args(["config", "set-timeout", "0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("at least 1 second"));
}

// ============================================================================
// Speak
// ============================================================================

#[test]
fn test_speak_without_endpoint_fails() {
    let temp_dir = TempDir::new().unwrap();
    vocalize_cmd(temp_dir.path())
        .args(["speak", "Hello", "--no-play", "-o"])
        .arg(temp_dir.path().join("out.mp3"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("vocalize config set-endpoint"));
}

#[test]
fn test_no_play_requires_output() {
    let temp_dir = TempDir::new().unwrap();
    vocalize_cmd(temp_dir.path())
        .args(["speak", "Hello", "--no-play"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--no-play needs --output"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_speak_saves_decoded_audio() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/polly"))
        .and(body_json(serde_json::json!({
            "voiceId": "Joanna",
            "text": "Hello, how are you today?"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "audio": MP3,
            "message": "Audio generated successfully"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let temp_dir = TempDir::new().unwrap();
    let output = temp_dir.path().join("hello.mp3");

    vocalize_cmd(temp_dir.path())
        .env("VOCALIZE_ENDPOINT", server.uri())
        .args(["speak", "Hello,", "how", "are", "you", "today?", "--no-play", "-o"])
        .arg(&output)
        .assert()
        .success()
        .stderr(predicate::str::contains("Saved"));

    let bytes = fs::read(&output).unwrap();
    assert!(bytes.starts_with(b"ID3"));
    assert_eq!(bytes.len(), 52);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_speak_reads_text_from_stdin() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/polly"))
        .and(body_json(serde_json::json!({"voiceId": "Nicole", "text": "From a pipe"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"audio": MP3})))
        .expect(1)
        .mount(&server)
        .await;

    let temp_dir = TempDir::new().unwrap();
    vocalize_cmd(temp_dir.path())
        .env("VOCALIZE_ENDPOINT", server.uri())
        .args(["speak", "--voice", "Nicole", "--no-play", "-o"])
        .arg(temp_dir.path().join("out.mp3"))
        .write_stdin("From a pipe\n")
        .assert()
        .success();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_speak_plays_with_configured_player() {
    let server =
        server_returning(ResponseTemplate::new(200).set_body_json(serde_json::json!({"audio": MP3})))
            .await;

    let temp_dir = TempDir::new().unwrap();
    write_config(temp_dir.path(), "player = \"true\"\n");

    vocalize_cmd(temp_dir.path())
        .env("VOCALIZE_ENDPOINT", server.uri())
        .args(["speak", "Hello"])
        .assert()
        .success()
        .stderr(predicate::str::contains("Playing"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_speak_saves_audio_when_player_fails() {
    let server =
        server_returning(ResponseTemplate::new(200).set_body_json(serde_json::json!({"audio": MP3})))
            .await;

    let temp_dir = TempDir::new().unwrap();
    write_config(temp_dir.path(), "player = \"definitely-missing-player\"\n");
    let output = temp_dir.path().join("out.mp3");

    vocalize_cmd(temp_dir.path())
        .env("VOCALIZE_ENDPOINT", server.uri())
        .args(["speak", "Hello", "-o"])
        .arg(&output)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Saved"))
        .stderr(predicate::str::contains("Error playing audio"));

    let bytes = fs::read(&output).unwrap();
    assert!(bytes.starts_with(b"ID3"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_speak_reports_server_error() {
    let server = server_returning(
        ResponseTemplate::new(500).set_body_json(serde_json::json!({"error": "Polly is down"})),
    )
    .await;

    let temp_dir = TempDir::new().unwrap();
    vocalize_cmd(temp_dir.path())
        .env("VOCALIZE_ENDPOINT", server.uri())
        .args(["speak", "Hello", "--no-play", "-o"])
        .arg(temp_dir.path().join("out.mp3"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("HTTP 500: Polly is down"));

    assert!(!temp_dir.path().join("out.mp3").exists());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_speak_reports_missing_audio() {
    let server =
        server_returning(ResponseTemplate::new(200).set_body_json(serde_json::json!({"audio": ""})))
            .await;

    let temp_dir = TempDir::new().unwrap();
    vocalize_cmd(temp_dir.path())
        .env("VOCALIZE_ENDPOINT", server.uri())
        .args(["speak", "Hello", "--no-play", "-o"])
        .arg(temp_dir.path().join("out.mp3"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("No audio data received from API"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_speak_reports_invalid_base64() {
    let server = server_returning(
        ResponseTemplate::new(200).set_body_json(serde_json::json!({"audio": "not-valid-base64!!"})),
    )
    .await;

    let temp_dir = TempDir::new().unwrap();
    vocalize_cmd(temp_dir.path())
        .env("VOCALIZE_ENDPOINT", server.uri())
        .args(["speak", "Hello", "--no-play", "-o"])
        .arg(temp_dir.path().join("out.mp3"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error processing audio"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_speak_reports_malformed_json() {
    let server =
        server_returning(ResponseTemplate::new(200).set_body_string("<html>oops</html>")).await;

    let temp_dir = TempDir::new().unwrap();
    vocalize_cmd(temp_dir.path())
        .env("VOCALIZE_ENDPOINT", server.uri())
        .args(["speak", "Hello", "--no-play", "-o"])
        .arg(temp_dir.path().join("out.mp3"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("Malformed response"));
}

// ============================================================================
// Interactive
// ============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_interactive_session() {
    let server =
        server_returning(ResponseTemplate::new(200).set_body_json(serde_json::json!({"audio": ""})))
            .await;

    let temp_dir = TempDir::new().unwrap();
    vocalize_cmd(temp_dir.path())
        .env("VOCALIZE_ENDPOINT", server.uri())
        .arg("interactive")
        .write_stdin(":voice Russell\n:voice Brian\nSay something\n:status\n:quit\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Voice: Russell (Male)"))
        .stdout(predicate::str::contains("Unknown voice: Brian"))
        .stdout(predicate::str::contains("Generating audio..."))
        .stdout(predicate::str::contains("Error: No audio data received from API"))
        .stdout(predicate::str::contains("Text:     Say something"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_interactive_ignores_speak_while_loading() {
    let server = server_returning(
        ResponseTemplate::new(200)
            .set_body_json(serde_json::json!({"audio": ""}))
            .set_delay(std::time::Duration::from_millis(500)),
    )
    .await;

    let temp_dir = TempDir::new().unwrap();
    vocalize_cmd(temp_dir.path())
        .env("VOCALIZE_ENDPOINT", server.uri())
        .arg("interactive")
        .write_stdin("Hello\n\n\n\n:status\n:quit\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Still loading, please wait"))
        .stdout(predicate::str::contains("Text:     Hello"));

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
}

#[test]
fn test_interactive_exits_on_eof() {
    let temp_dir = TempDir::new().unwrap();
    write_config(temp_dir.path(), "endpoint = \"http://127.0.0.1:9\"\n");

    vocalize_cmd(temp_dir.path())
        .arg("interactive")
        .write_stdin("")
        .assert()
        .success()
        .stdout(predicate::str::contains("[Joanna | Speak] >"));
}
