use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::fs;
use std::io::{ErrorKind, Read, Write};
use std::net::TcpListener;
use std::process::Command;
use std::thread::{self, JoinHandle};
use tempfile::TempDir;

const REPORT_BODY: &str = r#"{
    "username": "elio",
    "directorio": "liquidacion-abril25",
    "numero_facturas": 3,
    "monto_total_calculado": 60.75,
    "facturas": [
        {"id": 101, "montoTotal": 10, "fechaTransaccion": "2025-04-02"},
        {"id": 102, "montoTotal": 20.5, "fechaTransaccion": "2025-04-09"},
        {"id": "F-103", "montoTotal": 30.25, "fechaTransaccion": "2025-04-21"}
    ]
}"#;

fn settlement_cmd(workdir: &TempDir) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("settlement"));
    cmd.current_dir(workdir.path())
        .env_remove("SETTLEMENT_API_URL")
        .env_remove("RUST_LOG");
    cmd
}

/// Serve a single HTTP response and hand back the raw request that was received
fn serve_once(status_line: &str, body: &str) -> (String, JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    let response = format!(
        "HTTP/1.1 {status_line}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
        body.len()
    );

    let handle = thread::spawn(move || {
        let (mut stream, _) = listener.accept().unwrap();
        let mut request = Vec::new();
        let mut buf = [0u8; 4096];
        loop {
            let n = stream.read(&mut buf).unwrap();
            request.extend_from_slice(&buf[..n]);
            if n == 0 || request.windows(4).any(|w| w == b"\r\n\r\n") {
                break;
            }
        }
        stream.write_all(response.as_bytes()).unwrap();
        String::from_utf8_lossy(&request).to_string()
    });

    (format!("http://{addr}/api"), handle)
}

#[test]
fn test_help() {
    let workdir = TempDir::new().unwrap();
    settlement_cmd(&workdir)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Settlement reports"));
}

#[test]
fn test_version() {
    let workdir = TempDir::new().unwrap();
    settlement_cmd(&workdir)
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("settlement"));
}

#[test]
fn test_init_creates_config() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("settlement-config");

    settlement_cmd(&temp_dir)
        .args(["-C", config_path.to_str().unwrap(), "init"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Initialized settlement config"));

    assert!(config_path.join("config.toml").exists());
    assert!(config_path.join("output").is_dir());
}

#[test]
fn test_init_fails_if_exists() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("settlement-config");

    settlement_cmd(&temp_dir)
        .args(["-C", config_path.to_str().unwrap(), "init"])
        .assert()
        .success();

    settlement_cmd(&temp_dir)
        .args(["-C", config_path.to_str().unwrap(), "init"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));
}

#[test]
fn test_config_without_file_uses_fallback_url() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("nonexistent");

    settlement_cmd(&temp_dir)
        .args(["-C", config_path.to_str().unwrap(), "config"])
        .assert()
        .success()
        .stdout(predicate::str::contains("not found, using defaults"))
        .stdout(predicate::str::contains(
            "https://report-backend.azurewebsites.net/api (from built-in default)",
        ));
}

#[test]
fn test_config_environment_overrides_file() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("settlement-config");

    settlement_cmd(&temp_dir)
        .args(["-C", config_path.to_str().unwrap(), "init"])
        .assert()
        .success();

    settlement_cmd(&temp_dir)
        .env("SETTLEMENT_API_URL", "http://localhost:3000/api/")
        .args(["-C", config_path.to_str().unwrap(), "config"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "http://localhost:3000/api (from SETTLEMENT_API_URL)",
        ));
}

#[test]
fn test_config_reads_dotenv_in_config_dir() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("settlement-config");
    fs::create_dir_all(&config_path).unwrap();
    fs::write(
        config_path.join(".env"),
        "SETTLEMENT_API_URL=http://dotenv.local/api\n",
    )
    .unwrap();

    settlement_cmd(&temp_dir)
        .args(["-C", config_path.to_str().unwrap(), "config"])
        .assert()
        .success()
        .stdout(predicate::str::contains("http://dotenv.local/api"));
}

#[test]
fn test_malformed_config_is_reported() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("settlement-config");
    fs::create_dir_all(&config_path).unwrap();
    fs::write(config_path.join("config.toml"), "[api\nbase_url = ").unwrap();

    settlement_cmd(&temp_dir)
        .args(["-C", config_path.to_str().unwrap(), "config"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to parse config file"));
}

#[test]
fn test_report_missing_directory_makes_no_request() {
    let temp_dir = TempDir::new().unwrap();
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    listener.set_nonblocking(true).unwrap();
    let api_url = format!("http://{}/api", listener.local_addr().unwrap());

    settlement_cmd(&temp_dir)
        .args(["-C", temp_dir.path().to_str().unwrap()])
        .args(["report", "--user", "elio", "--api-url", &api_url])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Please enter a user and a directory."));

    settlement_cmd(&temp_dir)
        .args(["-C", temp_dir.path().to_str().unwrap()])
        .args(["report", "--user", "", "--directory", "abril", "--api-url", &api_url])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Please enter a user and a directory."));

    let err = listener.accept().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::WouldBlock);
}

#[test]
fn test_report_invalid_advance() {
    let temp_dir = TempDir::new().unwrap();

    settlement_cmd(&temp_dir)
        .args(["-C", temp_dir.path().to_str().unwrap()])
        .args(["report", "-u", "elio", "-d", "abril", "--advance", "mil"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid advance 'mil'"));
}

#[test]
fn test_report_prints_summary_and_table() {
    let temp_dir = TempDir::new().unwrap();
    let (api_url, server) = serve_once("200 OK", REPORT_BODY);

    settlement_cmd(&temp_dir)
        .args(["-C", temp_dir.path().to_str().unwrap()])
        .args([
            "report",
            "--user",
            "elio",
            "--directory",
            "liquidacion-abril25",
            "--advance",
            "100",
            "--api-url",
            &api_url,
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Directory:     liquidacion-abril25"))
        .stdout(predicate::str::contains("Invoices:      3"))
        .stdout(predicate::str::contains("Total amount:  Bs. 60.75"))
        .stdout(predicate::str::contains("Advance:       Bs. 100.00"))
        .stdout(predicate::str::contains("Difference to pay: Bs. 39.25"))
        .stdout(predicate::str::contains("AMOUNT"))
        .stdout(predicate::str::contains("20.50"))
        .stdout(predicate::str::contains("F-103"));

    let request = server.join().unwrap();
    assert!(request.starts_with("GET /api/report?"));
    assert!(request.contains("username=elio"));
    assert!(request.contains("directorio=liquidacion-abril25"));
}

#[test]
fn test_report_amount_owed_by_payer() {
    let temp_dir = TempDir::new().unwrap();
    let (api_url, server) = serve_once("200 OK", REPORT_BODY);

    settlement_cmd(&temp_dir)
        .args(["-C", temp_dir.path().to_str().unwrap()])
        .args(["report", "-u", "elio", "-d", "liquidacion-abril25", "--api-url", &api_url])
        .assert()
        .success()
        .stdout(predicate::str::contains("Advance:       Bs. 0.00"))
        .stdout(predicate::str::contains("Difference to collect: Bs. 60.75"));

    server.join().unwrap();
}

#[test]
fn test_report_without_invoices() {
    let temp_dir = TempDir::new().unwrap();
    let body = r#"{"username":"elio","directorio":"vacio","numero_facturas":0,"monto_total_calculado":0,"facturas":[]}"#;
    let (api_url, server) = serve_once("200 OK", body);

    settlement_cmd(&temp_dir)
        .args(["-C", temp_dir.path().to_str().unwrap()])
        .args(["report", "-u", "elio", "-d", "vacio", "--api-url", &api_url])
        .assert()
        .success()
        .stdout(predicate::str::contains("Difference: Bs. 0.00"))
        .stdout(predicate::str::contains("No invoices found for this period."));

    server.join().unwrap();
}

#[test]
fn test_report_json_output() {
    let temp_dir = TempDir::new().unwrap();
    let (api_url, server) = serve_once("200 OK", REPORT_BODY);

    let output = settlement_cmd(&temp_dir)
        .args(["-C", temp_dir.path().to_str().unwrap()])
        .args([
            "report",
            "-u",
            "elio",
            "-d",
            "liquidacion-abril25",
            "-a",
            "50",
            "--json",
            "--api-url",
            &api_url,
        ])
        .output()
        .unwrap();
    server.join().unwrap();

    assert!(output.status.success());
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["report"]["numero_facturas"], 3);
    assert_eq!(json["report"]["facturas"].as_array().unwrap().len(), 3);
    assert_eq!(json["reconciliation"]["balance"], "owed_by_payer");
    assert_eq!(json["reconciliation"]["advance"], 50.0);
    assert_eq!(json["reconciliation"]["difference"], -10.75);
}

#[test]
fn test_report_service_error_body_is_shown() {
    let temp_dir = TempDir::new().unwrap();
    let (api_url, server) = serve_once("404 Not Found", "\"Directorio no encontrado\"");

    settlement_cmd(&temp_dir)
        .args(["-C", temp_dir.path().to_str().unwrap()])
        .args(["report", "-u", "elio", "-d", "nada", "--api-url", &api_url])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error: Directorio no encontrado"));

    server.join().unwrap();
}

#[test]
fn test_report_service_error_without_body() {
    let temp_dir = TempDir::new().unwrap();
    let (api_url, server) = serve_once("500 Internal Server Error", "");

    settlement_cmd(&temp_dir)
        .args(["-C", temp_dir.path().to_str().unwrap()])
        .args(["report", "-u", "elio", "-d", "abril", "--api-url", &api_url])
        .assert()
        .failure()
        .stderr(predicate::str::contains(
            "An error occurred while fetching the report.",
        ));

    server.join().unwrap();
}

#[test]
fn test_report_unreachable_service() {
    let temp_dir = TempDir::new().unwrap();
    // Bind and drop to get a port nobody listens on
    let port = TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port();
    let api_url = format!("http://127.0.0.1:{port}/api");

    settlement_cmd(&temp_dir)
        .args(["-C", temp_dir.path().to_str().unwrap()])
        .args(["report", "-u", "elio", "-d", "abril", "--api-url", &api_url])
        .assert()
        .failure()
        .stderr(predicate::str::contains(
            "An error occurred while fetching the report.",
        ));
}
