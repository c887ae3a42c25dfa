// ABOUTME: Integration tests for the web2api CLI binary.
// ABOUTME: Tests path matching on HTML files and offline and fetched host queries.

use assert_cmd::assert::OutputAssertExt;
use assert_cmd::cargo::CommandCargoExt;
use httpmock::prelude::*;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use std::process::Command;
use tempfile::TempDir;

const RATING: &str = r#"{
    "depth_decay": 1.0,
    "id_weight": 0.6,
    "class_weight": 0.4,
    "rampup_span": 1.0,
    "accept_threshold": 0.1
}"#;

const PAGE: &str = r#"<!DOCTYPE html>
<html><body>
  <div id="product" class="card">
    <h1 id="name" class="title">Blue Kettle</h1>
    <span id="price" class="amount">19.99</span>
  </div>
</body></html>"#;

fn web2api_cmd() -> Command {
    let mut cmd = Command::cargo_bin("web2api").unwrap();
    cmd.env("RUST_LOG", "warn");
    cmd
}

fn write_host(dir: &Path, base_url: &str) {
    let config = format!(
        r#"{{
            "base_url": "{}",
            "rating": {},
            "item_pages": [{{
                "id": "product",
                "pathname": "/product",
                "elements": {{ "name": "<text><h1>name,title<div>product,card" }}
            }}],
            "display_pages": []
        }}"#,
        base_url, RATING
    );
    fs::write(dir.join("shop.host.config"), config).unwrap();
}

#[test]
fn match_prints_accepted_nodes() {
    let temp_dir = TempDir::new().unwrap();
    let rating = temp_dir.path().join("rating.json");
    let html = temp_dir.path().join("page.html");
    fs::write(&rating, RATING).unwrap();
    fs::write(&html, PAGE).unwrap();

    web2api_cmd()
        .arg("match")
        .arg("--path")
        .arg("<text><h1>name,title<div>product,card")
        .arg("--rating")
        .arg(&rating)
        .arg("--html")
        .arg(&html)
        .arg("--compact")
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""value":"Blue Kettle""#))
        .stdout(predicate::str::contains(r#""tag":"h1""#))
        .stdout(predicate::str::contains(r#""depth":4"#));
}

#[test]
fn match_logs_to_stderr() {
    let temp_dir = TempDir::new().unwrap();
    let rating = temp_dir.path().join("rating.json");
    let html = temp_dir.path().join("page.html");
    fs::write(&rating, RATING).unwrap();
    fs::write(&html, PAGE).unwrap();

    web2api_cmd()
        .env("RUST_LOG", "info")
        .arg("match")
        .arg("--path")
        .arg("<text><h1>name,title<div>product,card")
        .arg("--rating")
        .arg(&rating)
        .arg("--html")
        .arg(&html)
        .assert()
        .success()
        .stderr(predicate::str::contains("match finished"))
        .stdout(predicate::str::contains("match finished").not());
}

#[test]
fn strict_match_rejects_malformed_path() {
    let temp_dir = TempDir::new().unwrap();
    let rating = temp_dir.path().join("rating.json");
    let html = temp_dir.path().join("page.html");
    fs::write(&rating, RATING).unwrap();
    fs::write(&html, PAGE).unwrap();

    web2api_cmd()
        .arg("match")
        .arg("--path")
        .arg("h1>name,title")
        .arg("--rating")
        .arg(&rating)
        .arg("--html")
        .arg(&html)
        .arg("--strict")
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("malformed locator path"));
}

#[test]
fn match_reports_invalid_rating() {
    let temp_dir = TempDir::new().unwrap();
    let rating = temp_dir.path().join("rating.json");
    let html = temp_dir.path().join("page.html");
    fs::write(&rating, RATING.replace("0.6", "0.9")).unwrap();
    fs::write(&html, PAGE).unwrap();

    web2api_cmd()
        .arg("match")
        .arg("--path")
        .arg("<h1>name,title")
        .arg("--rating")
        .arg(&rating)
        .arg("--html")
        .arg(&html)
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid trust model"));
}

#[test]
fn query_runs_offline_against_html_file() {
    let temp_dir = TempDir::new().unwrap();
    write_host(temp_dir.path(), "shop.example.com");
    let html = temp_dir.path().join("product.html");
    fs::write(&html, PAGE).unwrap();

    web2api_cmd()
        .arg("query")
        .arg("--hosts")
        .arg(temp_dir.path())
        .arg("shop.example.com")
        .arg("product")
        .arg("--html")
        .arg(&html)
        .arg("--url")
        .arg("http://shop.example.com/product")
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""kind": "item""#))
        .stdout(predicate::str::contains("Blue Kettle"));
}

#[test]
fn query_fetches_page_and_reports_timing() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(GET).path("/product");
        then.status(200)
            .header("content-type", "text/html; charset=utf-8")
            .body(PAGE);
    });

    let temp_dir = TempDir::new().unwrap();
    write_host(temp_dir.path(), &server.base_url());

    web2api_cmd()
        .arg("query")
        .arg("--hosts")
        .arg(temp_dir.path())
        .arg(server.base_url())
        .arg("product")
        .arg("--timing")
        .assert()
        .success()
        .stdout(predicate::str::contains("Blue Kettle"))
        .stderr(predicate::str::contains("elapsed:"));

    mock.assert();
}

#[test]
fn query_unknown_host_fails() {
    let temp_dir = TempDir::new().unwrap();
    write_host(temp_dir.path(), "shop.example.com");

    web2api_cmd()
        .arg("query")
        .arg("--hosts")
        .arg(temp_dir.path())
        .arg("elsewhere.example.com")
        .arg("product")
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("no host found"));
}
