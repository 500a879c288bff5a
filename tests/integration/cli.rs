//! The `tagsync` binary end to end.

use crate::common::{LATEST_PATH, TestCheckout};
use anyhow::Result;
use assert_cmd::Command;
use mockito::{Mock, Server, ServerGuard};
use predicates::prelude::*;
use serde_json::json;

const UNREACHABLE_REGISTRY: &str = "http://127.0.0.1:9";

async fn latest_release(server: &mut ServerGuard, tag: &str) -> Mock {
    server
        .mock("GET", LATEST_PATH)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(json!({"tag_name": tag}).to_string())
        .create_async()
        .await
}

#[test]
fn test_help_lists_subcommands() {
    Command::cargo_bin("tagsync")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(
            predicate::str::contains("repo")
                .and(predicate::str::contains("check"))
                .and(predicate::str::contains("update"))
                .and(predicate::str::contains("build"))
                .and(predicate::str::contains("status")),
        );
}

#[test]
fn test_verbose_conflicts_with_quiet() {
    Command::cargo_bin("tagsync")
        .unwrap()
        .args(["--verbose", "--quiet", "status"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot be used with"));
}

#[test]
fn test_status_needs_no_registry() -> Result<()> {
    let checkout = TestCheckout::new()?;
    checkout.write_config(UNREACHABLE_REGISTRY, "true")?;

    let output = checkout.run_tagsync(&["status"])?;
    output
        .assert_success()
        .assert_stdout_contains("environment:")
        .assert_stdout_contains("native")
        .assert_stdout_contains("upstream")
        .assert_stdout_contains("https://github.com/acme/app");
    Ok(())
}

#[test]
fn test_status_reports_unresolvable_remote() -> Result<()> {
    let checkout = TestCheckout::new()?;
    std::fs::write(checkout.config_path(), "remote = \"gone\"\n")?;

    let output = checkout.run_tagsync(&["--json", "status"])?;
    output.assert_success();
    let value = output.json();
    assert_eq!(value["status"], "success");
    assert_eq!(value["value"]["remote_name"], "gone");
    assert_eq!(value["value"]["remote"]["status"], "failure");
    assert_eq!(value["value"]["remote"]["error"]["kind"], "no_remote_configured");
    Ok(())
}

#[test]
fn test_repo_json_payload() -> Result<()> {
    let checkout = TestCheckout::new()?;
    checkout.write_config(UNREACHABLE_REGISTRY, "true")?;

    let output = checkout.run_tagsync(&["repo", "--json"])?;
    output.assert_success();
    assert_eq!(
        output.json(),
        json!({
            "status": "success",
            "value": {
                "web_url": "https://github.com/acme/app",
                "identity": {"owner": "acme", "name": "app"}
            }
        })
    );
    Ok(())
}

#[test]
fn test_missing_remote_fails_with_suggestion() -> Result<()> {
    let checkout = TestCheckout::new()?;
    std::fs::write(checkout.config_path(), "remote = \"gone\"\n")?;

    let output = checkout.run_tagsync(&["repo"])?;
    output
        .assert_failure()
        .assert_stderr_contains("No remote named 'gone' is configured")
        .assert_stderr_contains("git remote add gone");
    assert_eq!(output.code, Some(1));
    Ok(())
}

#[test]
fn test_missing_config_file_is_an_error() -> Result<()> {
    let checkout = TestCheckout::new()?;

    let output = checkout.run_tagsync(&["status"])?;
    output.assert_failure().assert_stderr_contains("Config file not found");
    Ok(())
}

#[tokio::test]
async fn test_check_reports_available_release() -> Result<()> {
    let checkout = TestCheckout::new()?;
    let mut server = Server::new_async().await;
    let _latest = latest_release(&mut server, "v2.0.0").await;
    checkout.write_config(&server.url(), "true")?;

    let output = checkout.run_tagsync(&["check"])?;
    output
        .assert_success()
        .assert_stdout_contains("Update available:")
        .assert_stdout_contains("v2.0.0");

    let output = checkout.run_tagsync(&["check", "--json"])?;
    output.assert_success();
    assert_eq!(
        output.json(),
        json!({
            "status": "success",
            "value": [{"tag": "v2.0.0", "author": "Actions", "summary": "Latest release"}]
        })
    );
    Ok(())
}

#[tokio::test]
async fn test_check_up_to_date() -> Result<()> {
    let checkout = TestCheckout::new()?;
    let head = checkout.checkout().rev_parse_head()?;
    let mut server = Server::new_async().await;
    let _latest = latest_release(&mut server, &head).await;
    checkout.write_config(&server.url(), "true")?;

    let output = checkout.run_tagsync(&["check"])?;
    output
        .assert_success()
        .assert_stdout_contains("Already on the latest release");
    Ok(())
}

#[tokio::test]
async fn test_registry_failure_json_payload_and_exit_code() -> Result<()> {
    let checkout = TestCheckout::new()?;
    let mut server = Server::new_async().await;
    let _missing = server
        .mock("GET", LATEST_PATH)
        .with_status(404)
        .with_body(json!({"message": "Not Found"}).to_string())
        .create_async()
        .await;
    checkout.write_config(&server.url(), "true")?;

    let output = checkout.run_tagsync(&["--json", "check"])?;
    output
        .assert_failure()
        .assert_stderr_contains("Release registry returned 404");
    let value = output.json();
    assert_eq!(value["status"], "failure");
    assert_eq!(
        value["error"],
        json!({"kind": "registry_error", "status_code": 404, "status_text": "Not Found"})
    );
    Ok(())
}

#[cfg(unix)]
#[tokio::test]
async fn test_update_with_build() -> Result<()> {
    let checkout = TestCheckout::new()?;
    let mut server = Server::new_async().await;
    let _latest = latest_release(&mut server, "v2.0.0").await;
    checkout.write_config(&server.url(), "echo building")?;

    let output = checkout.run_tagsync(&["update", "--build"])?;
    output
        .assert_success()
        .assert_stdout_contains("Updated to")
        .assert_stdout_contains("v2.0.0")
        .assert_stdout_contains("Build succeeded");
    assert_eq!(
        checkout.checkout().rev_parse_head()?,
        checkout.checkout().rev_parse("v2.0.0")?
    );
    Ok(())
}

#[tokio::test]
async fn test_update_json_payload() -> Result<()> {
    let checkout = TestCheckout::new()?;
    let mut server = Server::new_async().await;
    let _latest = latest_release(&mut server, "v2.0.0").await;
    checkout.write_config(&server.url(), "true")?;

    let output = checkout.run_tagsync(&["update", "--json"])?;
    output.assert_success();
    assert_eq!(output.json(), json!({"status": "success", "value": {"changed": true}}));
    Ok(())
}

#[cfg(unix)]
#[test]
fn test_build_failure_marker() -> Result<()> {
    let checkout = TestCheckout::new()?;
    checkout.write_config(UNREACHABLE_REGISTRY, "echo 'Build failed: missing module' >&2")?;

    let output = checkout.run_tagsync(&["build"])?;
    output
        .assert_failure()
        .assert_stderr_contains("The build reported a failure");

    // In JSON mode a reported failure is a successful call returning false
    let output = checkout.run_tagsync(&["build", "--json"])?;
    output.assert_success();
    assert_eq!(output.json(), json!({"status": "success", "value": false}));
    Ok(())
}

#[cfg(unix)]
#[test]
fn test_build_exit_code_failure() -> Result<()> {
    let checkout = TestCheckout::new()?;
    checkout.write_config(UNREACHABLE_REGISTRY, "exit 3")?;

    let output = checkout.run_tagsync(&["--json", "build"])?;
    output.assert_failure();
    let value = output.json();
    assert_eq!(value["error"]["kind"], "command_failed");
    assert_eq!(value["error"]["tool"], "sh");
    assert_eq!(value["error"]["exit_info"], json!({"type": "code", "value": 3}));
    Ok(())
}
