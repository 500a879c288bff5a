//! Check, apply and build against a real checkout and a mock registry.

use crate::common::{LATEST_PATH, TestCheckout};
use anyhow::Result;
use mockito::{Mock, Server, ServerGuard};
use serde_json::json;
use tagsync::config::BuildConfig;
use tagsync::release::{ReleaseClient, ReleaseDescriptor};
use tagsync::runner::CommandRunner;
use tagsync::upgrade::{ControllerSettings, RebuildStatus, UpdateController, UpdateState};
use tagsync::utils::ExecutionEnvironment;

fn controller(checkout: &TestCheckout, server: &ServerGuard, build: BuildConfig) -> UpdateController {
    let runner = CommandRunner::new(ExecutionEnvironment::Native, checkout.path());
    let settings = ControllerSettings {
        remote: "upstream".to_string(),
        build,
        dev_build: false,
        lock_dir: checkout.lock_dir().to_path_buf(),
        ..ControllerSettings::default()
    };
    UpdateController::new(runner, ReleaseClient::new(server.url()).unwrap(), settings)
}

async fn latest_release(server: &mut ServerGuard, tag: &str) -> Mock {
    server
        .mock("GET", LATEST_PATH)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(json!({"tag_name": tag}).to_string())
        .create_async()
        .await
}

fn shell_build(script: &str) -> BuildConfig {
    BuildConfig {
        program: "sh".to_string(),
        args: vec!["-c".to_string(), script.to_string()],
        dev_flag: "--dev".to_string(),
    }
}

#[tokio::test]
async fn test_check_then_apply_moves_checkout_to_release() -> Result<()> {
    tagsync::test_utils::init_test_logging(None);
    let checkout = TestCheckout::new()?;
    let mut server = Server::new_async().await;
    let _latest = latest_release(&mut server, "v2.0.0").await;
    let controller = controller(&checkout, &server, BuildConfig::default());

    let updates = controller.check_for_update().await?;
    assert_eq!(updates, vec![ReleaseDescriptor::pending("v2.0.0")]);
    assert_eq!(controller.state().name(), "checked");

    let changed = controller.apply_update().await?;
    assert!(changed, "switch to v2.0.0 should report an updated tree");
    assert_eq!(
        checkout.checkout().rev_parse_head()?,
        checkout.checkout().rev_parse("v2.0.0")?
    );
    assert_eq!(controller.state().applied_tag(), Some("v2.0.0"));
    assert!(checkout.checkout().status_porcelain()?.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_second_apply_of_same_release_reports_no_change() -> Result<()> {
    tagsync::test_utils::init_test_logging(None);
    let checkout = TestCheckout::new()?;
    let mut server = Server::new_async().await;
    let _latest = latest_release(&mut server, "v2.0.0").await;
    let controller = controller(&checkout, &server, BuildConfig::default());

    assert!(controller.apply_update().await?);
    let head = checkout.checkout().rev_parse_head()?;

    // git still prints "HEAD is now at <sha> Updated build" for this switch
    assert!(!controller.apply_update().await?);
    assert_eq!(checkout.checkout().rev_parse_head()?, head);
    assert_eq!(
        controller.state(),
        UpdateState::Applied {
            tag: "v2.0.0".to_string(),
            changed: false,
            rebuild: None,
        }
    );
    Ok(())
}

#[tokio::test]
async fn test_check_picks_up_tags_published_after_clone() -> Result<()> {
    tagsync::test_utils::init_test_logging(None);
    let checkout = TestCheckout::new()?;
    checkout.upstream().commit_file("VERSION", "3.0.0\n", "Release 3")?;
    checkout.upstream().tag("v3.0.0")?;

    let mut server = Server::new_async().await;
    let _latest = latest_release(&mut server, "v3.0.0").await;
    let controller = controller(&checkout, &server, BuildConfig::default());

    // The fetch inside the check brings in v3.0.0 before the switch needs it
    assert_eq!(controller.check_for_update().await?.len(), 1);
    controller.apply_update().await?;
    assert_eq!(
        checkout.checkout().rev_parse_head()?,
        checkout.checkout().rev_parse("v3.0.0")?
    );
    Ok(())
}

#[tokio::test]
async fn test_head_equal_to_release_tag_is_up_to_date() -> Result<()> {
    tagsync::test_utils::init_test_logging(None);
    let checkout = TestCheckout::new()?;
    let head = checkout.checkout().rev_parse_head()?;

    let mut server = Server::new_async().await;
    let _latest = latest_release(&mut server, &head).await;
    let controller = controller(&checkout, &server, BuildConfig::default());

    assert!(controller.check_for_update().await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_unknown_tag_fails_apply_and_leaves_checkout() -> Result<()> {
    tagsync::test_utils::init_test_logging(None);
    let checkout = TestCheckout::new()?;
    let before = checkout.checkout().rev_parse_head()?;

    let mut server = Server::new_async().await;
    let _latest = latest_release(&mut server, "v9.9.9").await;
    let controller = controller(&checkout, &server, BuildConfig::default());

    let err = controller.apply_update().await.unwrap_err();
    assert_eq!(err.kind(), "command_failed");
    assert_eq!(controller.state(), UpdateState::Unknown);
    assert_eq!(checkout.checkout().rev_parse_head()?, before);
    Ok(())
}

#[tokio::test]
async fn test_operations_leave_a_lock_file() -> Result<()> {
    tagsync::test_utils::init_test_logging(None);
    let checkout = TestCheckout::new()?;
    let mut server = Server::new_async().await;
    let _latest = latest_release(&mut server, "v2.0.0").await;
    let controller = controller(&checkout, &server, BuildConfig::default());

    controller.check_for_update().await?;
    let lock_files: Vec<_> = std::fs::read_dir(checkout.lock_dir())?.collect();
    assert_eq!(lock_files.len(), 1);

    // Released after the check, so a second check can take it again
    controller.check_for_update().await?;
    Ok(())
}

#[cfg(unix)]
#[tokio::test]
async fn test_build_runs_in_source_root_and_reads_marker() -> Result<()> {
    tagsync::test_utils::init_test_logging(None);
    let checkout = TestCheckout::new()?;
    let mut server = Server::new_async().await;
    let _latest = latest_release(&mut server, "v2.0.0").await;

    let ok = controller(&checkout, &server, shell_build("test -f VERSION && echo built"));
    ok.apply_update().await?;
    assert!(ok.build().await?);
    assert!(matches!(
        ok.state(),
        UpdateState::Applied {
            rebuild: Some(RebuildStatus::Succeeded),
            ..
        }
    ));

    let failing = controller(&checkout, &server, shell_build("echo 'Build failed: syntax error' >&2"));
    assert!(!failing.build().await?);
    Ok(())
}
