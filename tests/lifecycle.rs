//! End-to-end runs through the lifecycle controller.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use k6_core::lifecycle::{CommandResult, ExitCode, LifecycleController, Phase};

mod common;

#[tokio::test]
async fn test_success_on_local_sink() {
    let (console, stdout, _) = common::captured_console(false);
    let controller = LifecycleController::new(common::settings("stdout", "raw"), console);
    let root = controller.root().clone();

    let outcome = controller
        .execute(|ctx| async move {
            assert!(!ctx.cancel.is_cancelled());
            assert_eq!(ctx.settings.log.output, "stdout");
            tracing::info!("running");
            CommandResult::Ok(())
        })
        .await;

    assert_eq!(outcome.exit_code, 0);
    assert!(!outcome.drained);
    assert_eq!(
        outcome.phases,
        vec![Phase::Init, Phase::Running, Phase::Success, Phase::Terminated]
    );
    assert_eq!(stdout.contents(), "running\n");
    assert!(root.is_cancelled());
}

#[tokio::test]
async fn test_structured_error_sets_code_and_hint() {
    let (console, stdout, _) = common::captured_console(false);
    let controller = LifecycleController::new(common::settings("stdout", "json"), console);

    let outcome = controller
        .execute(|_| async {
            CommandResult::Err(ExitCode::new(3, "invalid arguments").with_hint("bad args").into())
        })
        .await;

    assert_eq!(outcome.exit_code, 3);
    assert_eq!(outcome.hint.as_deref(), Some("bad args"));
    assert_eq!(
        outcome.phases,
        vec![Phase::Init, Phase::Running, Phase::Failure, Phase::Terminated]
    );
    let logged = stdout.contents();
    assert!(logged.contains("\"hint\":\"bad args\""));
    assert!(logged.contains("invalid arguments"));
    assert!(logged.contains("ERROR"));
}

#[tokio::test]
async fn test_unstructured_error_is_generic_failure() {
    let (console, _, stderr) = common::captured_console(false);
    let controller = LifecycleController::new(common::settings("stderr", ""), console);

    let outcome = controller.execute(|_| async { CommandResult::Err("boom".into()) }).await;

    assert_eq!(outcome.exit_code, -1);
    assert_eq!(outcome.hint, None);
    assert!(stderr.contents().contains("boom"));
    assert!(!stderr.contents().contains("hint"));
}

#[tokio::test]
async fn test_bad_log_output_fails_before_running() {
    let (console, stdout, stderr) = common::captured_console(false);
    let controller = LifecycleController::new(common::settings("carrier-pigeon", ""), console);

    let previous = common::Capture::default();
    let writer = previous.clone();
    let previous_dispatch = tracing::Dispatch::new(
        tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .without_time()
            .finish(),
    );
    let _guard = tracing::dispatcher::set_default(&previous_dispatch);

    let ran = Arc::new(AtomicBool::new(false));
    let flag = ran.clone();
    let outcome = controller
        .execute(|_| async move {
            flag.store(true, Ordering::SeqCst);
            CommandResult::Ok(())
        })
        .await;

    assert!(!ran.load(Ordering::SeqCst));
    assert_eq!(outcome.exit_code, -1);
    assert_eq!(
        outcome.phases,
        vec![Phase::Init, Phase::Failure, Phase::Terminated]
    );
    assert!(stdout.contents().is_empty());
    assert!(stderr.contents().contains("unsupported log output `carrier-pigeon`"));

    // the dispatcher in place before the failed setup keeps receiving events
    tracing::info!("after failed setup");
    assert!(previous.contents().contains("after failed setup"));
    assert!(!stderr.contents().contains("after failed setup"));
}

#[tokio::test]
async fn test_remote_sink_drains_before_terminating() {
    let (address, received) = common::start_collector().await;
    let (console, stdout, stderr) = common::captured_console(true);
    let output = format!("remote-uri={address},pushPeriod=20ms");
    let controller = LifecycleController::new(common::settings(&output, "json"), console);

    let outcome = controller
        .execute(|ctx| async move {
            tracing::info!(vus = 10, "started vus");
            tracing::info!("test finished");
            assert!(!ctx.cancel.is_cancelled());
            CommandResult::Err(ExitCode::new(99, "thresholds crossed").into())
        })
        .await;

    assert_eq!(outcome.exit_code, 99);
    assert!(outcome.drained);
    assert_eq!(
        outcome.phases,
        vec![
            Phase::Init,
            Phase::Running,
            Phase::Failure,
            Phase::Draining,
            Phase::Terminated
        ]
    );

    let all_lines = ["started vus\n", "test finished\n", "thresholds crossed\n"];
    let delivered = common::eventually(Duration::from_secs(2), || {
        let text = received.lock().unwrap();
        all_lines.iter().all(|line| text.contains(line))
    })
    .await;
    assert!(delivered, "received: {}", received.lock().unwrap());

    // raw lines only: no JSON and no ANSI despite the requested format
    let text = received.lock().unwrap().clone();
    assert!(!text.contains('{'));
    assert!(!text.contains("\x1b["));

    // nothing went to the local streams except the fallback copy of the error
    assert!(stdout.contents().is_empty());
    assert!(stderr.contents().contains("thresholds crossed"));
}

#[tokio::test]
async fn test_remote_success_still_drains() {
    let (address, received) = common::start_collector().await;
    let (console, _, _) = common::captured_console(false);
    let output = format!("remote-uri={address},pushPeriod=1m");
    let controller = LifecycleController::new(common::settings(&output, ""), console);

    let outcome = controller
        .execute(|_| async {
            tracing::warn!("flushed on shutdown");
            CommandResult::Ok(())
        })
        .await;

    assert_eq!(outcome.exit_code, 0);
    assert!(outcome.drained);
    let delivered = common::eventually(Duration::from_secs(2), || {
        received.lock().unwrap().contains("flushed on shutdown\n")
    })
    .await;
    assert!(delivered);
}
