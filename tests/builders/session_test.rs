//! Integration tests for builder sessions, with standard Unix tools standing
//! in for cabal, hpack and stack.

use std::path::Path;

use std::time::Duration;

use haskell_build::builders::{
    BuildCommand, BuildOptions, BuildSession, Builder, Step, StepKind, HPACK_MANIFEST,
};
use haskell_build::config::BuildConfig;
use haskell_build::process::{BuildEvent, BuildOutcome, Invocation, SpawnOptions};
use haskell_build::project::TargetSelection;
use tokio_util::sync::CancellationToken;

fn cabal_options(root: &Path, hpack: &str) -> BuildOptions {
    let mut config = BuildConfig::default();
    // `touch v2-build` leaves a marker showing the main step ran.
    config.cabal.program = "touch".to_string();
    config.cabal.hpack_program = hpack.to_string();
    BuildOptions::new(
        root,
        TargetSelection::Auto {
            project: "demo".to_string(),
        },
        config,
    )
}

#[tokio::test]
async fn failing_hpack_aborts_before_main_step() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join(HPACK_MANIFEST), "name: demo\n").unwrap();
    let options = cabal_options(dir.path(), "false");

    let session = Builder::CabalV2
        .start(BuildCommand::Build, &options, CancellationToken::new())
        .await;
    let kinds: Vec<_> = session.steps().map(|s| s.kind).collect();
    assert_eq!(kinds, vec![StepKind::Prepare, StepKind::Main]);

    let result = session.finish().await.unwrap();
    assert_eq!(result.exit_code, Some(1));
    assert!(!result.has_error);
    assert_eq!(result.outcome(), BuildOutcome::ToolFailure { exit_code: 1 });
    assert!(!dir.path().join("v2-build").exists());
}

#[tokio::test]
async fn successful_hpack_runs_main_step() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join(HPACK_MANIFEST), "name: demo\n").unwrap();
    let options = cabal_options(dir.path(), "true");

    let result = Builder::CabalV2
        .start(BuildCommand::Build, &options, CancellationToken::new())
        .await
        .finish()
        .await
        .unwrap();
    assert_eq!(result.exit_code, Some(0));
    assert!(dir.path().join("v2-build").exists());
}

#[tokio::test]
async fn no_package_yaml_skips_hpack() {
    let dir = tempfile::tempdir().unwrap();
    // Would fail the build if it ran.
    let options = cabal_options(dir.path(), "false");

    let session = Builder::CabalV2
        .start(BuildCommand::Test, &options, CancellationToken::new())
        .await;
    assert_eq!(session.steps().count(), 1);

    let result = session.finish().await.unwrap();
    assert!(result.succeeded());
    assert!(dir.path().join("v2-test").exists());
}

#[tokio::test]
async fn cancelled_build_never_starts_main_step() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join(HPACK_MANIFEST), "name: demo\n").unwrap();
    let options = cabal_options(dir.path(), "true");
    let cancel = CancellationToken::new();
    cancel.cancel();

    let result = Builder::CabalV2
        .start(BuildCommand::Build, &options, cancel)
        .await
        .finish()
        .await
        .unwrap();
    assert_eq!(result.outcome(), BuildOutcome::Interrupted);
    assert!(!dir.path().join("v2-build").exists());
}

#[tokio::test]
async fn stack_arguments_reach_the_tool() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = BuildConfig::default();
    config.stack.program = "echo".to_string();
    config.stack.arguments.build = vec!["--fast".to_string()];
    let options = BuildOptions::new(
        dir.path(),
        TargetSelection::Component {
            project: "demo".to_string(),
            component: "lib:demo".to_string(),
        },
        config,
    );

    let mut session = Builder::Stack
        .start(BuildCommand::Build, &options, CancellationToken::new())
        .await;
    let mut echoed = Vec::new();
    while let Some(event) = session.next_event().await.unwrap() {
        if let BuildEvent::Message { raw, .. } = event {
            if !raw.is_empty() {
                echoed.push(raw);
            }
        }
    }
    assert_eq!(
        echoed,
        vec!["build demo:lib --fast --no-run-tests --no-run-benchmarks"]
    );
    assert!(session.finish().await.unwrap().succeeded());
}

#[tokio::test]
async fn events_of_all_steps_are_yielded_in_order() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join(HPACK_MANIFEST), "name: demo\n").unwrap();
    let mut config = BuildConfig::default();
    config.cabal.hpack_program = "pwd".to_string();
    config.cabal.program = "echo".to_string();
    let options = BuildOptions::new(
        dir.path(),
        TargetSelection::Auto {
            project: "demo".to_string(),
        },
        config,
    );

    let mut session = Builder::CabalV2
        .start(BuildCommand::Clean, &options, CancellationToken::new())
        .await;
    let mut echoed = Vec::new();
    while let Some(event) = session.next_event().await.unwrap() {
        if let BuildEvent::Message { raw, .. } = event {
            if !raw.is_empty() {
                echoed.push(raw);
            }
        }
    }
    assert_eq!(echoed.len(), 2);
    assert_eq!(echoed[1], "v2-clean");
    assert!(session.finish().await.unwrap().succeeded());
}

#[tokio::test]
async fn none_builder_succeeds_without_events() {
    let options = cabal_options(&std::env::temp_dir(), "false");
    let mut session = Builder::None
        .start(BuildCommand::Build, &options, CancellationToken::new())
        .await;
    assert!(session.next_event().await.unwrap().is_none());
    let result = session.finish().await.unwrap();
    assert_eq!(result.exit_code, Some(0));
    assert!(!result.has_error);
}

fn shell(script: &str) -> Invocation {
    Invocation::new("sh", vec!["-c".to_string(), script.to_string()])
}

#[tokio::test]
async fn failing_prepare_step_result_is_returned_verbatim() {
    let dir = tempfile::tempdir().unwrap();
    let steps = vec![
        Step::prepare(shell("echo 'package.yaml: invalid' >&2; exit 2")),
        Step::main(Invocation::new("touch", vec!["main-ran".to_string()])),
    ];
    let session = BuildSession::new(
        steps,
        SpawnOptions::for_project(dir.path()),
        CancellationToken::new(),
    );

    let result = session.finish().await.unwrap();
    assert_eq!(result.exit_code, Some(2));
    assert!(!result.has_error);
    assert_eq!(result.outcome(), BuildOutcome::ToolFailure { exit_code: 2 });
    assert!(!dir.path().join("main-ran").exists());
}

#[tokio::test]
async fn cancel_between_steps_skips_main_step() {
    let dir = tempfile::tempdir().unwrap();
    let cancel = CancellationToken::new();
    let steps = vec![
        Step::prepare(shell("echo prepared")),
        Step::main(Invocation::new("touch", vec!["main-ran".to_string()])),
    ];
    let mut session = BuildSession::new(
        steps,
        SpawnOptions::for_project(dir.path()),
        cancel.clone(),
    );

    while let Some(event) = session.next_event().await.unwrap() {
        if matches!(&event, BuildEvent::Message { raw, .. } if raw == "prepared") {
            // Let the preparation step exit with 0 before the token fires.
            tokio::time::sleep(Duration::from_millis(300)).await;
            cancel.cancel();
        }
    }

    let result = session.finish().await.unwrap();
    assert_eq!(result.exit_code, None);
    assert_eq!(result.outcome(), BuildOutcome::Interrupted);
    assert!(!dir.path().join("main-ran").exists());
}
