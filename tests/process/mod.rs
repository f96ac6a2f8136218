//! Process supervision tests.


/// Verify all public process types are exported from the library.
#[test]
fn test_all_process_types_exported() {
    use haskell_build::process::{
        BuildEvent, BuildOutcome, BuildResult, Invocation, RunError, RunState, RunStateMachine,
        SpawnError, SpawnOptions, PATH_SEPARATOR,
    };

    let _ = RunStateMachine::new();
    let _ = SpawnOptions::for_project(std::env::temp_dir());
    let _ = Invocation::new("cabal", vec!["v2-build".to_string()]);
    let _: fn() -> RunError = || RunError::NoStdout;
    let _: fn() -> SpawnError = || SpawnError::NotFound {
        program: "cabal".to_string(),
    };
    assert_eq!(BuildResult::success().outcome(), BuildOutcome::Success);
    assert_eq!(RunState::default(), RunState::Spawning);
    assert!(!PATH_SEPARATOR.is_empty());
    let _ = BuildEvent::Progress(haskell_build::output::Progress {
        completed: 0,
        total: 1,
    });
}
