//! Build orchestration tests.

#[cfg(unix)]
mod session_test;

/// Verify all public builder types are exported from the library.
#[test]
fn test_all_builder_types_exported() {
    use haskell_build::builders::{
        BuildCommand, BuildError, BuildOptions, Builder, Step, StepKind, HPACK_MANIFEST,
        LIBRARY_TARGET, NO_RUN_BENCHMARKS, NO_RUN_TESTS, VERB_PREFIX,
    };
    use haskell_build::config::BuildConfig;
    use haskell_build::process::Invocation;
    use haskell_build::project::TargetSelection;

    let _ = BuildOptions::new(
        std::env::temp_dir(),
        TargetSelection::Auto {
            project: "demo".to_string(),
        },
        BuildConfig::default(),
    );
    let step = Step::prepare(Invocation::new("hpack", Vec::new()));
    assert_eq!(step.kind, StepKind::Prepare);
    assert_eq!(Builder::CabalV2.to_string(), "cabal-v2");
    assert_eq!(BuildCommand::Test.verb(), "test");
    assert_eq!(HPACK_MANIFEST, "package.yaml");
    assert_eq!(VERB_PREFIX, "v2-");
    assert_eq!(LIBRARY_TARGET, "lib");
    assert_eq!(NO_RUN_TESTS, "--no-run-tests");
    assert_eq!(NO_RUN_BENCHMARKS, "--no-run-benchmarks");
    let _: fn(haskell_build::process::RunError) -> BuildError = BuildError::Run;
}
