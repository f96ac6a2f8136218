//! stack strategy.

use super::{BuildCommand, BuildOptions};
use crate::process::Invocation;
use crate::project::TargetSelection;

/// Keeps `stack build` and `stack bench` from running test suites.
pub const NO_RUN_TESTS: &str = "--no-run-tests";
/// Keeps `stack build` and `stack test` from running benchmarks.
pub const NO_RUN_BENCHMARKS: &str = "--no-run-benchmarks";

/// Marker starting cabal library targets.
const LIBRARY_PREFIX: &str = "lib:";
/// How stack names a package's library.
pub const LIBRARY_TARGET: &str = "lib";

fn qualify(project: &str, component: &str) -> String {
    let component = if component.starts_with(LIBRARY_PREFIX) {
        LIBRARY_TARGET
    } else {
        component
    };
    format!("{project}:{component}")
}

/// Unit qualifiers, used by `build`.
fn unit_qualifiers(target: &TargetSelection) -> Vec<String> {
    match target {
        TargetSelection::All { project, units } => units
            .iter()
            .map(|unit| qualify(project, &unit.target))
            .collect(),
        TargetSelection::Component { project, component } => vec![qualify(project, component)],
        TargetSelection::Auto { .. } => Vec::new(),
    }
}

/// Whole-package qualifier, used by `test`, `bench` and `clean`.
fn project_qualifiers(target: &TargetSelection) -> Vec<String> {
    match target {
        TargetSelection::All { project, .. } | TargetSelection::Component { project, .. } => {
            vec![project.clone()]
        }
        TargetSelection::Auto { .. } => Vec::new(),
    }
}

/// The stack invocation for `command`.
///
/// Suppression flags go last and are chosen per command, so `build` never
/// runs tests or benchmarks and `test`/`bench` only run their own phase.
pub(super) fn invocation(command: BuildCommand, options: &BuildOptions) -> Invocation {
    let stack = &options.config.stack;
    let (targets, flags): (Vec<String>, &[&str]) = match command {
        BuildCommand::Build => (
            unit_qualifiers(&options.target),
            &[NO_RUN_TESTS, NO_RUN_BENCHMARKS],
        ),
        BuildCommand::Test => (project_qualifiers(&options.target), &[NO_RUN_BENCHMARKS]),
        BuildCommand::Bench => (project_qualifiers(&options.target), &[NO_RUN_TESTS]),
        BuildCommand::Clean => (project_qualifiers(&options.target), &[]),
    };

    let mut args = stack.arguments.global.clone();
    args.push(command.verb().to_string());
    args.extend(targets);
    args.extend_from_slice(stack.arguments.for_command(command));
    args.extend(flags.iter().map(|flag| (*flag).to_string()));
    Invocation::new(&stack.program, args)
}
