//! cabal v2 strategy.

use super::{BuildCommand, BuildOptions, Step};
use crate::process::Invocation;
use crate::project::TargetSelection;

/// hpack manifest whose presence triggers the pre-step.
pub const HPACK_MANIFEST: &str = "package.yaml";

/// Prefix of the cabal command verbs.
pub const VERB_PREFIX: &str = "v2-";

/// `<project>:<unit>` qualifiers for the selected target.
fn qualifiers(target: &TargetSelection) -> Vec<String> {
    match target {
        TargetSelection::All { project, units } => units
            .iter()
            .map(|unit| format!("{project}:{}", unit.target))
            .collect(),
        TargetSelection::Component { project, component } => vec![format!("{project}:{component}")],
        TargetSelection::Auto { .. } => Vec::new(),
    }
}

/// The main cabal invocation for `command`.
///
/// Only `build` is narrowed to the selected target.
pub(super) fn invocation(command: BuildCommand, options: &BuildOptions) -> Invocation {
    let cabal = &options.config.cabal;
    let mut args = cabal.arguments.global.clone();
    args.push(format!("{VERB_PREFIX}{}", command.verb()));
    if command == BuildCommand::Build {
        args.extend(qualifiers(&options.target));
    }
    args.extend_from_slice(cabal.arguments.for_command(command));
    Invocation::new(&cabal.program, args)
}

/// The hpack invocation, when enabled and `package.yaml` is present.
pub(super) async fn hpack_step(options: &BuildOptions) -> Option<Invocation> {
    let cabal = &options.config.cabal;
    if !cabal.run_hpack {
        return None;
    }
    let manifest = options.root.join(HPACK_MANIFEST);
    let present = tokio::fs::metadata(&manifest)
        .await
        .is_ok_and(|meta| meta.is_file());
    tracing::debug!(path = %manifest.display(), present, "Checked for hpack manifest");
    present.then(|| Invocation::new(&cabal.hpack_program, Vec::new()))
}

pub(super) async fn plan(command: BuildCommand, options: &BuildOptions) -> Vec<Step> {
    let mut steps = Vec::with_capacity(2);
    if let Some(hpack) = hpack_step(options).await {
        steps.push(Step::prepare(hpack));
    }
    steps.push(Step::main(invocation(command, options)));
    steps
}
