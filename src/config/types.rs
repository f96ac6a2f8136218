//! Configuration types.

use serde::{Deserialize, Serialize};

use crate::builders::{BuildCommand, Builder};

/// Extra arguments passed to a build tool.
///
/// `global` arguments come before the command verb, the per-command list
/// after the target qualifiers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolArguments {
    pub global: Vec<String>,
    pub build: Vec<String>,
    pub test: Vec<String>,
    pub bench: Vec<String>,
    pub clean: Vec<String>,
}

impl ToolArguments {
    /// Arguments configured for `command`.
    #[must_use]
    pub fn for_command(&self, command: BuildCommand) -> &[String] {
        match command {
            BuildCommand::Build => &self.build,
            BuildCommand::Test => &self.test,
            BuildCommand::Bench => &self.bench,
            BuildCommand::Clean => &self.clean,
        }
    }
}

/// Settings for the cabal (v2) builder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CabalConfig {
    /// Executable to run.
    pub program: String,
    /// Regenerate the `.cabal` file with hpack when `package.yaml` exists.
    pub run_hpack: bool,
    /// Executable used for the hpack pre-step.
    pub hpack_program: String,
    pub arguments: ToolArguments,
}

impl Default for CabalConfig {
    fn default() -> Self {
        Self {
            program: "cabal".to_string(),
            run_hpack: true,
            hpack_program: "hpack".to_string(),
            arguments: ToolArguments::default(),
        }
    }
}

/// Settings for the stack builder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StackConfig {
    /// Executable to run.
    pub program: String,
    pub arguments: ToolArguments,
}

impl Default for StackConfig {
    fn default() -> Self {
        Self {
            program: "stack".to_string(),
            arguments: ToolArguments::default(),
        }
    }
}

/// Settings for the external manifest parser.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ManifestConfig {
    /// Command line of the parser; the manifest is written to its stdin.
    pub command: Vec<String>,
}

impl Default for ManifestConfig {
    fn default() -> Self {
        Self {
            command: vec!["cabal2json".to_string()],
        }
    }
}

/// Complete build configuration, loaded once by the caller.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    /// Builder used when none is given on the command line.
    pub builder: Option<Builder>,
    pub cabal: CabalConfig,
    pub stack: StackConfig,
    pub manifest: ManifestConfig,
}
