//! Project manifest collaborator.
//!
//! Parsing a `.cabal` file is left to an external tool. This module defines
//! the shape of what it returns and a [`ManifestParser`] seam, plus an
//! implementation that runs the tool as a subprocess speaking JSON.

use std::process::Stdio;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

/// Kind of a buildable unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum UnitKind {
    Library,
    Executable,
    TestSuite,
    Benchmark,
}

/// One buildable unit of a project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildUnit {
    #[serde(rename = "type")]
    pub kind: UnitKind,
    /// Human readable name.
    pub name: String,
    /// Target identifier understood by the build tools, e.g. `lib:foo`.
    pub target: String,
}

/// Structured description of a project manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectDescription {
    pub name: String,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub targets: Vec<BuildUnit>,
}

/// Turns manifest bytes into project information.
#[async_trait]
pub trait ManifestParser: Send + Sync {
    /// Parse a manifest, or `None` if it cannot be understood.
    async fn parse(&self, manifest: &[u8]) -> Option<ProjectDescription>;

    /// Targets of the units `file` (relative to the project root, `/`
    /// separated) belongs to.
    async fn units_for_file(&self, manifest: &[u8], file: &str) -> Vec<String>;
}

/// Error type for external manifest parser runs.
#[derive(thiserror::Error, Debug)]
pub enum ManifestError {
    #[error("Manifest parser command is empty")]
    EmptyCommand,
    #[error("Failed to run manifest parser: {0}")]
    Io(#[from] std::io::Error),
    #[error("Manifest parser exited with {status}: {stderr}")]
    Failed {
        status: std::process::ExitStatus,
        stderr: String,
    },
    #[error("Failed to decode manifest parser output: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Runs an external command that reads the manifest on stdin and prints
/// JSON on stdout.
#[derive(Debug, Clone)]
pub struct ExternalManifestParser {
    command: Vec<String>,
}

impl ExternalManifestParser {
    /// `command` is the program followed by its fixed arguments.
    #[must_use]
    pub fn new(command: Vec<String>) -> Self {
        Self { command }
    }

    async fn run(&self, manifest: &[u8], extra: Option<&str>) -> Result<Vec<u8>, ManifestError> {
        let (program, args) = self.command.split_first().ok_or(ManifestError::EmptyCommand)?;

        let mut cmd = Command::new(program);
        cmd.args(args)
            .args(extra)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        let mut child = cmd.spawn()?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(manifest).await?;
            stdin.shutdown().await?;
        }

        let output = child.wait_with_output().await?;
        if !output.status.success() {
            return Err(ManifestError::Failed {
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(output.stdout)
    }
}

#[async_trait]
impl ManifestParser for ExternalManifestParser {
    async fn parse(&self, manifest: &[u8]) -> Option<ProjectDescription> {
        let result = self
            .run(manifest, None)
            .await
            .and_then(|out| Ok(serde_json::from_slice::<Option<ProjectDescription>>(&out)?));
        match result {
            Ok(desc) => desc,
            Err(e) => {
                tracing::error!(error = %e, "Manifest parser failed");
                None
            }
        }
    }

    async fn units_for_file(&self, manifest: &[u8], file: &str) -> Vec<String> {
        let file = file.replace('\\', "/");
        let result = self
            .run(manifest, Some(&file))
            .await
            .and_then(|out| Ok(serde_json::from_slice::<Vec<String>>(&out)?));
        match result {
            Ok(units) => units,
            Err(e) => {
                tracing::error!(error = %e, file = %file, "Manifest parser failed");
                Vec::new()
            }
        }
    }
}
