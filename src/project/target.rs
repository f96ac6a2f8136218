//! Build target selection.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::{BuildUnit, ManifestParser};

/// Extension of the manifest file looked up at the project root.
pub const MANIFEST_EXTENSION: &str = "cabal";

/// Project name used when none is known.
pub const AUTO_PROJECT: &str = "Auto";

/// Target as chosen by the user, before anything is read from disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum TargetSpec {
    /// One specific unit, e.g. `exe:foo`.
    Component { project: String, component: String },
    /// Every unit of the project.
    All { project: String },
    /// The unit owning the file being edited, resolved at build time.
    Auto { project: String },
}

impl Default for TargetSpec {
    fn default() -> Self {
        Self::Auto {
            project: AUTO_PROJECT.to_string(),
        }
    }
}

impl TargetSpec {
    #[must_use]
    pub fn project(&self) -> &str {
        match self {
            Self::Component { project, .. } | Self::All { project } | Self::Auto { project } => {
                project
            }
        }
    }
}

/// Target handed to a builder. Immutable for the duration of one build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetSelection {
    Component { project: String, component: String },
    All { project: String, units: Vec<BuildUnit> },
    /// Let the build tool pick.
    Auto { project: String },
}

impl TargetSelection {
    #[must_use]
    pub fn project(&self) -> &str {
        match self {
            Self::Component { project, .. } | Self::All { project, .. } | Self::Auto { project } => {
                project
            }
        }
    }
}

/// Error type for target resolution.
#[derive(thiserror::Error, Debug)]
pub enum TargetError {
    /// No manifest in the project root.
    #[error("No .cabal file found in {0}")]
    NoManifest(PathBuf),
    /// The manifest could not be read.
    #[error("Could not read {path}: {source}")]
    ReadManifest {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Find the first `*.cabal` file directly inside `root`.
///
/// # Errors
///
/// Returns `TargetError::NoManifest` if there is none or `root` cannot be
/// listed.
pub async fn find_manifest(root: &Path) -> Result<PathBuf, TargetError> {
    let no_manifest = || TargetError::NoManifest(root.to_path_buf());
    let mut entries = tokio::fs::read_dir(root).await.map_err(|_| no_manifest())?;

    let mut candidates = Vec::new();
    while let Ok(Some(entry)) = entries.next_entry().await {
        let path = entry.path();
        let is_file = entry.file_type().await.is_ok_and(|t| t.is_file());
        if is_file && path.extension().is_some_and(|ext| ext == MANIFEST_EXTENSION) {
            candidates.push(path);
        }
    }
    // Directory order is unspecified; keep the choice stable.
    candidates.sort();
    candidates.into_iter().next().ok_or_else(no_manifest)
}

/// Turn the user's target choice into a builder target.
///
/// `All` and `Auto` consult the manifest parser; when it cannot help the
/// selection degrades to `Auto` so the build tool decides. `active_file` is
/// the file being edited, used to resolve `Auto`.
///
/// # Errors
///
/// Returns `TargetError` if the manifest is needed but missing or unreadable.
pub async fn resolve_target(
    spec: &TargetSpec,
    root: &Path,
    active_file: Option<&Path>,
    parser: &dyn ManifestParser,
) -> Result<TargetSelection, TargetError> {
    let fallback = || TargetSelection::Auto {
        project: spec.project().to_string(),
    };

    let resolved = match spec {
        TargetSpec::Component { project, component } => {
            return Ok(TargetSelection::Component {
                project: project.clone(),
                component: component.clone(),
            });
        }
        TargetSpec::All { .. } => {
            let manifest = read_manifest(root).await?;
            parser
                .parse(&manifest)
                .await
                .map(|desc| TargetSelection::All {
                    project: desc.name,
                    units: desc.targets,
                })
        }
        TargetSpec::Auto { .. } => {
            let manifest = read_manifest(root).await?;
            match active_file.and_then(|file| relative_path(root, file)) {
                Some(relative) => {
                    let units = parser.units_for_file(&manifest, &relative).await;
                    match units.into_iter().next() {
                        Some(component) => parser.parse(&manifest).await.map(|desc| {
                            TargetSelection::Component {
                                project: desc.name,
                                component,
                            }
                        }),
                        None => None,
                    }
                }
                None => None,
            }
        }
    };

    let selection = resolved.unwrap_or_else(fallback);
    tracing::debug!(?spec, ?selection, "Resolved build target");
    Ok(selection)
}

async fn read_manifest(root: &Path) -> Result<Vec<u8>, TargetError> {
    let path = find_manifest(root).await?;
    tokio::fs::read(&path)
        .await
        .map_err(|source| TargetError::ReadManifest { path, source })
}

/// `file` relative to `root`, `/` separated.
fn relative_path(root: &Path, file: &Path) -> Option<String> {
    let relative = file.strip_prefix(root).ok()?;
    let parts: Vec<_> = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    Some(parts.join("/"))
}
