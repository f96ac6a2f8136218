//! Integration tests for target resolution against a stub manifest parser.

use std::path::Path;
use std::sync::Mutex;

use async_trait::async_trait;
use haskell_build::project::{
    find_manifest, resolve_target, BuildUnit, ManifestParser, ProjectDescription, TargetError,
    TargetSelection, TargetSpec, UnitKind,
};

#[derive(Default)]
struct StubParser {
    description: Option<ProjectDescription>,
    units: Vec<String>,
    asked_for: Mutex<Vec<String>>,
}

#[async_trait]
impl ManifestParser for StubParser {
    async fn parse(&self, _manifest: &[u8]) -> Option<ProjectDescription> {
        self.description.clone()
    }

    async fn units_for_file(&self, _manifest: &[u8], file: &str) -> Vec<String> {
        self.asked_for.lock().unwrap().push(file.to_string());
        self.units.clone()
    }
}

fn description() -> ProjectDescription {
    ProjectDescription {
        name: "demo".to_string(),
        version: "0.1.0".to_string(),
        targets: vec![
            BuildUnit {
                kind: UnitKind::Library,
                name: "demo".to_string(),
                target: "lib:demo".to_string(),
            },
            BuildUnit {
                kind: UnitKind::Executable,
                name: "demo-cli".to_string(),
                target: "exe:demo-cli".to_string(),
            },
        ],
    }
}

fn project_dir() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("demo.cabal"), "name: demo\n").unwrap();
    dir
}

fn auto(project: &str) -> TargetSpec {
    TargetSpec::Auto {
        project: project.to_string(),
    }
}

#[tokio::test]
async fn component_passes_through_without_manifest() {
    let dir = tempfile::tempdir().unwrap();
    let spec = TargetSpec::Component {
        project: "demo".to_string(),
        component: "exe:demo".to_string(),
    };
    let selection = resolve_target(&spec, dir.path(), None, &StubParser::default())
        .await
        .unwrap();
    assert_eq!(
        selection,
        TargetSelection::Component {
            project: "demo".to_string(),
            component: "exe:demo".to_string()
        }
    );
}

#[tokio::test]
async fn all_uses_parsed_name_and_units() {
    let dir = project_dir();
    let parser = StubParser {
        description: Some(description()),
        ..StubParser::default()
    };
    let spec = TargetSpec::All {
        project: "whatever".to_string(),
    };
    let selection = resolve_target(&spec, dir.path(), None, &parser).await.unwrap();
    assert_eq!(
        selection,
        TargetSelection::All {
            project: "demo".to_string(),
            units: description().targets
        }
    );
}

#[tokio::test]
async fn all_degrades_to_auto_when_parse_fails() {
    let dir = project_dir();
    let spec = TargetSpec::All {
        project: "mine".to_string(),
    };
    let selection = resolve_target(&spec, dir.path(), None, &StubParser::default())
        .await
        .unwrap();
    assert_eq!(selection, TargetSelection::Auto { project: "mine".to_string() });
}

#[tokio::test]
async fn auto_picks_unit_of_active_file() {
    let dir = project_dir();
    let parser = StubParser {
        description: Some(description()),
        units: vec!["exe:demo-cli".to_string(), "lib:demo".to_string()],
        ..StubParser::default()
    };
    let active = dir.path().join("app").join("Main.hs");
    let selection = resolve_target(&auto("Auto"), dir.path(), Some(&active), &parser)
        .await
        .unwrap();

    assert_eq!(
        selection,
        TargetSelection::Component {
            project: "demo".to_string(),
            component: "exe:demo-cli".to_string()
        }
    );
    assert_eq!(*parser.asked_for.lock().unwrap(), vec!["app/Main.hs"]);
}

#[tokio::test]
async fn auto_without_known_unit_stays_auto() {
    let dir = project_dir();
    let parser = StubParser {
        description: Some(description()),
        ..StubParser::default()
    };
    let active = dir.path().join("Setup.hs");
    let selection = resolve_target(&auto("Auto"), dir.path(), Some(&active), &parser)
        .await
        .unwrap();
    assert_eq!(selection, TargetSelection::Auto { project: "Auto".to_string() });

    let selection = resolve_target(&auto("Auto"), dir.path(), None, &parser)
        .await
        .unwrap();
    assert_eq!(selection.project(), "Auto");
}

#[tokio::test]
async fn file_outside_project_is_not_looked_up() {
    let dir = project_dir();
    let parser = StubParser {
        description: Some(description()),
        units: vec!["lib:demo".to_string()],
        ..StubParser::default()
    };
    let selection = resolve_target(
        &auto("Auto"),
        dir.path(),
        Some(Path::new("/somewhere/else/Foo.hs")),
        &parser,
    )
    .await
    .unwrap();
    assert!(matches!(selection, TargetSelection::Auto { .. }));
    assert!(parser.asked_for.lock().unwrap().is_empty());
}

#[tokio::test]
async fn missing_manifest_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = resolve_target(&auto("Auto"), dir.path(), None, &StubParser::default())
        .await
        .unwrap_err();
    assert!(matches!(err, TargetError::NoManifest(_)));
}

#[tokio::test]
async fn first_manifest_in_name_order_wins() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("zeta.cabal"), "").unwrap();
    std::fs::write(dir.path().join("alpha.cabal"), "").unwrap();
    std::fs::create_dir(dir.path().join("dir.cabal")).unwrap();
    std::fs::write(dir.path().join("cabal.project"), "").unwrap();

    let found = find_manifest(dir.path()).await.unwrap();
    assert_eq!(found, dir.path().join("alpha.cabal"));
}
