//! haskell-build - Run cabal or stack and report GHC diagnostics.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand, ValueEnum};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use haskell_build::builders::{BuildCommand, BuildError, BuildOptions, Builder};
use haskell_build::config::{BuildConfig, ConfigError, ConfigLoader};
use haskell_build::display;
use haskell_build::process::{BuildEvent, BuildOutcome};
use haskell_build::project::{resolve_target, ExternalManifestParser, TargetSpec, AUTO_PROJECT};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum BuilderArg {
    CabalV2,
    Stack,
    None,
}

impl From<BuilderArg> for Builder {
    fn from(arg: BuilderArg) -> Self {
        match arg {
            BuilderArg::CabalV2 => Builder::CabalV2,
            BuilderArg::Stack => Builder::Stack,
            BuilderArg::None => Builder::None,
        }
    }
}

#[derive(Parser)]
#[command(
    name = "haskell-build",
    about = "Run cabal or stack and report GHC diagnostics",
    version
)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short = 'v', long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Configuration file to use instead of the default locations.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the project.
    Build(BuildArgs),
    /// Build and run the test suites.
    Test(BuildArgs),
    /// Build and run the benchmarks.
    Bench(BuildArgs),
    /// Remove build artifacts.
    Clean(BuildArgs),
}

impl Commands {
    fn split(self) -> (BuildCommand, BuildArgs) {
        match self {
            Self::Build(args) => (BuildCommand::Build, args),
            Self::Test(args) => (BuildCommand::Test, args),
            Self::Bench(args) => (BuildCommand::Bench, args),
            Self::Clean(args) => (BuildCommand::Clean, args),
        }
    }
}

#[derive(Args)]
struct BuildArgs {
    /// Build tool; defaults to the configured one, then cabal-v2.
    #[arg(short, long, value_enum)]
    builder: Option<BuilderArg>,
    /// Project root.
    #[arg(short, long, default_value = ".")]
    dir: PathBuf,
    /// Project name used to qualify targets.
    #[arg(short, long, default_value = AUTO_PROJECT)]
    project: String,
    /// Build a single unit, e.g. `exe:foo`.
    #[arg(short, long, conflicts_with = "all")]
    component: Option<String>,
    /// Build every unit of the project.
    #[arg(long)]
    all: bool,
    /// File being edited; picks the unit to build when no target is given.
    #[arg(short, long)]
    file: Option<PathBuf>,
}

impl BuildArgs {
    fn target_spec(&self) -> TargetSpec {
        let project = self.project.clone();
        if let Some(component) = &self.component {
            TargetSpec::Component {
                project,
                component: component.clone(),
            }
        } else if self.all {
            TargetSpec::All { project }
        } else {
            TargetSpec::Auto { project }
        }
    }
}

#[derive(thiserror::Error, Debug)]
enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Build(#[from] BuildError),
}

fn init_tracing(verbosity: u8) {
    let level = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn load_config(explicit: Option<PathBuf>, root: &Path) -> Result<BuildConfig, ConfigError> {
    let loader = match explicit {
        Some(path) => ConfigLoader::with_path(path),
        None => ConfigLoader::new(root),
    };
    loader.load()
}

fn exit_code(outcome: BuildOutcome) -> ExitCode {
    match outcome {
        BuildOutcome::Success => ExitCode::SUCCESS,
        BuildOutcome::SourceErrors | BuildOutcome::ToolFailure { .. } => ExitCode::from(1),
        BuildOutcome::Interrupted => ExitCode::from(130),
    }
}

async fn run(
    command: BuildCommand,
    args: BuildArgs,
    config_path: Option<PathBuf>,
) -> Result<BuildOutcome, CliError> {
    let root = std::fs::canonicalize(&args.dir).unwrap_or_else(|_| args.dir.clone());
    let config = load_config(config_path, &root)?;
    let builder = args
        .builder
        .map(Builder::from)
        .or(config.builder)
        .unwrap_or(Builder::CabalV2);

    let spec = args.target_spec();
    let active_file = args
        .file
        .as_ref()
        .map(|f| std::fs::canonicalize(f).unwrap_or_else(|_| f.clone()));
    let parser = ExternalManifestParser::new(config.manifest.command.clone());
    let target = resolve_target(&spec, &root, active_file.as_deref(), &parser)
        .await
        .map_err(BuildError::from)?;

    tracing::info!(
        %builder,
        %command,
        root = %root.display(),
        target = ?target,
        "Starting haskell-build"
    );

    let cancel = CancellationToken::new();
    let ctrl_c = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("Interrupt received, cancelling build");
                cancel.cancel();
            }
        })
    };

    let options = BuildOptions::new(root, target, config);
    let mut session = builder.start(command, &options, cancel).await;
    for step in session.steps() {
        display::print_command(&step.invocation);
    }

    while let Some(event) = session.next_event().await? {
        match event {
            BuildEvent::Progress(progress) => display::print_progress(progress),
            BuildEvent::Message {
                origin,
                raw,
                diagnostic,
            } => match diagnostic {
                Some(diagnostic) => display::print_diagnostic(&diagnostic),
                None => display::print_raw(origin, &raw),
            },
        }
    }
    let result = session.finish().await?;
    ctrl_c.abort();

    Ok(result.outcome())
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let (command, args) = cli.command.split();
    match run(command, args, cli.config).await {
        Ok(outcome) => {
            display::print_outcome(outcome);
            exit_code(outcome)
        }
        Err(e) => {
            display::print_error(&e.to_string());
            ExitCode::FAILURE
        }
    }
}
