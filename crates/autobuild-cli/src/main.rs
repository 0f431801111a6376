//! Autobuild CLI
//!
//! The `autobuild` command runs the post-sync pipeline on a project directory.
//!
//! ## Commands
//!
//! - `run`: detect, build, sync git remotes, build again, notify
//! - `detect`: print the detected build system
//! - `config show` / `config init`: inspect or create `autobuild.toml`

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn, Level};

use autobuild_core::{
    BuildOrchestrator, BuildPhaseResult, BuildSystemDetector, Collaborators, CompletionSound,
    GitSyncStrategy, HostVariant, RunReport, Settings, SettingsStore, StaticCapabilities, Trigger,
};
use autobuild_exec::{
    default_settings_path, write_default_settings, CommandTaskRunner, FsProjectModel, GitCli,
    TerminalNotifier, TokioProcessSpawner, TomlSettingsStore,
};

#[derive(Parser)]
#[command(name = "autobuild")]
#[command(author = "Stevedores Org")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Build, sync git remotes, and build again", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON log lines and JSON reports
    #[arg(long, global = true)]
    json: bool,

    /// Settings file (default: <project>/autobuild.toml)
    #[arg(long, global = true, env = "AUTOBUILD_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the pipeline once
    Run {
        /// Project directory
        #[arg(short, long, default_value = ".")]
        path: PathBuf,

        /// Event that started the run (opened, sync-succeeded, sync-skipped, manual)
        #[arg(short, long, default_value = "manual")]
        trigger: Trigger,

        /// Host whose capabilities to assume (intellij, android-studio, headless)
        #[arg(long, default_value = "headless")]
        host: HostVariant,

        /// Override the git sync strategy (none, merge, rebase)
        #[arg(long)]
        strategy: Option<GitSyncStrategy>,

        /// Override the completion sound (none, music1..music6)
        #[arg(long)]
        sound: Option<CompletionSound>,

        /// Directory holding `<sound>.wav` files
        #[arg(long, env = "AUTOBUILD_SOUNDS_DIR")]
        sounds_dir: Option<PathBuf>,

        /// Program used to play sound files
        #[arg(long, env = "AUTOBUILD_SOUND_PLAYER", default_value = "aplay")]
        player: String,
    },

    /// Print the detected build system
    Detect {
        /// Project directory
        #[arg(short, long, default_value = ".")]
        path: PathBuf,

        /// Host whose capabilities to assume
        #[arg(long, default_value = "headless")]
        host: HostVariant,
    },

    /// Inspect or create the settings file
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print effective settings as TOML
    Show {
        /// Project directory
        #[arg(short, long, default_value = ".")]
        path: PathBuf,
    },

    /// Write default settings
    Init {
        /// Project directory
        #[arg(short, long, default_value = ".")]
        path: PathBuf,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

/// Settings from disk with per-invocation overrides applied on every load.
struct OverridingStore {
    inner: TomlSettingsStore,
    strategy: Option<GitSyncStrategy>,
    sound: Option<CompletionSound>,
}

impl SettingsStore for OverridingStore {
    fn load(&self) -> autobuild_core::Result<Settings> {
        let mut settings = self.inner.load()?;
        if let Some(strategy) = self.strategy {
            settings.git_sync = strategy;
        }
        if let Some(sound) = self.sound {
            settings.sound = sound;
        }
        Ok(settings)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    autobuild_core::init_tracing(cli.json, level);

    match cli.command {
        Commands::Run {
            path,
            trigger,
            host,
            strategy,
            sound,
            sounds_dir,
            player,
        } => {
            let store = OverridingStore {
                inner: TomlSettingsStore::new(settings_path(cli.config.as_deref(), &path)),
                strategy,
                sound,
            };
            let notifier = match sounds_dir {
                Some(dir) => TerminalNotifier::new().with_sounds(dir, player),
                None => TerminalNotifier::new(),
            };
            cmd_run(&path, trigger, host, store, notifier, cli.json).await
        }
        Commands::Detect { path, host } => cmd_detect(&path, host, cli.json),
        Commands::Config { action } => match action {
            ConfigAction::Show { path } => {
                cmd_config_show(&settings_path(cli.config.as_deref(), &path))
            }
            ConfigAction::Init { path, force } => {
                cmd_config_init(&settings_path(cli.config.as_deref(), &path), force)
            }
        },
    }
}

fn settings_path(config: Option<&Path>, project: &Path) -> PathBuf {
    config
        .map(Path::to_path_buf)
        .unwrap_or_else(|| default_settings_path(project))
}

fn canonical_project(path: &Path) -> Result<PathBuf> {
    path.canonicalize()
        .with_context(|| format!("Project directory not found: {}", path.display()))
}

/// Run the pipeline once. Exits successfully whenever the run reaches Done.
async fn cmd_run(
    path: &Path,
    trigger: Trigger,
    host: HostVariant,
    store: OverridingStore,
    notifier: TerminalNotifier,
    json: bool,
) -> Result<()> {
    let root = canonical_project(path)?;
    let settings = store
        .load()
        .with_context(|| format!("Failed to load settings from {}", store.inner.path().display()))?;
    info!(project = %root.display(), host = %host, trigger = %trigger, "Starting autobuild");

    let spawner = Arc::new(TokioProcessSpawner::new());
    let orchestrator = Arc::new(BuildOrchestrator::new(Collaborators {
        project: Arc::new(FsProjectModel::new(&root)),
        capabilities: Arc::new(StaticCapabilities::for_variant(host)),
        vcs: Arc::new(GitCli::new()),
        tasks: Arc::new(CommandTaskRunner::new(
            spawner.clone(),
            settings.build.native_command.clone(),
        )),
        spawner,
        notifier: Arc::new(notifier),
        settings: Arc::new(store),
    }));

    let Some(handle) = orchestrator.trigger(trigger) else {
        warn!(trigger = %trigger, "Trigger ignored");
        println!("Trigger '{}' ignored on {} host", trigger, host);
        return Ok(());
    };
    let report = handle.await.context("Pipeline task failed")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }
    Ok(())
}

fn phase_line(result: &BuildPhaseResult) -> String {
    match (&result.skipped, result.succeeded) {
        (Some(reason), _) => format!("skipped ({reason})"),
        (None, true) => "ok".to_string(),
        (None, false) => match &result.detail {
            Some(detail) => format!("FAILED ({detail})"),
            None => "FAILED".to_string(),
        },
    }
}

fn print_report(report: &RunReport) {
    println!(
        "Run {} ({}) with {}",
        report.run_id, report.trigger, report.build_system
    );
    println!("  build 1:  {}", phase_line(&report.first_build));
    match &report.sync_skipped {
        Some(reason) => println!("  git sync: skipped ({reason:?})"),
        None => {
            let failed = report.failed_repositories().count();
            println!(
                "  git sync: {} ({} repositories, {} failed)",
                report.strategy,
                report.sync_results.len(),
                failed
            );
            for result in &report.sync_results {
                match &result.error_message {
                    Some(error) if !result.succeeded => {
                        println!("    {}: FAILED", result.repository_id);
                        for line in error.lines() {
                            println!("      {line}");
                        }
                    }
                    _ => println!("    {}: ok", result.repository_id),
                }
            }
        }
    }
    println!("  build 2:  {}", phase_line(&report.second_build));
    println!("Done in {} ms", report.duration_ms);
}

fn cmd_detect(path: &Path, host: HostVariant, json: bool) -> Result<()> {
    let root = canonical_project(path)?;
    let capabilities = StaticCapabilities::for_variant(host);
    let kind = BuildSystemDetector::new(&capabilities).detect(&FsProjectModel::new(&root));

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&serde_json::json!({
                "project": root,
                "build_system": kind,
            }))?
        );
    } else {
        println!("{kind}");
    }
    Ok(())
}

fn cmd_config_show(path: &Path) -> Result<()> {
    let settings = TomlSettingsStore::new(path)
        .load()
        .with_context(|| format!("Failed to load settings from {}", path.display()))?;
    if !path.exists() {
        println!("# {} not found; showing defaults", path.display());
    }
    print!("{}", settings.to_toml_string()?);
    Ok(())
}

fn cmd_config_init(path: &Path, force: bool) -> Result<()> {
    write_default_settings(path, force)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    println!("Wrote default settings to {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_run_arguments_parse() {
        let cli = Cli::try_parse_from([
            "autobuild",
            "run",
            "--path",
            "/work/app",
            "--trigger",
            "sync-succeeded",
            "--host",
            "android-studio",
            "--strategy",
            "rebase",
            "--sound",
            "none",
        ])
        .unwrap();

        match cli.command {
            Commands::Run {
                path,
                trigger,
                host,
                strategy,
                sound,
                ..
            } => {
                assert_eq!(path, PathBuf::from("/work/app"));
                assert_eq!(trigger, Trigger::SyncSucceeded);
                assert_eq!(host, HostVariant::AndroidStudio);
                assert_eq!(strategy, Some(GitSyncStrategy::Rebase));
                assert_eq!(sound, Some(CompletionSound::None));
            }
            _ => panic!("expected run"),
        }
    }

    #[test]
    fn test_unknown_strategy_rejected() {
        assert!(Cli::try_parse_from(["autobuild", "run", "--strategy", "squash"]).is_err());
    }

    #[test]
    fn test_overrides_apply_on_load() {
        let dir = tempfile::tempdir().unwrap();
        let store = OverridingStore {
            inner: TomlSettingsStore::new(default_settings_path(dir.path())),
            strategy: Some(GitSyncStrategy::None),
            sound: Some(CompletionSound::Music5),
        };
        let settings = store.load().unwrap();
        assert_eq!(settings.git_sync, GitSyncStrategy::None);
        assert_eq!(settings.sound, CompletionSound::Music5);
        assert_eq!(settings.readiness, Settings::default().readiness);
    }

    #[test]
    fn test_explicit_config_path_wins() {
        let explicit = PathBuf::from("/etc/autobuild.toml");
        assert_eq!(
            settings_path(Some(explicit.as_path()), Path::new("/work/app")),
            explicit
        );
        assert_eq!(
            settings_path(None, Path::new("/work/app")),
            PathBuf::from("/work/app/autobuild.toml")
        );
    }

    #[test]
    fn test_phase_line() {
        use autobuild_core::BuildPhase;
        assert_eq!(phase_line(&BuildPhaseResult::success(BuildPhase::First)), "ok");
        assert_eq!(
            phase_line(&BuildPhaseResult::failure(BuildPhase::First, "exit code 1")),
            "FAILED (exit code 1)"
        );
        assert!(phase_line(&BuildPhaseResult::skipped(BuildPhase::Second, "not ready"))
            .starts_with("skipped"));
    }
}
