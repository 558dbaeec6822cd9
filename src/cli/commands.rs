//! Command dispatch: routes each subcommand to its service call.

use std::io;
use std::path::{Path, PathBuf};

use clap::CommandFactory;
use tracing::{debug, instrument};

use crate::cli::args::{Cli, Commands, ConfigCommands, USAGE_HINT};
use crate::cli::output;
use crate::cli::{CliError, CliResult};
use crate::config::{global_config_path, local_config_path, Settings};
use crate::domain::ProvisionReport;
use crate::infrastructure::di::ServiceContainer;
use crate::infrastructure::traits::FileSystem;
use crate::infrastructure::{InfraError, InfraResult};

/// Load settings, wire services and run the parsed command.
pub fn execute_command(cli: &Cli) -> CliResult<()> {
    if !needs_settings(cli.command.as_ref()) {
        return dispatch(cli, &ServiceContainer::new(Settings::default()));
    }

    let settings = load_settings(cli)?;
    debug!("settings: {:?}", settings);
    let container = if cli.dry_run {
        ServiceContainer::dry_run(settings)
    } else {
        ServiceContainer::new(settings)
    };
    dispatch(cli, &container)
}

/// Run the parsed command against an already wired container.
pub fn dispatch(cli: &Cli, container: &ServiceContainer) -> CliResult<()> {
    match &cli.command {
        Some(Commands::InitializeGCloud) => initialize(container),
        Some(Commands::ProcessPhoto { file }) => process_photo(container, file.as_ref()),
        Some(Commands::CompileCloudFunctions) => compile_functions(container),
        Some(Commands::FetchResult { file_name }) => fetch_result(container, file_name),
        Some(Commands::Config { command }) => config(cli, container, command),
        Some(Commands::Completion { shell }) => {
            let mut cmd = Cli::command();
            clap_complete::generate(*shell, &mut cmd, "ocrdeploy", &mut io::stdout());
            Ok(())
        }
        Some(Commands::Unknown(args)) => {
            let given = args.first().map(|a| a.to_string_lossy());
            output::info(&fallback_message(given.as_deref()));
            Ok(())
        }
        None => {
            output::info(&fallback_message(None));
            Ok(())
        }
    }
}

/// What is printed for an unrecognized subcommand (echoed back) or none at all.
pub fn fallback_message(given: Option<&str>) -> String {
    match given {
        Some(word) => format!("{word}\n{USAGE_HINT}"),
        None => USAGE_HINT.to_string(),
    }
}

/// `config init` and `config path` must work while a config file is broken.
fn needs_settings(command: Option<&Commands>) -> bool {
    !matches!(
        command,
        None | Some(Commands::Unknown(_))
            | Some(Commands::Completion { .. })
            | Some(Commands::Config {
                command: ConfigCommands::Init { .. } | ConfigCommands::Path,
            })
    )
}

fn project_dir(cli: &Cli) -> Option<PathBuf> {
    cli.project_dir
        .clone()
        .or_else(|| std::env::current_dir().ok())
}

/// Layered settings with `--project` applied last.
pub fn load_settings(cli: &Cli) -> CliResult<Settings> {
    let mut settings = Settings::load(project_dir(cli).as_deref())?;
    if let Some(project) = &cli.project {
        settings.project_id = Some(project.clone());
    }
    Ok(settings)
}

#[instrument(skip(container))]
fn initialize(container: &ServiceContainer) -> CliResult<()> {
    let service = container.provision_service();
    let target = service.target()?;
    output::header(&format!("Initializing {}", target.project_id));
    let report = service.initialize()?;
    print_report(&report);
    Ok(())
}

#[instrument(skip(container))]
fn process_photo(container: &ServiceContainer, file: Option<&PathBuf>) -> CliResult<()> {
    let report = container
        .provision_service()
        .process_photo(file.map(PathBuf::as_path))?;
    print_report(&report);
    Ok(())
}

#[instrument(skip(container))]
fn compile_functions(container: &ServiceContainer) -> CliResult<()> {
    let service = container.provision_service();
    let target = service.target()?;
    output::header(&format!("Deploying functions to {}", target.project_id));
    let report = service.compile_functions()?;
    print_report(&report);
    Ok(())
}

#[instrument(skip(container))]
fn fetch_result(container: &ServiceContainer, file_name: &str) -> CliResult<()> {
    match container.provision_service().fetch_result(file_name)? {
        Some(value) => {
            output::info(&format!("{value:#}"));
        }
        None => output::warning(&format!("no result content for {file_name}")),
    }
    Ok(())
}

fn config(cli: &Cli, container: &ServiceContainer, command: &ConfigCommands) -> CliResult<()> {
    match command {
        ConfigCommands::Show => {
            output::info(&container.settings.to_toml()?);
        }
        ConfigCommands::Path => {
            let global = global_config_path();
            let local = project_dir(cli).map(|d| local_config_path(&d));
            for (label, path) in [("global", global), ("local", local)] {
                match path {
                    Some(p) if container.fs.exists(&p) => {
                        output::action(label, &p.display());
                    }
                    Some(p) => output::action(label, &format!("{} (not found)", p.display())),
                    None => output::action(label, &"(unavailable)"),
                }
            }
        }
        ConfigCommands::Init { global, force } => {
            let path = if *global {
                global_config_path()
            } else {
                project_dir(cli).map(|d| local_config_path(&d))
            }
            .ok_or_else(|| CliError::Usage("cannot determine config location".into()))?;

            if container.fs.exists(&path) && !force {
                return Err(CliError::Usage(format!(
                    "{} already exists (use --force to overwrite)",
                    path.display()
                )));
            }
            write_template(container.fs.as_ref(), &path)?;
            output::action("Created", &path.display());
        }
    }
    Ok(())
}

fn write_template(fs: &dyn FileSystem, path: &Path) -> InfraResult<()> {
    fs.ensure_parent(path).map_err(|e| {
        InfraError::io(format!("create config directory {}", path.display()), e)
    })?;
    fs.write(path, &Settings::template())
        .map_err(|e| InfraError::io(format!("write config {}", path.display()), e))
}

/// One line per step; remote failures are reported but not fatal.
fn print_report(report: &ProvisionReport) {
    for outcome in &report.outcomes {
        let line = format!("{}: {}", outcome.step.label(), outcome.step.target());
        if outcome.succeeded() {
            output::success_detail(&line);
        } else {
            output::failure(&format!("{line} (exit {:?})", outcome.exit_code));
        }
    }
    let failed = report.failed().count();
    if failed > 0 {
        output::warning(&format!(
            "{failed} step(s) failed; earlier steps were not rolled back"
        ));
    }
}
