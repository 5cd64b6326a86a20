//! Command dispatch: one handler per subcommand.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::thread;

use clap::CommandFactory;
use clap_complete::{generate, Shell};
use tracing::{debug, instrument};

use crate::cli::args::{Cli, Commands, ConfigCommands};
use crate::cli::output;
use crate::cli::render::{describe_change, to_termtree};
use crate::cli::{CliError, CliResult};
use crate::config::{global_config_path, project_config_path, Settings};
use crate::infrastructure::di::ServiceContainer;
use crate::infrastructure::event_script::load_event_script;
use crate::infrastructure::InfraError;

pub fn execute_command(cli: &Cli) -> CliResult<()> {
    match &cli.command {
        Some(Commands::Scan { dir }) => cmd_scan(&project_dir(cli, dir.as_deref())?),
        Some(Commands::Replay {
            script,
            dir,
            verbose,
        }) => cmd_replay(script, &project_dir(cli, dir.as_deref())?, *verbose),
        Some(Commands::Check { dir }) => cmd_check(&project_dir(cli, dir.as_deref())?),
        Some(Commands::Config { command }) => cmd_config(command, &project_dir(cli, None)?),
        Some(Commands::Completion { shell }) => {
            cmd_completion(*shell);
            Ok(())
        }
        None => Cli::command()
            .print_help()
            .map_err(|e| CliError::from(InfraError::io("print help", e))),
    }
}

/// Positional directory, else `-C`, else the current directory.
fn project_dir(cli: &Cli, positional: Option<&Path>) -> CliResult<PathBuf> {
    match positional.or(cli.project_dir.as_deref()) {
        Some(dir) => Ok(dir.to_path_buf()),
        None => std::env::current_dir()
            .map_err(|e| CliError::from(InfraError::io("determine current directory", e))),
    }
}

fn container_for(project_dir: &Path) -> CliResult<ServiceContainer> {
    let settings = Settings::load(Some(project_dir))?;
    debug!("effective settings: {:?}", settings);
    Ok(ServiceContainer::new(settings))
}

#[instrument]
fn cmd_scan(project_dir: &Path) -> CliResult<()> {
    let container = container_for(project_dir)?;
    let session = container.open_session(project_dir)?;
    output::info(&to_termtree(session.tree(), &container.settings.render));
    Ok(())
}

#[instrument]
fn cmd_replay(script: &Path, project_dir: &Path, verbose: bool) -> CliResult<()> {
    let container = container_for(project_dir)?;
    let mut session = container.open_session(project_dir)?;
    let events = load_event_script(script, project_dir)?;
    let changes = session.subscribe();

    let (sender, receiver) = mpsc::channel();
    thread::spawn(move || {
        for event in events {
            if sender.send(event).is_err() {
                break;
            }
        }
    });
    let dispatched = session.run(receiver)?;

    if verbose {
        output::header("Changes");
        for change in changes.try_iter() {
            output::detail(&describe_change(session.tree(), &change));
        }
    }
    output::info(&to_termtree(session.tree(), &container.settings.render));
    output::success(&format!("replayed {} events", dispatched));
    Ok(())
}

#[instrument]
fn cmd_check(project_dir: &Path) -> CliResult<()> {
    let container = container_for(project_dir)?;
    let session = container.open_session(project_dir)?;
    let tree = session.tree();

    let mismatches = tree.recount();
    if mismatches.is_empty() {
        output::success(&format!("counters consistent ({} nodes)", tree.len()));
        return Ok(());
    }
    output::header("Inconsistent counters");
    for (node, stored, expected) in &mismatches {
        output::failure(&format!(
            "{}: stored {}, expected {}",
            tree.path_of(*node).join("/"),
            stored,
            expected
        ));
    }
    Err(CliError::Inconsistent(mismatches.len()))
}

fn cmd_config(command: &ConfigCommands, project_dir: &Path) -> CliResult<()> {
    match command {
        ConfigCommands::Show => {
            let settings = Settings::load(Some(project_dir))?;
            output::info(&settings.to_toml()?);
        }
        ConfigCommands::Path => {
            let describe = |path: &Path| {
                let state = if path.exists() { "exists" } else { "not found" };
                format!("{} ({})", path.display(), state)
            };
            match global_config_path() {
                Some(path) => output::info(&format!("global:  {}", describe(&path))),
                None => output::warning("no home directory, global config disabled"),
            }
            output::info(&format!(
                "project: {}",
                describe(&project_config_path(project_dir))
            ));
        }
    }
    Ok(())
}

fn cmd_completion(shell: Shell) {
    let mut cmd = Cli::command();
    let name = cmd.get_name().to_string();
    generate(shell, &mut cmd, name, &mut io::stdout());
}
