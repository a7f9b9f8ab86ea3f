//! Command-line front end for Docket.
//!
//! # Responsibility
//! - Resolve configuration, start logging and own the database connection.
//! - Restore from the snapshot once at startup when the store is empty.
//! - Translate subcommands into `NoteService` / `Archiver` calls.
//!
//! # Invariants
//! - Failing to open the database is fatal; snapshot failures are not.
//! - The connection is closed explicitly before the process exits.

mod commands;

use anyhow::Context;
use clap::Parser;
use commands::{Cli, Command};
use docket_core::db::{close_db, open_db};
use docket_core::{
    init_logging, AppConfig, Archiver, ImportOutcome, NoteService, NoteStore, SqliteNoteStore,
};
use log::{error, info, warn};
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let config = cli
        .apply_overrides(AppConfig::from_env()?)
        .context("invalid configuration")?;

    if let Err(err) = init_logging(config.log_level, &config.log_dir) {
        eprintln!("warning: file logging disabled: {err}");
    }

    info!(
        "event=cli_start module=cli status=ok command={}",
        cli.command.name()
    );

    let mut conn = open_db(&config.db_path).with_context(|| {
        error!("event=cli_start module=cli status=error error_code=db_unavailable");
        format!("cannot open database `{}`", config.db_path.display())
    })?;

    let result = {
        let store = SqliteNoteStore::try_new(&mut conn).context("database is not usable")?;
        let mut service = NoteService::new(store);
        let archiver = Archiver::new(&config.snapshot_path);

        serve(&cli.command, &mut service, &archiver)
    };

    close_db(conn).context("failed to close database")?;
    result
}

/// Restores from the snapshot, then dispatches the subcommand.
fn serve<S: NoteStore>(
    command: &Command,
    service: &mut NoteService<S>,
    archiver: &Archiver,
) -> anyhow::Result<()> {
    restore_on_startup(archiver, service);
    command.execute(service, archiver)
}

/// Returns `None` when the snapshot could not be loaded; that is only a warning.
fn restore_on_startup<S: NoteStore>(
    archiver: &Archiver,
    service: &mut NoteService<S>,
) -> Option<ImportOutcome> {
    match archiver.import_if_empty(service.store_mut()) {
        Ok(outcome) => {
            if let ImportOutcome::Imported { notes } = outcome {
                println!(
                    "Restored {notes} note(s) from {}",
                    archiver.snapshot_path().display()
                );
            }
            Some(outcome)
        }
        Err(err) => {
            warn!("event=snapshot_restore module=cli status=error error={err}");
            eprintln!("warning: failed to load backup: {err}");
            None
        }
    }
}
