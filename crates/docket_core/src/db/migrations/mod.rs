//! SQLite migration registry and executor.
//!
//! # Responsibility
//! - Register schema migrations in strictly increasing order.
//! - Apply pending migrations atomically.
//! - Upgrade databases written by the original desktop app (user_version 0,
//!   optional `image_path`, text timestamps) in place.
//!
//! # Invariants
//! - `version` values must remain monotonic.
//! - Every step is idempotent against a table that already has its effect.
//! - Applied migration version is mirrored to `PRAGMA user_version`.

use crate::db::{DbError, DbResult};
use log::info;
use rusqlite::{Connection, Transaction};

#[derive(Debug, Clone, Copy)]
enum MigrationStep {
    /// Executes a static SQL batch.
    Sql(&'static str),
    /// Adds a column unless `PRAGMA table_info` already lists it.
    AddColumnIfMissing {
        table: &'static str,
        column: &'static str,
        definition: &'static str,
    },
}

#[derive(Debug, Clone, Copy)]
struct Migration {
    version: u32,
    step: MigrationStep,
}

const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        step: MigrationStep::Sql(include_str!("0001_notes.sql")),
    },
    Migration {
        version: 2,
        step: MigrationStep::AddColumnIfMissing {
            table: "notes",
            column: "image_path",
            definition: "TEXT NOT NULL DEFAULT ''",
        },
    },
    Migration {
        version: 3,
        step: MigrationStep::Sql(include_str!("0003_normalize_legacy_rows.sql")),
    },
];

/// Returns the latest migration version known by this binary.
pub fn latest_version() -> u32 {
    MIGRATIONS.last().map_or(0, |migration| migration.version)
}

/// Returns the schema version recorded in the database.
pub fn current_version(conn: &Connection) -> DbResult<u32> {
    let version = conn.query_row("PRAGMA user_version;", [], |row| row.get::<_, u32>(0))?;
    Ok(version)
}

/// Applies all pending migrations on the provided connection.
pub fn apply_migrations(conn: &mut Connection) -> DbResult<()> {
    let current = current_version(conn)?;
    let latest = latest_version();

    if current > latest {
        return Err(DbError::UnsupportedSchemaVersion {
            db_version: current,
            latest_supported: latest,
        });
    }

    if current == latest {
        return Ok(());
    }

    let tx = conn.transaction()?;
    for migration in MIGRATIONS {
        if migration.version <= current {
            continue;
        }

        apply_step(&tx, migration.step)?;
        tx.execute_batch(&format!("PRAGMA user_version = {};", migration.version))?;
    }
    tx.commit()?;

    info!("event=db_migrate module=db status=ok from_version={current} to_version={latest}");
    Ok(())
}

fn apply_step(tx: &Transaction<'_>, step: MigrationStep) -> DbResult<()> {
    match step {
        MigrationStep::Sql(sql) => tx.execute_batch(sql)?,
        MigrationStep::AddColumnIfMissing {
            table,
            column,
            definition,
        } => {
            if !table_has_column(tx, table, column)? {
                tx.execute_batch(&format!(
                    "ALTER TABLE {table} ADD COLUMN {column} {definition};"
                ))?;
            }
        }
    }
    Ok(())
}

/// Reports whether `table` currently declares `column`.
pub fn table_has_column(conn: &Connection, table: &str, column: &str) -> DbResult<bool> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table});"))?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let current: String = row.get(1)?;
        if current == column {
            return Ok(true);
        }
    }
    Ok(false)
}
