//! Project store bootstrap and forward-only schema migrations.
//!
//! Migrations are applied in version order and recorded in
//! `schema_migrations`. Never edit or reorder a migration after it ships;
//! append a new one instead.

use rusqlite::{params, Connection};
use std::fs;
use std::path::Path;

use super::open_connection;
use super::schema::{MIGRATIONS_TABLE, PROJECT_SCHEMA};
use crate::error::{CinescribeError, Result};
use crate::paths::{absolutize, derive_title, ProjectDirs};

/// What a migration does to the store.
#[derive(Debug)]
pub enum MigrationStep {
    /// A batch of SQL statements.
    Sql(&'static str),
    /// Add a column unless the table already has it.
    AddColumn {
        table: &'static str,
        column: &'static str,
        definition: &'static str,
    },
}

#[derive(Debug)]
pub struct Migration {
    pub version: u32,
    pub name: &'static str,
    pub step: MigrationStep,
}

pub const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        name: "initial_schema",
        step: MigrationStep::Sql(PROJECT_SCHEMA),
    },
    Migration {
        version: 2,
        name: "project_info_tags",
        step: MigrationStep::AddColumn {
            table: "Project_Info",
            column: "tags",
            definition: "TEXT DEFAULT ''",
        },
    },
];

impl Migration {
    fn apply(&self, conn: &Connection) -> Result<()> {
        match self.step {
            MigrationStep::Sql(sql) => conn.execute_batch(sql)?,
            MigrationStep::AddColumn {
                table,
                column,
                definition,
            } => {
                if !has_column(conn, table, column)? {
                    conn.execute_batch(&format!(
                        "ALTER TABLE {} ADD COLUMN {} {}",
                        table, column, definition
                    ))?;
                }
            }
        }
        Ok(())
    }
}

/// Highest version this build knows how to produce.
pub fn latest_version() -> u32 {
    MIGRATIONS.last().map(|m| m.version).unwrap_or(0)
}

/// Highest version recorded in the store (0 for an unversioned store).
///
/// Read-only: a store without `schema_migrations` is left untouched.
pub fn current_version(conn: &Connection) -> Result<u32> {
    let tracked: i64 = conn.query_row(
        "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'schema_migrations'",
        [],
        |row| row.get(0),
    )?;
    if tracked == 0 {
        return Ok(0);
    }

    let version: u32 = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_migrations",
        [],
        |row| row.get(0),
    )?;
    Ok(version)
}

pub fn has_column(conn: &Connection, table: &str, column: &str) -> Result<bool> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({})", table))?;
    let columns = stmt
        .query_map([], |row| row.get::<_, String>(1))?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(columns.iter().any(|c| c.eq_ignore_ascii_case(column)))
}

/// Apply every pending migration. A no-op on an up-to-date store.
pub fn ensure_schema_upgrades(conn: &Connection) -> Result<()> {
    conn.execute_batch(MIGRATIONS_TABLE)?;
    let current = current_version(conn)?;
    let latest = latest_version();

    if current > latest {
        return Err(CinescribeError::SchemaTooNew {
            found: current,
            supported: latest,
        });
    }

    for migration in MIGRATIONS.iter().filter(|m| m.version > current) {
        let tx = conn.unchecked_transaction()?;
        migration.apply(&tx)?;
        tx.execute(
            "INSERT INTO schema_migrations (version, name) VALUES (?1, ?2)",
            params![migration.version, migration.name],
        )?;
        tx.commit()?;

        tracing::info!(
            version = migration.version,
            name = migration.name,
            "Applied schema migration"
        );
    }

    Ok(())
}

/// Create (or adopt) a project store at `path`.
///
/// The `Project_Info` row is inserted only when missing. An explicit
/// `title` replaces the stored one; without it existing data is untouched.
pub fn initialize_project_store(path: &Path, title: Option<&str>) -> Result<()> {
    let path = absolutize(path)?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    ProjectDirs::for_store(&path)?.ensure()?;

    let conn = open_connection(&path)?;
    ensure_schema_upgrades(&conn)?;

    let derived = derive_title(&path);
    let inserted = conn.execute(
        "INSERT INTO Project_Info (id, title) VALUES (1, ?1) ON CONFLICT(id) DO NOTHING",
        [title.unwrap_or(&derived)],
    )?;

    if inserted == 0 {
        if let Some(title) = title {
            conn.execute(
                "UPDATE Project_Info SET title = ?1, updated_at = datetime('now') WHERE id = 1",
                [title],
            )?;
        }
    }

    tracing::info!(path = ?path, created = inserted > 0, "Initialized project store");
    Ok(())
}
