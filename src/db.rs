use std::path::Path;

use anyhow::{Context, Result};
use rusqlite::Connection;

use crate::extract::ExtractedRecord;

pub const DEFAULT_DB_PATH: &str = "data/schools.sqlite";

pub fn connect(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    let conn = Connection::open(path)
        .with_context(|| format!("Failed to open database {}", path.display()))?;
    conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;
    Ok(conn)
}

pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS runs (
            id          INTEGER PRIMARY KEY,
            batch       TEXT NOT NULL,
            query       TEXT NOT NULL,
            school_name TEXT,
            url         TEXT,
            outcome     TEXT NOT NULL CHECK(outcome IN ('ok','invalid','not_found','fetch_error')),
            error       TEXT,
            created_at  TEXT NOT NULL DEFAULT (datetime('now'))
        );
        CREATE INDEX IF NOT EXISTS idx_runs_batch ON runs(batch);
        CREATE INDEX IF NOT EXISTS idx_runs_outcome ON runs(outcome);

        -- Full extractor output, including fields the CSV report leaves out
        CREATE TABLE IF NOT EXISTS records (
            run_id      INTEGER PRIMARY KEY REFERENCES runs(id),
            school_name TEXT NOT NULL,
            school_type TEXT NOT NULL CHECK(school_type IN ('K-12','High School')),
            url         TEXT NOT NULL,
            overview    TEXT NOT NULL,
            ratio       TEXT NOT NULL,
            math        TEXT NOT NULL,
            reading     TEXT NOT NULL,
            science     TEXT NOT NULL,
            graduation  TEXT NOT NULL
        );
        ",
    )?;
    Ok(())
}

// ── Run log ──

pub struct RunRow<'a> {
    pub batch: &'a str,
    pub query: &'a str,
    pub school_name: Option<&'a str>,
    pub url: Option<&'a str>,
    pub outcome: &'a str,
    pub error: Option<String>,
}

/// Insert one query outcome, plus its record when extraction succeeded.
pub fn save_run(conn: &Connection, run: &RunRow, record: Option<&ExtractedRecord>) -> Result<i64> {
    let tx = conn.unchecked_transaction()?;
    tx.execute(
        "INSERT INTO runs (batch, query, school_name, url, outcome, error)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        rusqlite::params![run.batch, run.query, run.school_name, run.url, run.outcome, run.error],
    )?;
    let run_id = tx.last_insert_rowid();

    if let Some(r) = record {
        tx.execute(
            "INSERT INTO records
                (run_id, school_name, school_type, url, overview, ratio, math, reading, science, graduation)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            rusqlite::params![
                run_id,
                r.school_name,
                r.school_type.tag(),
                run.url.unwrap_or(""),
                r.overview,
                r.ratio,
                r.math,
                r.reading,
                r.science,
                r.graduation,
            ],
        )?;
    }

    tx.commit()?;
    Ok(run_id)
}

// ── Stats ──

pub struct Stats {
    pub batches: usize,
    pub total: usize,
    pub ok: usize,
    pub invalid: usize,
    pub not_found: usize,
    pub fetch_errors: usize,
    pub high_schools: usize,
    pub k12: usize,
}

pub fn get_stats(conn: &Connection) -> Result<Stats> {
    let count_outcome = |outcome: &str| -> Result<usize> {
        Ok(conn.query_row(
            "SELECT COUNT(*) FROM runs WHERE outcome = ?1",
            [outcome],
            |r| r.get(0),
        )?)
    };
    let count_type = |school_type: &str| -> Result<usize> {
        Ok(conn.query_row(
            "SELECT COUNT(*) FROM records WHERE school_type = ?1",
            [school_type],
            |r| r.get(0),
        )?)
    };

    let batches: usize =
        conn.query_row("SELECT COUNT(DISTINCT batch) FROM runs", [], |r| r.get(0))?;
    let total: usize = conn.query_row("SELECT COUNT(*) FROM runs", [], |r| r.get(0))?;

    Ok(Stats {
        batches,
        total,
        ok: count_outcome("ok")?,
        invalid: count_outcome("invalid")?,
        not_found: count_outcome("not_found")?,
        fetch_errors: count_outcome("fetch_error")?,
        high_schools: count_type("High School")?,
        k12: count_type("K-12")?,
    })
}
