use rusqlite::Connection;

use crate::error::{CatalogError, Result};

use super::SqliteCatalogStore;

const CATALOG_SCHEMA_SQL: &str = r"
    PRAGMA foreign_keys = ON;

    CREATE TABLE IF NOT EXISTS ns_class (
        id INTEGER PRIMARY KEY,
        description TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS ns_subclass (
        code TEXT PRIMARY KEY,
        ns_class INTEGER NOT NULL REFERENCES ns_class(id),
        description TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS ns_family (
        code TEXT PRIMARY KEY,
        ns_class INTEGER NOT NULL REFERENCES ns_class(id),
        ns_subclass TEXT REFERENCES ns_subclass(code),
        description TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS status_group (
        id INTEGER PRIMARY KEY,
        name TEXT NOT NULL UNIQUE
    );

    CREATE TABLE IF NOT EXISTS status (
        id REAL PRIMARY KEY,
        status_group_id INTEGER REFERENCES status_group(id),
        description_short TEXT NOT NULL,
        description_long TEXT
    );

    CREATE TABLE IF NOT EXISTS relation_type (
        id INTEGER PRIMARY KEY,
        name TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS country (
        id INTEGER PRIMARY KEY,
        name TEXT NOT NULL,
        iso_code TEXT
    );

    CREATE TABLE IF NOT EXISTS mineral (
        id TEXT PRIMARY KEY,
        name TEXT NOT NULL UNIQUE,
        formula TEXT NOT NULL DEFAULT '',
        note TEXT,
        ns_class INTEGER REFERENCES ns_class(id),
        ns_subclass TEXT,
        ns_family TEXT,
        ns_mineral TEXT,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS mineral_status (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        mineral_id TEXT NOT NULL REFERENCES mineral(id) ON DELETE CASCADE,
        status_id REAL NOT NULL REFERENCES status(id),
        direct_status INTEGER NOT NULL DEFAULT 1,
        author TEXT,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL,
        UNIQUE(mineral_id, status_id)
    );

    CREATE TABLE IF NOT EXISTS mineral_relation (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        mineral_id TEXT NOT NULL REFERENCES mineral(id) ON DELETE CASCADE,
        mineral_status_id INTEGER NOT NULL REFERENCES mineral_status(id) ON DELETE CASCADE,
        relation_id TEXT NOT NULL REFERENCES mineral(id) ON DELETE CASCADE,
        relation_type_id INTEGER REFERENCES relation_type(id),
        direct_relation INTEGER,
        relation_note TEXT
    );

    CREATE TABLE IF NOT EXISTS mineral_hierarchy (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        mineral_id TEXT NOT NULL REFERENCES mineral(id) ON DELETE CASCADE,
        parent_id TEXT REFERENCES mineral(id) ON DELETE CASCADE
    );

    CREATE TABLE IF NOT EXISTS mineral_country (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        mineral_id TEXT NOT NULL REFERENCES mineral(id) ON DELETE CASCADE,
        country_id INTEGER NOT NULL REFERENCES country(id),
        note TEXT,
        UNIQUE(mineral_id, country_id)
    );

    CREATE TABLE IF NOT EXISTS mineral_history (
        mineral_id TEXT PRIMARY KEY REFERENCES mineral(id) ON DELETE CASCADE,
        discovery_year_min INTEGER,
        discovery_year_max INTEGER,
        discovery_year_note TEXT,
        ima_year INTEGER,
        publication_year INTEGER
    );

    CREATE TABLE IF NOT EXISTS mineral_crystallography (
        mineral_id TEXT PRIMARY KEY REFERENCES mineral(id) ON DELETE CASCADE,
        crystal_system TEXT,
        crystal_class TEXT,
        space_group TEXT,
        note TEXT
    );

    CREATE TABLE IF NOT EXISTS mineral_structure (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        mineral_id TEXT NOT NULL REFERENCES mineral(id) ON DELETE CASCADE,
        formula TEXT,
        a REAL,
        b REAL,
        c REAL,
        alpha REAL,
        beta REAL,
        gamma REAL,
        volume REAL,
        reference TEXT
    );

    CREATE INDEX IF NOT EXISTS idx_mineral_status_mineral ON mineral_status(mineral_id);
    CREATE INDEX IF NOT EXISTS idx_mineral_relation_mineral ON mineral_relation(mineral_id);
    CREATE INDEX IF NOT EXISTS idx_mineral_hierarchy_mineral ON mineral_hierarchy(mineral_id);
    CREATE INDEX IF NOT EXISTS idx_mineral_hierarchy_parent ON mineral_hierarchy(parent_id);
    CREATE INDEX IF NOT EXISTS idx_mineral_country_country ON mineral_country(country_id);
    CREATE INDEX IF NOT EXISTS idx_mineral_structure_mineral ON mineral_structure(mineral_id);
    CREATE INDEX IF NOT EXISTS idx_mineral_history_year ON mineral_history(discovery_year_min);
";

impl SqliteCatalogStore {
    pub fn migrate(&self) -> Result<()> {
        let conn = self
            .conn
            .lock()
            .map_err(|_| CatalogError::mutex_poisoned("sqlite"))?;
        conn.execute_batch(CATALOG_SCHEMA_SQL)?;
        ensure_required_column(
            &conn,
            "mineral_relation",
            "direct_relation",
            "unsupported mineral_relation schema: direct_relation is missing; rebuild the catalog database",
        )?;
        ensure_required_column(
            &conn,
            "mineral_hierarchy",
            "parent_id",
            "unsupported mineral_hierarchy schema: parent_id is missing; rebuild the catalog database",
        )?;
        Ok(())
    }
}

fn ensure_required_column(
    conn: &Connection,
    table: &str,
    column: &str,
    message: &str,
) -> Result<()> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table})"))?;
    let rows = stmt.query_map([], |row| row.get::<_, String>(1))?;
    for row in rows {
        if row? == column {
            return Ok(());
        }
    }
    Err(CatalogError::DataIntegrity(message.to_string()))
}
