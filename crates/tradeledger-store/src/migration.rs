//! Ledger schema and its upgrades.
//!
//! `MIGRATIONS[n]` upgrades a ledger from version `n` to `n + 1`. Applied
//! versions are recorded in `schema_migrations`, all inside one transaction.

use rusqlite::{params, Connection, Transaction};

use crate::error::{Result, StoreError};

const MIGRATIONS: &[&str] = &[
    // v1: exchange registry and trade ledger.
    r#"
    -- Upserted from the listing, never deleted
    CREATE TABLE exchanges (
        symbol TEXT PRIMARY KEY,
        currency TEXT NOT NULL,
        latest_trade_known INTEGER NOT NULL,
        latest_trade_stored INTEGER            -- NULL: not watched
    );

    -- Append-only; ids are never reused
    CREATE TABLE trades (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        time INTEGER NOT NULL,
        price TEXT NOT NULL,
        volume TEXT NOT NULL,
        symbol TEXT NOT NULL REFERENCES exchanges(symbol)
    );

    CREATE INDEX exchanges_currency
        ON exchanges(currency, latest_trade_known, symbol, latest_trade_stored);
    CREATE INDEX exchanges_checkpoint
        ON exchanges(latest_trade_stored, latest_trade_known, currency, symbol);
    CREATE INDEX trades_symbol_time
        ON trades(symbol, time, id, price, volume);
    "#,
    // v2: recovery attempts survive restarts.
    r#"
    ALTER TABLE exchanges ADD COLUMN rebootstrap_attempts INTEGER NOT NULL DEFAULT 0;
    "#,
];

/// Schema version this build reads and writes.
pub const CURRENT_VERSION: u32 = MIGRATIONS.len() as u32;

/// Bring `conn` up to [`CURRENT_VERSION`]. Safe to call on every open.
pub fn migrate(conn: &mut Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version INTEGER PRIMARY KEY,
            applied_at INTEGER NOT NULL
        )",
    )?;

    let found = schema_version(conn)?;
    if found > CURRENT_VERSION {
        return Err(StoreError::UnsupportedSchema {
            found,
            supported: CURRENT_VERSION,
        });
    }
    if found == CURRENT_VERSION {
        return Ok(());
    }

    let tx = conn.transaction()?;
    for (index, sql) in MIGRATIONS.iter().enumerate().skip(found as usize) {
        apply(&tx, index as u32 + 1, sql)?;
    }
    tx.commit()?;
    Ok(())
}

/// Highest applied version, 0 for a fresh ledger.
pub fn schema_version(conn: &Connection) -> Result<u32> {
    Ok(conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_migrations",
        [],
        |row| row.get(0),
    )?)
}

fn apply(tx: &Transaction<'_>, version: u32, sql: &str) -> Result<()> {
    tx.execute_batch(sql)?;
    tx.execute(
        "INSERT INTO schema_migrations (version, applied_at) VALUES (?1, strftime('%s', 'now'))",
        params![version],
    )?;
    tracing::info!(version, "upgraded ledger schema");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(conn: &Connection, kind: &str) -> Vec<String> {
        let mut stmt = conn
            .prepare("SELECT name FROM sqlite_master WHERE type = ?1 ORDER BY name")
            .unwrap();
        let rows = stmt.query_map([kind], |row| row.get(0)).unwrap();
        rows.map(|r| r.unwrap()).collect()
    }

    #[test]
    fn test_fresh_ledger_gets_full_schema() {
        let mut conn = Connection::open_in_memory().unwrap();
        migrate(&mut conn).unwrap();

        let tables = names(&conn, "table");
        for table in ["exchanges", "trades", "schema_migrations"] {
            assert!(tables.iter().any(|t| t == table), "missing {table}");
        }
        let indexes = names(&conn, "index");
        assert!(indexes.iter().any(|i| i == "trades_symbol_time"));
        assert_eq!(schema_version(&conn).unwrap(), CURRENT_VERSION);
    }

    #[test]
    fn test_v1_ledger_upgrades_in_place() {
        let mut conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            "CREATE TABLE schema_migrations (version INTEGER PRIMARY KEY, applied_at INTEGER NOT NULL)",
        )
        .unwrap();
        let tx = conn.transaction().unwrap();
        apply(&tx, 1, MIGRATIONS[0]).unwrap();
        tx.commit().unwrap();
        conn.execute(
            "INSERT INTO exchanges (symbol, currency, latest_trade_known) VALUES ('X', 'USD', 5)",
            [],
        )
        .unwrap();
        assert_eq!(schema_version(&conn).unwrap(), 1);

        migrate(&mut conn).unwrap();
        let attempts: u32 = conn
            .query_row(
                "SELECT rebootstrap_attempts FROM exchanges WHERE symbol = 'X'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(attempts, 0);
        assert_eq!(schema_version(&conn).unwrap(), CURRENT_VERSION);
    }

    #[test]
    fn test_reopen_applies_nothing() {
        let mut conn = Connection::open_in_memory().unwrap();
        migrate(&mut conn).unwrap();
        migrate(&mut conn).unwrap();

        let applied: u32 = conn
            .query_row("SELECT COUNT(*) FROM schema_migrations", [], |row| row.get(0))
            .unwrap();
        assert_eq!(applied, CURRENT_VERSION);
    }

    #[test]
    fn test_newer_ledger_is_refused() {
        let mut conn = Connection::open_in_memory().unwrap();
        migrate(&mut conn).unwrap();
        conn.execute(
            "INSERT INTO schema_migrations (version, applied_at) VALUES (99, 0)",
            [],
        )
        .unwrap();

        assert!(matches!(
            migrate(&mut conn),
            Err(StoreError::UnsupportedSchema { found: 99, .. })
        ));
    }
}
