use std::path::Path;

use anyhow::{Context, Result};
use rusqlite::{Connection, params};
use tracing::debug;

use crate::error::DeltaError;
use crate::models::{OptionSelectionRow, OptionType};

const TABLE_PREFIX: &str = "options_";

/// Map a `YYYYMMDD` key to its table name. Anything other than exactly
/// eight ASCII digits is rejected before it can reach SQL text.
pub fn table_name(date_key: &str) -> Result<String, DeltaError> {
    if date_key.len() != 8 || !date_key.bytes().all(|b| b.is_ascii_digit()) {
        return Err(DeltaError::InvalidTableName(date_key.to_string()));
    }
    Ok(format!("{}{}", TABLE_PREFIX, date_key))
}

/// SQLite store holding one `options_YYYYMMDD` table per processed day.
pub struct OptionStore {
    conn: Connection,
}

impl OptionStore {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("opening sqlite at {}", path.display()))?;
        Ok(Self { conn })
    }

    pub fn open_in_memory() -> Result<Self> {
        Ok(Self {
            conn: Connection::open_in_memory().context("opening in-memory sqlite")?,
        })
    }

    /// Create the day table if needed and append `rows` in one transaction.
    /// Re-running a day appends duplicates; there is no uniqueness constraint.
    pub fn save_day(&mut self, date_key: &str, rows: &[OptionSelectionRow]) -> Result<usize> {
        let table = table_name(date_key)?;

        let tx = self.conn.transaction()?;
        tx.execute_batch(&format!(
            "CREATE TABLE IF NOT EXISTS {table} (
                symbol       TEXT,
                strike_price INTEGER,
                expiry       TEXT,
                option_type  TEXT,
                volume       REAL
            );"
        ))
        .with_context(|| format!("creating table {}", table))?;

        {
            let mut stmt = tx.prepare(&format!(
                "INSERT INTO {table} (symbol, strike_price, expiry, option_type, volume)
                 VALUES (?1, ?2, ?3, ?4, ?5)"
            ))?;
            for row in rows {
                stmt.execute(params![
                    row.symbol,
                    row.strike_price,
                    row.expiry,
                    row.option_type.as_str(),
                    row.volume
                ])?;
            }
        }
        tx.commit().with_context(|| format!("committing {}", table))?;

        debug!(table = %table, rows = rows.len(), "stored option selection");
        Ok(rows.len())
    }

    /// All rows stored for a day, in insertion order.
    pub fn load_day(&self, date_key: &str) -> Result<Vec<OptionSelectionRow>> {
        let table = table_name(date_key)?;
        let mut stmt = self.conn.prepare(&format!(
            "SELECT symbol, strike_price, expiry, option_type, volume FROM {table} ORDER BY rowid"
        ))?;

        let rows = stmt.query_map([], |row| {
            let option_type: String = row.get(3)?;
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, i64>(1)?,
                row.get::<_, String>(2)?,
                option_type,
                row.get::<_, f64>(4)?,
            ))
        })?;

        let mut out = Vec::new();
        for row in rows {
            let (symbol, strike_price, expiry, option_type, volume) = row?;
            let option_type = match option_type.as_str() {
                "call" => OptionType::Call,
                "put" => OptionType::Put,
                other => anyhow::bail!("unexpected option_type '{}' in {}", other, table),
            };
            out.push(OptionSelectionRow {
                symbol,
                strike_price,
                expiry,
                option_type,
                volume,
            });
        }
        Ok(out)
    }

    /// Date keys of every day table present, ascending.
    pub fn day_keys(&self) -> Result<Vec<String>> {
        let mut stmt = self.conn.prepare(
            "SELECT name FROM sqlite_master WHERE type = 'table' AND name LIKE 'options\\_%' ESCAPE '\\' ORDER BY name",
        )?;
        let names = stmt.query_map([], |row| row.get::<_, String>(0))?;

        let mut keys = Vec::new();
        for name in names {
            let name = name?;
            if let Some(key) = name.strip_prefix(TABLE_PREFIX) {
                if table_name(key).is_ok() {
                    keys.push(key.to_string());
                }
            }
        }
        Ok(keys)
    }
}
