//! SQLite-backed table store.
//!
//! Every table is replaced wholesale: [`HealthStore::load_table`] drops any
//! existing table of the same name, recreates it from the [`Table`]'s columns
//! and inserts all rows inside one transaction.

use std::path::Path;

use health_core::error::{HealthError, Result};
use health_core::table::{Cell, Table};
use rusqlite::types::{Value, ValueRef};
use rusqlite::{params_from_iter, Connection};
use tracing::debug;

pub struct HealthStore {
    conn: Connection,
}

impl HealthStore {
    /// Open (creating if needed) the store file at `path`.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(path)
            .map_err(|e| db_err(format!("Failed to open {}", path.display()), e))?;
        debug!("Opened store at {}", path.display());
        Ok(Self { conn })
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| db_err("Failed to open in-memory store".to_string(), e))?;
        Ok(Self { conn })
    }

    /// Replace table `name` with the contents of `table`.
    pub fn load_table(&mut self, name: &str, table: &Table) -> Result<()> {
        if table.columns().is_empty() {
            return Err(HealthError::Database(format!(
                "Cannot create table {} without columns",
                name
            )));
        }

        let ident = quote_ident(name);
        let column_defs: Vec<String> = table
            .columns()
            .iter()
            .enumerate()
            .map(|(i, column)| {
                let decl = column_affinity(table, i);
                if decl.is_empty() {
                    quote_ident(column)
                } else {
                    format!("{} {}", quote_ident(column), decl)
                }
            })
            .collect();
        let placeholders = vec!["?"; table.columns().len()].join(", ");

        let tx = self
            .conn
            .transaction()
            .map_err(|e| db_err(format!("Failed to begin load of {}", name), e))?;

        tx.execute(&format!("DROP TABLE IF EXISTS {}", ident), [])
            .map_err(|e| db_err(format!("Failed to drop {}", name), e))?;
        tx.execute(
            &format!("CREATE TABLE {} ({})", ident, column_defs.join(", ")),
            [],
        )
        .map_err(|e| db_err(format!("Failed to create {}", name), e))?;

        {
            let mut stmt = tx
                .prepare(&format!("INSERT INTO {} VALUES ({})", ident, placeholders))
                .map_err(|e| db_err(format!("Failed to prepare insert into {}", name), e))?;
            for row in table.rows() {
                stmt.execute(params_from_iter(row.iter().map(to_sql_value)))
                    .map_err(|e| db_err(format!("Failed to insert into {}", name), e))?;
            }
        }

        tx.commit()
            .map_err(|e| db_err(format!("Failed to commit {}", name), e))?;

        debug!("Loaded {} rows into {}", table.len(), name);
        Ok(())
    }

    /// Read table `name` back, rows in insertion order.
    pub fn query_table(&self, name: &str) -> Result<Table> {
        if !self.has_table(name)? {
            return Err(HealthError::MissingTable(name.to_string()));
        }

        let mut stmt = self
            .conn
            .prepare(&format!("SELECT * FROM {} ORDER BY rowid", quote_ident(name)))
            .map_err(|e| db_err(format!("Failed to query {}", name), e))?;
        let columns: Vec<String> = stmt.column_names().iter().map(|c| c.to_string()).collect();
        let width = columns.len();

        let mut table = Table::new(name, columns);
        let mut rows = stmt
            .query([])
            .map_err(|e| db_err(format!("Failed to query {}", name), e))?;
        while let Some(row) = rows
            .next()
            .map_err(|e| db_err(format!("Failed to read {}", name), e))?
        {
            let mut cells = Vec::with_capacity(width);
            for i in 0..width {
                let value = row
                    .get_ref(i)
                    .map_err(|e| db_err(format!("Failed to read {}", name), e))?;
                cells.push(from_sql_value(value));
            }
            table.push_row(cells)?;
        }

        Ok(table)
    }

    pub fn has_table(&self, name: &str) -> Result<bool> {
        let count: i64 = self
            .conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1",
                [name],
                |row| row.get(0),
            )
            .map_err(|e| db_err(format!("Failed to look up {}", name), e))?;
        Ok(count > 0)
    }

    /// Names of all user tables, sorted.
    pub fn table_names(&self) -> Result<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT name FROM sqlite_master \
                 WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY name",
            )
            .map_err(|e| db_err("Failed to list tables".to_string(), e))?;
        let names = stmt
            .query_map([], |row| row.get::<_, String>(0))
            .map_err(|e| db_err("Failed to list tables".to_string(), e))?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| db_err("Failed to list tables".to_string(), e))?;
        Ok(names)
    }

    /// Drop every user table.
    pub fn drop_all_tables(&mut self) -> Result<()> {
        let names = self.table_names()?;
        let tx = self
            .conn
            .transaction()
            .map_err(|e| db_err("Failed to begin drop".to_string(), e))?;
        for name in &names {
            tx.execute(&format!("DROP TABLE IF EXISTS {}", quote_ident(name)), [])
                .map_err(|e| db_err(format!("Failed to drop {}", name), e))?;
        }
        tx.commit()
            .map_err(|e| db_err("Failed to commit drop".to_string(), e))?;
        debug!("Dropped {} tables", names.len());
        Ok(())
    }
}

// ── Internal helpers ──────────────────────────────────────────────────────────

fn db_err(context: String, e: rusqlite::Error) -> HealthError {
    HealthError::Database(format!("{}: {}", context, e))
}

fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Declared type for column `index`: the widest kind of value it holds.
fn column_affinity(table: &Table, index: usize) -> &'static str {
    let mut has_integer = false;
    let mut has_real = false;
    for row in table.rows() {
        match &row[index] {
            Cell::Text(_) => return "TEXT",
            Cell::Real(_) => has_real = true,
            Cell::Integer(_) => has_integer = true,
            Cell::Null => {}
        }
    }
    if has_real {
        "REAL"
    } else if has_integer {
        "INTEGER"
    } else {
        ""
    }
}

fn to_sql_value(cell: &Cell) -> Value {
    match cell {
        Cell::Null => Value::Null,
        Cell::Integer(i) => Value::Integer(*i),
        Cell::Real(f) => Value::Real(*f),
        Cell::Text(s) => Value::Text(s.clone()),
    }
}

fn from_sql_value(value: ValueRef<'_>) -> Cell {
    match value {
        ValueRef::Null => Cell::Null,
        ValueRef::Integer(i) => Cell::Integer(i),
        ValueRef::Real(f) => Cell::Real(f),
        ValueRef::Text(bytes) | ValueRef::Blob(bytes) => {
            Cell::Text(String::from_utf8_lossy(bytes).into_owned())
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn weights() -> Table {
        let mut t = Table::new(
            "Bodyweight",
            vec!["date".to_string(), "bodyweight".to_string(), "unit".to_string()],
        );
        t.push_row(vec!["2019-08-02".into(), Cell::Real(71.3), "kg".into()])
            .unwrap();
        t.push_row(vec!["2019-08-01".into(), Cell::Integer(70), Cell::Null])
            .unwrap();
        t
    }

    #[test]
    fn test_load_then_query_preserves_rows_and_order() {
        let mut store = HealthStore::open_in_memory().unwrap();
        let table = weights();
        store.load_table("Bodyweight", &table).unwrap();

        let back = store.query_table("Bodyweight").unwrap();
        assert_eq!(back.columns(), table.columns());
        assert_eq!(back.rows()[0][0], Cell::Text("2019-08-02".to_string()));
        assert_eq!(back.rows()[1][2], Cell::Null);
        // REAL affinity turns the stored integer into a real.
        assert_eq!(back.rows()[1][1], Cell::Real(70.0));
    }

    #[test]
    fn test_load_replaces_existing_table() {
        let mut store = HealthStore::open_in_memory().unwrap();
        store.load_table("Bodyweight", &weights()).unwrap();

        let mut smaller = Table::new("Bodyweight", vec!["x".to_string()]);
        smaller.push_row(vec![Cell::Integer(1)]).unwrap();
        store.load_table("Bodyweight", &smaller).unwrap();

        let back = store.query_table("Bodyweight").unwrap();
        assert_eq!(back.columns(), &["x"]);
        assert_eq!(back.len(), 1);
    }

    #[test]
    fn test_empty_table_keeps_schema() {
        let mut store = HealthStore::open_in_memory().unwrap();
        let empty = Table::new("Steps", vec!["date".to_string(), "steps".to_string()]);
        store.load_table("Steps", &empty).unwrap();

        let back = store.query_table("Steps").unwrap();
        assert!(back.is_empty());
        assert_eq!(back.columns(), &["date", "steps"]);
    }

    #[test]
    fn test_load_without_columns_is_error() {
        let mut store = HealthStore::open_in_memory().unwrap();
        let err = store
            .load_table("Empty", &Table::new("Empty", vec![]))
            .unwrap_err();
        assert!(matches!(err, HealthError::Database(_)));
    }

    #[test]
    fn test_query_missing_table() {
        let store = HealthStore::open_in_memory().unwrap();
        let err = store.query_table("Workout").unwrap_err();
        assert!(matches!(err, HealthError::MissingTable(name) if name == "Workout"));
    }

    #[test]
    fn test_awkward_identifiers_are_quoted() {
        let mut store = HealthStore::open_in_memory().unwrap();
        let mut t = Table::new(
            "Nutrition",
            vec!["Fat (g)".to_string(), "say \"hi\"".to_string()],
        );
        t.push_row(vec![Cell::Real(1.5), "x".into()]).unwrap();
        store.load_table("Nutrition", &t).unwrap();

        let back = store.query_table("Nutrition").unwrap();
        assert_eq!(back.columns(), &["Fat (g)", "say \"hi\""]);
    }

    #[test]
    fn test_table_names_and_drop_all() {
        let mut store = HealthStore::open_in_memory().unwrap();
        store.load_table("Workout", &weights()).unwrap();
        store.load_table("Activity", &weights()).unwrap();
        assert_eq!(store.table_names().unwrap(), vec!["Activity", "Workout"]);

        store.drop_all_tables().unwrap();
        assert!(store.table_names().unwrap().is_empty());
        assert!(!store.has_table("Workout").unwrap());
    }

    #[test]
    fn test_open_file_persists_across_handles() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("nested").join("Health.db");
        {
            let mut store = HealthStore::open(&path).unwrap();
            store.load_table("Bodyweight", &weights()).unwrap();
        }
        let store = HealthStore::open(&path).unwrap();
        assert_eq!(store.query_table("Bodyweight").unwrap().len(), 2);
    }
}
