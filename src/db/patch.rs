//! Parameterized partial updates and ordering helpers.

use rusqlite::types::Value;
use rusqlite::{params, Connection};

use crate::error::Result;

/// Builds `UPDATE <table> SET ... WHERE id = ?` from the fields that are present.
///
/// Column names only ever come from `&'static str` literals in this crate;
/// every value is bound as a parameter.
pub struct UpdateBuilder {
    table: &'static str,
    columns: Vec<&'static str>,
    values: Vec<Value>,
    touched: Option<&'static str>,
}

impl UpdateBuilder {
    pub fn new(table: &'static str) -> Self {
        Self {
            table,
            columns: Vec::new(),
            values: Vec::new(),
            touched: None,
        }
    }

    pub fn set(mut self, column: &'static str, value: impl Into<Value>) -> Self {
        self.columns.push(column);
        self.values.push(value.into());
        self
    }

    pub fn set_opt<T: Into<Value>>(self, column: &'static str, value: Option<T>) -> Self {
        match value {
            Some(value) => self.set(column, value),
            None => self,
        }
    }

    /// Also stamp `column` with the current time whenever anything changes.
    pub fn touch(mut self, column: &'static str) -> Self {
        self.touched = Some(column);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    fn sql(&self) -> String {
        let mut assignments: Vec<String> = self
            .columns
            .iter()
            .enumerate()
            .map(|(i, column)| format!("{} = ?{}", column, i + 1))
            .collect();
        if let Some(column) = self.touched {
            assignments.push(format!("{} = datetime('now')", column));
        }
        format!(
            "UPDATE {} SET {} WHERE id = ?{}",
            self.table,
            assignments.join(", "),
            self.columns.len() + 1
        )
    }

    /// Run the update; returns the number of rows changed (0 for an empty patch).
    pub fn execute(self, conn: &Connection, id: i64) -> Result<usize> {
        if self.is_empty() {
            return Ok(0);
        }
        let sql = self.sql();
        let mut values = self.values;
        values.push(Value::Integer(id));
        Ok(conn.execute(&sql, rusqlite::params_from_iter(values))?)
    }
}

/// Assign `sort_index` 1..=n following `ordered_ids`.
///
/// With a scope, rows whose scope column differs are left alone even when
/// their id is listed.
pub fn assign_sort_order(
    conn: &Connection,
    table: &'static str,
    scope: Option<(&'static str, i64)>,
    ordered_ids: &[i64],
) -> Result<()> {
    let tx = conn.unchecked_transaction()?;
    {
        match scope {
            Some((column, scope_id)) => {
                let mut stmt = tx.prepare(&format!(
                    "UPDATE {} SET sort_index = ?1 WHERE id = ?2 AND {} = ?3",
                    table, column
                ))?;
                for (position, id) in (1i64..).zip(ordered_ids) {
                    stmt.execute(params![position, id, scope_id])?;
                }
            }
            None => {
                let mut stmt =
                    tx.prepare(&format!("UPDATE {} SET sort_index = ?1 WHERE id = ?2", table))?;
                for (position, id) in (1i64..).zip(ordered_ids) {
                    stmt.execute(params![position, id])?;
                }
            }
        }
    }
    tx.commit()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            "CREATE TABLE items (id INTEGER PRIMARY KEY, name TEXT, note TEXT, owner INTEGER, sort_index INTEGER, updated_at TEXT);
             INSERT INTO items (id, name, note, owner) VALUES (1, 'a', 'keep', 10), (2, 'b', NULL, 10), (3, 'c', NULL, 10), (4, 'd', NULL, 20);",
        )
        .unwrap();
        conn
    }

    #[test]
    fn test_builder_sql() {
        let builder = UpdateBuilder::new("items")
            .set("name", "x".to_string())
            .set_opt::<String>("note", None)
            .set("owner", 3i64)
            .touch("updated_at");
        assert_eq!(
            builder.sql(),
            "UPDATE items SET name = ?1, owner = ?2, updated_at = datetime('now') WHERE id = ?3"
        );
    }

    #[test]
    fn test_only_present_fields_change() {
        let conn = setup();
        let changed = UpdateBuilder::new("items")
            .set_opt("name", Some("renamed".to_string()))
            .set_opt::<String>("note", None)
            .touch("updated_at")
            .execute(&conn, 1)
            .unwrap();
        assert_eq!(changed, 1);

        let (name, note, updated): (String, String, Option<String>) = conn
            .query_row("SELECT name, note, updated_at FROM items WHERE id = 1", [], |r| {
                Ok((r.get(0)?, r.get(1)?, r.get(2)?))
            })
            .unwrap();
        assert_eq!(name, "renamed");
        assert_eq!(note, "keep");
        assert!(updated.is_some());
    }

    #[test]
    fn test_empty_patch_is_noop() {
        let conn = setup();
        let changed = UpdateBuilder::new("items").touch("updated_at").execute(&conn, 1).unwrap();
        assert_eq!(changed, 0);
    }

    #[test]
    fn test_value_is_bound_not_interpolated() {
        let conn = setup();
        UpdateBuilder::new("items")
            .set("name", "x'; DROP TABLE items; --".to_string())
            .execute(&conn, 2)
            .unwrap();
        let name: String = conn
            .query_row("SELECT name FROM items WHERE id = 2", [], |r| r.get(0))
            .unwrap();
        assert_eq!(name, "x'; DROP TABLE items; --");
    }

    #[test]
    fn test_scoped_sort_order() {
        let conn = setup();
        assign_sort_order(&conn, "items", Some(("owner", 10)), &[3, 1, 2, 4]).unwrap();

        let order: Vec<(i64, Option<i64>)> = conn
            .prepare("SELECT id, sort_index FROM items ORDER BY id")
            .unwrap()
            .query_map([], |r| Ok((r.get(0)?, r.get(1)?)))
            .unwrap()
            .collect::<rusqlite::Result<_>>()
            .unwrap();
        assert_eq!(order, vec![(1, Some(2)), (2, Some(3)), (3, Some(1)), (4, None)]);
    }
}
