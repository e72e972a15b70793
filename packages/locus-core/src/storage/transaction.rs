//! Scoped write transactions.
//!
//! A [`WriteTransaction`] is begun against a connection, used for any
//! number of statements, then either committed or rolled back. Dropping
//! it without committing rolls back, so an early `?` return never leaves
//! a partial write behind.

use std::ops::Deref;

use rusqlite::{Connection, DropBehavior, Transaction, TransactionBehavior};

use crate::error::{Error, Result};

pub(crate) struct WriteTransaction<'conn> {
    tx: Transaction<'conn>,
}

impl<'conn> WriteTransaction<'conn> {
    /// Begin an IMMEDIATE transaction, taking the write lock up front
    pub(crate) fn begin(conn: &'conn mut Connection) -> Result<Self> {
        let mut tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(|e| Error::DatabaseError(format!("Failed to begin transaction: {}", e)))?;
        tx.set_drop_behavior(DropBehavior::Rollback);
        Ok(Self { tx })
    }

    /// Make every statement run in this transaction durable
    pub(crate) fn commit(self) -> Result<()> {
        self.tx
            .commit()
            .map_err(|e| Error::DatabaseError(format!("Failed to commit transaction: {}", e)))
    }

    /// Discard every statement run in this transaction
    pub(crate) fn rollback(self) -> Result<()> {
        self.tx
            .rollback()
            .map_err(|e| Error::DatabaseError(format!("Failed to roll back transaction: {}", e)))
    }
}

impl Deref for WriteTransaction<'_> {
    type Target = Connection;

    fn deref(&self) -> &Connection {
        &self.tx
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("CREATE TABLE t (v INTEGER NOT NULL)").unwrap();
        conn
    }

    fn count(conn: &Connection) -> i64 {
        conn.query_row("SELECT COUNT(*) FROM t", [], |row| row.get(0))
            .unwrap()
    }

    #[test]
    fn test_commit_persists() {
        let mut conn = setup();
        let tx = WriteTransaction::begin(&mut conn).unwrap();
        tx.execute("INSERT INTO t (v) VALUES (1)", []).unwrap();
        tx.commit().unwrap();
        assert_eq!(count(&conn), 1);
    }

    #[test]
    fn test_explicit_rollback_discards() {
        let mut conn = setup();
        let tx = WriteTransaction::begin(&mut conn).unwrap();
        tx.execute("INSERT INTO t (v) VALUES (1)", []).unwrap();
        tx.rollback().unwrap();
        assert_eq!(count(&conn), 0);
    }

    #[test]
    fn test_drop_without_commit_rolls_back() {
        let mut conn = setup();
        {
            let tx = WriteTransaction::begin(&mut conn).unwrap();
            tx.execute("INSERT INTO t (v) VALUES (1)", []).unwrap();
        }
        assert_eq!(count(&conn), 0);
    }

    #[test]
    fn test_error_inside_scope_leaves_nothing() {
        let mut conn = setup();
        let attempt = |conn: &mut Connection| -> Result<()> {
            let tx = WriteTransaction::begin(conn)?;
            tx.execute("INSERT INTO t (v) VALUES (1)", [])?;
            // NOT NULL violation
            tx.execute("INSERT INTO t (v) VALUES (NULL)", [])?;
            tx.commit()
        };

        assert!(attempt(&mut conn).is_err());
        assert_eq!(count(&conn), 0);
    }
}
