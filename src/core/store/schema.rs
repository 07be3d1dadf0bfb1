//! Table installation

use super::{Store, StoreError};
use crate::core::identity::RecordKind;
use crate::schema::ddl::{create_table, Dialect};

impl Store {
    /// Create every record table and change table
    ///
    /// Safe to run more than once.
    pub fn install(&mut self) -> Result<(), StoreError> {
        let tx = self.conn.transaction().map_err(StoreError::Sqlite)?;
        for descriptor in self.registry.iter() {
            let sql = create_table(descriptor, Dialect::Sqlite);
            tracing::debug!(
                kind = %descriptor.kind,
                table = descriptor.table(),
                "installing table"
            );
            tx.execute_batch(&sql).map_err(StoreError::Sqlite)?;
        }
        tx.commit().map_err(StoreError::Sqlite)?;

        tracing::info!(tables = self.registry.iter().count(), "store installed");
        Ok(())
    }

    /// Whether the table for a kind exists
    pub fn is_installed(&self, kind: RecordKind) -> Result<bool, StoreError> {
        let descriptor = self.registry.descriptor(kind)?;
        let count: i64 = self
            .conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1",
                [descriptor.table()],
                |row| row.get(0),
            )
            .map_err(StoreError::Sqlite)?;
        Ok(count > 0)
    }
}
