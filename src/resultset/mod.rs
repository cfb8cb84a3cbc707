//! # Result-Set Adapter
//!
//! Drains a live row cursor into a [`VirtualTable`], one row at a time. The
//! adapter only ever reads the cursor's *current* row - it never seeks
//! backward and never holds cursor references past row advancement, which
//! is what lets the table outlive the statement entirely.
//!
//! Per column, a pluggable predicate over the cursor-reported data-type
//! name decides the caching strategy: large/streamable types are drained
//! through the [`BinaryStore`] right now (their stream is only valid while
//! the cursor sits on this row) and cached as a pointer; everything else is
//! captured as an inline scalar.

use std::io::Read;
use std::sync::Arc;

use eyre::Result;

use crate::binary::BinaryStore;
use crate::table::{ScalarValue, VirtualElement, VirtualTable};

/// The upstream cursor abstraction: column metadata plus value access for
/// the current row only.
pub trait RowCursor {
    fn column_count(&self) -> usize;

    fn column_name(&self, index: usize) -> &str;

    /// The column's data-type name as the driver reports it; carried onto
    /// every produced element so consumers can render without re-querying
    /// metadata.
    fn data_type_name(&self, index: usize) -> &str;

    /// The current row's value at `index` as an inline scalar.
    fn scalar(&mut self, index: usize) -> Result<ScalarValue>;

    /// A byte stream over the current row's value at `index`. Only valid
    /// until the cursor advances.
    fn binary_stream(&mut self, index: usize) -> Result<Box<dyn Read + '_>>;
}

/// Default binary-classification predicate: the usual large-object type
/// names a console cannot afford to hold inline.
pub fn is_large_object_type(data_type: &str) -> bool {
    matches!(
        data_type.to_ascii_uppercase().as_str(),
        "BLOB"
            | "CLOB"
            | "NCLOB"
            | "RAW"
            | "LONG RAW"
            | "TINYBLOB"
            | "MEDIUMBLOB"
            | "LONGBLOB"
            | "LONGTEXT"
    )
}

/// Produces one cached element per cursor cell, routing binary-classified
/// columns through the binary store.
pub struct CachedElementFactory {
    table_id: String,
    store: Arc<BinaryStore>,
    is_binary: Box<dyn Fn(&str) -> bool + Send + Sync>,
}

impl CachedElementFactory {
    pub fn new(
        table_id: impl Into<String>,
        store: Arc<BinaryStore>,
        is_binary: impl Fn(&str) -> bool + Send + Sync + 'static,
    ) -> Self {
        Self {
            table_id: table_id.into(),
            store,
            is_binary: Box::new(is_binary),
        }
    }

    pub fn table_id(&self) -> &str {
        &self.table_id
    }

    /// Consumes the current row's value at `column` and returns the element
    /// to cache for it. For binary-classified columns the cursor stream is
    /// drained to the store during this call.
    pub fn generate_element(
        &self,
        cursor: &mut dyn RowCursor,
        row_id: u64,
        column: usize,
    ) -> Result<VirtualElement> {
        let column_name = cursor.column_name(column).to_string();
        let data_type = cursor.data_type_name(column).to_string();
        if (self.is_binary)(&data_type) {
            let meta = {
                let mut stream = cursor.binary_stream(column)?;
                self.store.write(&mut stream)?
            };
            Ok(VirtualElement::binary(
                self.table_id.clone(),
                row_id,
                column as u32,
                column_name,
                data_type,
                meta,
            ))
        } else {
            let value = cursor.scalar(column)?;
            Ok(VirtualElement::scalar(
                self.table_id.clone(),
                row_id,
                column as u32,
                column_name,
                data_type,
                value,
            ))
        }
    }
}

impl std::fmt::Debug for CachedElementFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CachedElementFactory")
            .field("table_id", &self.table_id)
            .finish()
    }
}

/// A virtual table fed from a row cursor through a [`CachedElementFactory`].
pub struct ResultSetTable {
    table: VirtualTable,
    factory: CachedElementFactory,
}

impl ResultSetTable {
    pub fn new(factory: CachedElementFactory) -> Self {
        let table = VirtualTable::new(factory.table_id().to_string());
        Self { table, factory }
    }

    /// Drives the factory across every column of the cursor's current row
    /// and inserts the resulting elements under `row_id`.
    pub fn add_row(&mut self, row_id: u64, cursor: &mut dyn RowCursor) -> Result<()> {
        for column in 0..cursor.column_count() {
            let element = self.factory.generate_element(cursor, row_id, column)?;
            self.table.put(element);
        }
        Ok(())
    }

    pub fn table(&self) -> &VirtualTable {
        &self.table
    }

    pub fn table_mut(&mut self) -> &mut VirtualTable {
        &mut self.table
    }

    pub fn into_table(self) -> VirtualTable {
        self.table
    }
}
