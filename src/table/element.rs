//! Cached cell values.
//!
//! A [`VirtualElement`] is one cell of a virtual table: its `(row, column)`
//! position, the column metadata consumers need to render it (name and the
//! cursor-reported data-type name), and the content - an inline scalar or a
//! pointer into the binary store for values too large to keep in memory.

use crate::binary::BinaryContentMeta;

/// An inline cell value, stored without boxing.
#[derive(Debug, Clone, PartialEq)]
pub enum ScalarValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Bytes(Vec<u8>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum CellContent {
    Scalar(ScalarValue),
    Binary(BinaryContentMeta),
}

#[derive(Debug, Clone, PartialEq)]
pub struct VirtualElement {
    table_id: String,
    row_id: u64,
    column_id: u32,
    column_name: String,
    data_type: String,
    content: CellContent,
}

impl VirtualElement {
    /// A cell holding an inline scalar.
    pub fn scalar(
        table_id: impl Into<String>,
        row_id: u64,
        column_id: u32,
        column_name: impl Into<String>,
        data_type: impl Into<String>,
        value: ScalarValue,
    ) -> Self {
        Self {
            table_id: table_id.into(),
            row_id,
            column_id,
            column_name: column_name.into(),
            data_type: data_type.into(),
            content: CellContent::Scalar(value),
        }
    }

    /// A cell holding a pointer into the binary store.
    pub fn binary(
        table_id: impl Into<String>,
        row_id: u64,
        column_id: u32,
        column_name: impl Into<String>,
        data_type: impl Into<String>,
        meta: BinaryContentMeta,
    ) -> Self {
        Self {
            table_id: table_id.into(),
            row_id,
            column_id,
            column_name: column_name.into(),
            data_type: data_type.into(),
            content: CellContent::Binary(meta),
        }
    }

    pub fn table_id(&self) -> &str {
        &self.table_id
    }

    pub fn row_id(&self) -> u64 {
        self.row_id
    }

    pub fn column_id(&self) -> u32 {
        self.column_id
    }

    pub fn column_name(&self) -> &str {
        &self.column_name
    }

    /// The data-type name the cursor reported for this column, used by
    /// consumers to render the value without re-querying metadata.
    pub fn data_type_name(&self) -> &str {
        &self.data_type
    }

    pub fn content(&self) -> &CellContent {
        &self.content
    }

    pub fn is_binary(&self) -> bool {
        matches!(self.content, CellContent::Binary(_))
    }

    pub fn binary_meta(&self) -> Option<&BinaryContentMeta> {
        match &self.content {
            CellContent::Binary(meta) => Some(meta),
            CellContent::Scalar(_) => None,
        }
    }

    pub fn scalar_value(&self) -> Option<&ScalarValue> {
        match &self.content {
            CellContent::Scalar(value) => Some(value),
            CellContent::Binary(_) => None,
        }
    }
}
