//! # Cross-Linked Virtual Table
//!
//! The sparse matrix of cached cells. Every element is reachable along two
//! axes - its row and its column - so a streaming row-major producer and a
//! later columnar consumer (projection) share one structure without any
//! re-sort.
//!
//! ## Representation
//!
//! The cross-linking is expressed as an element arena keyed by
//! `(row_id, column_id)` in an ordered map, plus two auxiliary ordered
//! indexes built from the same keys:
//!
//! ```text
//! cells:   BTreeMap<(row, col), VirtualElement>   the arena
//! rows:    BTreeMap<row, BTreeSet<col>>           row -> sorted columns
//! columns: BTreeMap<col, ColumnInfo>              col -> sorted rows + meta
//! ```
//!
//! Inserting an element is local index surgery at its row and column
//! insertion points regardless of the caller's fill order - row-first,
//! column-first, or scrambled all land in the same shape. Row iteration is
//! ascending `row_id`; within a row, columns ascend. Only cells that were
//! explicitly put exist: `get` on an absent cell is `None`, never a
//! default.
//!
//! ## Derived Tables
//!
//! `select` keeps whole rows (with their original row ids) that pass a
//! predicate; `project` keeps the requested columns, failing before
//! building anything if a requested column id was never populated.

use std::collections::{BTreeMap, BTreeSet};

use eyre::{bail, Result};

use super::element::VirtualElement;
use super::listener::TableListener;

struct ColumnInfo {
    name: String,
    data_type: String,
    rows: BTreeSet<u64>,
}

pub struct VirtualTable {
    table_id: String,
    cells: BTreeMap<(u64, u32), VirtualElement>,
    rows: BTreeMap<u64, BTreeSet<u32>>,
    columns: BTreeMap<u32, ColumnInfo>,
    listeners: Vec<Box<dyn TableListener>>,
}

impl VirtualTable {
    /// Creates an empty table for the given identifier.
    pub fn new(table_id: impl Into<String>) -> Self {
        Self {
            table_id: table_id.into(),
            cells: BTreeMap::new(),
            rows: BTreeMap::new(),
            columns: BTreeMap::new(),
            listeners: Vec::new(),
        }
    }

    pub fn table_id(&self) -> &str {
        &self.table_id
    }

    pub fn add_listener(&mut self, listener: impl TableListener + 'static) {
        self.listeners.push(Box::new(listener));
    }

    /// Inserts the element at its `(row, column)` position, replacing the
    /// previous content if the cell exists - last write wins, cardinality
    /// unchanged. First touch of a column or row registers it and fires
    /// the corresponding listener hook; `on_element_put` fires every time.
    pub fn put(&mut self, element: VirtualElement) {
        let row_id = element.row_id();
        let column_id = element.column_id();

        if !self.columns.contains_key(&column_id) {
            self.columns.insert(
                column_id,
                ColumnInfo {
                    name: element.column_name().to_string(),
                    data_type: element.data_type_name().to_string(),
                    rows: BTreeSet::new(),
                },
            );
            for listener in self.listeners.iter_mut() {
                listener.on_column_added(column_id);
            }
        }
        if !self.rows.contains_key(&row_id) {
            self.rows.insert(row_id, BTreeSet::new());
            for listener in self.listeners.iter_mut() {
                listener.on_line_added(row_id);
            }
        }

        self.rows
            .get_mut(&row_id)
            .expect("row registered above")
            .insert(column_id);
        self.columns
            .get_mut(&column_id)
            .expect("column registered above")
            .rows
            .insert(row_id);
        self.cells.insert((row_id, column_id), element);

        let element = &self.cells[&(row_id, column_id)];
        for listener in self.listeners.iter_mut() {
            listener.on_element_put(element);
        }
    }

    /// The element at `(row, column)`, or `None` if that cell was never put.
    pub fn get(&self, row_id: u64, column_id: u32) -> Option<&VirtualElement> {
        self.cells.get(&(row_id, column_id))
    }

    /// Number of distinct non-empty rows (not the number of elements).
    pub fn count(&self) -> u64 {
        self.rows.len() as u64
    }

    /// Populated column ids, ascending.
    pub fn column_ids(&self) -> Vec<u32> {
        self.columns.keys().copied().collect()
    }

    /// Rows in ascending `row_id` order.
    pub fn lines(&self) -> impl Iterator<Item = VirtualLine<'_>> {
        self.rows.keys().map(move |&row_id| VirtualLine {
            row_id,
            table: self,
        })
    }

    pub fn line(&self, row_id: u64) -> Option<VirtualLine<'_>> {
        self.rows.contains_key(&row_id).then_some(VirtualLine {
            row_id,
            table: self,
        })
    }

    pub fn column(&self, column_id: u32) -> Option<VirtualColumn<'_>> {
        self.columns
            .contains_key(&column_id)
            .then_some(VirtualColumn {
                column_id,
                table: self,
            })
    }

    /// A new table holding the rows that pass the predicate, keeping each
    /// surviving row's original `row_id`. Listeners do not carry over.
    pub fn select<P>(&self, mut predicate: P) -> VirtualTable
    where
        P: FnMut(&VirtualLine<'_>) -> bool,
    {
        let mut selected = VirtualTable::new(format!("{}#select", self.table_id));
        for line in self.lines() {
            if predicate(&line) {
                for element in line.iter() {
                    selected.put(element.clone());
                }
            }
        }
        selected
    }

    /// A new table restricted to `column_ids`, with `mapper` applied to
    /// every element. Fails before building anything if any requested
    /// column id was never populated.
    pub fn project<F>(&self, column_ids: &[u32], mut mapper: F) -> Result<VirtualTable>
    where
        F: FnMut(&VirtualElement) -> VirtualElement,
    {
        for &column_id in column_ids {
            if !self.columns.contains_key(&column_id) {
                bail!("column {column_id} does not exist");
            }
        }
        let mut projected = VirtualTable::new(format!("{}#project", self.table_id));
        for &column_id in column_ids {
            let column = VirtualColumn {
                column_id,
                table: self,
            };
            for element in column.iter() {
                projected.put(mapper(element));
            }
        }
        Ok(projected)
    }
}

impl std::fmt::Debug for VirtualTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VirtualTable")
            .field("table_id", &self.table_id)
            .field("rows", &self.rows.len())
            .field("columns", &self.columns.len())
            .field("cells", &self.cells.len())
            .finish()
    }
}

/// View of one row; iterates its elements in ascending `column_id`.
#[derive(Clone, Copy)]
pub struct VirtualLine<'a> {
    row_id: u64,
    table: &'a VirtualTable,
}

impl<'a> VirtualLine<'a> {
    pub fn row_id(&self) -> u64 {
        self.row_id
    }

    pub fn get(&self, column_id: u32) -> Option<&'a VirtualElement> {
        self.table.cells.get(&(self.row_id, column_id))
    }

    pub fn iter(&self) -> impl Iterator<Item = &'a VirtualElement> + 'a {
        self.table
            .cells
            .range((self.row_id, u32::MIN)..=(self.row_id, u32::MAX))
            .map(|(_, element)| element)
    }

    pub fn len(&self) -> usize {
        self.table.rows.get(&self.row_id).map_or(0, BTreeSet::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// View of one column; iterates its elements in ascending `row_id`.
#[derive(Clone, Copy)]
pub struct VirtualColumn<'a> {
    column_id: u32,
    table: &'a VirtualTable,
}

impl<'a> VirtualColumn<'a> {
    pub fn column_id(&self) -> u32 {
        self.column_id
    }

    pub fn name(&self) -> &'a str {
        &self.info().name
    }

    pub fn data_type_name(&self) -> &'a str {
        &self.info().data_type
    }

    pub fn iter(&self) -> impl Iterator<Item = &'a VirtualElement> + 'a {
        let table = self.table;
        let column_id = self.column_id;
        self.info().rows.iter().map(move |&row_id| {
            table
                .cells
                .get(&(row_id, column_id))
                .expect("column index entry has a cell")
        })
    }

    pub fn len(&self) -> usize {
        self.info().rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn info(&self) -> &'a ColumnInfo {
        self.table
            .columns
            .get(&self.column_id)
            .expect("column view exists only for registered columns")
    }
}
