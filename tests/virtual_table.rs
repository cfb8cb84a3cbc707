//! # Virtual Table Tests
//!
//! The structural properties of the sparse table: identical iteration
//! results for row-major, column-major and scrambled insertion orders; no
//! phantom cells; last-write-wins replacement; exactly-once listener
//! callbacks; and `select`/`project` derivation semantics.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use rand::seq::SliceRandom;

use rowspool::table::VirtualLine;
use rowspool::{ScalarValue, TableListener, VirtualElement, VirtualTable};

fn element(row: u64, col: u32) -> VirtualElement {
    VirtualElement::scalar(
        "test_table",
        row,
        col,
        format!("c{col}"),
        "VARCHAR2",
        ScalarValue::Text(format!("{row}-{col}")),
    )
}

fn text_of(element: &VirtualElement) -> String {
    match element.scalar_value() {
        Some(ScalarValue::Text(text)) => text.clone(),
        other => panic!("expected text content, got {other:?}"),
    }
}

/// Row-by-row image of the table: (row id, [(column id, text)]).
fn snapshot(table: &VirtualTable) -> Vec<(u64, Vec<(u32, String)>)> {
    table
        .lines()
        .map(|line| {
            let cells = line
                .iter()
                .map(|e| (e.column_id(), text_of(e)))
                .collect::<Vec<_>>();
            (line.row_id(), cells)
        })
        .collect()
}

fn full_matrix(rows: u64, cols: u32) -> Vec<(u64, u32)> {
    let mut cells = Vec::new();
    for row in 0..rows {
        for col in 0..cols {
            cells.push((row, col));
        }
    }
    cells
}

#[test]
fn insertion_order_does_not_change_iteration() {
    let cells = full_matrix(10, 5);

    let mut row_major = VirtualTable::new("test_table");
    for &(row, col) in &cells {
        row_major.put(element(row, col));
    }

    let mut column_major = VirtualTable::new("test_table");
    for col in 0..5 {
        for row in 0..10 {
            column_major.put(element(row, col));
        }
    }

    let mut scrambled_cells = cells.clone();
    scrambled_cells.shuffle(&mut rand::thread_rng());
    let mut scrambled = VirtualTable::new("test_table");
    for (row, col) in scrambled_cells {
        scrambled.put(element(row, col));
    }

    let reference = snapshot(&row_major);
    assert_eq!(snapshot(&column_major), reference);
    assert_eq!(snapshot(&scrambled), reference);
    assert_eq!(row_major.count(), 10);
    assert_eq!(row_major.column_ids(), vec![0, 1, 2, 3, 4]);
}

#[test]
fn reverse_insertion_orders() {
    let mut forward = VirtualTable::new("test_table");
    for row in 0..10 {
        for col in 0..5 {
            forward.put(element(row, col));
        }
    }

    let mut backward = VirtualTable::new("test_table");
    for row in (0..10).rev() {
        for col in (0..5).rev() {
            backward.put(element(row, col));
        }
    }

    assert_eq!(snapshot(&backward), snapshot(&forward));
}

#[test]
fn sparse_matrix_counts_rows_with_cells_only() {
    // ~50% density, column-first insertion
    let mut table = VirtualTable::new("test_table");
    let mut populated_rows = std::collections::BTreeSet::new();
    for col in 0..5u32 {
        for row in 0..10u64 {
            if (row + col as u64) % 2 == 0 {
                table.put(element(row, col));
                populated_rows.insert(row);
            }
        }
    }

    assert_eq!(table.count(), populated_rows.len() as u64);

    // rows ascend; columns ascend within each row
    let mut previous_row = None;
    for line in table.lines() {
        if let Some(prev) = previous_row {
            assert!(line.row_id() > prev);
        }
        previous_row = Some(line.row_id());
        let cols: Vec<u32> = line.iter().map(VirtualElement::column_id).collect();
        let mut sorted = cols.clone();
        sorted.sort_unstable();
        assert_eq!(cols, sorted);
    }
}

#[test]
fn no_phantom_cells_appear() {
    let mut table = VirtualTable::new("test_table");
    table.put(element(2, 3));

    assert!(table.get(2, 3).is_some());
    assert!(table.get(2, 0).is_none());
    assert!(table.get(2, 4).is_none());
    assert!(table.get(0, 3).is_none());
    assert_eq!(table.count(), 1);
    assert_eq!(table.line(2).unwrap().len(), 1);
    assert_eq!(table.column(3).unwrap().len(), 1);
}

#[test]
fn put_twice_replaces_without_growing() {
    let mut table = VirtualTable::new("test_table");
    table.put(element(1, 2));
    let before = table.count();

    let replacement = VirtualElement::scalar(
        "test_table",
        1,
        2,
        "c2",
        "VARCHAR2",
        ScalarValue::Text("replaced".into()),
    );
    table.put(replacement);

    assert_eq!(table.count(), before);
    assert_eq!(text_of(table.get(1, 2).unwrap()), "replaced");
    assert_eq!(table.line(1).unwrap().len(), 1);
    assert_eq!(table.column(2).unwrap().len(), 1);
}

struct CountingListener {
    elements: Arc<AtomicUsize>,
    lines: Arc<AtomicUsize>,
    columns: Arc<AtomicUsize>,
}

impl TableListener for CountingListener {
    fn on_element_put(&mut self, _element: &VirtualElement) {
        self.elements.fetch_add(1, Ordering::SeqCst);
    }

    fn on_line_added(&mut self, _row_id: u64) {
        self.lines.fetch_add(1, Ordering::SeqCst);
    }

    fn on_column_added(&mut self, _column_id: u32) {
        self.columns.fetch_add(1, Ordering::SeqCst);
    }
}

#[test]
fn listeners_fire_exactly_once_per_structure_and_once_per_put() {
    let elements = Arc::new(AtomicUsize::new(0));
    let lines = Arc::new(AtomicUsize::new(0));
    let columns = Arc::new(AtomicUsize::new(0));

    let mut table = VirtualTable::new("test_table");
    table.add_listener(CountingListener {
        elements: Arc::clone(&elements),
        lines: Arc::clone(&lines),
        columns: Arc::clone(&columns),
    });

    for row in 0..5 {
        for col in 0..4 {
            table.put(element(row, col));
        }
    }
    assert_eq!(elements.load(Ordering::SeqCst), 20);
    assert_eq!(lines.load(Ordering::SeqCst), 5);
    assert_eq!(columns.load(Ordering::SeqCst), 4);

    // overwriting an existing cell fires only the element hook
    table.put(element(0, 0));
    assert_eq!(elements.load(Ordering::SeqCst), 21);
    assert_eq!(lines.load(Ordering::SeqCst), 5);
    assert_eq!(columns.load(Ordering::SeqCst), 4);
}

#[test]
fn select_keeps_original_row_ids() {
    let mut table = VirtualTable::new("test_table");
    for row in 0..10 {
        for col in 0..3 {
            table.put(element(row, col));
        }
    }

    let even = table.select(|line: &VirtualLine<'_>| line.row_id() % 2 == 0);
    assert_eq!(even.count(), 5);
    let ids: Vec<u64> = even.lines().map(|l| l.row_id()).collect();
    assert_eq!(ids, vec![0, 2, 4, 6, 8]);
    assert_eq!(text_of(even.get(4, 1).unwrap()), "4-1");

    // source table is untouched
    assert_eq!(table.count(), 10);
}

#[test]
fn project_restricts_and_transforms_columns() {
    let mut table = VirtualTable::new("test_table");
    for row in 0..4 {
        for col in 0..5 {
            table.put(element(row, col));
        }
    }

    let projected = table.project(&[2, 4], |e| e.clone()).unwrap();
    assert_eq!(projected.column_ids(), vec![2, 4]);
    assert_eq!(projected.count(), 4);
    assert!(projected.get(0, 0).is_none());
    assert_eq!(text_of(projected.get(3, 4).unwrap()), "3-4");

    let relabeled = table
        .project(&[1], |e| {
            VirtualElement::scalar(
                e.table_id(),
                e.row_id(),
                e.column_id(),
                e.column_name(),
                "CLOB",
                e.scalar_value().cloned().unwrap_or(ScalarValue::Null),
            )
        })
        .unwrap();
    assert_eq!(relabeled.get(0, 1).unwrap().data_type_name(), "CLOB");
}

#[test]
fn project_of_absent_column_fails_before_building() {
    let mut table = VirtualTable::new("test_table");
    for row in 0..10 {
        for col in 0..5 {
            table.put(element(row, col));
        }
    }

    let err = table.project(&[2, 5], |e| e.clone()).unwrap_err();
    assert!(err.to_string().contains("column 5 does not exist"));
}
