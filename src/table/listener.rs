//! Structural-mutation hooks for virtual tables.
//!
//! Listeners are a plain observer list attached to the table; the table
//! invokes them synchronously, in registration order, immediately after
//! each mutation. `on_column_added` / `on_line_added` fire exactly once,
//! the first time a column or row index is touched; `on_element_put` fires
//! for every put, including overwrites of an existing cell.

use super::element::VirtualElement;

pub trait TableListener: Send {
    fn on_element_put(&mut self, _element: &VirtualElement) {}

    fn on_line_added(&mut self, _row_id: u64) {}

    fn on_column_added(&mut self, _column_id: u32) {}
}
