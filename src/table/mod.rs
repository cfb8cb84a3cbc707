//! # Virtual Table Module
//!
//! The in-process representation of a cached query result: a sparse,
//! two-dimensional, order-preserving table of cell values decoupled from
//! the live database cursor that produced them.
//!
//! A [`VirtualTable`] accepts [`VirtualElement`]s in any insertion order -
//! row-first while a cursor streams, column-first when a projection is
//! rebuilt, or fully scrambled - and always iterates rows in ascending row
//! id with columns ascending within each row. Cell values are either inline
//! scalars or binary pointers resolved later through the binary store.
//!
//! - `element`: cell values ([`VirtualElement`], [`ScalarValue`], [`CellContent`])
//! - `virtual_table`: the table, its row/column views, `select`/`project`
//! - `listener`: synchronous structural-mutation hooks

mod element;
mod listener;
mod virtual_table;

pub use element::{CellContent, ScalarValue, VirtualElement};
pub use listener::TableListener;
pub use virtual_table::{VirtualColumn, VirtualLine, VirtualTable};
