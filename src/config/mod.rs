//! # Configuration Module
//!
//! Centralizes the numeric constants of the paging layer. Constants that
//! depend on each other are co-located and guarded with compile-time
//! assertions so they cannot drift apart.

pub mod constants;
pub use constants::*;
