//! In-memory inventory state and its durable persistence.
//!
//! This module contains:
//! - [`Inventory`]: the live dataset (items, locations, categories) with
//!   the full mutation surface and its referential-integrity rules
//! - [`Coordinator`]: hydrates the inventory from the durable store (or
//!   seeds it on first run) and debounces mutations into replace-all
//!   commits on a dedicated persistence task
//!
//! The coordinator is the sole writer to the durable store.

pub mod coordinator;
pub mod inventory;

pub use coordinator::{Coordinator, CoordinatorState};
pub use inventory::Inventory;
