//! Durable local storage for inventory collections.
//!
//! This module provides the [`Database`], a versioned collection store
//! backed by one JSON document per collection. It exposes atomic bulk
//! `get_all` / `put_all` / `clear` operations per collection and nothing
//! finer-grained; the persistence coordinator is its only writer.
//!
//! Collections:
//! - `items` keyed by name
//! - `locations` keyed by id
//! - `categories` keyed by id
//! - `meta` keyed by key

pub mod database;
pub mod error;

pub use database::{Database, CATEGORIES, ITEMS, LOCATIONS, META};
pub use error::StoreError;
