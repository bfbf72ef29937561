//! The in-memory dataset and its mutation rules.
//!
//! Referential integrity is deliberately asymmetric: saving an item whose
//! location or category does not exist yet auto-creates it, while deleting
//! a location or category still referenced by any item is refused. Location
//! and category lists are kept sorted.

use crate::models::Item;

/// The three live collections. Locations and categories are plain string
/// ids in memory; the store layer wraps them into keyed rows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Inventory {
    pub items: Vec<Item>,
    pub locations: Vec<String>,
    pub categories: Vec<String>,
}

impl Inventory {
    pub fn is_empty(&self) -> bool {
        self.items.is_empty() && self.locations.is_empty() && self.categories.is_empty()
    }

    /// Add a new item. Refused when the name is blank or already taken
    /// (item names are the primary key). A missing location or category is
    /// auto-created.
    pub fn add_item(&mut self, item: Item) -> bool {
        if item.name.trim().is_empty() || self.items.iter().any(|i| i.name == item.name) {
            return false;
        }
        self.ensure_references(&item);
        self.items.push(item);
        true
    }

    /// Replace the item previously stored under `original_name`. A rename
    /// is just the replaced record carrying a new name; the storage layer
    /// sees delete-old-insert-new through the replace-all commit. Refused
    /// when the original does not exist or the new name collides with a
    /// different item.
    pub fn save_item(&mut self, updated: Item, original_name: &str) -> bool {
        let Some(index) = self.items.iter().position(|i| i.name == original_name) else {
            return false;
        };
        if updated.name.trim().is_empty() {
            return false;
        }
        if updated.name != original_name && self.items.iter().any(|i| i.name == updated.name) {
            return false;
        }
        self.ensure_references(&updated);
        self.items[index] = updated;
        true
    }

    pub fn delete_item(&mut self, name: &str) -> bool {
        let before = self.items.len();
        self.items.retain(|i| i.name != name);
        self.items.len() != before
    }

    pub fn add_location(&mut self, id: &str) -> bool {
        insert_sorted(&mut self.locations, id)
    }

    /// Remove a location. Refused while any item still references it; the
    /// list is left unchanged in that case.
    pub fn remove_location(&mut self, id: &str) -> bool {
        if self.items.iter().any(|i| i.location == id) {
            return false;
        }
        let before = self.locations.len();
        self.locations.retain(|l| l != id);
        self.locations.len() != before
    }

    pub fn add_category(&mut self, id: &str) -> bool {
        insert_sorted(&mut self.categories, id)
    }

    /// Remove a category, with the same in-use protection as locations.
    pub fn remove_category(&mut self, id: &str) -> bool {
        if self.items.iter().any(|i| i.category == id) {
            return false;
        }
        let before = self.categories.len();
        self.categories.retain(|c| c != id);
        self.categories.len() != before
    }

    /// Replace the full dataset. Used by restore; never merges.
    pub fn replace_all(&mut self, items: Vec<Item>, locations: Vec<String>, categories: Vec<String>) {
        self.items = items;
        self.locations = locations;
        self.categories = categories;
    }

    /// Auto-create the location/category an item points at (soft
    /// referential integrity). Blank references are left dangling-free by
    /// simply not creating anything.
    fn ensure_references(&mut self, item: &Item) {
        if !item.location.trim().is_empty() {
            insert_sorted(&mut self.locations, &item.location);
        }
        if !item.category.trim().is_empty() {
            insert_sorted(&mut self.categories, &item.category);
        }
    }
}

/// Insert into a sorted list of unique ids. Returns false for blanks and
/// duplicates.
fn insert_sorted(list: &mut Vec<String>, value: &str) -> bool {
    let value = value.trim();
    if value.is_empty() || list.iter().any(|v| v == value) {
        return false;
    }
    list.push(value.to_string());
    list.sort();
    true
}

// ============================================================================
// Tests
// ============================================================================
