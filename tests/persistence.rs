//! End-to-end persistence behavior: hydrate-or-seed, debounced commits,
//! rename semantics and restore, all against a real temp-dir store.

use std::path::Path;
use std::time::Duration;

use craftcache::models::{seed, CategoryRecord, Item, LocationRecord};
use craftcache::persist::CoordinatorState;
use craftcache::store::{Database, CATEGORIES, ITEMS, LOCATIONS};
use craftcache::{Coordinator, Inventory};
use tempfile::TempDir;

/// Comfortably past the 350 ms quiet period.
const SETTLE: Duration = Duration::from_millis(600);

fn seed_inventory() -> Inventory {
    Inventory {
        items: seed::items(),
        locations: seed::locations(),
        categories: seed::categories(),
    }
}

fn item(name: &str, location: &str, category: &str) -> Item {
    Item {
        name: name.to_string(),
        location: location.to_string(),
        category: category.to_string(),
        tags: vec!["test".to_string()],
        photo_src: None,
    }
}

/// Read the committed state back through a second handle on the same files.
fn committed_state(root: &Path) -> Inventory {
    let db = Database::open(root, "craft-storage-tracker", 1).unwrap();
    let items: Vec<Item> = db.get_all(ITEMS).unwrap();
    let locations: Vec<LocationRecord> = db.get_all(LOCATIONS).unwrap();
    let categories: Vec<CategoryRecord> = db.get_all(CATEGORIES).unwrap();
    Inventory {
        items,
        locations: locations.into_iter().map(|r| r.id).collect(),
        categories: categories.into_iter().map(|r| r.id).collect(),
    }
}

fn sorted_by_name(mut items: Vec<Item>) -> Vec<Item> {
    items.sort_by(|a, b| a.name.cmp(&b.name));
    items
}

fn assert_state_eq(a: &Inventory, b: &Inventory) {
    assert_eq!(
        sorted_by_name(a.items.clone()),
        sorted_by_name(b.items.clone())
    );
    let sorted = |v: &[String]| {
        let mut v = v.to_vec();
        v.sort();
        v
    };
    assert_eq!(sorted(&a.locations), sorted(&b.locations));
    assert_eq!(sorted(&a.categories), sorted(&b.categories));
}

#[tokio::test]
async fn test_empty_store_is_seeded_before_any_mutation() {
    let tmp = TempDir::new().unwrap();
    let db = Database::open(tmp.path(), "craft-storage-tracker", 1).unwrap();

    let coordinator = Coordinator::start(db, seed_inventory()).await;
    assert_eq!(coordinator.state(), CoordinatorState::Ready);

    // The seed must be both exposed and already durable, with no quiet
    // period involved.
    let snapshot = coordinator.snapshot();
    assert_eq!(snapshot.items.len(), 8);
    assert_state_eq(&committed_state(tmp.path()), &snapshot);
}

#[tokio::test]
async fn test_second_start_hydrates_instead_of_reseeding() {
    let tmp = TempDir::new().unwrap();

    {
        let db = Database::open(tmp.path(), "craft-storage-tracker", 1).unwrap();
        let coordinator = Coordinator::start(db, seed_inventory()).await;
        coordinator.add_item(item("Custom Thing", "Top Shelf", "Supply"));
        coordinator.flush().await;
    }

    let db = Database::open(tmp.path(), "craft-storage-tracker", 1).unwrap();
    let coordinator = Coordinator::start(db, seed_inventory()).await;
    let snapshot = coordinator.snapshot();
    assert_eq!(snapshot.items.len(), 9);
    assert!(snapshot.items.iter().any(|i| i.name == "Custom Thing"));
}

#[tokio::test]
async fn test_mutation_burst_settles_to_memory_state() {
    let tmp = TempDir::new().unwrap();
    let db = Database::open(tmp.path(), "craft-storage-tracker", 1).unwrap();
    let coordinator = Coordinator::start(db, seed_inventory()).await;

    assert!(coordinator.add_item(item("New Plushie", "Top Shelf", "Plushie")));
    assert!(coordinator.add_location("Attic Crate"));
    assert!(coordinator.delete_item("Milo the Mammoth"));
    assert!(!coordinator.remove_category("Plushie")); // still referenced

    tokio::time::sleep(SETTLE).await;

    let committed = committed_state(tmp.path());
    assert_state_eq(&committed, &coordinator.snapshot());
    assert!(committed.items.iter().any(|i| i.name == "New Plushie"));
    assert!(!committed.items.iter().any(|i| i.name == "Milo the Mammoth"));
    assert!(committed.locations.contains(&"Attic Crate".to_string()));
    assert!(committed.categories.contains(&"Plushie".to_string()));
}

#[tokio::test]
async fn test_rename_leaves_only_new_key_after_settle() {
    let tmp = TempDir::new().unwrap();
    let db = Database::open(tmp.path(), "craft-storage-tracker", 1).unwrap();
    let coordinator = Coordinator::start(db, seed_inventory()).await;
    tokio::time::sleep(SETTLE).await;

    let renamed = item("Milo the Mastodon", "Studio Rack", "Plushie");
    assert!(coordinator.save_item(renamed, "Milo the Mammoth"));
    tokio::time::sleep(SETTLE).await;

    let committed = committed_state(tmp.path());
    assert!(committed.items.iter().any(|i| i.name == "Milo the Mastodon"));
    assert!(
        !committed.items.iter().any(|i| i.name == "Milo the Mammoth"),
        "old key must not survive a settled rename"
    );
}

#[tokio::test]
async fn test_restore_replaces_state_and_commits() {
    let tmp = TempDir::new().unwrap();
    let db = Database::open(tmp.path(), "craft-storage-tracker", 1).unwrap();
    let coordinator = Coordinator::start(db, seed_inventory()).await;

    let payload = br#"{
        "version": 1,
        "items": [
            {"name": "Only Item", "location": "Shelf", "category": "Misc", "tags": []}
        ],
        "locations": ["Shelf"],
        "categories": ["Misc"],
        "exportedAt": "2026-01-15T10:00:00Z"
    }"#;
    coordinator.restore(payload).unwrap();

    let snapshot = coordinator.snapshot();
    assert_eq!(snapshot.items.len(), 1);
    assert_eq!(snapshot.locations, vec!["Shelf"]);

    tokio::time::sleep(SETTLE).await;
    assert_state_eq(&committed_state(tmp.path()), &snapshot);
}

#[tokio::test]
async fn test_bad_restore_leaves_state_untouched() {
    let tmp = TempDir::new().unwrap();
    let db = Database::open(tmp.path(), "craft-storage-tracker", 1).unwrap();
    let coordinator = Coordinator::start(db, seed_inventory()).await;
    let before = coordinator.snapshot();

    let err = coordinator.restore(br#"{"items": "nope"}"#);
    assert!(err.is_err());
    assert_eq!(coordinator.snapshot(), before);
}

#[tokio::test]
async fn test_backup_export_round_trips_through_restore() {
    let tmp = TempDir::new().unwrap();
    let db = Database::open(tmp.path(), "craft-storage-tracker", 1).unwrap();
    let coordinator = Coordinator::start(db, seed_inventory()).await;
    coordinator.add_item(item("Exported", "Top Shelf", "Supply"));

    let backup = coordinator.export().unwrap();

    let tmp2 = TempDir::new().unwrap();
    let db2 = Database::open(tmp2.path(), "craft-storage-tracker", 1).unwrap();
    let other = Coordinator::start(db2, Inventory::default()).await;
    other.restore(backup.contents.as_bytes()).unwrap();

    assert_state_eq(&other.snapshot(), &coordinator.snapshot());
}
