//! Hydration and debounced durable commits.
//!
//! The [`Coordinator`] owns the live [`Inventory`] and a dedicated
//! persistence task. Mutations are applied to memory first and then signal
//! the task over an mpsc channel; the task runs a trailing-edge debounce so
//! a burst of edits produces a single replace-all commit. At most one commit
//! is ever in flight because only the persistence task commits.
//!
//! Persistence is best-effort: a failed commit is logged, memory is never
//! rolled back, and the next mutation schedules a fresh attempt.

use std::sync::{Arc, Mutex};

use tokio::sync::{mpsc, oneshot};
use tokio::time::{sleep_until, Duration, Instant};
use tracing::{debug, info, warn};

use crate::backup::{BackupFile, FormatError, Snapshot};
use crate::models::{CategoryRecord, Item, LocationRecord, MetaRecord};
use crate::store::{Database, StoreError, CATEGORIES, ITEMS, LOCATIONS, META};

use super::Inventory;

// ============================================================================
// Constants
// ============================================================================

/// Quiet period for the trailing-edge debounce. A commit fires only after
/// this long without a further mutation.
const DEBOUNCE_MS: u64 = 350;

/// Buffer size for the dirty-signal channel. Signals are collapsible (one
/// pending ping is as good as ten), so a small buffer suffices.
const SIGNAL_BUFFER_SIZE: usize = 8;

/// Meta key recording the schema version the dataset was written with.
const META_SCHEMA_KEY: &str = "schemaVersion";

enum Signal {
    Dirty,
    Flush(oneshot::Sender<()>),
}

/// Coordinator lifecycle, driven inside [`Coordinator::start`]:
/// `Uninitialized` before any store access, `Hydrating` while the
/// collections are read (and possibly seeded), `Ready` once the live
/// in-memory collections are exposed. Callers only ever observe `Ready`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoordinatorState {
    Uninitialized,
    Hydrating,
    Ready,
}

/// Owns the in-memory inventory and the single writer to the durable store.
pub struct Coordinator {
    inventory: Arc<Mutex<Inventory>>,
    signal_tx: mpsc::Sender<Signal>,
    state: CoordinatorState,
}

impl Coordinator {
    /// Hydrate from the durable store, or seed it when all collections are
    /// empty. The seed commit happens synchronously, so the first run is
    /// durable before any user action.
    ///
    /// Store failures during hydration are logged and degrade to
    /// in-memory-only operation; they never halt the application.
    pub async fn start(db: Database, seed: Inventory) -> Self {
        let mut state = CoordinatorState::Uninitialized;
        debug!(?state, "starting persistence coordinator");

        state = CoordinatorState::Hydrating;
        debug!(?state, "reading collections");

        let inventory = match hydrate(&db) {
            Ok(Some(inventory)) => {
                info!(
                    items = inventory.items.len(),
                    locations = inventory.locations.len(),
                    categories = inventory.categories.len(),
                    "inventory hydrated from store"
                );
                inventory
            }
            Ok(None) => {
                info!("store empty, committing seed dataset");
                if let Err(err) = commit(&db, &seed) {
                    warn!(error = %err, "seed commit failed, continuing in-memory only");
                } else if let Err(err) = db.put_all(
                    META,
                    &[MetaRecord {
                        key: META_SCHEMA_KEY.to_string(),
                        value: db.schema_version().to_string(),
                    }],
                ) {
                    warn!(error = %err, "schema meta write failed");
                }
                seed
            }
            Err(err) => {
                warn!(error = %err, "hydration failed, continuing in-memory only");
                seed
            }
        };

        let inventory = Arc::new(Mutex::new(inventory));
        let (signal_tx, signal_rx) = mpsc::channel(SIGNAL_BUFFER_SIZE);
        tokio::spawn(persistence_task(db, Arc::clone(&inventory), signal_rx));

        state = CoordinatorState::Ready;
        debug!(?state, "live collections exposed");
        Self {
            inventory,
            signal_tx,
            state,
        }
    }

    pub fn state(&self) -> CoordinatorState {
        self.state
    }

    /// Clone of the current in-memory dataset.
    pub fn snapshot(&self) -> Inventory {
        lock(&self.inventory).clone()
    }

    // ------------------------------------------------------------------
    // Mutations. Each applies to memory and, when something changed,
    // signals the persistence task. None of them ever blocks on a commit.
    // ------------------------------------------------------------------

    pub fn add_item(&self, item: Item) -> bool {
        self.mutate(|inv| inv.add_item(item))
    }

    pub fn save_item(&self, updated: Item, original_name: &str) -> bool {
        self.mutate(|inv| inv.save_item(updated, original_name))
    }

    pub fn delete_item(&self, name: &str) -> bool {
        self.mutate(|inv| inv.delete_item(name))
    }

    pub fn add_location(&self, id: &str) -> bool {
        self.mutate(|inv| inv.add_location(id))
    }

    pub fn remove_location(&self, id: &str) -> bool {
        self.mutate(|inv| inv.remove_location(id))
    }

    pub fn add_category(&self, id: &str) -> bool {
        self.mutate(|inv| inv.add_category(id))
    }

    pub fn remove_category(&self, id: &str) -> bool {
        self.mutate(|inv| inv.remove_category(id))
    }

    /// Serialize the current state into a portable backup file.
    pub fn export(&self) -> Result<BackupFile, serde_json::Error> {
        Snapshot::capture(&self.snapshot()).export()
    }

    /// Parse a backup payload and, if its shape is valid, fully replace the
    /// in-memory state and schedule a fresh commit. A shape failure leaves
    /// existing state untouched.
    pub fn restore(&self, payload: &[u8]) -> Result<(), FormatError> {
        let snapshot = Snapshot::from_slice(payload)?;
        self.mutate(|inv| {
            inv.replace_all(snapshot.items, snapshot.locations, snapshot.categories);
            true
        });
        info!("inventory restored from backup");
        Ok(())
    }

    /// Commit the current state immediately, bypassing the quiet period.
    /// Used at orderly teardown; durability after an unflushed mutation is
    /// otherwise guaranteed only once the quiet period elapses.
    pub async fn flush(&self) {
        let (ack_tx, ack_rx) = oneshot::channel();
        if self.signal_tx.send(Signal::Flush(ack_tx)).await.is_ok() {
            let _ = ack_rx.await;
        }
    }

    fn mutate(&self, f: impl FnOnce(&mut Inventory) -> bool) -> bool {
        let changed = f(&mut lock(&self.inventory));
        if changed {
            self.mark_dirty();
        }
        changed
    }

    fn mark_dirty(&self) {
        // A full buffer already carries a pending ping; dropping this one
        // loses nothing.
        let _ = self.signal_tx.try_send(Signal::Dirty);
    }
}

fn lock(inventory: &Mutex<Inventory>) -> std::sync::MutexGuard<'_, Inventory> {
    match inventory.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

/// Read all three collections; `None` means the store is entirely empty and
/// should be seeded.
fn hydrate(db: &Database) -> Result<Option<Inventory>, StoreError> {
    let items: Vec<Item> = db.get_all(ITEMS)?;
    let locations: Vec<LocationRecord> = db.get_all(LOCATIONS)?;
    let categories: Vec<CategoryRecord> = db.get_all(CATEGORIES)?;

    if items.is_empty() && locations.is_empty() && categories.is_empty() {
        return Ok(None);
    }

    Ok(Some(Inventory {
        items,
        locations: locations.into_iter().map(|r| r.id).collect(),
        categories: categories.into_iter().map(|r| r.id).collect(),
    }))
}

/// Replace-all commit: clear then rewrite each collection in full. Small
/// collection sizes make the extra write volume acceptable; renames fall
/// out naturally since the old key simply is not in the snapshot.
fn commit(db: &Database, snapshot: &Inventory) -> Result<(), StoreError> {
    db.clear(ITEMS)?;
    db.put_all(ITEMS, &snapshot.items)?;

    let locations: Vec<LocationRecord> = snapshot
        .locations
        .iter()
        .map(|id| LocationRecord { id: id.clone() })
        .collect();
    db.clear(LOCATIONS)?;
    db.put_all(LOCATIONS, &locations)?;

    let categories: Vec<CategoryRecord> = snapshot
        .categories
        .iter()
        .map(|id| CategoryRecord { id: id.clone() })
        .collect();
    db.clear(CATEGORIES)?;
    db.put_all(CATEGORIES, &categories)?;

    debug!(
        items = snapshot.items.len(),
        locations = locations.len(),
        categories = categories.len(),
        "inventory committed"
    );
    Ok(())
}

fn commit_current(db: &Database, inventory: &Mutex<Inventory>) {
    let snapshot = lock(inventory).clone();
    if let Err(err) = commit(db, &snapshot) {
        // No retry and no rollback: memory stays authoritative and the
        // next mutation schedules a fresh attempt.
        warn!(error = %err, "debounced commit failed");
    }
}

/// The dedicated persistence task. Being the only code path that writes to
/// the store makes the at-most-one-writer invariant structural.
async fn persistence_task(
    db: Database,
    inventory: Arc<Mutex<Inventory>>,
    mut signal_rx: mpsc::Receiver<Signal>,
) {
    let debounce = Duration::from_millis(DEBOUNCE_MS);

    while let Some(signal) = signal_rx.recv().await {
        match signal {
            Signal::Flush(ack) => {
                commit_current(&db, &inventory);
                let _ = ack.send(());
                continue;
            }
            Signal::Dirty => {}
        }

        // Trailing-edge debounce: every further mutation pushes the
        // deadline out; the commit fires only after a full quiet period.
        let mut deadline = Instant::now() + debounce;
        loop {
            tokio::select! {
                _ = sleep_until(deadline) => {
                    commit_current(&db, &inventory);
                    break;
                }
                signal = signal_rx.recv() => match signal {
                    Some(Signal::Dirty) => deadline = Instant::now() + debounce,
                    Some(Signal::Flush(ack)) => {
                        commit_current(&db, &inventory);
                        let _ = ack.send(());
                        break;
                    }
                    None => {
                        // Teardown with a commit pending: best effort.
                        commit_current(&db, &inventory);
                        return;
                    }
                },
            }
        }
    }
}
