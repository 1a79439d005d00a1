//! In-process table change notifications.
//!
//! A [`ChangeRegister`] maps each physical table to the listeners interested in
//! it. Writers call [`ChangeRegister::notify`] after a change commits; every
//! listener currently subscribed to that table is invoked synchronously.
//!
//! - The table map is behind an `RwLock`; each table's bucket has its own
//!   `Mutex`, so notifications for different tables do not contend.
//! - Delivery to a single listener is serialized by a per-listener mutex, even
//!   when it is subscribed to several tables notified concurrently.
//! - A listener that triggers a notification for itself from inside
//!   `on_change` gets the nested event queued and delivered once the current
//!   callback returns.
//! - A panicking listener is logged and skipped; the others still run.

use crate::table::TableId;
use std::cell::RefCell;
use std::collections::{BTreeSet, HashMap, VecDeque};
use std::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock, Weak};

/// Kind of change made to a table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeAction {
    Insert,
    Update,
    Delete,
}

impl ChangeAction {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Insert => "INSERT",
            Self::Update => "UPDATE",
            Self::Delete => "DELETE",
        }
    }
}

impl fmt::Display for ChangeAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Receives table change events.
///
/// Called synchronously from [`ChangeRegister::notify`]; implementations should
/// return quickly (bump a counter, send on a channel).
pub trait TableChangeListener: Send + Sync {
    fn on_change(&self, table: &TableId, action: ChangeAction);
}

impl<F> TableChangeListener for F
where
    F: Fn(&TableId, ChangeAction) + Send + Sync,
{
    fn on_change(&self, table: &TableId, action: ChangeAction) {
        self(table, action)
    }
}

thread_local! {
    /// Slots whose listener is running on this thread.
    static DELIVERING: RefCell<Vec<u64>> = const { RefCell::new(Vec::new()) };
}

struct ListenerSlot {
    id: u64,
    listener: Arc<dyn TableChangeListener>,
    delivery: Mutex<()>,
    /// Events raised by the listener's own callback, drained by the
    /// delivering thread before it releases `delivery`.
    pending: Mutex<VecDeque<(TableId, ChangeAction)>>,
}

impl ListenerSlot {
    fn is_delivering_here(&self) -> bool {
        DELIVERING.with(|ids| ids.borrow().contains(&self.id))
    }

    fn deliver(&self, table: &TableId, action: ChangeAction) {
        if self.is_delivering_here() {
            self.pending
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push_back((table.clone(), action));
            tracing::trace!(
                target: "tableflow",
                listener = self.id,
                %table,
                %action,
                "nested change queued"
            );
            return;
        }

        let _serial = self.delivery.lock().unwrap_or_else(PoisonError::into_inner);
        let _marker = DeliveryMarker::enter(self.id);
        self.invoke(table, action);
        loop {
            let next = self
                .pending
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .pop_front();
            match next {
                Some((table, action)) => self.invoke(&table, action),
                None => break,
            }
        }
    }

    fn invoke(&self, table: &TableId, action: ChangeAction) {
        let outcome = catch_unwind(AssertUnwindSafe(|| self.listener.on_change(table, action)));
        if let Err(payload) = outcome {
            tracing::warn!(
                target: "tableflow",
                listener = self.id,
                %table,
                %action,
                panic = panic_message(payload.as_ref()),
                "table change listener panicked"
            );
        }
    }
}

/// Marks a slot as delivering on the current thread until dropped.
struct DeliveryMarker(u64);

impl DeliveryMarker {
    fn enter(id: u64) -> Self {
        DELIVERING.with(|ids| ids.borrow_mut().push(id));
        Self(id)
    }
}

impl Drop for DeliveryMarker {
    fn drop(&mut self) {
        DELIVERING.with(|ids| ids.borrow_mut().retain(|id| *id != self.0));
    }
}

#[derive(Default)]
struct Bucket {
    slots: Mutex<Vec<Arc<ListenerSlot>>>,
}

impl Bucket {
    fn slots(&self) -> MutexGuard<'_, Vec<Arc<ListenerSlot>>> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Process-wide table → listeners registry, shared through `Arc`.
#[derive(Default)]
pub struct ChangeRegister {
    tables: RwLock<HashMap<TableId, Arc<Bucket>>>,
    next_id: AtomicU64,
}

impl ChangeRegister {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Subscribe `listener` to every table in `tables`.
    ///
    /// The listener stays registered until the returned handle is
    /// unsubscribed or dropped.
    pub fn subscribe(
        self: &Arc<Self>,
        tables: impl IntoIterator<Item = TableId>,
        listener: Arc<dyn TableChangeListener>,
    ) -> RegisteredListener {
        let tables: BTreeSet<TableId> = tables.into_iter().collect();
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let slot = Arc::new(ListenerSlot {
            id,
            listener,
            delivery: Mutex::new(()),
            pending: Mutex::new(VecDeque::new()),
        });

        for table in &tables {
            self.insert_slot(table, &slot);
        }

        tracing::debug!(
            target: "tableflow",
            listener = id,
            tables = ?tables,
            "listener subscribed"
        );

        RegisteredListener {
            register: Arc::downgrade(self),
            id,
            tables: tables.into_iter().collect(),
            active: AtomicBool::new(true),
        }
    }

    fn insert_slot(&self, table: &TableId, slot: &Arc<ListenerSlot>) {
        {
            let map = self.read_map();
            if let Some(bucket) = map.get(table) {
                // Pushed while the read lock is held: bucket removal needs the
                // write lock, so this bucket cannot be dropped underneath us.
                bucket.slots().push(Arc::clone(slot));
                return;
            }
        }

        let mut map = self.write_map();
        map.entry(table.clone())
            .or_default()
            .slots()
            .push(Arc::clone(slot));
    }

    fn remove_listener(&self, id: u64, tables: &[TableId]) {
        for table in tables {
            let now_empty = {
                let map = self.read_map();
                let Some(bucket) = map.get(table) else {
                    continue;
                };
                let mut slots = bucket.slots();
                slots.retain(|slot| slot.id != id);
                slots.is_empty()
            };

            if now_empty {
                let mut map = self.write_map();
                let still_empty = map
                    .get(table)
                    .is_some_and(|bucket| bucket.slots().is_empty());
                if still_empty {
                    map.remove(table);
                }
            }
        }

        tracing::debug!(target: "tableflow", listener = id, "listener unsubscribed");
    }

    /// Deliver a change on `table` to every current listener of it.
    ///
    /// Returns the number of listeners reached. A listener that is already
    /// running on this thread has the event queued rather than invoked
    /// recursively.
    pub fn notify(&self, table: &TableId, action: ChangeAction) -> usize {
        let bucket = match self.read_map().get(table) {
            Some(bucket) => Arc::clone(bucket),
            None => {
                tracing::trace!(target: "tableflow", %table, %action, "no listeners");
                return 0;
            }
        };
        let snapshot: Vec<Arc<ListenerSlot>> = bucket.slots().clone();

        tracing::trace!(
            target: "tableflow",
            %table,
            %action,
            listeners = snapshot.len(),
            "notifying listeners"
        );

        for slot in &snapshot {
            slot.deliver(table, action);
        }
        snapshot.len()
    }

    /// [`notify`](Self::notify) for each table; returns the total invocations.
    pub fn notify_all<'a>(
        &self,
        tables: impl IntoIterator<Item = &'a TableId>,
        action: ChangeAction,
    ) -> usize {
        tables
            .into_iter()
            .map(|table| self.notify(table, action))
            .sum()
    }

    /// Number of tables with at least one listener.
    pub fn table_count(&self) -> usize {
        self.read_map().len()
    }

    /// Number of listeners subscribed to `table`.
    pub fn listener_count(&self, table: &TableId) -> usize {
        self.read_map()
            .get(table)
            .map_or(0, |bucket| bucket.slots().len())
    }

    pub fn is_subscribed(&self, table: &TableId) -> bool {
        self.listener_count(table) > 0
    }

    fn read_map(&self) -> std::sync::RwLockReadGuard<'_, HashMap<TableId, Arc<Bucket>>> {
        self.tables.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_map(&self) -> std::sync::RwLockWriteGuard<'_, HashMap<TableId, Arc<Bucket>>> {
        self.tables.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl fmt::Debug for ChangeRegister {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChangeRegister")
            .field("tables", &self.table_count())
            .finish()
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s
    } else {
        "<non-string panic>"
    }
}

/// Handle for a subscription made with [`ChangeRegister::subscribe`].
///
/// Dropping the handle unsubscribes.
#[must_use = "dropping the handle unsubscribes the listener"]
pub struct RegisteredListener {
    register: Weak<ChangeRegister>,
    id: u64,
    tables: Vec<TableId>,
    active: AtomicBool,
}

impl RegisteredListener {
    /// Remove the listener from every table. Safe to call more than once.
    pub fn unsubscribe(&self) {
        if !self.active.swap(false, Ordering::AcqRel) {
            return;
        }
        if let Some(register) = self.register.upgrade() {
            register.remove_listener(self.id, &self.tables);
        }
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    /// Tables this listener was subscribed to.
    pub fn tables(&self) -> &[TableId] {
        &self.tables
    }
}

impl fmt::Debug for RegisteredListener {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisteredListener")
            .field("id", &self.id)
            .field("tables", &self.tables)
            .field("active", &self.is_active())
            .finish()
    }
}

impl Drop for RegisteredListener {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}
