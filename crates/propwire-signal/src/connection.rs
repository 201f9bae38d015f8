#![forbid(unsafe_code)]

//! Connection tokens into a [`Signal`](crate::Signal).
//!
//! A [`Connection`] names one subscriber entry of one signal. It does not
//! keep the signal alive: it holds a type-erased `Weak` reference to the
//! signal's slot table, so every operation on a token whose signal has been
//! dropped (or whose entry has been removed) is a silent no-op.
//!
//! # Guards
//!
//! - [`ScopedConnection`] disconnects its entry when dropped.
//! - [`ConnectionBlocker`] blocks its entry for as long as it lives and then
//!   restores the previous block state.

use std::any::Any;
use std::cell::RefCell;
use std::fmt;
use std::rc::Weak;

/// Slot bookkeeping shared by every `Signal<T>`, independent of `T`.
pub(crate) trait SlotTable {
    /// Detach the slot and hand its callback back so the caller can drop it
    /// outside the table borrow.
    fn remove_slot(&mut self, id: u64) -> Option<Box<dyn Any>>;
    fn has_slot(&self, id: u64) -> bool;
    fn set_slot_blocked(&mut self, id: u64, blocked: bool) -> bool;
    fn slot_blocked(&self, id: u64) -> Option<bool>;
}

pub(crate) type TableRef = Weak<RefCell<dyn SlotTable>>;

/// Handle to a single subscriber of a signal.
///
/// Cloning a `Connection` yields another token for the **same** entry.
/// A default-constructed connection is detached: it is never connected and
/// every operation on it does nothing.
#[derive(Clone, Default)]
pub struct Connection {
    id: u64,
    table: Option<TableRef>,
}

impl Connection {
    pub(crate) fn new(id: u64, table: TableRef) -> Self {
        Self {
            id,
            table: Some(table),
        }
    }

    /// A token that refers to no subscriber.
    #[must_use]
    pub fn detached() -> Self {
        Self::default()
    }

    fn read<R>(&self, f: impl FnOnce(&(dyn SlotTable + 'static)) -> R) -> Option<R> {
        let table = self.table.as_ref()?.upgrade()?;
        let out = f(&*table.borrow());
        Some(out)
    }

    fn write<R>(&self, f: impl FnOnce(&mut (dyn SlotTable + 'static)) -> R) -> Option<R> {
        let table = self.table.as_ref()?.upgrade()?;
        let out = f(&mut *table.borrow_mut());
        Some(out)
    }

    /// Whether the entry is still registered with a live signal.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.read(|table| table.has_slot(self.id)).unwrap_or(false)
    }

    /// Remove the entry from its signal.
    ///
    /// Returns `true` if this call removed it. Calling it again, or on a
    /// token whose signal is gone, returns `false` and changes nothing.
    pub fn disconnect(&self) -> bool {
        let removed = self.write(|table| table.remove_slot(self.id)).flatten();
        removed.is_some()
    }

    /// Stop delivery to this entry without removing it.
    pub fn block(&self) {
        self.write(|table| table.set_slot_blocked(self.id, true));
    }

    /// Resume delivery to this entry.
    pub fn unblock(&self) {
        self.write(|table| table.set_slot_blocked(self.id, false));
    }

    /// Whether delivery to this entry is currently suppressed.
    ///
    /// A disconnected entry reports `false`.
    #[must_use]
    pub fn is_blocked(&self) -> bool {
        self.read(|table| table.slot_blocked(self.id)).flatten().unwrap_or(false)
    }

    /// Block this entry until the returned guard is dropped.
    pub fn blocker(&self) -> ConnectionBlocker {
        ConnectionBlocker::new(self.clone())
    }

    /// Convert into a guard that disconnects on drop.
    pub fn scoped(self) -> ScopedConnection {
        ScopedConnection {
            connection: Some(self),
        }
    }

    /// Whether this token was issued by the slot table at `table`.
    pub(crate) fn belongs_to<U: ?Sized>(&self, table: *const U) -> bool {
        self.table
            .as_ref()
            .is_some_and(|weak| std::ptr::addr_eq(weak.as_ptr(), table))
    }
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("id", &self.id)
            .field("connected", &self.is_connected())
            .field("blocked", &self.is_blocked())
            .finish()
    }
}

/// RAII guard that disconnects its entry when dropped.
///
/// Use [`release`](Self::release) to keep the subscription alive past the
/// guard.
#[must_use = "dropping a ScopedConnection disconnects it immediately"]
pub struct ScopedConnection {
    connection: Option<Connection>,
}

impl ScopedConnection {
    /// Borrow the underlying token.
    #[must_use]
    pub fn connection(&self) -> Option<&Connection> {
        self.connection.as_ref()
    }

    /// Whether the guarded entry is still registered.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.connection
            .as_ref()
            .is_some_and(Connection::is_connected)
    }

    /// Give up the guard without disconnecting.
    pub fn release(mut self) -> Connection {
        self.connection.take().unwrap_or_default()
    }
}

impl From<Connection> for ScopedConnection {
    fn from(connection: Connection) -> Self {
        connection.scoped()
    }
}

impl Drop for ScopedConnection {
    fn drop(&mut self) {
        if let Some(connection) = self.connection.take() {
            connection.disconnect();
        }
    }
}

impl fmt::Debug for ScopedConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScopedConnection")
            .field("connection", &self.connection)
            .finish()
    }
}

/// RAII guard that blocks an entry for its lifetime.
///
/// On drop the entry is unblocked only if it was unblocked when the guard
/// was created, so guards nest.
#[must_use = "dropping a ConnectionBlocker unblocks immediately"]
pub struct ConnectionBlocker {
    connection: Connection,
    was_blocked: bool,
}

impl ConnectionBlocker {
    fn new(connection: Connection) -> Self {
        let was_blocked = connection.is_blocked();
        connection.block();
        Self {
            connection,
            was_blocked,
        }
    }
}

impl Drop for ConnectionBlocker {
    fn drop(&mut self) {
        if !self.was_blocked {
            self.connection.unblock();
        }
    }
}

impl fmt::Debug for ConnectionBlocker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionBlocker")
            .field("connection", &self.connection)
            .field("was_blocked", &self.was_blocked)
            .finish()
    }
}
