#![forbid(unsafe_code)]

//! Ordered multicast signal with blockable subscribers.
//!
//! # Design
//!
//! [`Signal<T>`] keeps its subscribers in an `Rc<RefCell<..>>` slot table,
//! ordered by a monotonically increasing slot id. Each slot carries a
//! callback and a `blocked` flag. [`Connection`] tokens refer back to the
//! table through a type-erased `Weak`, so a token never keeps a signal alive.
//!
//! # Dispatch
//!
//! [`emit`](Signal::emit) snapshots the slot list, releases the borrow, and
//! then calls each slot in subscription order. Before each call the slot is
//! looked up again, so a slot disconnected or blocked by an earlier callback
//! in the same dispatch is skipped. Slots connected during a dispatch only
//! receive later dispatches.
//!
//! # Performance
//!
//! | Operation       | Complexity                 |
//! |-----------------|----------------------------|
//! | `connect()`     | O(1) amortized             |
//! | `disconnect()`  | O(log S + S) (remove)      |
//! | `emit()`        | O(S log S), S = subscribers|
//! | `slot_count()`  | O(1)                       |
//!
//! # Failure Modes
//!
//! - **Panicking subscriber**: the panic is not caught; remaining slots of
//!   that dispatch are not called.

use std::any::Any;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::connection::{Connection, ScopedConnection, SlotTable, TableRef};

type Callback<T> = Rc<dyn Fn(&T)>;
type ExtendedCallback<T> = Rc<dyn Fn(&Connection, &T)>;

enum SlotFn<T> {
    Plain(Callback<T>),
    /// Receives its own connection as the first argument.
    Extended(ExtendedCallback<T>),
}

// Manual Clone: `T` itself need not be Clone.
impl<T> Clone for SlotFn<T> {
    fn clone(&self) -> Self {
        match self {
            Self::Plain(f) => Self::Plain(Rc::clone(f)),
            Self::Extended(f) => Self::Extended(Rc::clone(f)),
        }
    }
}

struct Slot<T> {
    id: u64,
    callback: SlotFn<T>,
    blocked: bool,
}

/// Shared interior for [`Signal<T>`].
struct SignalInner<T> {
    /// Sorted by `id`; new slots are always appended with a fresh, larger id.
    slots: Vec<Slot<T>>,
    next_id: u64,
    /// Whole-signal block; suppresses every dispatch.
    blocked: bool,
}

impl<T> SignalInner<T> {
    fn position(&self, id: u64) -> Option<usize> {
        self.slots.binary_search_by_key(&id, |slot| slot.id).ok()
    }

    fn push(&mut self, callback: SlotFn<T>) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        self.slots.push(Slot {
            id,
            callback,
            blocked: false,
        });
        id
    }

    fn is_ready(&self, id: u64) -> bool {
        !self.blocked
            && self
                .position(id)
                .is_some_and(|index| !self.slots[index].blocked)
    }
}

impl<T: 'static> SlotTable for SignalInner<T> {
    fn remove_slot(&mut self, id: u64) -> Option<Box<dyn Any>> {
        let index = self.position(id)?;
        let slot = self.slots.remove(index);
        Some(Box::new(slot.callback))
    }

    fn has_slot(&self, id: u64) -> bool {
        self.position(id).is_some()
    }

    fn set_slot_blocked(&mut self, id: u64, blocked: bool) -> bool {
        match self.position(id) {
            Some(index) => {
                self.slots[index].blocked = blocked;
                true
            }
            None => false,
        }
    }

    fn slot_blocked(&self, id: u64) -> Option<bool> {
        self.position(id).map(|index| self.slots[index].blocked)
    }
}

/// An ordered, synchronous multicast channel.
///
/// A `Signal` owns its slot table; it is not `Clone`. Hand out a
/// [`SignalHandle`] to let other code subscribe without being able to emit.
///
/// # Invariants
///
/// 1. Subscribers are called in subscription order.
/// 2. A blocked subscriber is skipped but stays registered.
/// 3. A disconnected subscriber is never called again.
/// 4. `slot_count()` counts blocked and unblocked subscribers alike.
pub struct Signal<T> {
    inner: Rc<RefCell<SignalInner<T>>>,
}

impl<T> fmt::Debug for Signal<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("Signal")
            .field("slot_count", &inner.slots.len())
            .field("blocked", &inner.blocked)
            .finish()
    }
}

impl<T: 'static> Default for Signal<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: 'static> Signal<T> {
    /// Create a signal with no subscribers.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Rc::new(RefCell::new(SignalInner {
                slots: Vec::new(),
                next_id: 0,
                blocked: false,
            })),
        }
    }

    fn table(&self) -> TableRef {
        Rc::downgrade(&self.inner) as TableRef
    }

    fn register(&self, callback: SlotFn<T>) -> Connection {
        let id = self.inner.borrow_mut().push(callback);
        Connection::new(id, self.table())
    }

    /// Subscribe `callback`. It is called with every emitted value.
    pub fn connect(&self, callback: impl Fn(&T) + 'static) -> Connection {
        self.register(SlotFn::Plain(Rc::new(callback)))
    }

    /// Subscribe a callback that also receives its own [`Connection`], so it
    /// can block or disconnect itself from inside the call.
    pub fn connect_extended(&self, callback: impl Fn(&Connection, &T) + 'static) -> Connection {
        self.register(SlotFn::Extended(Rc::new(callback)))
    }

    /// Subscribe `callback` for as long as the returned guard lives.
    pub fn connect_scoped(&self, callback: impl Fn(&T) + 'static) -> ScopedConnection {
        self.connect(callback).scoped()
    }

    /// Remove the subscriber behind `connection`.
    ///
    /// Returns `false` if the token is stale or belongs to another signal.
    pub fn disconnect(&self, connection: &Connection) -> bool {
        if !connection.belongs_to(Rc::as_ptr(&self.inner)) {
            return false;
        }
        connection.disconnect()
    }

    /// Remove every subscriber. Outstanding tokens become disconnected.
    pub fn disconnect_all(&self) {
        // Drop callbacks after the borrow ends; their captures may touch this signal.
        let slots = std::mem::take(&mut self.inner.borrow_mut().slots);
        drop(slots);
    }

    /// Number of registered subscribers, blocked or not.
    #[must_use]
    pub fn slot_count(&self) -> usize {
        self.inner.borrow().slots.len()
    }

    /// Suppress every dispatch until [`unblock`](Self::unblock).
    pub fn block(&self) {
        self.inner.borrow_mut().blocked = true;
    }

    /// Resume dispatching.
    pub fn unblock(&self) {
        self.inner.borrow_mut().blocked = false;
    }

    /// Whether the whole signal is blocked.
    #[must_use]
    pub fn is_blocked(&self) -> bool {
        self.inner.borrow().blocked
    }

    /// Subscribe-only view of this signal.
    #[must_use]
    pub fn handle(&self) -> SignalHandle<'_, T> {
        SignalHandle { signal: self }
    }

    /// Call every unblocked subscriber with `value`, in subscription order.
    pub fn emit(&self, value: &T) {
        // Snapshot so callbacks may connect, disconnect or block freely.
        let snapshot: Vec<(u64, SlotFn<T>)> = {
            let inner = self.inner.borrow();
            if inner.blocked || inner.slots.is_empty() {
                return;
            }
            inner
                .slots
                .iter()
                .map(|slot| (slot.id, slot.callback.clone()))
                .collect()
        };

        for (id, callback) in snapshot {
            if !self.inner.borrow().is_ready(id) {
                continue;
            }
            match callback {
                SlotFn::Plain(f) => f(value),
                SlotFn::Extended(f) => f(&Connection::new(id, self.table()), value),
            }
        }
    }
}

/// A borrowed, subscribe-only view of a [`Signal`].
///
/// Whoever owns the `Signal` keeps the right to [`emit`](Signal::emit);
/// holders of a `SignalHandle` can only manage subscriptions.
pub struct SignalHandle<'a, T> {
    signal: &'a Signal<T>,
}

impl<T> Clone for SignalHandle<'_, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for SignalHandle<'_, T> {}

impl<T> fmt::Debug for SignalHandle<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("SignalHandle").field(self.signal).finish()
    }
}

impl<T: 'static> SignalHandle<'_, T> {
    /// See [`Signal::connect`].
    pub fn connect(&self, callback: impl Fn(&T) + 'static) -> Connection {
        self.signal.connect(callback)
    }

    /// See [`Signal::connect_extended`].
    pub fn connect_extended(&self, callback: impl Fn(&Connection, &T) + 'static) -> Connection {
        self.signal.connect_extended(callback)
    }

    /// See [`Signal::connect_scoped`].
    pub fn connect_scoped(&self, callback: impl Fn(&T) + 'static) -> ScopedConnection {
        self.signal.connect_scoped(callback)
    }

    /// See [`Signal::disconnect`].
    pub fn disconnect(&self, connection: &Connection) -> bool {
        self.signal.disconnect(connection)
    }

    /// See [`Signal::disconnect_all`].
    pub fn disconnect_all(&self) {
        self.signal.disconnect_all();
    }

    /// See [`Signal::slot_count`].
    #[must_use]
    pub fn slot_count(&self) -> usize {
        self.signal.slot_count()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
