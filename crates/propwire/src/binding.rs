#![forbid(unsafe_code)]

//! Live, directed bindings between properties.
//!
//! # Design
//!
//! A binding is one edge `source → target`. Creating it:
//!
//! 1. disconnects and forgets the target's previous inbound binding,
//! 2. writes the (converted) current source value into the target,
//! 3. subscribes to the source's change signal with an extended slot.
//!
//! On every source change the slot blocks its own connection with a
//! [`ConnectionBlocker`](propwire_signal::ConnectionBlocker), converts the
//! value, writes it into the target and unblocks. The block covers one edge
//! for one call, which is enough to stop an `A ↔ B` pair from bouncing
//! forever: the echo coming back through `B → A` finds `A → B` blocked.
//!
//! # Ownership
//!
//! ```text
//!  caller ──BindingHandle──┐
//!                          ├──► Binding ──Connection (weak)──► source signal
//!  target ──BindingHandle──┘                                        │
//!    ▲                                                              │
//!    └───────────────── Weak<target> captured by the slot ◄─────────┘
//! ```
//!
//! No strong reference cycle exists. The binding is torn down when the last
//! handle drops, when the target is dropped, rebound or unbound, or when
//! [`BindingHandle::disconnect`] is called.
//!
//! # Failure Modes
//!
//! - **Target rejects the value**: nothing is retried or raised and the
//!   binding stays connected; the target keeps its previous value.
//! - **Target dropped first**: the target disconnects its inbound binding as
//!   it drops, so outstanding handles report inactive.
//! - **Cycles of three or more edges**: only the edge currently propagating
//!   is blocked, so `A → B → C → A` can keep circulating as long as every
//!   write is accepted. Break such cycles with a validator that rejects
//!   unchanged values.

use std::fmt;
use std::rc::Rc;

use propwire_signal::{Connection, SignalHandle};

#[cfg(feature = "tracing")]
use tracing::{debug, trace};

use crate::cell::PropertyCell;

/// Anything a binding can read from.
///
/// Implemented by every property view. Sources without a change signal
/// (computed properties) produce a one-shot binding: the target is synced
/// once and the returned handle is inactive from the start.
pub trait BindingSource<S> {
    /// Current value of the source.
    fn current(&self) -> S;

    /// Signal fired after every accepted write, if the source has one.
    fn change_signal(&self) -> Option<SignalHandle<'_, S>>;

    /// Name used in logs and `Debug` output.
    fn source_name(&self) -> &'static str;
}

/// One directed edge. Only reachable through [`BindingHandle`].
struct Binding {
    connection: Connection,
    source: &'static str,
    target: &'static str,
}

impl Binding {
    fn disconnect(&self) {
        if self.connection.disconnect() {
            #[cfg(feature = "tracing")]
            debug!(source = self.source, target = self.target, "binding disconnected");
        }
    }
}

impl Drop for Binding {
    fn drop(&mut self) {
        self.disconnect();
    }
}

/// Shared-ownership handle to a binding.
///
/// The target property keeps one clone; the caller gets another. The
/// binding stays live while either exists and has not been disconnected.
#[derive(Clone)]
pub struct BindingHandle {
    binding: Rc<Binding>,
}

impl BindingHandle {
    fn new(binding: Binding) -> Self {
        Self {
            binding: Rc::new(binding),
        }
    }

    /// Whether source changes still reach the target.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.binding.connection.is_connected()
    }

    /// Stop propagating. The target keeps its current value.
    ///
    /// Calling this more than once, or after the binding was replaced, does
    /// nothing.
    pub fn disconnect(&self) {
        self.binding.disconnect();
    }

    /// Name of the source property.
    #[must_use]
    pub fn source_name(&self) -> &'static str {
        self.binding.source
    }

    /// Name of the target property.
    #[must_use]
    pub fn target_name(&self) -> &'static str {
        self.binding.target
    }

    /// Whether both handles refer to the same binding.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.binding, &other.binding)
    }
}

impl fmt::Debug for BindingHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BindingHandle")
            .field("source", &self.binding.source)
            .field("target", &self.binding.target)
            .field("active", &self.is_active())
            .finish()
    }
}

/// Bind `target` to `source` through `convert`, replacing any prior binding.
pub(crate) fn establish<S, T, Src>(
    target: &Rc<PropertyCell<T>>,
    source: &Src,
    convert: impl Fn(&S) -> T + 'static,
) -> BindingHandle
where
    S: 'static,
    T: Clone + 'static,
    Src: BindingSource<S> + ?Sized,
{
    release(target);

    // Sync first so the target is consistent the moment this returns.
    target.set(convert(&source.current()));

    let connection = match source.change_signal() {
        Some(signal) => {
            let weak_target = Rc::downgrade(target);
            signal.connect_extended(move |conn, value: &S| {
                let Some(target) = weak_target.upgrade() else {
                    conn.disconnect();
                    return;
                };
                let _guard = conn.blocker();
                #[cfg_attr(not(feature = "tracing"), allow(unused_variables))]
                let accepted = target.set(convert(value));
                #[cfg(feature = "tracing")]
                if !accepted {
                    trace!(target = target.label(), "bound value rejected by target");
                }
            })
        }
        None => Connection::detached(),
    };

    let handle = BindingHandle::new(Binding {
        connection,
        source: source.source_name(),
        target: target.label(),
    });

    #[cfg(feature = "tracing")]
    debug!(
        source = handle.source_name(),
        target = handle.target_name(),
        live = handle.is_active(),
        "binding established"
    );

    // The initial sync may have re-entered and bound the target again.
    if let Some(stale) = target.replace_binding(Some(handle.clone())) {
        stale.disconnect();
    }
    handle
}

/// Disconnect and forget the target's inbound binding, if any.
pub(crate) fn release<T: Clone + 'static>(target: &PropertyCell<T>) {
    if let Some(previous) = target.replace_binding(None) {
        previous.disconnect();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::Storage;
    use std::cell::{Cell, RefCell};

    fn cell<T: Clone + 'static>(value: T) -> Rc<PropertyCell<T>> {
        PropertyCell::new(Storage::stored(value, None), false)
    }

    impl<T: Clone + 'static> BindingSource<T> for Rc<PropertyCell<T>> {
        fn current(&self) -> T {
            self.get()
        }

        fn change_signal(&self) -> Option<SignalHandle<'_, T>> {
            Some(self.changed())
        }

        fn source_name(&self) -> &'static str {
            self.label()
        }
    }

    #[test]
    fn establish_syncs_immediately() {
        let source = cell(7);
        let target = cell(0);

        let handle = establish(&target, &source, |v: &i32| *v);
        assert_eq!(target.get(), 7);
        assert!(handle.is_active());
    }

    #[test]
    fn propagates_through_converter() {
        let source = cell(1);
        let target = cell(String::new());

        let _handle = establish(&target, &source, |v: &i32| format!("#{v}"));
        source.set(42);
        assert_eq!(target.get(), "#42");
    }

    #[test]
    fn target_holds_the_binding() {
        let source = cell(1);
        let target = cell(0);

        drop(establish(&target, &source, |v: &i32| *v));
        source.set(2);
        assert_eq!(target.get(), 2);
        assert!(target.binding().is_some_and(|h| h.is_active()));
    }

    #[test]
    fn dropping_target_tears_down_binding() {
        let source = cell(1);
        let target = cell(0);
        let handle = establish(&target, &source, |v: &i32| *v);
        assert_eq!(source.changed().slot_count(), 1);

        drop(target);
        // The caller's handle outlives the target but reports it gone.
        assert!(!handle.is_active());
        assert_eq!(source.changed().slot_count(), 0);
        source.set(5);
        assert_eq!(source.get(), 5);
    }

    #[test]
    fn dropping_every_handle_disconnects() {
        let source = cell(1);
        let target = cell(0);
        drop(establish(&target, &source, |v: &i32| *v));
        assert_eq!(source.changed().slot_count(), 1);

        release(&target);
        assert_eq!(source.changed().slot_count(), 0);
        source.set(9);
        assert_eq!(target.get(), 1);
    }

    #[test]
    fn rejected_propagation_keeps_binding() {
        let source = cell(1);
        let target = PropertyCell::new(
            Storage::stored(
                0,
                Some(Box::new(|current: &mut i32, candidate: &i32| {
                    let ok = *candidate % 2 == 0;
                    if ok {
                        *current = *candidate;
                    }
                    ok
                })),
            ),
            false,
        );

        let handle = establish(&target, &source, |v: &i32| *v);
        // Initial value 1 is odd: rejected.
        assert_eq!(target.get(), 0);
        source.set(3);
        assert_eq!(target.get(), 0);
        assert!(handle.is_active());
        source.set(4);
        assert_eq!(target.get(), 4);
    }

    #[test]
    fn two_way_edges_settle() {
        let a = cell(0);
        let b = cell(0);
        let writes = Rc::new(Cell::new(0u32));
        let writes_clone = Rc::clone(&writes);
        let _probe = a
            .changed()
            .connect(move |_| writes_clone.set(writes_clone.get() + 1));

        let _ab = establish(&b, &a, |v: &i32| *v);
        let _ba = establish(&a, &b, |v: &i32| *v);
        writes.set(0);

        a.set(37);
        assert_eq!(b.get(), 37);
        assert_eq!(a.get(), 37);
        // The first write plus one echo from b → a; the echo is not
        // bounced again because a → b is blocked during its own call.
        assert_eq!(writes.get(), 2);
    }

    #[test]
    fn disconnect_is_idempotent() {
        let source = cell(1);
        let target = cell(0);
        let handle = establish(&target, &source, |v: &i32| *v);

        handle.disconnect();
        handle.disconnect();
        assert!(!handle.is_active());
        source.set(8);
        assert_eq!(target.get(), 1);
    }

    #[test]
    fn handle_debug_and_names() {
        let source = cell(1);
        source.set_name("src");
        let target = cell(0);
        target.set_name("dst");
        let handle = establish(&target, &source, |v: &i32| *v);

        assert_eq!(handle.source_name(), "src");
        assert_eq!(handle.target_name(), "dst");
        let dbg = format!("{handle:?}");
        assert!(dbg.contains("BindingHandle"));
        assert!(dbg.contains("active: true"));
    }

    #[test]
    fn rebinding_inside_initial_sync_keeps_latest() {
        let first = cell(1);
        let second = cell(2);
        let target = cell(0);
        let rebound = Rc::new(RefCell::new(None));

        let target_weak = Rc::downgrade(&target);
        let second_clone = Rc::clone(&second);
        let rebound_clone = Rc::clone(&rebound);
        let _hook = target.changed().connect(move |v: &i32| {
            if *v == 1 && rebound_clone.borrow().is_none() {
                if let Some(target) = target_weak.upgrade() {
                    let h = establish(&target, &second_clone, |v: &i32| *v);
                    *rebound_clone.borrow_mut() = Some(h);
                }
            }
        });

        let outer = establish(&target, &first, |v: &i32| *v);
        // The outer bind finished last, so it is the one that remains.
        assert!(outer.is_active());
        let inner = rebound.borrow().clone();
        assert!(inner.is_some_and(|h| !h.is_active()));
        assert!(target.binding().is_some_and(|h| h.ptr_eq(&outer)));
    }
}
