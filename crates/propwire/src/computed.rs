#![forbid(unsafe_code)]

//! Read-only properties whose value is computed on every read.
//!
//! A [`ComputedProperty`] has no backing value and no write path. It also
//! has no change signal: nothing tells it when its inputs move. Binding a
//! target to it therefore copies the value once and yields an inactive
//! [`BindingHandle`](crate::BindingHandle).
//!
//! | Operation      | Cost                      |
//! |----------------|---------------------------|
//! | `get()`        | one call to the closure   |
//! | `clone()`      | `Rc` increment            |

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

use propwire_signal::SignalHandle;

use crate::access::AccessMode;
use crate::binding::BindingSource;
use crate::cell::UNNAMED;

struct ComputedInner<T> {
    compute: Box<dyn Fn() -> T>,
    name: Cell<Option<&'static str>>,
}

/// A property backed by an owner-supplied function.
///
/// ```
/// use std::cell::Cell;
/// use std::rc::Rc;
/// use propwire::ComputedProperty;
///
/// let state = Rc::new(Cell::new(4));
/// let state_clone = Rc::clone(&state);
/// let full = ComputedProperty::new(move || state_clone.get() + 3);
///
/// assert_eq!(full.get(), 7);
/// state.set(10);
/// assert_eq!(full.get(), 13);
/// ```
pub struct ComputedProperty<T> {
    inner: Rc<ComputedInner<T>>,
}

impl<T: 'static> ComputedProperty<T> {
    /// Wrap `compute`. It runs on every [`get`](Self::get).
    #[must_use]
    pub fn new(compute: impl Fn() -> T + 'static) -> Self {
        Self {
            inner: Rc::new(ComputedInner {
                compute: Box::new(compute),
                name: Cell::new(None),
            }),
        }
    }

    /// Attach a name used in logs and `Debug` output.
    #[must_use]
    pub fn named(self, name: &'static str) -> Self {
        self.inner.name.set(Some(name));
        self
    }

    /// Name given with `named`, if any.
    #[must_use]
    pub fn name(&self) -> Option<&'static str> {
        self.inner.name.get()
    }

    /// Evaluate the function.
    #[must_use]
    pub fn get(&self) -> T {
        (self.inner.compute)()
    }

    /// Always [`AccessMode::Computed`].
    #[must_use]
    pub fn access_mode(&self) -> AccessMode {
        AccessMode::Computed
    }
}

impl<T: 'static> BindingSource<T> for ComputedProperty<T> {
    fn current(&self) -> T {
        self.get()
    }

    fn change_signal(&self) -> Option<SignalHandle<'_, T>> {
        None
    }

    fn source_name(&self) -> &'static str {
        self.inner.name.get().unwrap_or(UNNAMED)
    }
}

impl<T> Clone for ComputedProperty<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: fmt::Debug + 'static> fmt::Debug for ComputedProperty<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComputedProperty")
            .field("name", &self.source_name())
            .field("value", &self.get())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Property;

    #[test]
    fn recomputes_on_every_read() {
        let calls = Rc::new(Cell::new(0u32));
        let calls_clone = Rc::clone(&calls);
        let prop = ComputedProperty::new(move || {
            calls_clone.set(calls_clone.get() + 1);
            calls_clone.get()
        });

        assert_eq!(prop.get(), 1);
        assert_eq!(prop.get(), 2);
        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn reflects_other_properties() {
        let base = Property::new(4);
        let base_clone = base.clone();
        let full = ComputedProperty::new(move || base_clone.get() + 3).named("full");

        assert_eq!(full.get(), 7);
        base.set(10);
        assert_eq!(full.get(), 13);
        assert_eq!(full.name(), Some("full"));
        assert_eq!(full.access_mode(), AccessMode::Computed);
    }

    #[test]
    fn binding_from_computed_is_a_snapshot() {
        let state = Rc::new(Cell::new(5));
        let state_clone = Rc::clone(&state);
        let computed = ComputedProperty::new(move || state_clone.get());
        let target = Property::new(0);

        let handle = target.bind(&computed);
        assert_eq!(target.get(), 5);
        assert!(!handle.is_active());

        state.set(6);
        assert_eq!(target.get(), 5);
        // The snapshot still counts as the target's binding until replaced.
        assert!(target.binding().is_some_and(|h| h.ptr_eq(&handle)));
    }

    #[test]
    fn debug_shows_current_value() {
        let prop = ComputedProperty::new(|| 42).named("answer");
        let dbg = format!("{prop:?}");
        assert!(dbg.contains("answer"));
        assert!(dbg.contains("42"));
    }
}
