#![forbid(unsafe_code)]

//! Shared interior of every mutable property.
//!
//! [`Property`](crate::Property), [`RestrictedProperty`](crate::RestrictedProperty)
//! and [`ReadOnlyProperty`](crate::ReadOnlyProperty) are views over one
//! `Rc<PropertyCell<T>>`. The cell owns the storage, the change signal and
//! the inbound binding slot; the views only decide which of those a caller
//! can reach.
//!
//! # Write protocol
//!
//! 1. The validator (stored) or setter (backed) sees the candidate.
//! 2. Rejection leaves the value untouched and emits nothing, even if the
//!    validator scribbled on its working copy first.
//! 3. Acceptance emits the value read back through `get()`, so validators
//!    that clamp or transform are observed as they stored it.
//!
//! No `RefCell` borrow is held while the change signal runs.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use propwire_signal::{Signal, SignalHandle};

#[cfg(feature = "tracing")]
use tracing::trace;

use crate::access::AccessMode;
use crate::binding::BindingHandle;

pub(crate) type Validator<T> = Box<dyn Fn(&mut T, &T) -> bool>;
pub(crate) type Getter<T> = Box<dyn Fn() -> T>;
pub(crate) type Setter<T> = Box<dyn Fn(&T) -> bool>;

pub(crate) const UNNAMED: &str = "unnamed";

pub(crate) enum Storage<T> {
    /// Local backing value, optionally guarded by a validator that may
    /// transform the candidate before it is stored.
    Stored {
        slot: RefCell<T>,
        validator: Option<Validator<T>>,
    },
    /// Reads and writes delegate to owner accessors.
    Backed { getter: Getter<T>, setter: Setter<T> },
}

impl<T> Storage<T> {
    pub(crate) fn stored(value: T, validator: Option<Validator<T>>) -> Self {
        Self::Stored {
            slot: RefCell::new(value),
            validator,
        }
    }

    pub(crate) fn backed(getter: Getter<T>, setter: Setter<T>) -> Self {
        Self::Backed { getter, setter }
    }
}

pub(crate) struct PropertyCell<T> {
    storage: Storage<T>,
    restricted: bool,
    name: Cell<Option<&'static str>>,
    changed: Signal<T>,
    /// At most one inbound binding.
    binding: RefCell<Option<BindingHandle>>,
}

impl<T: Clone + 'static> PropertyCell<T> {
    pub(crate) fn new(storage: Storage<T>, restricted: bool) -> Rc<Self> {
        Rc::new(Self {
            storage,
            restricted,
            name: Cell::new(None),
            changed: Signal::new(),
            binding: RefCell::new(None),
        })
    }

    pub(crate) fn set_name(&self, name: &'static str) {
        self.name.set(Some(name));
    }

    pub(crate) fn name(&self) -> Option<&'static str> {
        self.name.get()
    }

    pub(crate) fn label(&self) -> &'static str {
        self.name.get().unwrap_or(UNNAMED)
    }

    pub(crate) fn access_mode(&self) -> AccessMode {
        match (&self.storage, self.restricted) {
            (Storage::Backed { .. }, _) => AccessMode::Backed,
            (Storage::Stored { .. }, false) => AccessMode::StoredPublic,
            (Storage::Stored { .. }, true) => AccessMode::StoredRestricted,
        }
    }

    pub(crate) fn get(&self) -> T {
        match &self.storage {
            Storage::Stored { slot, .. } => slot.borrow().clone(),
            Storage::Backed { getter, .. } => getter(),
        }
    }

    pub(crate) fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        match &self.storage {
            Storage::Stored { slot, .. } => f(&*slot.borrow()),
            Storage::Backed { getter, .. } => f(&getter()),
        }
    }

    /// Run the write protocol. Returns whether the value was accepted.
    ///
    /// A validator works on a copy of the current value; the copy is only
    /// committed on acceptance, and no borrow is held while it runs.
    pub(crate) fn set(&self, value: T) -> bool {
        let accepted = match &self.storage {
            Storage::Stored { slot, validator } => match validator {
                Some(validate) => {
                    let mut next = slot.borrow().clone();
                    let ok = validate(&mut next, &value);
                    if ok {
                        *slot.borrow_mut() = next;
                    }
                    ok
                }
                None => {
                    *slot.borrow_mut() = value;
                    true
                }
            },
            Storage::Backed { setter, .. } => setter(&value),
        };

        #[cfg(feature = "tracing")]
        trace!(
            property = self.label(),
            mode = self.access_mode().as_str(),
            accepted,
            "property write"
        );

        if accepted {
            let current = self.get();
            self.changed.emit(&current);
        }
        accepted
    }

    pub(crate) fn changed(&self) -> SignalHandle<'_, T> {
        self.changed.handle()
    }

    pub(crate) fn binding(&self) -> Option<BindingHandle> {
        self.binding.borrow().clone()
    }

    /// Swap the inbound binding. The previous handle is returned so the
    /// caller drops it after this borrow has ended.
    pub(crate) fn replace_binding(&self, next: Option<BindingHandle>) -> Option<BindingHandle> {
        self.binding.replace(next)
    }
}

impl<T> Drop for PropertyCell<T> {
    fn drop(&mut self) {
        if let Some(binding) = self.binding.get_mut().take() {
            binding.disconnect();
        }
    }
}

impl<T: fmt::Debug + Clone + 'static> fmt::Debug for PropertyCell<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropertyCell")
            .field("name", &self.label())
            .field("mode", &self.access_mode())
            .field("value", &self.get())
            .field("subscribers", &self.changed.slot_count())
            .field(
                "bound",
                &self.binding.borrow().as_ref().is_some_and(BindingHandle::is_active),
            )
            .finish()
    }
}
