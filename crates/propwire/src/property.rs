#![forbid(unsafe_code)]

//! Mutable property views.
//!
//! | View                     | Read | Write | Bind as target | Bind as source |
//! |--------------------------|------|-------|----------------|----------------|
//! | [`Property`]             | yes  | yes   | yes            | yes            |
//! | [`RestrictedProperty`]   | yes  | yes   | yes            | yes            |
//! | [`ReadOnlyProperty`]     | yes  | no    | no             | yes            |
//!
//! `Property` is the public read/write variant. `RestrictedProperty` is the
//! owner's half of an owner-only property: the owner keeps it in a private
//! field and hands out [`RestrictedProperty::reader`], so Rust's own
//! visibility rules decide who may write.
//!
//! Every view is a cheap `Rc` handle; cloning shares the same value,
//! signal and binding slot.

use std::fmt;
use std::rc::Rc;

use propwire_signal::SignalHandle;

use crate::access::AccessMode;
use crate::binding::{self, BindingHandle, BindingSource};
use crate::cell::{PropertyCell, Storage};
use crate::error::{PropertyError, Result};

/// Read API shared by all three views.
macro_rules! read_api {
    () => {
        /// Current value. Backed properties call the owner getter each time.
        #[must_use]
        pub fn get(&self) -> T {
            self.cell.get()
        }

        /// Borrow the current value without cloning (stored properties).
        pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
            self.cell.with(f)
        }

        /// Change notifications: fired once per accepted write with the
        /// value as read back after the write.
        #[must_use]
        pub fn changed(&self) -> SignalHandle<'_, T> {
            self.cell.changed()
        }

        /// Name given with `named`, if any.
        #[must_use]
        pub fn name(&self) -> Option<&'static str> {
            self.cell.name()
        }

        /// How this property stores its value and who may write it.
        #[must_use]
        pub fn access_mode(&self) -> AccessMode {
            self.cell.access_mode()
        }
    };
}

/// Write and bind API shared by [`Property`] and [`RestrictedProperty`].
macro_rules! write_api {
    () => {
        /// Attach a name used in logs, errors and `Debug` output.
        #[must_use]
        pub fn named(self, name: &'static str) -> Self {
            self.cell.set_name(name);
            self
        }

        /// Write `value`. Returns `false` and changes nothing if the
        /// validator or setter rejects it; otherwise notifies subscribers.
        pub fn set(&self, value: T) -> bool {
            self.cell.set(value)
        }

        /// Like [`set`](Self::set), reporting rejection as an error.
        pub fn try_set(&self, value: T) -> Result<()> {
            if self.cell.set(value) {
                Ok(())
            } else {
                Err(PropertyError::Rejected {
                    property: self.cell.label(),
                })
            }
        }

        /// Modify a copy of the current value and write it back.
        pub fn update(&self, f: impl FnOnce(&mut T)) -> bool {
            let mut next = self.cell.get();
            f(&mut next);
            self.cell.set(next)
        }

        /// Track `source`, converting with `From`. Replaces any existing
        /// binding and syncs immediately.
        pub fn bind<S, Src>(&self, source: &Src) -> BindingHandle
        where
            S: Clone + 'static,
            T: From<S>,
            Src: BindingSource<S> + ?Sized,
        {
            binding::establish(&self.cell, source, |value: &S| T::from(value.clone()))
        }

        /// Track `source` through `converter`. Replaces any existing binding
        /// and syncs immediately.
        pub fn bind_with<S, Src>(
            &self,
            source: &Src,
            converter: impl Fn(&S) -> T + 'static,
        ) -> BindingHandle
        where
            S: 'static,
            Src: BindingSource<S> + ?Sized,
        {
            binding::establish(&self.cell, source, converter)
        }

        /// Drop the inbound binding. The current value is kept.
        pub fn unbind(&self) {
            binding::release(&self.cell);
        }

        /// The inbound binding, if one was established and not unbound.
        #[must_use]
        pub fn binding(&self) -> Option<BindingHandle> {
            self.cell.binding()
        }
    };
}

macro_rules! source_impl {
    ($view:ident) => {
        impl<T: Clone + 'static> BindingSource<T> for $view<T> {
            fn current(&self) -> T {
                self.cell.get()
            }

            fn change_signal(&self) -> Option<SignalHandle<'_, T>> {
                Some(self.cell.changed())
            }

            fn source_name(&self) -> &'static str {
                self.cell.label()
            }
        }

        impl<T> Clone for $view<T> {
            fn clone(&self) -> Self {
                Self {
                    cell: Rc::clone(&self.cell),
                }
            }
        }

        impl<T: fmt::Debug + Clone + 'static> fmt::Debug for $view<T> {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.debug_tuple(stringify!($view)).field(&*self.cell).finish()
            }
        }
    };
}

// ---------------------------------------------------------------------------
// Property
// ---------------------------------------------------------------------------

/// A publicly readable and writable property.
///
/// # Example
///
/// ```
/// use propwire::Property;
///
/// let age = Property::validated(8, |current: &mut u32, candidate: &u32| {
///     let ok = *candidate < 10;
///     if ok {
///         *current = *candidate;
///     }
///     ok
/// });
/// assert!(age.set(9));
/// assert!(!age.set(12));
/// assert_eq!(age.get(), 9);
/// ```
pub struct Property<T> {
    cell: Rc<PropertyCell<T>>,
}

impl<T: Clone + 'static> Property<T> {
    /// Stored property that accepts every write.
    #[must_use]
    pub fn new(value: T) -> Self {
        Self::from_storage(Storage::stored(value, None))
    }

    /// Stored property guarded by `validator(current, candidate)`.
    ///
    /// The validator decides whether to accept and is responsible for
    /// writing `current` itself, so it may store a clamped or otherwise
    /// transformed value.
    #[must_use]
    pub fn validated(value: T, validator: impl Fn(&mut T, &T) -> bool + 'static) -> Self {
        Self::from_storage(Storage::stored(value, Some(Box::new(validator))))
    }

    /// Property with no local value: reads call `getter`, writes call
    /// `setter`.
    #[must_use]
    pub fn backed(
        getter: impl Fn() -> T + 'static,
        setter: impl Fn(&T) -> bool + 'static,
    ) -> Self {
        Self::from_storage(Storage::backed(Box::new(getter), Box::new(setter)))
    }

    fn from_storage(storage: Storage<T>) -> Self {
        Self {
            cell: PropertyCell::new(storage, false),
        }
    }

    read_api!();
    write_api!();
}

impl<T: Clone + Default + 'static> Default for Property<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

source_impl!(Property);

// ---------------------------------------------------------------------------
// RestrictedProperty
// ---------------------------------------------------------------------------

/// The owner's view of an owner-only property.
///
/// Keep it in a private field and expose [`reader`](Self::reader) instead.
///
/// ```
/// use propwire::{ReadOnlyProperty, RestrictedProperty};
///
/// pub struct Greeter {
///     greeting: RestrictedProperty<String>,
/// }
///
/// impl Greeter {
///     pub fn greeting(&self) -> ReadOnlyProperty<String> {
///         self.greeting.reader()
///     }
///
///     pub fn init(&self) {
///         self.greeting.set("Hello".to_string());
///     }
/// }
///
/// let g = Greeter { greeting: RestrictedProperty::new(String::new()) };
/// g.init();
/// assert_eq!(g.greeting().get(), "Hello");
/// ```
pub struct RestrictedProperty<T> {
    cell: Rc<PropertyCell<T>>,
}

impl<T: Clone + 'static> RestrictedProperty<T> {
    /// Stored owner-only property that accepts every owner write.
    #[must_use]
    pub fn new(value: T) -> Self {
        Self::from_storage(Storage::stored(value, None))
    }

    /// Stored owner-only property guarded by `validator(current, candidate)`.
    #[must_use]
    pub fn validated(value: T, validator: impl Fn(&mut T, &T) -> bool + 'static) -> Self {
        Self::from_storage(Storage::stored(value, Some(Box::new(validator))))
    }

    /// Owner-only property delegating to owner accessors.
    #[must_use]
    pub fn backed(
        getter: impl Fn() -> T + 'static,
        setter: impl Fn(&T) -> bool + 'static,
    ) -> Self {
        Self::from_storage(Storage::backed(Box::new(getter), Box::new(setter)))
    }

    fn from_storage(storage: Storage<T>) -> Self {
        Self {
            cell: PropertyCell::new(storage, true),
        }
    }

    /// Public, read-only view over the same property.
    #[must_use]
    pub fn reader(&self) -> ReadOnlyProperty<T> {
        ReadOnlyProperty {
            cell: Rc::clone(&self.cell),
        }
    }

    read_api!();
    write_api!();
}

impl<T: Clone + Default + 'static> Default for RestrictedProperty<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

source_impl!(RestrictedProperty);

// ---------------------------------------------------------------------------
// ReadOnlyProperty
// ---------------------------------------------------------------------------

/// Public view of an owner-only property: read, subscribe, bind from.
pub struct ReadOnlyProperty<T> {
    cell: Rc<PropertyCell<T>>,
}

impl<T: Clone + 'static> ReadOnlyProperty<T> {
    read_api!();

    /// Whether this view and `other` observe the same property.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.cell, &other.cell)
    }

    /// Whether the owner has bound the property to a live source.
    #[must_use]
    pub fn is_bound(&self) -> bool {
        self.cell.binding().is_some_and(|handle| handle.is_active())
    }
}

source_impl!(ReadOnlyProperty);

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::{Cell, RefCell};

    fn counter<T: Clone + 'static>(changed: SignalHandle<'_, T>) -> Rc<Cell<u32>> {
        let count = Rc::new(Cell::new(0u32));
        let count_clone = Rc::clone(&count);
        let _ = changed.connect(move |_| count_clone.set(count_clone.get() + 1));
        count
    }

    fn under_ten(current: &mut i32, candidate: &i32) -> bool {
        let ok = *candidate < 10;
        if ok {
            *current = *candidate;
        }
        ok
    }

    #[test]
    fn default_setter_has_no_validation() {
        let prop = Property::new(0);
        assert!(prop.set(5));
        assert_eq!(prop.get(), 5);
    }

    #[test]
    fn custom_validator_rejects() {
        let prop = Property::validated(0, under_ten);
        assert!(prop.set(8));
        assert!(!prop.set(12));
        assert_eq!(prop.get(), 8);
    }

    #[test]
    fn changed_fires_only_on_accept() {
        let prop = Property::validated(0, under_ten);
        let last = Rc::new(Cell::new(0));
        let last_clone = Rc::clone(&last);
        let _conn = prop.changed().connect(move |v: &i32| last_clone.set(*v));

        prop.set(16);
        assert_eq!(last.get(), 0);
        prop.set(3);
        assert_eq!(last.get(), 3);
    }

    #[test]
    fn try_set_reports_rejection() {
        let prop = Property::validated(0, under_ten).named("level");
        assert_eq!(prop.try_set(4), Ok(()));
        assert_eq!(
            prop.try_set(40),
            Err(PropertyError::Rejected { property: "level" })
        );
        assert_eq!(prop.get(), 4);
    }

    #[test]
    fn update_acts_like_compound_assignment() {
        let prop = Property::new(16);
        let count = counter(prop.changed());

        assert!(prop.update(|v| *v += 4));
        assert_eq!(prop.get(), 20);
        assert!(prop.update(|v| *v <<= 1));
        assert_eq!(prop.get(), 40);
        assert_eq!(count.get(), 2);
    }

    #[test]
    fn update_respects_validator() {
        let prop = Property::validated(8, under_ten);
        assert!(!prop.update(|v| *v += 5));
        assert_eq!(prop.get(), 8);
    }

    #[test]
    fn backed_property_writes_through() {
        let backing = Rc::new(Cell::new('g'));
        let read = Rc::clone(&backing);
        let write = Rc::clone(&backing);
        let prop = Property::backed(
            move || read.get(),
            move |c: &char| {
                write.set(*c);
                true
            },
        );

        assert_eq!(prop.get(), 'g');
        assert!(prop.set('x'));
        assert_eq!(backing.get(), 'x');
        assert_eq!(prop.access_mode(), AccessMode::Backed);
    }

    #[test]
    fn clone_shares_state() {
        let a = Property::new(1);
        let b = a.clone();
        b.set(2);
        assert_eq!(a.get(), 2);
    }

    #[test]
    fn restricted_reader_sees_owner_writes() {
        let owner_view = RestrictedProperty::new(String::new()).named("title");
        let public_view = owner_view.reader();
        let count = counter(public_view.changed());

        owner_view.set("Hello".to_string());
        assert_eq!(public_view.get(), "Hello");
        assert_eq!(public_view.with(String::len), 5);
        assert_eq!(count.get(), 1);
        assert_eq!(public_view.access_mode(), AccessMode::StoredRestricted);
        assert_eq!(public_view.name(), Some("title"));
    }

    #[test]
    fn restricted_backed_is_reported_as_backed() {
        let store = Rc::new(RefCell::new(String::from("World")));
        let read = Rc::clone(&store);
        let write = Rc::clone(&store);
        let prop = RestrictedProperty::backed(
            move || read.borrow().clone(),
            move |s: &String| {
                *write.borrow_mut() = s.clone();
                true
            },
        );
        assert_eq!(prop.access_mode(), AccessMode::Backed);
        assert_eq!(prop.reader().get(), "World");
    }

    #[test]
    fn bind_without_converter_uses_from() {
        let source = Property::new('a');
        let target: Property<u32> = Property::new(0);

        let handle = target.bind(&source);
        assert_eq!(target.get(), 97);
        source.set('e');
        assert_eq!(target.get(), 101);
        assert!(handle.is_active());
    }

    #[test]
    fn bind_replaces_previous_binding() {
        let first = Property::new(1);
        let second = Property::new(2);
        let target = Property::new(0);

        let old = target.bind(&first);
        let new = target.bind(&second);
        assert!(!old.is_active());
        assert!(new.is_active());
        assert!(target.binding().is_some_and(|h| h.ptr_eq(&new)));

        first.set(10);
        assert_eq!(target.get(), 2);
        second.set(20);
        assert_eq!(target.get(), 20);
    }

    #[test]
    fn unbind_keeps_last_value() {
        let source = Property::new(5);
        let target = Property::new(0);
        let handle = target.bind(&source);

        target.unbind();
        assert!(!handle.is_active());
        assert!(target.binding().is_none());
        source.set(6);
        assert_eq!(target.get(), 5);

        // Unbinding an unbound property is harmless.
        target.unbind();
    }

    #[test]
    fn reader_can_be_a_binding_source() {
        let owned = RestrictedProperty::new(String::from("Hello"));
        let target = Property::new(0i32);

        let _handle = target.bind_with(&owned.reader(), |s: &String| {
            s.chars().next().map_or(0, |c| c as i32)
        });
        assert_eq!(target.get(), 72);
        owned.set("world".to_string());
        assert_eq!(target.get(), 119);
    }

    #[test]
    fn owner_can_bind_restricted_property() {
        let source = Property::new(3);
        let owned = RestrictedProperty::new(0);
        let reader = owned.reader();

        let _handle = owned.bind(&source);
        assert!(reader.is_bound());
        source.set(4);
        assert_eq!(reader.get(), 4);

        owned.unbind();
        assert!(!reader.is_bound());
    }

    #[test]
    fn debug_format() {
        let prop = Property::new(42).named("answer");
        let dbg = format!("{prop:?}");
        assert!(dbg.contains("Property"));
        assert!(dbg.contains("answer"));
        assert!(dbg.contains("42"));
    }

    #[test]
    fn default_uses_value_default() {
        let prop: Property<String> = Property::default();
        assert_eq!(prop.get(), "");
        assert_eq!(prop.access_mode(), AccessMode::StoredPublic);
    }
}
