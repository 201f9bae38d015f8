#![forbid(unsafe_code)]

//! Observable properties with change signals and live bindings.
//!
//! # Role in propwire
//! `propwire` layers typed properties over [`propwire_signal`]. A property
//! is a value (or a pair of owner accessors) plus a change signal fired after
//! every accepted write. A binding makes one property track another.
//!
//! # Property variants
//!
//! | Type                   | Storage          | Writers          | Signal |
//! |------------------------|------------------|------------------|--------|
//! | [`Property`]           | stored or backed | anyone           | yes    |
//! | [`RestrictedProperty`] | stored or backed | owner only       | yes    |
//! | [`ReadOnlyProperty`]   | view of the above| nobody           | yes    |
//! | [`ComputedProperty`]   | none             | nobody           | no     |
//!
//! # Example
//!
//! ```
//! use propwire::prelude::*;
//!
//! struct Player {
//!     pub age: Property<u32>,
//!     title: RestrictedProperty<String>,
//! }
//!
//! impl Player {
//!     fn new() -> Self {
//!         Self {
//!             age: Property::new(8).named("age"),
//!             title: RestrictedProperty::new(String::new()).named("title"),
//!         }
//!     }
//!
//!     fn title(&self) -> ReadOnlyProperty<String> {
//!         self.title.reader()
//!     }
//!
//!     fn promote(&self) {
//!         self.title.set(format!("level {}", self.age.get()));
//!     }
//! }
//!
//! let player = Player::new();
//! let label = Property::new(String::new());
//! let _binding = label.bind_with(&player.age, |age: &u32| age.to_string());
//!
//! player.age.set(9);
//! player.promote();
//! assert_eq!(label.get(), "9");
//! assert_eq!(player.title().get(), "level 9");
//! ```
//!
//! # Feature flags
//! - `tracing` (default): structured `trace!`/`debug!` events for writes and
//!   binding lifecycle through the `tracing` crate.
//!
//! # Threading
//! All types are `Rc`-based and `!Send`; use them from one thread.

pub mod access;
pub mod binding;
mod cell;
pub mod computed;
pub mod error;
pub mod property;

pub use access::AccessMode;
pub use binding::{BindingHandle, BindingSource};
pub use computed::ComputedProperty;
pub use error::{PropertyError, Result};
pub use property::{Property, ReadOnlyProperty, RestrictedProperty};

pub use propwire_signal::{Connection, ConnectionBlocker, ScopedConnection, Signal, SignalHandle};

/// Everything an owner type usually needs.
pub mod prelude {
    pub use crate::{
        AccessMode, BindingHandle, BindingSource, ComputedProperty, Property, PropertyError,
        ReadOnlyProperty, RestrictedProperty,
    };
    pub use propwire_signal::{Connection, ScopedConnection, Signal};
}
