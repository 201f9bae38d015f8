#![forbid(unsafe_code)]

//! Signal/slot channel for propwire.
//!
//! # Role in propwire
//! `propwire-signal` is the leaf of the workspace. It knows nothing about
//! properties: it delivers a value to an ordered list of subscribers and
//! hands out tokens that block or remove one subscriber. `propwire` builds
//! its change notifications and bindings on top of it.
//!
//! # Primary types
//! - [`Signal`]: owned, ordered multicast channel. Only the owner can emit.
//! - [`SignalHandle`]: borrowed subscribe-only view of a signal.
//! - [`Connection`]: token for one subscriber (disconnect, block, unblock).
//! - [`ScopedConnection`]: disconnects on drop.
//! - [`ConnectionBlocker`]: blocks for its lifetime.
//!
//! # Example
//!
//! ```
//! use propwire_signal::Signal;
//! use std::cell::Cell;
//! use std::rc::Rc;
//!
//! let signal = Signal::new();
//! let seen = Rc::new(Cell::new(0));
//! let seen_clone = Rc::clone(&seen);
//! let conn = signal.connect(move |v: &i32| seen_clone.set(*v));
//!
//! signal.emit(&3);
//! assert_eq!(seen.get(), 3);
//!
//! conn.block();
//! signal.emit(&4);
//! assert_eq!(seen.get(), 3);
//! ```
//!
//! # Threading
//! Everything here is `Rc`-based and therefore `!Send`. Dispatch is
//! synchronous and runs to completion on the caller's stack.

pub mod connection;
pub mod signal;

pub use connection::{Connection, ConnectionBlocker, ScopedConnection};
pub use signal::{Signal, SignalHandle};
