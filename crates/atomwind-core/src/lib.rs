//! Core systems for atomwind.
//!
//! This crate provides the observer plumbing the styling crates build on:
//!
//! - **Signal/Slot System**: Type-safe, synchronous notification with
//!   optional per-connection filters
//! - **Property System**: Values that report whether a write changed them
//! - **Logging**: `tracing` targets and span names for every subsystem
//!
//! # Signal/Slot Example
//!
//! ```
//! use atomwind_core::Signal;
//!
//! // Create a signal that notifies when a value changes
//! let value_changed = Signal::<i32>::new();
//!
//! // Connect a slot to handle the signal
//! let conn_id = value_changed.connect(|value| {
//!     println!("Value changed to: {}", value);
//! });
//!
//! // Emit the signal
//! value_changed.emit(42);
//!
//! // Disconnect when done
//! value_changed.disconnect(conn_id);
//! ```

pub mod logging;
pub mod property;
pub mod signal;

pub use property::Property;
pub use signal::{ConnectionGuard, ConnectionId, Signal};
