//! Signal/slot system for atomwind.
//!
//! This module provides a type-safe observer mechanism. Signals are emitted
//! by stores when their state changes, and connected slots (callbacks) are
//! invoked in response.
//!
//! # Key Types
//!
//! - [`Signal<Args>`] - The main signal type for emitting notifications
//! - [`ConnectionId`] - Unique identifier returned when connecting a slot
//! - [`ConnectionGuard`] - RAII guard that disconnects when dropped
//!
//! # Filtered Connections
//!
//! A slot may be connected together with a filter via
//! [`Signal::connect_filtered`]. The filter sees every emitted value and the
//! slot only runs when it returns `true`. Stores use this to scope
//! notifications to the topics a consumer actually depends on.
//!
//! # Re-entrancy
//!
//! Emission snapshots the matching slots before invoking any of them and
//! releases the connection lock first. Slots may therefore connect,
//! disconnect or emit on the same signal without deadlocking; such changes
//! take effect from the next emission.
//!
//! # Example
//!
//! ```
//! use atomwind_core::Signal;
//!
//! // Create a signal that passes a string argument
//! let text_changed = Signal::<String>::new();
//!
//! // Connect a slot (closure)
//! let conn_id = text_changed.connect(|text| {
//!     println!("Text changed to: {}", text);
//! });
//!
//! // Emit the signal
//! text_changed.emit("Hello, World!".to_string());
//!
//! // Disconnect when done
//! text_changed.disconnect(conn_id);
//! ```

use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use slotmap::{new_key_type, SlotMap};

use crate::logging::{span_names, targets};

new_key_type! {
    /// A unique identifier for a signal-slot connection.
    ///
    /// Use this ID to disconnect a specific connection via [`Signal::disconnect`].
    /// The ID remains valid until the connection is explicitly disconnected or
    /// the signal is dropped.
    pub struct ConnectionId;
}

type Slot<Args> = Arc<dyn Fn(&Args) + Send + Sync>;
type Filter<Args> = Arc<dyn Fn(&Args) -> bool + Send + Sync>;

/// Internal storage for a single connection.
struct Connection<Args> {
    slot: Slot<Args>,
    /// When present, the slot only runs for values accepted by the filter.
    filter: Option<Filter<Args>>,
}

/// A type-safe signal that can have multiple connected slots.
///
/// When a signal is emitted, all connected slots whose filter accepts the
/// value are invoked with it, synchronously and in connection order.
///
/// # Type Parameter
///
/// - `Args`: The argument type passed to connected slots. Use `()` for signals
///   with no arguments, or a tuple like `(String, i32)` for multiple arguments.
pub struct Signal<Args> {
    /// All active connections.
    connections: Mutex<SlotMap<ConnectionId, Connection<Args>>>,
}

impl<Args: 'static> Default for Signal<Args> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Args: 'static> std::fmt::Debug for Signal<Args> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Signal")
            .field("connections", &self.connection_count())
            .finish()
    }
}

impl<Args: 'static> Signal<Args> {
    /// Create a new signal with no connections.
    pub fn new() -> Self {
        Self {
            connections: Mutex::new(SlotMap::with_key()),
        }
    }

    /// Connect a slot (closure) to this signal.
    ///
    /// Returns a `ConnectionId` that can be used to disconnect the slot later.
    ///
    /// # Example
    ///
    /// ```
    /// use atomwind_core::Signal;
    ///
    /// let signal = Signal::<String>::new();
    /// let id = signal.connect(|s| println!("Got: {}", s));
    /// signal.emit("Hello".to_string());
    /// ```
    pub fn connect<F>(&self, slot: F) -> ConnectionId
    where
        F: Fn(&Args) + Send + Sync + 'static,
    {
        self.insert(Connection {
            slot: Arc::new(slot),
            filter: None,
        })
    }

    /// Connect a slot that only runs for values accepted by `filter`.
    ///
    /// # Example
    ///
    /// ```
    /// use atomwind_core::Signal;
    /// use std::sync::atomic::{AtomicI32, Ordering};
    /// use std::sync::Arc;
    ///
    /// let signal = Signal::<i32>::new();
    /// let evens = Arc::new(AtomicI32::new(0));
    /// let evens_clone = evens.clone();
    /// signal.connect_filtered(|n| n % 2 == 0, move |_| {
    ///     evens_clone.fetch_add(1, Ordering::SeqCst);
    /// });
    ///
    /// signal.emit(1);
    /// signal.emit(2);
    /// assert_eq!(evens.load(Ordering::SeqCst), 1);
    /// ```
    pub fn connect_filtered<P, F>(&self, filter: P, slot: F) -> ConnectionId
    where
        P: Fn(&Args) -> bool + Send + Sync + 'static,
        F: Fn(&Args) + Send + Sync + 'static,
    {
        self.insert(Connection {
            slot: Arc::new(slot),
            filter: Some(Arc::new(filter)),
        })
    }

    fn insert(&self, connection: Connection<Args>) -> ConnectionId {
        self.connections.lock().insert(connection)
    }

    /// Disconnect a specific slot by its connection ID.
    ///
    /// Returns `true` if the connection was found and removed, `false` otherwise.
    pub fn disconnect(&self, id: ConnectionId) -> bool {
        self.connections.lock().remove(id).is_some()
    }

    /// Disconnect all slots from this signal.
    pub fn disconnect_all(&self) {
        self.connections.lock().clear();
    }

    /// Get the number of connected slots.
    pub fn connection_count(&self) -> usize {
        self.connections.lock().len()
    }

    /// Emit the signal, invoking every connected slot whose filter accepts
    /// `args`.
    ///
    /// Returns the number of slots that were invoked.
    pub fn emit(&self, args: Args) -> usize {
        let _span = tracing::trace_span!(target: targets::SIGNAL, span_names::SIGNAL).entered();

        // Snapshot under the lock, dispatch without it.
        let slots: Vec<Slot<Args>> = {
            let connections = self.connections.lock();
            connections
                .values()
                .filter(|conn| conn.filter.as_ref().is_none_or(|accept| accept(&args)))
                .map(|conn| conn.slot.clone())
                .collect()
        };

        tracing::trace!(target: targets::SIGNAL, slot_count = slots.len(), "emitting signal");

        for slot in &slots {
            slot(&args);
        }

        slots.len()
    }

    /// Connect a filtered slot that is disconnected when the returned guard
    /// is dropped.
    ///
    /// The guard only holds a weak reference, so dropping it after the signal
    /// itself is gone is harmless.
    pub fn connect_filtered_scoped<P, F>(self: &Arc<Self>, filter: P, slot: F) -> ConnectionGuard<Args>
    where
        P: Fn(&Args) -> bool + Send + Sync + 'static,
        F: Fn(&Args) + Send + Sync + 'static,
    {
        let id = self.connect_filtered(filter, slot);
        ConnectionGuard::new(self, id)
    }
}

/// A connection guard that automatically disconnects when dropped.
///
/// Created via [`Signal::connect_filtered_scoped`].
///
/// # Example
///
/// ```
/// use atomwind_core::Signal;
/// use std::sync::atomic::{AtomicI32, Ordering};
/// use std::sync::Arc;
///
/// let signal = Arc::new(Signal::<i32>::new());
/// let counter = Arc::new(AtomicI32::new(0));
/// {
///     let counter_clone = counter.clone();
///     let _guard = signal.connect_filtered_scoped(|&n| n > 0, move |&n| {
///         counter_clone.fetch_add(n, Ordering::SeqCst);
///     });
///     signal.emit(-1); // filtered out
///     signal.emit(42); // counter = 42
/// }
/// signal.emit(43); // Nothing happens - connection was dropped
/// assert_eq!(counter.load(Ordering::SeqCst), 42);
/// ```
pub struct ConnectionGuard<Args: 'static> {
    signal: Weak<Signal<Args>>,
    id: ConnectionId,
}

impl<Args: 'static> ConnectionGuard<Args> {
    fn new(signal: &Arc<Signal<Args>>, id: ConnectionId) -> Self {
        Self {
            signal: Arc::downgrade(signal),
            id,
        }
    }
}

impl<Args: 'static> std::fmt::Debug for ConnectionGuard<Args> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionGuard").field("id", &self.id).finish()
    }
}

impl<Args: 'static> Drop for ConnectionGuard<Args> {
    fn drop(&mut self) {
        if let Some(signal) = self.signal.upgrade() {
            signal.disconnect(self.id);
        }
    }
}
