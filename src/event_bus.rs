use crate::error;
use std::{
    collections::HashMap,
    fmt::{Display, Formatter},
    hash::Hash,
    panic::{self, AssertUnwindSafe},
    sync::{
        Arc, Mutex, MutexGuard,
        atomic::{AtomicU64, Ordering},
    },
};

/// An event that can travel over an [`EventBus`]. Handlers are registered per kind.
pub trait BusEvent {
    type Kind: Copy + Eq + Hash + Display + Send;

    fn kind(&self) -> Self::Kind;
}

/// Handle returned by [`EventBus::subscribe`], used to unregister the handler again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// Error a handler reports back to the bus. It is logged and never reaches the emitter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandlerError(String);

impl HandlerError {
    pub fn new(msg: impl Into<String>) -> Self { Self(msg.into()) }
}

impl Display for HandlerError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result { f.write_str(&self.0) }
}

impl std::error::Error for HandlerError {}

impl From<&str> for HandlerError {
    fn from(value: &str) -> Self { Self::new(value) }
}

impl From<String> for HandlerError {
    fn from(value: String) -> Self { Self(value) }
}

type Handler<E> = Arc<dyn Fn(&E) -> Result<(), HandlerError> + Send + Sync>;

/// In-process publish/subscribe registry.
///
/// Handlers are stored in registration order per event kind and invoked
/// synchronously by [`EventBus::emit`]. A handler returning an error or
/// panicking is logged and skipped; the remaining handlers still run.
pub struct EventBus<E: BusEvent> {
    handlers: Mutex<HashMap<E::Kind, Vec<(SubscriptionId, Handler<E>)>>>,
    next_id: AtomicU64,
}

impl<E: BusEvent> EventBus<E> {
    pub fn new() -> Self {
        Self {
            handlers: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(0),
        }
    }

    fn lock_handlers(&self) -> MutexGuard<'_, HashMap<E::Kind, Vec<(SubscriptionId, Handler<E>)>>> {
        self.handlers
            .lock()
            .expect("[FATAL] Mutex poisoned: Failed to acquire handler registry")
    }

    pub fn subscribe<F>(&self, kind: E::Kind, handler: F) -> SubscriptionId
    where F: Fn(&E) -> Result<(), HandlerError> + Send + Sync + 'static {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.lock_handlers().entry(kind).or_default().push((id, Arc::new(handler)));
        id
    }

    /// Removes a handler. Returns `false` if it was not registered for `kind`.
    pub fn unsubscribe(&self, kind: E::Kind, id: SubscriptionId) -> bool {
        let mut handlers = self.lock_handlers();
        let Some(list) = handlers.get_mut(&kind) else {
            return false;
        };
        let len_before = list.len();
        list.retain(|(sub_id, _)| *sub_id != id);
        let removed = list.len() != len_before;
        if list.is_empty() {
            handlers.remove(&kind);
        }
        removed
    }

    pub fn handler_count(&self, kind: E::Kind) -> usize {
        self.lock_handlers().get(&kind).map_or(0, Vec::len)
    }

    /// Delivers `event` to every handler of its kind and returns how many succeeded.
    ///
    /// The handler list is snapshotted before dispatch, so handlers may
    /// (un)subscribe from within a callback without deadlocking.
    pub fn emit(&self, event: &E) -> usize {
        let kind = event.kind();
        let snapshot: Vec<Handler<E>> = self
            .lock_handlers()
            .get(&kind)
            .map(|list| list.iter().map(|(_, h)| Arc::clone(h)).collect())
            .unwrap_or_default();

        let mut delivered = 0;
        for handler in snapshot {
            match panic::catch_unwind(AssertUnwindSafe(|| handler(event))) {
                Ok(Ok(())) => delivered += 1,
                Ok(Err(e)) => error!("Handler for '{kind}' event failed: {e}"),
                Err(_) => error!("Handler for '{kind}' event panicked, continuing."),
            }
        }
        delivered
    }
}

impl<E: BusEvent> Default for EventBus<E> {
    fn default() -> Self { Self::new() }
}
