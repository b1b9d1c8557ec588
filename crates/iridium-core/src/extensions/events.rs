//! Extension lifecycle event bus.
//!
//! Fire-and-forget notifications for hosts to drive UI state, logging, or
//! retry policies. A given extension's events fire in the order its state
//! actually changed; no ordering is guaranteed across extensions.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

/// Kind of lifecycle event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExtensionEventKind {
    /// A module was loaded.
    Loaded,
    /// A module failed to load.
    LoadError,
    /// An extension was activated.
    Activated,
    /// An activation failed.
    ActivationError,
    /// An extension was deactivated.
    Deactivated,
    /// A deactivation failed.
    DeactivationError,
}

/// A lifecycle event delivered to subscribers.
#[derive(Debug, Clone, Serialize)]
pub struct ExtensionEvent {
    /// Event kind.
    pub kind: ExtensionEventKind,
    /// Id of the extension the event concerns.
    pub extension_id: String,
    /// Failure message for error events.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ExtensionEvent {
    /// Creates an event without a message.
    pub fn new(kind: ExtensionEventKind, extension_id: impl Into<String>) -> Self {
        Self { kind, extension_id: extension_id.into(), message: None }
    }

    /// Creates an event carrying a failure message.
    pub fn with_message(
        kind: ExtensionEventKind,
        extension_id: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self { kind, extension_id: extension_id.into(), message: Some(message.into()) }
    }
}

type ListenerFn = Arc<dyn Fn(&ExtensionEvent) + Send + Sync>;

struct ListenerEntry {
    id: u64,
    kind: Option<ExtensionEventKind>,
    listener: ListenerFn,
}

/// Lifecycle event bus.
#[derive(Default)]
pub struct ExtensionEventBus {
    listeners: RwLock<Vec<ListenerEntry>>,
    next_listener_id: AtomicU64,
}

impl ExtensionEventBus {
    /// Creates an empty bus.
    pub fn new() -> Self {
        Self { listeners: RwLock::new(Vec::new()), next_listener_id: AtomicU64::new(1) }
    }

    /// Subscribes to every event. Returns a handle for unsubscribing.
    pub fn subscribe(&self, listener: impl Fn(&ExtensionEvent) + Send + Sync + 'static) -> u64 {
        self.push_listener(None, Arc::new(listener))
    }

    /// Subscribes to a single event kind. Returns a handle for unsubscribing.
    pub fn on(
        &self,
        kind: ExtensionEventKind,
        listener: impl Fn(&ExtensionEvent) + Send + Sync + 'static,
    ) -> u64 {
        self.push_listener(Some(kind), Arc::new(listener))
    }

    fn push_listener(&self, kind: Option<ExtensionEventKind>, listener: ListenerFn) -> u64 {
        let id = self.next_listener_id.fetch_add(1, Ordering::Relaxed);
        self.listeners
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(ListenerEntry { id, kind, listener });
        id
    }

    /// Unsubscribes a listener by handle.
    pub fn unsubscribe(&self, id: u64) {
        self.listeners
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .retain(|entry| entry.id != id);
    }

    /// Emits an event to all matching subscribers.
    pub fn emit(&self, event: &ExtensionEvent) {
        let listeners = self.listeners.read().unwrap_or_else(PoisonError::into_inner);
        for entry in listeners.iter() {
            if entry.kind.is_none() || entry.kind == Some(event.kind) {
                (entry.listener)(event);
            }
        }
    }

    /// Current subscriber count.
    pub fn subscriber_count(&self) -> usize {
        self.listeners.read().unwrap_or_else(PoisonError::into_inner).len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn test_subscribe_receives_all_kinds() {
        let bus = ExtensionEventBus::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        {
            let seen = seen.clone();
            bus.subscribe(move |event| seen.lock().unwrap().push(event.kind));
        }

        bus.emit(&ExtensionEvent::new(ExtensionEventKind::Loaded, "test-ext"));
        bus.emit(&ExtensionEvent::new(ExtensionEventKind::Activated, "test-ext"));

        assert_eq!(
            *seen.lock().unwrap(),
            vec![ExtensionEventKind::Loaded, ExtensionEventKind::Activated]
        );
    }

    #[test]
    fn test_on_filters_by_kind() {
        let bus = ExtensionEventBus::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        {
            let seen = seen.clone();
            bus.on(ExtensionEventKind::ActivationError, move |event| {
                seen.lock().unwrap().push(event.extension_id.clone());
            });
        }

        bus.emit(&ExtensionEvent::new(ExtensionEventKind::Activated, "healthy-ext"));
        bus.emit(&ExtensionEvent::with_message(
            ExtensionEventKind::ActivationError,
            "broken-ext",
            "hook failed",
        ));

        assert_eq!(*seen.lock().unwrap(), vec!["broken-ext"]);
    }

    #[test]
    fn test_unsubscribe_stops_delivery() {
        let bus = ExtensionEventBus::new();
        let count = Arc::new(Mutex::new(0));
        let handle = {
            let count = count.clone();
            bus.subscribe(move |_| *count.lock().unwrap() += 1)
        };

        bus.emit(&ExtensionEvent::new(ExtensionEventKind::Loaded, "test-ext"));
        bus.unsubscribe(handle);
        bus.emit(&ExtensionEvent::new(ExtensionEventKind::Loaded, "test-ext"));

        assert_eq!(*count.lock().unwrap(), 1);
        assert_eq!(bus.subscriber_count(), 0);
    }
}
