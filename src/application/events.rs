//! Lifecycle events and the typed publish/subscribe bus

use std::fmt;

use thiserror::Error;

use crate::domain::error::WrongState;
use crate::domain::recording::EncodedChunk;

use super::ports::CaptureError;

/// Failures surfaced through `error` events
#[derive(Debug, Clone, Error)]
pub enum RecorderError {
    #[error(transparent)]
    WrongState(#[from] WrongState),

    #[error("Capture failed: {0}")]
    Capture(#[from] CaptureError),
}

/// The closed set of event kinds a recorder emits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Start,
    Duration,
    DataAvailable,
    Stop,
    Error,
}

impl EventKind {
    /// Every kind, in lifecycle order
    pub const ALL: [EventKind; 5] = [
        Self::Start,
        Self::Duration,
        Self::DataAvailable,
        Self::Stop,
        Self::Error,
    ];

    /// Get the event name
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Duration => "duration",
            Self::DataAvailable => "dataavailable",
            Self::Stop => "stop",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A lifecycle event with its payload
#[derive(Debug, Clone)]
pub enum RecorderEvent {
    /// Capture began
    Started,
    /// One second of capture elapsed; payload is the new total
    Duration(u64),
    /// The encoder delivered a chunk
    DataAvailable(EncodedChunk),
    /// The session fully drained
    Stopped,
    /// An operation was misused, or the capture pipeline failed
    Error(RecorderError),
}

impl RecorderEvent {
    /// The kind this event dispatches under
    pub fn kind(&self) -> EventKind {
        match self {
            Self::Started => EventKind::Start,
            Self::Duration(_) => EventKind::Duration,
            Self::DataAvailable(_) => EventKind::DataAvailable,
            Self::Stopped => EventKind::Stop,
            Self::Error(_) => EventKind::Error,
        }
    }
}

/// What a listener wants done with default handling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EventFlow {
    #[default]
    Continue,
    Suppress,
}

/// Identifies one subscription for later removal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Listener = Box<dyn FnMut(&RecorderEvent) -> EventFlow + Send>;

struct Registration {
    id: SubscriptionId,
    kind: EventKind,
    listener: Listener,
}

/// Synchronous multi-listener dispatch keyed by event kind.
///
/// Listeners are visited in registration order, filtered to the dispatched
/// kind. Dispatch runs on the controller task; listeners must not subscribe
/// or unsubscribe from within a callback.
#[derive(Default)]
pub struct EventBus {
    next_id: u64,
    entries: Vec<Registration>,
}

impl EventBus {
    /// Create an empty bus
    pub fn new() -> Self {
        Self {
            next_id: 0,
            entries: Vec::new(),
        }
    }

    /// Register a listener for one event kind.
    /// The listener's return value controls default handling for that event.
    pub fn subscribe<F>(&mut self, kind: EventKind, listener: F) -> SubscriptionId
    where
        F: FnMut(&RecorderEvent) -> EventFlow + Send + 'static,
    {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.entries.push(Registration {
            id,
            kind,
            listener: Box::new(listener),
        });
        id
    }

    /// Register a listener that never suppresses default handling
    pub fn on<F>(&mut self, kind: EventKind, mut listener: F) -> SubscriptionId
    where
        F: FnMut(&RecorderEvent) + Send + 'static,
    {
        self.subscribe(kind, move |event| {
            listener(event);
            EventFlow::Continue
        })
    }

    /// Remove a subscription. Returns whether an entry was removed.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|entry| entry.id != id);
        self.entries.len() != before
    }

    /// Number of live subscriptions
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no listeners are registered
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Dispatch an event to every listener registered for its kind, in
    /// registration order. Returns true if any listener asked for default
    /// handling to be suppressed.
    pub fn dispatch(&mut self, event: &RecorderEvent) -> bool {
        let kind = event.kind();
        let mut suppressed = false;
        for entry in self.entries.iter_mut().filter(|e| e.kind == kind) {
            if (entry.listener)(event) == EventFlow::Suppress {
                suppressed = true;
            }
        }
        suppressed
    }
}
