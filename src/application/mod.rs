//! Application layer - Use cases and port interfaces
//!
//! Contains the recording controller, its event surface, the encode
//! worker, and trait definitions for external system interactions.

pub mod events;
pub mod ports;
pub mod recorder;
pub mod worker;

// Re-export the control surface
pub use events::{EventBus, EventFlow, EventKind, RecorderError, RecorderEvent, SubscriptionId};
pub use recorder::Recorder;
pub use worker::EncodeWorker;
