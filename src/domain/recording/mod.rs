//! Recording domain module

mod chunk;
mod duration;
mod state;

pub use chunk::{EncodedChunk, MimeType};
pub use duration::{Duration, DEFAULT_LIMIT_SECS};
pub use state::{RecorderState, RecordingSession, StopReason};
