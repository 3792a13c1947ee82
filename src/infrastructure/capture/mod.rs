//! Audio capture implementations

mod context;
mod cpal_source;

pub use context::{capture_supported, CaptureContext};
pub use cpal_source::CpalSource;
