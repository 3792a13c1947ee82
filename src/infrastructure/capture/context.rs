//! Process-wide capture context
//!
//! One cpal host is shared by every capture source in the process, created
//! lazily on first use and never torn down. Device and stream configuration
//! are resolved through it.

use std::sync::Arc;

use cpal::traits::{DeviceTrait, HostTrait};
use cpal::{SampleFormat, StreamConfig};
use once_cell::sync::Lazy;

use crate::application::ports::CaptureError;

/// Global shared capture context
static CONTEXT: Lazy<Arc<CaptureContext>> = Lazy::new(|| {
    Arc::new(CaptureContext {
        host: cpal::default_host(),
    })
});

/// Whether this process can capture audio at all.
/// Check before building a capture source.
pub fn capture_supported() -> bool {
    CaptureContext::shared().input_available()
}

/// Factory for input devices and their stream configuration
pub struct CaptureContext {
    host: cpal::Host,
}

impl CaptureContext {
    /// Get the shared context, creating it on first use
    pub fn shared() -> Arc<CaptureContext> {
        Arc::clone(&CONTEXT)
    }

    /// Whether a default input device is present
    pub fn input_available(&self) -> bool {
        self.host.default_input_device().is_some()
    }

    /// Resolve the default input device
    pub(crate) fn input_device(&self) -> Result<cpal::Device, CaptureError> {
        self.host
            .default_input_device()
            .ok_or(CaptureError::NoDevice)
    }

    /// Resolve the device's native stream configuration
    pub(crate) fn input_config(
        device: &cpal::Device,
    ) -> Result<(StreamConfig, SampleFormat), CaptureError> {
        let supported = device
            .default_input_config()
            .map_err(|e| CaptureError::Config(e.to_string()))?;
        let sample_format = supported.sample_format();
        Ok((supported.config(), sample_format))
    }
}
