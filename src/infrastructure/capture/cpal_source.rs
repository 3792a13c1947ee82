//! Microphone capture using cpal
//!
//! The cpal stream is owned by a dedicated thread because it is not Send.
//! Device callbacks downmix to mono, re-batch to a fixed granularity, and
//! push batches into the controller's buffer channel. The thread parks on a
//! live flag; clearing the flag stops delivery at once and releases the
//! device when the thread drops the stream.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use async_trait::async_trait;
use cpal::traits::{DeviceTrait, StreamTrait};
use cpal::{SampleFormat, StreamConfig};
use tokio::sync::{mpsc, oneshot};

use crate::application::ports::{CaptureError, CaptureStream, MediaSource};

use super::context::CaptureContext;

/// Samples per delivered batch
const BATCH_SAMPLES: usize = 2048;

/// How often the capture thread polls its live flag
const PARK_POLL: Duration = Duration::from_millis(50);

/// Downmixes interleaved frames to mono and regroups them into fixed-size
/// batches for the controller.
struct FrameBatcher {
    channels: usize,
    pending: Vec<f32>,
    buffers: mpsc::UnboundedSender<Vec<f32>>,
}

impl FrameBatcher {
    fn new(channels: u16, buffers: mpsc::UnboundedSender<Vec<f32>>) -> Self {
        Self {
            channels: channels.max(1) as usize,
            pending: Vec::with_capacity(BATCH_SAMPLES),
            buffers,
        }
    }

    fn push(&mut self, samples: &[f32]) {
        for frame in samples.chunks(self.channels) {
            let sum: f32 = frame.iter().sum();
            self.pending.push(sum / frame.len() as f32);

            if self.pending.len() >= BATCH_SAMPLES {
                let batch =
                    std::mem::replace(&mut self.pending, Vec::with_capacity(BATCH_SAMPLES));
                let _ = self.buffers.send(batch);
            }
        }
    }
}

/// Capture source for the default input device
pub struct CpalSource {
    context: Arc<CaptureContext>,
    config: StreamConfig,
    sample_format: SampleFormat,
}

impl CpalSource {
    /// Resolve the default input device and its native configuration
    pub fn new() -> Result<Self, CaptureError> {
        let context = CaptureContext::shared();
        let device = context.input_device()?;
        let (config, sample_format) = CaptureContext::input_config(&device)?;
        tracing::debug!(
            rate = config.sample_rate.0,
            channels = config.channels,
            format = ?sample_format,
            "Resolved input device"
        );
        Ok(Self {
            context,
            config,
            sample_format,
        })
    }
}

/// Open and start the device stream. Runs on the capture thread since the
/// returned stream must stay there.
fn open_stream(
    context: &CaptureContext,
    config: &StreamConfig,
    sample_format: SampleFormat,
    live: Arc<AtomicBool>,
    buffers: mpsc::UnboundedSender<Vec<f32>>,
) -> Result<cpal::Stream, CaptureError> {
    let device = context.input_device()?;
    let mut batcher = FrameBatcher::new(config.channels, buffers);

    let stream = match sample_format {
        SampleFormat::F32 => device
            .build_input_stream(
                config,
                move |data: &[f32], _: &cpal::InputCallbackInfo| {
                    if live.load(Ordering::SeqCst) {
                        batcher.push(data);
                    }
                },
                |err| tracing::warn!("Audio stream error: {}", err),
                None,
            )
            .map_err(|e| CaptureError::StreamOpen(e.to_string()))?,

        SampleFormat::I16 => device
            .build_input_stream(
                config,
                move |data: &[i16], _: &cpal::InputCallbackInfo| {
                    if live.load(Ordering::SeqCst) {
                        let converted: Vec<f32> =
                            data.iter().map(|&s| s as f32 / 32768.0).collect();
                        batcher.push(&converted);
                    }
                },
                |err| tracing::warn!("Audio stream error: {}", err),
                None,
            )
            .map_err(|e| CaptureError::StreamOpen(e.to_string()))?,

        other => return Err(CaptureError::UnsupportedFormat(format!("{:?}", other))),
    };

    stream
        .play()
        .map_err(|e| CaptureError::StreamOpen(e.to_string()))?;

    Ok(stream)
}

#[async_trait]
impl MediaSource for CpalSource {
    fn sample_rate(&self) -> u32 {
        self.config.sample_rate.0
    }

    async fn connect(
        &self,
        buffers: mpsc::UnboundedSender<Vec<f32>>,
    ) -> Result<Box<dyn CaptureStream>, CaptureError> {
        let (ready_tx, ready_rx) = oneshot::channel();
        let live = Arc::new(AtomicBool::new(true));

        let context = Arc::clone(&self.context);
        let config = self.config.clone();
        let sample_format = self.sample_format;
        let thread_live = Arc::clone(&live);

        let join = thread::Builder::new()
            .name("reel-capture".into())
            .spawn(move || {
                let gate = Arc::clone(&thread_live);
                match open_stream(&context, &config, sample_format, gate, buffers) {
                    Ok(stream) => {
                        let _ = ready_tx.send(Ok(()));
                        while thread_live.load(Ordering::SeqCst) {
                            thread::sleep(PARK_POLL);
                        }
                        drop(stream);
                    }
                    Err(e) => {
                        let _ = ready_tx.send(Err(e));
                    }
                }
            })
            .map_err(|e| CaptureError::StreamOpen(e.to_string()))?;

        match ready_rx.await {
            Ok(Ok(())) => Ok(Box::new(CpalStream {
                live,
                join: Some(join),
            })),
            Ok(Err(e)) => {
                let _ = join.join();
                Err(e)
            }
            Err(_) => {
                let _ = join.join();
                Err(CaptureError::StreamOpen(
                    "capture thread exited before the stream opened".into(),
                ))
            }
        }
    }
}

/// Live capture pipeline handle
struct CpalStream {
    live: Arc<AtomicBool>,
    join: Option<thread::JoinHandle<()>>,
}

impl CaptureStream for CpalStream {
    fn stop(&mut self) {
        self.live.store(false, Ordering::SeqCst);
        if let Some(join) = self.join.take() {
            let _ = join.join();
        }
    }
}

impl Drop for CpalStream {
    fn drop(&mut self) {
        self.stop();
    }
}
