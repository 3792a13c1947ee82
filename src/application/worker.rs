//! Background encode worker
//!
//! Encoding runs on a dedicated OS thread so a slow encoder never stalls
//! the controller. The thread owns the encoder and consumes a two-command
//! stream: `Encode` appends a buffer, `Dump` serializes everything held so
//! far and posts the bytes back. A failed dump is logged and produces no
//! reply.

use std::thread;

use tokio::sync::mpsc;

use crate::domain::recording::MimeType;

use super::ports::SampleEncoder;

/// Commands understood by the encode thread
#[derive(Debug)]
pub enum WorkerCommand {
    /// Append one buffer of samples
    Encode(Vec<f32>),
    /// Serialize the held audio and reply with the container bytes
    Dump { sample_rate: u32 },
}

/// Handle to a running encode thread.
///
/// Both operations are fire-and-forget; replies to `dump` arrive on the
/// receiver returned by [`spawn`]. Dropping the handle closes the command
/// channel and lets the thread finish its queue and exit.
pub struct EncodeWorker {
    commands: mpsc::UnboundedSender<WorkerCommand>,
    mime: MimeType,
}

impl EncodeWorker {
    /// Queue a buffer for encoding
    pub fn encode(&self, buffer: Vec<f32>) {
        let _ = self.commands.send(WorkerCommand::Encode(buffer));
    }

    /// Ask the worker to serialize what it holds
    pub fn dump(&self, sample_rate: u32) {
        let _ = self.commands.send(WorkerCommand::Dump { sample_rate });
    }

    /// Container type the worker produces
    pub fn mime_type(&self) -> MimeType {
        self.mime
    }
}

/// Start an encode thread around the given encoder.
///
/// Returns the command handle and the channel on which dump replies arrive.
pub fn spawn<E>(mut encoder: E) -> (EncodeWorker, mpsc::UnboundedReceiver<Vec<u8>>)
where
    E: SampleEncoder + 'static,
{
    let (command_tx, mut command_rx) = mpsc::unbounded_channel::<WorkerCommand>();
    let (reply_tx, reply_rx) = mpsc::unbounded_channel::<Vec<u8>>();
    let mime = encoder.mime_type();

    let spawned = thread::Builder::new()
        .name("reel-encoder".into())
        .spawn(move || {
            while let Some(command) = command_rx.blocking_recv() {
                match command {
                    WorkerCommand::Encode(buffer) => encoder.encode(buffer),
                    WorkerCommand::Dump { sample_rate } => match encoder.dump(sample_rate) {
                        Ok(bytes) => {
                            if reply_tx.send(bytes).is_err() {
                                break;
                            }
                        }
                        Err(e) => {
                            tracing::warn!("Dump failed, dropping reply: {}", e);
                        }
                    },
                }
            }
            tracing::debug!("Encode worker exiting");
        });
    if let Err(e) = spawned {
        tracing::error!("Failed to spawn encode worker: {}", e);
    }

    (
        EncodeWorker {
            commands: command_tx,
            mime,
        },
        reply_rx,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::EncodeError;

    /// Encoder that tracks buffers and dumps a byte per held sample
    struct CountingEncoder {
        samples: usize,
        fail_dump: bool,
    }

    impl CountingEncoder {
        fn new() -> Self {
            Self {
                samples: 0,
                fail_dump: false,
            }
        }
    }

    impl SampleEncoder for CountingEncoder {
        fn mime_type(&self) -> MimeType {
            MimeType::Wav
        }

        fn encode(&mut self, buffer: Vec<f32>) {
            self.samples += buffer.len();
        }

        fn dump(&mut self, _sample_rate: u32) -> Result<Vec<u8>, EncodeError> {
            if self.fail_dump {
                self.fail_dump = false;
                return Err(EncodeError::Encode("scripted failure".to_string()));
            }
            Ok(vec![0u8; self.samples])
        }
    }

    #[tokio::test]
    async fn dump_replies_with_encoded_bytes() {
        let (worker, mut replies) = spawn(CountingEncoder::new());

        worker.encode(vec![0.0; 100]);
        worker.encode(vec![0.0; 50]);
        worker.dump(16_000);

        let bytes = replies.recv().await.unwrap();
        assert_eq!(bytes.len(), 150);
    }

    #[tokio::test]
    async fn dumps_accumulate_across_replies() {
        let (worker, mut replies) = spawn(CountingEncoder::new());

        worker.encode(vec![0.0; 10]);
        worker.dump(16_000);
        assert_eq!(replies.recv().await.unwrap().len(), 10);

        worker.encode(vec![0.0; 5]);
        worker.dump(16_000);
        assert_eq!(replies.recv().await.unwrap().len(), 15);
    }

    #[tokio::test]
    async fn failed_dump_produces_no_reply() {
        let mut encoder = CountingEncoder::new();
        encoder.fail_dump = true;
        let (worker, mut replies) = spawn(encoder);

        worker.encode(vec![0.0; 8]);
        worker.dump(16_000);
        worker.dump(16_000);

        // Only the second dump answers; the first was swallowed.
        let bytes = replies.recv().await.unwrap();
        assert_eq!(bytes.len(), 8);
        assert!(replies.try_recv().is_err());
    }

    #[tokio::test]
    async fn reply_channel_closes_when_worker_dropped() {
        let (worker, mut replies) = spawn(CountingEncoder::new());
        drop(worker);
        assert!(replies.recv().await.is_none());
    }

    #[test]
    fn worker_reports_encoder_mime() {
        let (worker, _replies) = spawn(CountingEncoder::new());
        assert_eq!(worker.mime_type(), MimeType::Wav);
    }
}
