//! Main app runner for capture mode

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use tokio::sync::mpsc;
use tokio::time::{self, Duration as StdDuration, Instant};

use crate::application::ports::{AudioCueType, ConfigStore};
use crate::application::{EventKind, Recorder, RecorderError, RecorderEvent};
use crate::domain::config::AppConfig;
use crate::domain::recording::{EncodedChunk, MimeType, RecorderState};
use crate::infrastructure::{
    capture_supported, create_audio_cue, CpalSource, FlacEncoder, WavEncoder, XdgConfigStore,
};

use super::args::{CaptureOptions, EncoderArg};
use super::presenter::Presenter;
use super::signals::ShutdownSignal;

/// Exit codes
pub const EXIT_SUCCESS: u8 = 0;
pub const EXIT_ERROR: u8 = 1;
pub const EXIT_USAGE_ERROR: u8 = 2;

/// How long to wait for the final flush after a user stop
const STOP_DRAIN_GRACE: StdDuration = StdDuration::from_secs(5);

/// How long to wait for a racing periodic flush after the limit fires
const LIMIT_DRAIN_GRACE: StdDuration = StdDuration::from_millis(500);

/// How the capture loop ended
enum LoopEnd {
    /// End-of-stream already observed, nothing left in flight
    Drained,
    /// User stop issued, final flush still in flight
    Interrupted,
    /// The limit stopped the session without a final flush
    LimitReached,
    /// The capture boundary failed
    Failed(String),
}

/// Run one capture take and write it to disk
pub async fn run_capture(options: CaptureOptions) -> ExitCode {
    let mut presenter = Presenter::new();

    if !capture_supported() {
        presenter.error("No audio input device is available");
        return ExitCode::from(EXIT_ERROR);
    }

    let mut shutdown = match ShutdownSignal::install() {
        Ok(shutdown) => shutdown,
        Err(e) => {
            presenter.error(&format!("Failed to install signal handlers: {}", e));
            return ExitCode::from(EXIT_ERROR);
        }
    };

    let source = match CpalSource::new() {
        Ok(source) => source,
        Err(e) => {
            presenter.error(&format!("Cannot open the input device: {}", e));
            return ExitCode::from(EXIT_ERROR);
        }
    };

    let recorder = match options.encoder {
        EncoderArg::Wav => Recorder::new(source, WavEncoder::new()),
        EncoderArg::Flac => Recorder::new(source, FlacEncoder::new()),
    };

    let cue = create_audio_cue(options.cue);

    // Forward every event into the select loop below
    let (event_tx, mut events) = mpsc::unbounded_channel();
    for kind in EventKind::ALL {
        let tx = event_tx.clone();
        recorder.subscribe(kind, move |event| {
            let _ = tx.send(event.clone());
        });
    }

    let mut state = recorder.watch_state();
    let limit_secs = options.limit.as_secs();

    let _ = cue.play(AudioCueType::CaptureStart).await;
    recorder.start_with_limit(options.limit);

    presenter.info("Press Ctrl-C to stop and save");
    let opening = format!("Recording... {}", presenter.format_progress(0, limit_secs));
    presenter.show_capture_progress(&opening);

    let mut flush_ticker = options.flush_every.map(|every| {
        let period = every.as_std();
        time::interval_at(Instant::now() + period, period)
    });

    let mut newest: Option<EncodedChunk> = None;

    let mut end = loop {
        tokio::select! {
            _ = shutdown.recv() => {
                presenter.update_spinner("Stopping, flushing the encoder...");
                recorder.stop();
                break LoopEnd::Interrupted;
            }
            _ = flush_tick(&mut flush_ticker) => {
                recorder.request_data();
            }
            changed = state.changed() => {
                if changed.is_err() || *state.borrow_and_update() == RecorderState::Inactive {
                    break LoopEnd::LimitReached;
                }
            }
            event = events.recv() => match event {
                Some(RecorderEvent::Duration(seconds)) => {
                    presenter.update_capture_progress(seconds, limit_secs);
                }
                Some(RecorderEvent::DataAvailable(chunk)) => {
                    newest = Some(chunk);
                }
                Some(RecorderEvent::Stopped) => break LoopEnd::Drained,
                Some(RecorderEvent::Error(error)) => match error {
                    RecorderError::Capture(_) => break LoopEnd::Failed(error.to_string()),
                    RecorderError::WrongState(_) => presenter.warn(&error.to_string()),
                },
                Some(RecorderEvent::Started) | None => {}
            },
        }
    };

    let _ = cue.play(AudioCueType::CaptureStop).await;

    // A final flush, a racing periodic flush, or the error that ended the
    // session may still be in flight.
    let grace = match &end {
        LoopEnd::Drained | LoopEnd::Failed(_) => StdDuration::ZERO,
        LoopEnd::Interrupted => STOP_DRAIN_GRACE,
        LoopEnd::LimitReached => LIMIT_DRAIN_GRACE,
    };
    if !grace.is_zero() {
        let deadline = Instant::now() + grace;
        loop {
            tokio::select! {
                _ = time::sleep_until(deadline) => break,
                _ = shutdown.recv() => break,
                event = events.recv() => match event {
                    Some(RecorderEvent::DataAvailable(chunk)) => newest = Some(chunk),
                    Some(RecorderEvent::Stopped) => break,
                    Some(RecorderEvent::Error(error)) => match error {
                        RecorderError::Capture(_) => {
                            end = LoopEnd::Failed(error.to_string());
                            break;
                        }
                        // Our stop lost the race with the limit, so no
                        // flush is coming.
                        RecorderError::WrongState(_) => break,
                    },
                    Some(_) => {}
                    None => break,
                },
            }
        }
    }

    if let LoopEnd::Failed(message) = end {
        presenter.spinner_fail("Capture failed");
        presenter.error(&message);
        return ExitCode::from(EXIT_ERROR);
    }

    let chunk = match newest {
        Some(chunk) => chunk,
        None => {
            presenter.spinner_fail("Nothing to save");
            presenter.error(
                "The take ended before any data was flushed; \
                 stop with Ctrl-C or pass --flush-every",
            );
            return ExitCode::from(EXIT_ERROR);
        }
    };

    let path = output_path(options.output, chunk.mime_type());
    if let Err(e) = write_take(&path, &chunk).await {
        presenter.spinner_fail("Write failed");
        presenter.error(&format!("Cannot write {}: {}", path.display(), e));
        return ExitCode::from(EXIT_ERROR);
    }

    presenter.spinner_success(&format!(
        "Saved {} ({}, {}s captured)",
        path.display(),
        chunk.human_readable_size(),
        recorder.elapsed_seconds()
    ));
    ExitCode::from(EXIT_SUCCESS)
}

/// Wait for the next periodic flush, or forever when none is configured
async fn flush_tick(ticker: &mut Option<time::Interval>) {
    match ticker {
        Some(ticker) => {
            ticker.tick().await;
        }
        None => std::future::pending::<()>().await,
    }
}

fn output_path(explicit: Option<PathBuf>, mime: MimeType) -> PathBuf {
    explicit.unwrap_or_else(|| PathBuf::from(format!("take.{}", mime.extension())))
}

async fn write_take(path: &Path, chunk: &EncodedChunk) -> Result<(), std::io::Error> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await?;
        }
    }
    tokio::fs::write(path, chunk.data()).await
}

/// Merge configuration: defaults < file < CLI flags
pub async fn load_merged_config(cli_config: AppConfig) -> AppConfig {
    let store = XdgConfigStore::new();
    let file_config = store.load().await.unwrap_or_else(|_| AppConfig::empty());
    AppConfig::defaults().merge(file_config).merge(cli_config)
}
