//! Recording controller integration tests
//!
//! Drive the public API end to end with a scripted capture source, the
//! shipped WAV encoder where real output matters, and a counting encoder
//! where only the command flow does.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration as StdDuration;

use async_trait::async_trait;
use tokio::sync::{mpsc, watch};

use reel::application::ports::{
    CaptureError, CaptureStream, EncodeError, MediaSource, SampleEncoder,
};
use reel::application::{EventKind, Recorder, RecorderError, RecorderEvent};
use reel::domain::recording::{Duration, MimeType, RecorderState};
use reel::domain::Operation;
use reel::infrastructure::WavEncoder;

const SAMPLE_RATE: u32 = 16_000;

type BufferTap = Arc<Mutex<Option<mpsc::UnboundedSender<Vec<f32>>>>>;

/// Capture source driven by the test through a shared sender tap
struct ScriptedSource {
    tap: BufferTap,
    releases: Arc<AtomicUsize>,
}

impl ScriptedSource {
    fn new() -> (Self, BufferTap, Arc<AtomicUsize>) {
        let tap: BufferTap = Arc::new(Mutex::new(None));
        let releases = Arc::new(AtomicUsize::new(0));
        let source = Self {
            tap: Arc::clone(&tap),
            releases: Arc::clone(&releases),
        };
        (source, tap, releases)
    }
}

struct ScriptedStream {
    releases: Arc<AtomicUsize>,
    stopped: bool,
}

impl CaptureStream for ScriptedStream {
    fn stop(&mut self) {
        if !self.stopped {
            self.stopped = true;
            self.releases.fetch_add(1, Ordering::SeqCst);
        }
    }
}

impl Drop for ScriptedStream {
    fn drop(&mut self) {
        self.stop();
    }
}

#[async_trait]
impl MediaSource for ScriptedSource {
    fn sample_rate(&self) -> u32 {
        SAMPLE_RATE
    }

    async fn connect(
        &self,
        buffers: mpsc::UnboundedSender<Vec<f32>>,
    ) -> Result<Box<dyn CaptureStream>, CaptureError> {
        *self.tap.lock().unwrap() = Some(buffers);
        Ok(Box::new(ScriptedStream {
            releases: Arc::clone(&self.releases),
            stopped: false,
        }))
    }
}

/// Encoder that only counts dumps, for tests where no output is expected
struct CountingEncoder {
    dumps: Arc<AtomicUsize>,
}

impl CountingEncoder {
    fn new() -> (Self, Arc<AtomicUsize>) {
        let dumps = Arc::new(AtomicUsize::new(0));
        let encoder = Self {
            dumps: Arc::clone(&dumps),
        };
        (encoder, dumps)
    }
}

impl SampleEncoder for CountingEncoder {
    fn mime_type(&self) -> MimeType {
        MimeType::Wav
    }

    fn encode(&mut self, _buffer: Vec<f32>) {}

    fn dump(&mut self, _sample_rate: u32) -> Result<Vec<u8>, EncodeError> {
        self.dumps.fetch_add(1, Ordering::SeqCst);
        Ok(Vec::new())
    }
}

/// Forward every event kind into a channel the test can await
fn tap_events(recorder: &Recorder) -> mpsc::UnboundedReceiver<RecorderEvent> {
    let (tx, rx) = mpsc::unbounded_channel();
    for kind in EventKind::ALL {
        let tx = tx.clone();
        recorder.subscribe(kind, move |event| {
            let _ = tx.send(event.clone());
        });
    }
    rx
}

async fn wait_for_state(watch: &mut watch::Receiver<RecorderState>, wanted: RecorderState) {
    while *watch.borrow() != wanted {
        watch.changed().await.unwrap();
    }
}

async fn await_started(events: &mut mpsc::UnboundedReceiver<RecorderEvent>) {
    loop {
        match events.recv().await {
            Some(RecorderEvent::Started) => return,
            Some(RecorderEvent::Error(e)) => panic!("start failed: {}", e),
            Some(_) => {}
            None => panic!("event stream ended"),
        }
    }
}

fn feed(tap: &BufferTap, samples: Vec<f32>) {
    let buffers = tap.lock().unwrap().clone().expect("pipeline not attached");
    buffers.send(samples).unwrap();
}

fn assert_wav(data: &[u8], samples: usize) {
    assert_eq!(&data[0..4], b"RIFF");
    assert_eq!(&data[8..12], b"WAVE");
    assert_eq!(data.len(), 44 + samples * 2);
    let rate = u32::from_le_bytes([data[24], data[25], data[26], data[27]]);
    assert_eq!(rate, SAMPLE_RATE);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn user_stop_delivers_one_final_wav_take() {
    let (source, tap, releases) = ScriptedSource::new();
    let recorder = Recorder::new(source, WavEncoder::new());
    let mut events = tap_events(&recorder);

    recorder.start();
    await_started(&mut events).await;

    feed(&tap, vec![0.25; 2048]);
    feed(&tap, vec![-0.25; 1024]);
    recorder.stop();

    // The final flush arrives first, then end-of-stream with nothing between
    let chunk = match events.recv().await {
        Some(RecorderEvent::DataAvailable(chunk)) => chunk,
        other => panic!("expected the final chunk, got {:?}", other),
    };
    match events.recv().await {
        Some(RecorderEvent::Stopped) => {}
        other => panic!("expected end-of-stream, got {:?}", other),
    }

    assert_eq!(chunk.mime_type(), MimeType::Wav);
    assert_wav(chunk.data(), 3072);
    assert_eq!(releases.load(Ordering::SeqCst), 1);
    assert_eq!(recorder.state(), RecorderState::Inactive);
}

#[tokio::test(start_paused = true)]
async fn limit_ends_the_take_without_a_flush() {
    let (source, _tap, releases) = ScriptedSource::new();
    let (encoder, dumps) = CountingEncoder::new();
    let recorder = Recorder::new(source, encoder);
    let mut events = tap_events(&recorder);
    let mut watch = recorder.watch_state();

    recorder.start_with_limit(Duration::from_secs(3));

    let mut seen = Vec::new();
    while seen.len() < 3 {
        if let Some(RecorderEvent::Duration(secs)) = events.recv().await {
            seen.push(secs);
        }
    }
    assert_eq!(seen, vec![1, 2, 3]);

    wait_for_state(&mut watch, RecorderState::Inactive).await;

    // No flush on the deadline path: no chunk, no stop event
    std::thread::sleep(StdDuration::from_millis(100));
    assert!(events.try_recv().is_err());
    assert_eq!(dumps.load(Ordering::SeqCst), 0);
    assert_eq!(releases.load(Ordering::SeqCst), 1);
    assert_eq!(recorder.elapsed_seconds(), 3);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn mid_take_flushes_grow_the_same_take() {
    let (source, tap, releases) = ScriptedSource::new();
    let recorder = Recorder::new(source, WavEncoder::new());
    let mut events = tap_events(&recorder);

    recorder.start();
    await_started(&mut events).await;

    feed(&tap, vec![0.1; 2048]);
    recorder.request_data();
    let first = loop {
        if let Some(RecorderEvent::DataAvailable(chunk)) = events.recv().await {
            break chunk;
        }
    };
    assert!(recorder.is_recording());

    feed(&tap, vec![0.2; 2048]);
    recorder.request_data();
    let second = loop {
        if let Some(RecorderEvent::DataAvailable(chunk)) = events.recv().await {
            break chunk;
        }
    };
    assert!(second.size_bytes() >= first.size_bytes());
    assert!(recorder.is_recording());

    // The stop-path flush drains every pending buffer first, so the final
    // take holds all 4096 samples.
    recorder.stop();
    let last = loop {
        match events.recv().await {
            Some(RecorderEvent::DataAvailable(chunk)) => break chunk,
            Some(RecorderEvent::Stopped) => panic!("stop arrived before the final chunk"),
            Some(_) => {}
            None => panic!("event stream ended"),
        }
    };
    match events.recv().await {
        Some(RecorderEvent::Stopped) => {}
        other => panic!("expected end-of-stream, got {:?}", other),
    }

    assert_wav(last.data(), 4096);
    assert_eq!(releases.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn calls_in_the_wrong_state_surface_as_error_events() {
    let (source, _tap, _releases) = ScriptedSource::new();
    let (encoder, _dumps) = CountingEncoder::new();
    let recorder = Recorder::new(source, encoder);
    let mut events = tap_events(&recorder);

    recorder.stop();
    recorder.request_data();

    let mut operations = Vec::new();
    while operations.len() < 2 {
        match events.recv().await {
            Some(RecorderEvent::Error(RecorderError::WrongState(err))) => {
                assert_eq!(err.state, RecorderState::Inactive);
                operations.push(err.operation);
            }
            other => panic!("expected a wrong-state error, got {:?}", other),
        }
    }
    assert_eq!(operations, vec![Operation::Stop, Operation::RequestData]);
    assert_eq!(recorder.state(), RecorderState::Inactive);
}

#[tokio::test(start_paused = true)]
async fn take_after_deadline_starts_from_scratch() {
    let (source, _tap, releases) = ScriptedSource::new();
    let (encoder, dumps) = CountingEncoder::new();
    let recorder = Recorder::new(source, encoder);
    let mut events = tap_events(&recorder);
    let mut watch = recorder.watch_state();

    recorder.start_with_limit(Duration::from_secs(1));
    wait_for_state(&mut watch, RecorderState::Recording).await;
    wait_for_state(&mut watch, RecorderState::Inactive).await;

    recorder.start_with_limit(Duration::from_secs(1));
    wait_for_state(&mut watch, RecorderState::Recording).await;
    wait_for_state(&mut watch, RecorderState::Inactive).await;

    // Each session ticked once, released its stream once, flushed nothing
    let durations: Vec<u64> = drain_durations(&mut events);
    assert_eq!(durations, vec![1, 1]);
    assert_eq!(releases.load(Ordering::SeqCst), 2);
    assert_eq!(dumps.load(Ordering::SeqCst), 0);
    assert_eq!(recorder.elapsed_seconds(), 1);
}

fn drain_durations(events: &mut mpsc::UnboundedReceiver<RecorderEvent>) -> Vec<u64> {
    let mut seen = Vec::new();
    while let Ok(event) = events.try_recv() {
        if let RecorderEvent::Duration(secs) = event {
            seen.push(secs);
        }
    }
    seen
}
