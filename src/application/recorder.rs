//! Recording controller use case
//!
//! The controller couples a capture pipeline to the encode worker and runs
//! the session state machine on a single task: commands from the public
//! handle, the one-second duration tick, the auto-stop deadline, delivered
//! sample buffers, and worker replies are all interleaved as discrete turns
//! of one select loop. No operation blocks the caller; everything observable
//! comes back through the event bus or the state watch channel.

use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration as StdDuration;

use tokio::sync::{mpsc, watch};
use tokio::time::{self, Instant, Interval, Sleep};

use crate::domain::error::Operation;
use crate::domain::recording::{
    Duration, EncodedChunk, MimeType, RecorderState, RecordingSession, StopReason,
};

use super::events::{EventBus, EventFlow, EventKind, RecorderEvent, SubscriptionId};
use super::ports::{CaptureStream, MediaSource, SampleEncoder};
use super::worker::{self, EncodeWorker};

/// Cadence of the `duration` event
const TICK_PERIOD: StdDuration = StdDuration::from_secs(1);

/// Commands accepted by the controller task
enum Command {
    Start { limit: Duration },
    Stop,
    RequestData,
}

fn lock_bus(bus: &Mutex<EventBus>) -> MutexGuard<'_, EventBus> {
    // A panicking listener must not wedge the bus for later callers.
    bus.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Handle to a running recording controller.
///
/// Constructing one spawns the controller task and the encode worker; both
/// live until the handle is dropped. All operations return immediately after
/// scheduling their side effects, and misuse (an operation issued outside
/// its required state) surfaces as an `error` event rather than a return
/// value.
pub struct Recorder {
    commands: mpsc::UnboundedSender<Command>,
    bus: Arc<Mutex<EventBus>>,
    state_rx: watch::Receiver<RecorderState>,
    elapsed: Arc<AtomicU64>,
    mime: MimeType,
}

impl Recorder {
    /// Create a controller around a capture source and an encoder.
    /// The encoder moves onto its own thread and is reused across every
    /// start/stop cycle of this instance.
    pub fn new<S, E>(source: S, encoder: E) -> Self
    where
        S: MediaSource + 'static,
        E: SampleEncoder + 'static,
    {
        let (encode_worker, replies) = worker::spawn(encoder);
        let mime = encode_worker.mime_type();
        let bus = Arc::new(Mutex::new(EventBus::new()));
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (state_tx, state_rx) = watch::channel(RecorderState::Inactive);
        let elapsed = Arc::new(AtomicU64::new(0));

        let task_bus = Arc::clone(&bus);
        let task_elapsed = Arc::clone(&elapsed);
        tokio::spawn(async move {
            ControllerTask::new(
                Box::new(source),
                encode_worker,
                replies,
                command_rx,
                state_tx,
                task_bus,
                task_elapsed,
            )
            .run()
            .await;
        });

        Self {
            commands: command_tx,
            bus,
            state_rx,
            elapsed,
            mime,
        }
    }

    /// Start recording with the default capture limit
    pub fn start(&self) {
        self.start_with_limit(Duration::default_limit());
    }

    /// Start recording, auto-stopping once `limit` elapses.
    /// Illegal while already recording; emits a `wrong state` error event.
    pub fn start_with_limit(&self, limit: Duration) {
        let _ = self.commands.send(Command::Start { limit });
    }

    /// Stop recording and ask the encoder for one final chunk.
    /// Illegal while inactive; emits a `wrong state` error event.
    pub fn stop(&self) {
        let _ = self.commands.send(Command::Stop);
    }

    /// Ask the encoder to flush what it has accumulated so far.
    /// The chunk arrives later as a `dataavailable` event. Illegal while
    /// inactive; emits a `wrong state` error event.
    pub fn request_data(&self) {
        let _ = self.commands.send(Command::RequestData);
    }

    /// Register a listener for one event kind
    pub fn subscribe<F>(&self, kind: EventKind, listener: F) -> SubscriptionId
    where
        F: FnMut(&RecorderEvent) + Send + 'static,
    {
        lock_bus(&self.bus).on(kind, listener)
    }

    /// Register a listener that can suppress default handling
    pub fn subscribe_with<F>(&self, kind: EventKind, listener: F) -> SubscriptionId
    where
        F: FnMut(&RecorderEvent) -> EventFlow + Send + 'static,
    {
        lock_bus(&self.bus).subscribe(kind, listener)
    }

    /// Remove a previously registered listener
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        lock_bus(&self.bus).unsubscribe(id)
    }

    /// Current state of the controller
    pub fn state(&self) -> RecorderState {
        *self.state_rx.borrow()
    }

    /// Whether a session is live right now
    pub fn is_recording(&self) -> bool {
        self.state() == RecorderState::Recording
    }

    /// Watch channel mirroring every state transition, including the
    /// deadline-triggered stop that produces no final chunk.
    pub fn watch_state(&self) -> watch::Receiver<RecorderState> {
        self.state_rx.clone()
    }

    /// Whole seconds elapsed in the current (or last) session
    pub fn elapsed_seconds(&self) -> u64 {
        self.elapsed.load(Ordering::SeqCst)
    }

    /// MIME tag attached to every produced chunk
    pub fn mime_type(&self) -> MimeType {
        self.mime
    }
}

/// The controller's select loop and session state
struct ControllerTask {
    session: RecordingSession,
    source: Box<dyn MediaSource>,
    stream: Option<Box<dyn CaptureStream>>,
    buffers: mpsc::UnboundedReceiver<Vec<f32>>,
    worker: EncodeWorker,
    replies: mpsc::UnboundedReceiver<Vec<u8>>,
    commands: mpsc::UnboundedReceiver<Command>,
    ticker: Interval,
    deadline: Pin<Box<Sleep>>,
    state_tx: watch::Sender<RecorderState>,
    bus: Arc<Mutex<EventBus>>,
    elapsed: Arc<AtomicU64>,
}

impl ControllerTask {
    fn new(
        source: Box<dyn MediaSource>,
        worker: EncodeWorker,
        replies: mpsc::UnboundedReceiver<Vec<u8>>,
        commands: mpsc::UnboundedReceiver<Command>,
        state_tx: watch::Sender<RecorderState>,
        bus: Arc<Mutex<EventBus>>,
        elapsed: Arc<AtomicU64>,
    ) -> Self {
        // Parked placeholders; both are rebuilt on every start and only
        // polled while recording.
        let (_, buffers) = mpsc::unbounded_channel();
        Self {
            session: RecordingSession::new(),
            source,
            stream: None,
            buffers,
            worker,
            replies,
            commands,
            ticker: time::interval(TICK_PERIOD),
            deadline: Box::pin(time::sleep(StdDuration::ZERO)),
            state_tx,
            bus,
            elapsed,
        }
    }

    async fn run(mut self) {
        loop {
            tokio::select! {
                biased;

                command = self.commands.recv() => match command {
                    Some(Command::Start { limit }) => self.handle_start(limit).await,
                    Some(Command::Stop) => self.handle_stop(StopReason::UserRequested),
                    Some(Command::RequestData) => self.handle_request_data(),
                    None => break,
                },

                _ = self.ticker.tick(), if self.session.is_recording() => {
                    self.handle_tick();
                }

                _ = &mut self.deadline, if self.session.is_recording() => {
                    tracing::info!("Capture limit reached, stopping");
                    self.handle_stop(StopReason::DeadlineExceeded);
                }

                Some(buffer) = self.buffers.recv(), if self.session.is_recording() => {
                    self.worker.encode(buffer);
                }

                Some(bytes) = self.replies.recv() => {
                    self.handle_reply(bytes);
                }
            }
        }

        // Handle dropped mid-session: still release the device.
        if let Some(mut stream) = self.stream.take() {
            stream.stop();
        }
        tracing::debug!("Recording controller exiting");
    }

    /// Begin a session: reset the counter, arm the tick, attach the
    /// pipeline, announce, then arm the deadline.
    async fn handle_start(&mut self, limit: Duration) {
        if let Err(e) = self.session.begin() {
            self.emit(RecorderEvent::Error(e.into()));
            return;
        }

        self.elapsed.store(0, Ordering::SeqCst);
        let _ = self.state_tx.send(RecorderState::Recording);

        let started_at = Instant::now();
        self.ticker = time::interval_at(started_at + TICK_PERIOD, TICK_PERIOD);

        let (buffer_tx, buffer_rx) = mpsc::unbounded_channel();
        match self.source.connect(buffer_tx).await {
            Ok(stream) => {
                self.stream = Some(stream);
                self.buffers = buffer_rx;
            }
            Err(e) => {
                // The pipeline never attached; hand the session back.
                let _ = self.session.end();
                let _ = self.state_tx.send(RecorderState::Inactive);
                self.emit(RecorderEvent::Error(e.into()));
                return;
            }
        }

        tracing::info!(limit = %limit, "Recording started");
        self.emit(RecorderEvent::Started);
        self.deadline.as_mut().reset(started_at + limit.as_std());
    }

    /// End a session. A user-requested stop flushes the encoder before the
    /// state flips and the device is released; the deadline path skips the
    /// flush and relies on data requests the caller already issued.
    fn handle_stop(&mut self, reason: StopReason) {
        if let Err(e) = self.session.ensure_recording(Operation::Stop) {
            self.emit(RecorderEvent::Error(e.into()));
            return;
        }

        // Forward whatever the pipeline delivered that the loop has not yet
        // seen, so nothing handed off before the stop is lost.
        while let Ok(buffer) = self.buffers.try_recv() {
            self.worker.encode(buffer);
        }

        match reason {
            StopReason::UserRequested => self.worker.dump(self.source.sample_rate()),
            StopReason::DeadlineExceeded => {}
        }

        let _ = self.session.end();
        let _ = self.state_tx.send(RecorderState::Inactive);

        if let Some(mut stream) = self.stream.take() {
            stream.stop();
        }

        tracing::info!(
            reason = ?reason,
            seconds = self.session.elapsed_seconds(),
            "Recording stopped"
        );
    }

    fn handle_request_data(&mut self) {
        if let Err(e) = self.session.ensure_recording(Operation::RequestData) {
            self.emit(RecorderEvent::Error(e.into()));
            return;
        }
        self.worker.dump(self.source.sample_rate());
    }

    fn handle_tick(&mut self) {
        let seconds = self.session.tick();
        self.elapsed.store(seconds, Ordering::SeqCst);
        self.emit(RecorderEvent::Duration(seconds));
    }

    /// Every worker reply becomes a `dataavailable` event; one arriving
    /// after the state has gone inactive marks end-of-stream, so a `stop`
    /// event follows immediately.
    fn handle_reply(&mut self, bytes: Vec<u8>) {
        tracing::debug!(bytes = bytes.len(), "Encoded chunk ready");
        let chunk = EncodedChunk::new(bytes, self.worker.mime_type());
        self.emit(RecorderEvent::DataAvailable(chunk));
        if self.session.is_inactive() {
            self.emit(RecorderEvent::Stopped);
        }
    }

    fn emit(&self, event: RecorderEvent) {
        lock_bus(&self.bus).dispatch(&event);
    }
}
