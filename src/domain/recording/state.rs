//! Recording session state machine

use std::fmt;

use crate::domain::error::{Operation, WrongState};

/// Recorder states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RecorderState {
    #[default]
    Inactive,
    Recording,
}

impl RecorderState {
    /// Get the string representation
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Inactive => "inactive",
            Self::Recording => "recording",
        }
    }
}

impl fmt::Display for RecorderState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Why a recording session ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// Explicit stop from the caller; the encoder is asked to flush first
    UserRequested,
    /// The auto-stop deadline fired; no final flush is requested
    DeadlineExceeded,
}

/// Recording session entity.
/// Manages state transitions and the per-session elapsed counter.
///
/// State machine:
///   INACTIVE -> RECORDING (begin)
///   RECORDING -> INACTIVE (end)
#[derive(Debug, Default)]
pub struct RecordingSession {
    state: RecorderState,
    elapsed_seconds: u64,
}

impl RecordingSession {
    /// Create a new session in inactive state
    pub fn new() -> Self {
        Self {
            state: RecorderState::Inactive,
            elapsed_seconds: 0,
        }
    }

    /// Get the current state
    pub fn state(&self) -> RecorderState {
        self.state
    }

    /// Check if currently inactive
    pub fn is_inactive(&self) -> bool {
        self.state == RecorderState::Inactive
    }

    /// Check if currently recording
    pub fn is_recording(&self) -> bool {
        self.state == RecorderState::Recording
    }

    /// Get elapsed whole seconds for the current session
    pub fn elapsed_seconds(&self) -> u64 {
        self.elapsed_seconds
    }

    /// Transition from INACTIVE to RECORDING, resetting the elapsed counter
    pub fn begin(&mut self) -> Result<(), WrongState> {
        if self.state != RecorderState::Inactive {
            return Err(WrongState {
                operation: Operation::Start,
                state: self.state,
            });
        }
        self.state = RecorderState::Recording;
        self.elapsed_seconds = 0;
        Ok(())
    }

    /// Transition from RECORDING to INACTIVE
    pub fn end(&mut self) -> Result<(), WrongState> {
        if self.state != RecorderState::Recording {
            return Err(WrongState {
                operation: Operation::Stop,
                state: self.state,
            });
        }
        self.state = RecorderState::Inactive;
        Ok(())
    }

    /// Require RECORDING for a non-transition operation
    pub fn ensure_recording(&self, operation: Operation) -> Result<(), WrongState> {
        if self.state != RecorderState::Recording {
            return Err(WrongState {
                operation,
                state: self.state,
            });
        }
        Ok(())
    }

    /// Advance the elapsed counter by one second and return the new value.
    /// Only meaningful while recording; the caller gates the tick source.
    pub fn tick(&mut self) -> u64 {
        self.elapsed_seconds += 1;
        self.elapsed_seconds
    }
}
