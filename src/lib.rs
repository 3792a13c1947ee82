//! Reel - microphone capture with streaming encode
//!
//! This crate provides a recording controller that captures audio from the
//! microphone, hands sample batches to a background encoder, and surfaces the
//! session lifecycle as ordered events (`start`, `duration`, `dataavailable`,
//! `stop`, `error`).
//!
//! # Architecture
//!
//! The crate follows hexagonal (ports & adapters) architecture:
//!
//! - **Domain**: Core value objects, the session state machine, and errors
//! - **Application**: The recording controller, encode worker, event bus, and
//!   port interfaces (traits)
//! - **Infrastructure**: Adapter implementations (cpal capture, WAV/FLAC
//!   encoders, audio cues, XDG config)
//! - **CLI**: Command-line interface, argument parsing, and signal handling

pub mod application;
pub mod cli;
pub mod domain;
pub mod infrastructure;
