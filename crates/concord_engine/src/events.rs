//! # Lifecycle Payloads
//!
//! Channels the engine itself dispatches, in this order:
//!
//! ```text
//! startup   Initialize            dependencies first, once
//! frame     Update                dependencies first
//!           (buffered drains)     e.g. LogMessage
//!           StartFrame
//!           Draw
//!           EndFrame
//! shutdown  Shutdown              dependents first, once
//! ```
//!
//! `ShutdownRequested` may be dispatched by anyone to end the frame loop.

use std::sync::Arc;

use concord_core::Event;

use crate::config::EngineConfig;

/// Sent once at startup. Modules set themselves up here.
#[derive(Clone, Debug)]
pub struct Initialize {
    /// Configuration the engine was started with.
    pub config: Arc<EngineConfig>,
}

impl Event for Initialize {
    const CHANNEL: &'static str = "initialize";
}

/// Sent once when the engine stops, in reverse dependency order.
#[derive(Clone, Copy, Debug, Default)]
pub struct Shutdown;

impl Event for Shutdown {
    const CHANNEL: &'static str = "shutdown";
}

/// Asks the engine to leave the frame loop after the current frame.
#[derive(Clone, Copy, Debug, Default)]
pub struct ShutdownRequested;

impl Event for ShutdownRequested {
    const CHANNEL: &'static str = "shutdown_requested";
}

/// First event of every frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Update {
    /// Seconds since the previous frame, clamped.
    pub dt: f64,
    /// Frames per second averaged over recent frames.
    pub fps: f64,
    /// Zero-based frame index.
    pub frame: u64,
}

impl Event for Update {
    const CHANNEL: &'static str = "update";
}

/// Marks the start of rendering for a frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StartFrame {
    /// Zero-based frame index.
    pub frame: u64,
}

impl Event for StartFrame {
    const CHANNEL: &'static str = "start_frame";
}

/// Modules submit their draw work here.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Draw {
    /// Zero-based frame index.
    pub frame: u64,
}

impl Event for Draw {
    const CHANNEL: &'static str = "draw";
}

/// Last event of every frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EndFrame {
    /// Zero-based frame index.
    pub frame: u64,
}

impl Event for EndFrame {
    const CHANNEL: &'static str = "end_frame";
}

/// A log line for in-engine consumers such as a debug overlay.
///
/// Meant for buffered delivery: producers `enqueue`, consumers drain once per
/// frame. Pre-create a consumer's buffer to capture lines emitted before it
/// subscribes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LogMessage {
    /// Severity.
    pub level: tracing::Level,
    /// Formatted message.
    pub text: String,
}

impl LogMessage {
    /// Creates a log message.
    #[must_use]
    pub fn new(level: tracing::Level, text: impl Into<String>) -> Self {
        Self {
            level,
            text: text.into(),
        }
    }
}

impl Event for LogMessage {
    const CHANNEL: &'static str = "log_message";
}
