//! Thread-safe bridge between the control thread and the audio engine.
//!
//! This module provides the communication layer that allows a UI or host
//! parameter thread to safely interact with the real-time arpeggiator.
//!
//! # Architecture
//!
//! - **Control thread** owns [`ControlHandle`]
//! - **Audio thread** owns [`EngineHandle`] with the [`ArpEngine`]
//! - Configuration lives in shared atomics and is read once per block
//! - Note/reset commands travel over an MPSC channel
//! - Display state flows back through atomics
//!
//! # Usage
//!
//! ```ignore
//! let (control, mut engine) = create_bridge(48_000.0);
//!
//! // Control thread: change settings
//! control.set_speed(0.75);
//! control.set_mode(SequenceMode::Retake);
//!
//! // Audio thread: once per block
//! let output = engine.process_block(num_samples, &host_events);
//! ```

use std::sync::{
    Arc,
    atomic::{AtomicU8, AtomicU64, AtomicUsize, Ordering},
    mpsc::{self, Receiver, Sender},
};

use log::debug;

use crate::engine::{ArpEngine, EngineReadback};
use crate::event::{BlockOutput, InputEvent};
use crate::state::{ArpConfig, Command, ParamId, SequenceMode, SharedConfig};

/// Sentinel for "no value" in the optional readback fields.
const NONE: usize = usize::MAX;

/// Handle for the control thread.
///
/// All methods are safe to call from the main thread and never block on
/// the audio thread.
pub struct ControlHandle {
    /// Configuration read by the engine at the start of each block.
    config: Arc<SharedConfig>,

    /// Channel to send commands to the engine.
    command_tx: Sender<Command>,

    /// Shared readback state (updated by engine, read by UI).
    readback: Arc<SharedReadback>,
}

/// Handle for the audio thread containing the engine and communication channels.
pub struct EngineHandle {
    /// The arpeggiator (owned by audio thread).
    engine: ArpEngine,

    config: Arc<SharedConfig>,

    /// Channel to receive commands from the control thread.
    command_rx: Receiver<Command>,

    /// Shared readback state (written by engine).
    readback: Arc<SharedReadback>,
}

/// Lock-free shared state for engine -> UI readback.
struct SharedReadback {
    sounding_note: AtomicUsize,
    current_index: AtomicUsize,
    octave: AtomicU8,
    held_notes: AtomicUsize,
    step_length: AtomicUsize,
    sample_clock: AtomicUsize,
    blocks_processed: AtomicU64,
}

impl SharedReadback {
    fn new() -> Self {
        Self {
            sounding_note: AtomicUsize::new(NONE),
            current_index: AtomicUsize::new(NONE),
            octave: AtomicU8::new(1),
            held_notes: AtomicUsize::new(0),
            step_length: AtomicUsize::new(0),
            sample_clock: AtomicUsize::new(0),
            blocks_processed: AtomicU64::new(0),
        }
    }

    fn store(&self, state: &EngineReadback) {
        self.sounding_note.store(
            state.sounding_note.map_or(NONE, usize::from),
            Ordering::Relaxed,
        );
        self.current_index
            .store(state.current_index.unwrap_or(NONE), Ordering::Relaxed);
        self.octave.store(state.octave, Ordering::Relaxed);
        self.held_notes.store(state.held_notes, Ordering::Relaxed);
        self.step_length.store(state.step_length, Ordering::Relaxed);
        self.sample_clock.store(state.sample_clock, Ordering::Relaxed);
    }

    fn load(&self) -> EngineReadback {
        let optional = |value: usize| (value != NONE).then_some(value);
        EngineReadback {
            sounding_note: optional(self.sounding_note.load(Ordering::Relaxed))
                .map(|note| note as u8),
            current_index: optional(self.current_index.load(Ordering::Relaxed)),
            octave: self.octave.load(Ordering::Relaxed),
            held_notes: self.held_notes.load(Ordering::Relaxed),
            step_length: self.step_length.load(Ordering::Relaxed),
            sample_clock: self.sample_clock.load(Ordering::Relaxed),
        }
    }
}

/// Create a linked pair of handles for control and audio threads.
///
/// The engine starts with the default configuration, prepared at
/// `sample_rate`.
pub fn create_bridge(sample_rate: f64) -> (ControlHandle, EngineHandle) {
    create_bridge_with(sample_rate, ArpConfig::default())
}

/// Like [`create_bridge`], starting from `initial` instead of the defaults.
pub fn create_bridge_with(sample_rate: f64, initial: ArpConfig) -> (ControlHandle, EngineHandle) {
    let (cmd_tx, cmd_rx) = mpsc::channel();
    let config = Arc::new(SharedConfig::new(initial));
    let readback = Arc::new(SharedReadback::new());

    let mut engine = ArpEngine::new(sample_rate);
    engine.prepare(sample_rate);

    let control = ControlHandle {
        config: Arc::clone(&config),
        command_tx: cmd_tx,
        readback: Arc::clone(&readback),
    };

    let engine_handle = EngineHandle {
        engine,
        config,
        command_rx: cmd_rx,
        readback,
    };

    (control, engine_handle)
}

// ═══════════════════════════════════════════════════════════════════
// ControlHandle - Control Thread API
// ═══════════════════════════════════════════════════════════════════

impl ControlHandle {
    /// Send a command to the engine. Applied at the start of the next block.
    pub fn send(&self, cmd: Command) {
        // Receiver only goes away with the engine; nothing left to notify.
        let _ = self.command_tx.send(cmd);
    }

    // ───────────────────────────────────────────────────────────────
    // Configuration
    // ───────────────────────────────────────────────────────────────

    /// Returns the value actually stored.
    pub fn set_speed(&self, speed: f32) -> f32 {
        self.config.set_speed(speed)
    }

    /// Returns the value actually stored.
    pub fn set_note_duration(&self, duration: f32) -> f32 {
        self.config.set_note_duration(duration)
    }

    pub fn set_ascending(&self, ascending: bool) {
        self.config.set_ascending(ascending);
    }

    pub fn set_mode(&self, mode: SequenceMode) {
        self.config.set_mode(mode);
    }

    /// Returns the span actually stored.
    pub fn set_octave_span(&self, span: i32) -> u8 {
        self.config.set_octave_span(span)
    }

    /// Set a parameter by id. Returns `None` for an unknown id.
    pub fn set_param(&self, id: ParamId, value: f32) -> Option<f32> {
        self.config.set_param(id, value)
    }

    pub fn param(&self, id: ParamId) -> Option<f32> {
        self.config.param(id)
    }

    /// Current configuration.
    pub fn config(&self) -> ArpConfig {
        self.config.snapshot()
    }

    // ───────────────────────────────────────────────────────────────
    // Notes
    // ───────────────────────────────────────────────────────────────

    pub fn note_on(&self, note: u8) {
        self.send(Command::NoteOn { note });
    }

    pub fn note_off(&self, note: u8) {
        self.send(Command::NoteOff { note });
    }

    pub fn all_notes_off(&self) {
        self.send(Command::AllNotesOff);
    }

    pub fn reset(&self) {
        self.send(Command::Reset);
    }

    // ───────────────────────────────────────────────────────────────
    // Readback
    // ───────────────────────────────────────────────────────────────

    /// Engine state as of the last processed block.
    pub fn readback(&self) -> EngineReadback {
        self.readback.load()
    }

    /// Number of blocks the engine has processed.
    pub fn blocks_processed(&self) -> u64 {
        self.readback.blocks_processed.load(Ordering::Relaxed)
    }
}

// ═══════════════════════════════════════════════════════════════════
// EngineHandle - Audio Thread API
// ═══════════════════════════════════════════════════════════════════

impl EngineHandle {
    /// Drain pending commands.
    ///
    /// Call at the start of each audio block. Returns how many were applied.
    pub fn process_commands(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(cmd) = self.command_rx.try_recv() {
            match cmd {
                Command::NoteOn { note } => self.engine.note_on(note),
                Command::NoteOff { note } => self.engine.note_off(note),
                Command::AllNotesOff => self.engine.all_notes_off(),
                Command::Reset => self.engine.reset(),
            }
            applied += 1;
        }
        applied
    }

    /// Process one audio block.
    ///
    /// Drains commands, reads the configuration once, runs the engine and
    /// publishes readback.
    pub fn process_block(&mut self, num_samples: usize, events: &[InputEvent]) -> BlockOutput {
        self.process_commands();

        let config = self.config.snapshot();
        let output = self.engine.process_block(num_samples, events, &config);

        self.readback
            .blocks_processed
            .fetch_add(1, Ordering::Relaxed);
        self.sync_readback();
        output
    }

    /// Reconfigure for a new sample rate.
    pub fn prepare(&mut self, sample_rate: f64) {
        debug!("Bridge prepare at {} Hz", sample_rate);
        self.engine.prepare(sample_rate);
        self.sync_readback();
    }

    /// Clear held notes and the sounding note.
    pub fn reset(&mut self) {
        self.engine.reset();
        self.sync_readback();
    }

    /// Publish engine state to the control thread.
    fn sync_readback(&self) {
        self.readback.store(&self.engine.readback());
    }

    pub fn engine(&self) -> &ArpEngine {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut ArpEngine {
        &mut self.engine
    }
}
