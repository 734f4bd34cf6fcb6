// src/lib.rs
//
// Library entry point for Rust, FFI (iOS/Swift) and WebAssembly consumers.

mod bridge;
mod clock;
mod engine;
mod error;
mod event;
mod note_pool;
mod octave;
mod pattern;
mod state;

pub mod ffi;

#[cfg(feature = "web")]
mod wasm;

// Re-export key types for Rust consumers
pub use bridge::{ControlHandle, EngineHandle, create_bridge, create_bridge_with};
pub use clock::{SequencerClock, step_length, try_step_length};
pub use engine::{ArpEngine, EngineReadback};
pub use error::{ArpError, ArpResult};
pub use event::{BlockOutput, InputEvent, OUTPUT_VELOCITY, OutputEvent};
pub use note_pool::{HeldNotePool, MAX_HELD_NOTES};
pub use octave::{OctaveCycler, SEMITONES_PER_OCTAVE, transpose_note};
pub use pattern::{PatternState, Step, select};
pub use state::{
    ArpConfig, Command, MAX_OCTAVE_SPAN, MIN_OCTAVE_SPAN, ParamId, ParamInfo, ParamUnit,
    SequenceMode, SharedConfig, params,
};
