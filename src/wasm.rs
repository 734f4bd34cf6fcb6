//! WebAssembly bindings via wasm-bindgen for browser integration.
//!
//! This module is only compiled when the `web` feature is enabled.
//!
//! # Usage
//!
//! Build with wasm-pack:
//! ```bash
//! wasm-pack build --target web --features web
//! ```
//!
//! # JavaScript Example
//!
//! ```javascript
//! import init, { arpeggiator_init, ArpeggiatorWeb, mode_retake } from './arpeggiator.js';
//!
//! await init();
//! arpeggiator_init();
//!
//! const arp = new ArpeggiatorWeb(sampleRate);
//! arp.set_mode(mode_retake());
//!
//! // In the AudioWorklet, per block. Events are [kind, note, velocity, offset] quadruples.
//! const out = arp.process_block(128, new Uint32Array([1, 60, 100, 0]));
//! ```

use wasm_bindgen::prelude::*;

use crate::bridge::{ControlHandle, EngineHandle, create_bridge};
use crate::engine::EngineReadback;
use crate::event::{InputEvent, OutputEvent};
use crate::state::{SequenceMode, params};

/// Packed event kind for a note-off.
const KIND_NOTE_OFF: u32 = 0;
/// Packed event kind for a note-on.
const KIND_NOTE_ON: u32 = 1;

// ═══════════════════════════════════════════════════════════════════════════
// Initialization
// ═══════════════════════════════════════════════════════════════════════════

/// Initialize the wasm module. Call this once before using any other functions.
/// Sets up panic hooks and console logging.
#[wasm_bindgen]
pub fn arpeggiator_init() {
    console_error_panic_hook::set_once();
    console_log::init_with_level(log::Level::Debug).ok();
}

// ═══════════════════════════════════════════════════════════════════════════
// Constants
// ═══════════════════════════════════════════════════════════════════════════

#[wasm_bindgen]
pub fn mode_linear() -> u8 {
    SequenceMode::Linear.as_u8()
}

#[wasm_bindgen]
pub fn mode_randomize() -> u8 {
    SequenceMode::Randomize.as_u8()
}

#[wasm_bindgen]
pub fn mode_retake() -> u8 {
    SequenceMode::Retake.as_u8()
}

// ═══════════════════════════════════════════════════════════════════════════
// Parameter Registry
// ═══════════════════════════════════════════════════════════════════════════

#[wasm_bindgen]
pub fn param_name(id: u32) -> Option<String> {
    params::info(id).map(|info| info.name)
}

#[wasm_bindgen]
pub fn param_short_name(id: u32) -> Option<String> {
    params::info(id).map(|info| info.short_name)
}

/// Display string for a plain parameter value, e.g. "50 %".
#[wasm_bindgen]
pub fn param_format(id: u32, value: f32) -> Option<String> {
    params::info(id).map(|info| info.format(value))
}

#[wasm_bindgen]
pub fn param_normalize(id: u32, value: f32) -> f32 {
    params::info(id).map_or(f32::NAN, |info| info.normalize(value))
}

#[wasm_bindgen]
pub fn param_denormalize(id: u32, normalized: f32) -> f32 {
    params::info(id).map_or(f32::NAN, |info| info.denormalize(normalized))
}

// ═══════════════════════════════════════════════════════════════════════════
// Readback
// ═══════════════════════════════════════════════════════════════════════════

/// Engine state for UI display. `-1` means none.
#[wasm_bindgen]
#[derive(Clone, Copy)]
pub struct WebReadback {
    pub sounding_note: i32,
    pub current_index: i32,
    pub octave: u8,
    pub held_notes: u32,
    pub step_length: u32,
}

impl From<EngineReadback> for WebReadback {
    fn from(r: EngineReadback) -> Self {
        Self {
            sounding_note: r.sounding_note.map_or(-1, i32::from),
            current_index: r.current_index.map_or(-1, |i| i as i32),
            octave: r.octave,
            held_notes: r.held_notes as u32,
            step_length: r.step_length as u32,
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Arpeggiator
// ═══════════════════════════════════════════════════════════════════════════

/// Both sides of the bridge in one object.
///
/// An AudioWorklet runs control messages and processing on the same
/// thread, so the split handles are kept together here.
#[wasm_bindgen]
pub struct ArpeggiatorWeb {
    control: ControlHandle,
    engine: EngineHandle,
}

#[wasm_bindgen]
impl ArpeggiatorWeb {
    #[wasm_bindgen(constructor)]
    pub fn new(sample_rate: f64) -> ArpeggiatorWeb {
        let (control, engine) = create_bridge(sample_rate);
        Self { control, engine }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Processing
    // ─────────────────────────────────────────────────────────────────────────

    /// Process one block.
    ///
    /// `events` holds host events as `[kind, note, velocity, offset]`
    /// quadruples (kind 1 = note-on, 0 = note-off); the result uses the same
    /// packing. Notes queued with `note_on`/`note_off` apply first.
    pub fn process_block(&mut self, num_samples: u32, events: &[u32]) -> Vec<u32> {
        let input: Vec<InputEvent> = events.chunks_exact(4).filter_map(unpack).collect();
        let output = self.engine.process_block(num_samples as usize, &input);

        let mut packed = Vec::with_capacity(output.len() * 4);
        for event in &output {
            packed.extend_from_slice(&pack(event));
        }
        packed
    }

    pub fn prepare(&mut self, sample_rate: f64) {
        self.engine.prepare(sample_rate);
    }

    pub fn reset(&mut self) {
        self.engine.reset();
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Configuration
    // ─────────────────────────────────────────────────────────────────────────

    pub fn set_speed(&self, speed: f32) -> f32 {
        self.control.set_speed(speed)
    }

    pub fn set_note_duration(&self, duration: f32) -> f32 {
        self.control.set_note_duration(duration)
    }

    pub fn set_ascending(&self, ascending: bool) {
        self.control.set_ascending(ascending);
    }

    pub fn set_mode(&self, mode: u8) {
        self.control.set_mode(SequenceMode::from_u8(mode));
    }

    pub fn set_octave_span(&self, span: i32) -> u8 {
        self.control.set_octave_span(span)
    }

    /// Set a parameter by id. Returns the stored value, or NaN for an unknown id.
    pub fn set_param(&self, id: u32, value: f32) -> f32 {
        self.control.set_param(id, value).unwrap_or(f32::NAN)
    }

    pub fn get_param(&self, id: u32) -> f32 {
        self.control.param(id).unwrap_or(f32::NAN)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Notes (on-screen keyboard)
    // ─────────────────────────────────────────────────────────────────────────

    pub fn note_on(&self, note: u8) {
        self.control.note_on(note & 0x7f);
    }

    pub fn note_off(&self, note: u8) {
        self.control.note_off(note & 0x7f);
    }

    pub fn all_notes_off(&self) {
        self.control.all_notes_off();
    }

    pub fn get_readback(&self) -> WebReadback {
        self.control.readback().into()
    }
}

fn unpack(event: &[u32]) -> Option<InputEvent> {
    let note = (event[1] & 0x7f) as u8;
    let offset = event[3];
    match event[0] {
        KIND_NOTE_ON => Some(InputEvent::NoteOn {
            note,
            velocity: event[2].min(127) as u8,
            offset,
        }),
        KIND_NOTE_OFF => Some(InputEvent::NoteOff { note, offset }),
        _ => None,
    }
}

fn pack(event: &OutputEvent) -> [u32; 4] {
    match *event {
        OutputEvent::NoteOn {
            note,
            velocity,
            offset,
        } => [KIND_NOTE_ON, note as u32, velocity as u32, offset],
        OutputEvent::NoteOff { note, offset } => [KIND_NOTE_OFF, note as u32, 0, offset],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unpack_clamps_velocity() {
        for raw in [127, 128, 200, u32::MAX] {
            let event = unpack(&[KIND_NOTE_ON, 60, raw, 5]);
            assert_eq!(
                event,
                Some(InputEvent::NoteOn {
                    note: 60,
                    velocity: 127,
                    offset: 5
                })
            );
        }

        let event = unpack(&[KIND_NOTE_ON, 60, 64, 0]);
        assert_eq!(
            event,
            Some(InputEvent::NoteOn {
                note: 60,
                velocity: 64,
                offset: 0
            })
        );
        assert_eq!(unpack(&[7, 60, 64, 0]), None);
    }

    #[test]
    fn test_param_registry() {
        assert_eq!(param_format(params::SPEED, 0.5).as_deref(), Some("50 %"));
        assert_eq!(param_short_name(params::SEQUENCE_MODE).as_deref(), Some("Sequ"));
        assert_eq!(param_name(params::OCTAVE_SPAN).as_deref(), Some("Octaves"));
        assert_eq!(param_normalize(params::OCTAVE_SPAN, 3.0), 1.0);
        assert_eq!(param_denormalize(params::NOTE_DURATION, 0.0), 0.25);
        assert_eq!(param_name(99), None);
        assert!(param_normalize(99, 0.0).is_nan());
    }
}
