// src/state/config.rs
//
// Arpeggiator configuration.
//
// The control thread owns the values and writes them into `SharedConfig`.
// The audio thread takes one `ArpConfig` snapshot per block and never
// writes back. Every field lives in its own atomic, so a snapshot can mix
// old and new fields across a concurrent edit but never observes a torn
// scalar.

use std::sync::atomic::{AtomicBool, AtomicU8, AtomicU32, Ordering};

use log::warn;

use super::param_info::{ParamId, params};
use crate::error::ArpError;

/// Pattern selection mode. Exactly one is active at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SequenceMode {
    /// Step through the pool in order.
    #[default]
    Linear,
    /// Alternate between the first held note and a walking index.
    Randomize,
    /// Jump two, step back one.
    Retake,
}

impl SequenceMode {
    pub fn name(&self) -> &'static str {
        match self {
            SequenceMode::Linear => "Linear",
            SequenceMode::Randomize => "Randomize",
            SequenceMode::Retake => "Retake",
        }
    }

    /// Wire tag used by the atomic store and the host surfaces.
    #[inline]
    pub fn as_u8(self) -> u8 {
        match self {
            SequenceMode::Linear => 0,
            SequenceMode::Randomize => 1,
            SequenceMode::Retake => 2,
        }
    }

    /// Decode a tag; unknown tags saturate to `Retake`.
    #[inline]
    pub fn from_u8(tag: u8) -> Self {
        match tag {
            0 => SequenceMode::Linear,
            1 => SequenceMode::Randomize,
            _ => SequenceMode::Retake,
        }
    }
}

/// Lowest and highest configurable octave span.
pub const MIN_OCTAVE_SPAN: u8 = 1;
pub const MAX_OCTAVE_SPAN: u8 = 3;

/// One block's view of the configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArpConfig {
    /// 0.0 (slowest) ..= 1.0 (fastest)
    pub speed: f32,

    /// First-note duration multiplier, 0.25 ..= 4.0. Not applied to timing.
    pub note_duration: f32,

    /// Walk the pool upwards (and transpose octaves up) when true.
    pub ascending: bool,

    pub mode: SequenceMode,

    /// Number of octaves cycled through, 1 ..= 3.
    pub octave_span: u8,
}

impl Default for ArpConfig {
    fn default() -> Self {
        Self {
            speed: 0.5,
            note_duration: 1.0,
            ascending: true,
            mode: SequenceMode::Linear,
            octave_span: 1,
        }
    }
}

/// Lock-free configuration shared between control and audio threads.
///
/// Single writer (control thread), single reader (audio thread).
/// Floats are stored as bits since std has no `AtomicF32`.
pub struct SharedConfig {
    speed_bits: AtomicU32,
    note_duration_bits: AtomicU32,
    ascending: AtomicBool,
    mode: AtomicU8,
    octave_span: AtomicU8,
}

impl SharedConfig {
    pub fn new(initial: ArpConfig) -> Self {
        let shared = Self {
            speed_bits: AtomicU32::new(0),
            note_duration_bits: AtomicU32::new(0),
            ascending: AtomicBool::new(true),
            mode: AtomicU8::new(0),
            octave_span: AtomicU8::new(MIN_OCTAVE_SPAN),
        };
        shared.store(initial);
        shared
    }

    /// Load every field once.
    ///
    /// Audio-thread-safe, lock-free.
    #[inline]
    pub fn snapshot(&self) -> ArpConfig {
        ArpConfig {
            speed: f32::from_bits(self.speed_bits.load(Ordering::Relaxed)),
            note_duration: f32::from_bits(self.note_duration_bits.load(Ordering::Relaxed)),
            ascending: self.ascending.load(Ordering::Relaxed),
            mode: SequenceMode::from_u8(self.mode.load(Ordering::Relaxed)),
            octave_span: self.octave_span.load(Ordering::Relaxed),
        }
    }

    /// Store a whole configuration, clamping each field.
    pub fn store(&self, config: ArpConfig) {
        self.set_speed(config.speed);
        self.set_note_duration(config.note_duration);
        self.set_ascending(config.ascending);
        self.set_mode(config.mode);
        self.set_octave_span(config.octave_span as i32);
    }

    /// Returns the value actually stored.
    pub fn set_speed(&self, speed: f32) -> f32 {
        let speed = clamp_param(params::SPEED, speed);
        self.speed_bits.store(speed.to_bits(), Ordering::Relaxed);
        speed
    }

    /// Returns the value actually stored.
    pub fn set_note_duration(&self, duration: f32) -> f32 {
        let duration = clamp_param(params::NOTE_DURATION, duration);
        self.note_duration_bits
            .store(duration.to_bits(), Ordering::Relaxed);
        duration
    }

    pub fn set_ascending(&self, ascending: bool) {
        self.ascending.store(ascending, Ordering::Relaxed);
    }

    pub fn set_mode(&self, mode: SequenceMode) {
        self.mode.store(mode.as_u8(), Ordering::Relaxed);
    }

    /// Returns the span actually stored.
    pub fn set_octave_span(&self, span: i32) -> u8 {
        let span = clamp_param(params::OCTAVE_SPAN, span as f32) as u8;
        self.octave_span.store(span, Ordering::Relaxed);
        span
    }

    /// Set any parameter from a plain (denormalized) host value.
    ///
    /// Returns the value actually stored, or `None` for an unknown id.
    pub fn set_param(&self, id: ParamId, value: f32) -> Option<f32> {
        match id {
            params::SPEED => Some(self.set_speed(value)),
            params::NOTE_DURATION => Some(self.set_note_duration(value)),
            params::ASCENDING => {
                let ascending = value >= 0.5;
                self.set_ascending(ascending);
                Some(if ascending { 1.0 } else { 0.0 })
            }
            params::SEQUENCE_MODE => {
                let tag = clamp_param(params::SEQUENCE_MODE, value.round()) as u8;
                self.set_mode(SequenceMode::from_u8(tag));
                Some(tag as f32)
            }
            params::OCTAVE_SPAN => Some(self.set_octave_span(value.round() as i32) as f32),
            _ => None,
        }
    }

    /// Read any parameter back as a plain host value.
    pub fn param(&self, id: ParamId) -> Option<f32> {
        let config = self.snapshot();
        match id {
            params::SPEED => Some(config.speed),
            params::NOTE_DURATION => Some(config.note_duration),
            params::ASCENDING => Some(if config.ascending { 1.0 } else { 0.0 }),
            params::SEQUENCE_MODE => Some(config.mode.as_u8() as f32),
            params::OCTAVE_SPAN => Some(config.octave_span as f32),
            _ => None,
        }
    }
}

impl Default for SharedConfig {
    fn default() -> Self {
        Self::new(ArpConfig::default())
    }
}

/// Clamp to the parameter's range, warning when the input was out of range.
fn clamp_param(id: ParamId, value: f32) -> f32 {
    let Some(info) = params::info(id) else {
        return value;
    };
    match info.check(value) {
        Ok(value) => value,
        Err(err @ ArpError::ConfigOutOfRange { clamped, .. }) => {
            warn!("{}", err);
            clamped
        }
        Err(_) => info.clamp(value),
    }
}
