// src/octave.rs

/// Semitones added (or removed) per octave of transposition.
pub const SEMITONES_PER_OCTAVE: i16 = 12;

/// Tracks which octave of the configured span is currently applied.
///
/// The octave is 1-based and always within `1..=span`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OctaveCycler {
    octave: u8,
}

impl OctaveCycler {
    pub fn new() -> Self {
        Self { octave: 1 }
    }

    /// Current octave, `1..=span`.
    #[inline]
    pub fn octave(&self) -> u8 {
        self.octave
    }

    /// Move to the next octave, wrapping to 1 after `span`.
    ///
    /// Call exactly once per pattern wrap.
    #[inline]
    pub fn advance(&mut self, span: u8) {
        self.octave = if self.octave >= span { 1 } else { self.octave + 1 };
    }

    /// Pull the octave back to 1 if the span shrank below it.
    #[inline]
    pub fn constrain(&mut self, span: u8) {
        if self.octave > span.max(1) {
            self.octave = 1;
        }
    }

    /// Semitone offset for the current octave: `(octave - 1) * 12`, negated
    /// when descending.
    #[inline]
    pub fn transpose(&self, ascending: bool) -> i16 {
        let shift = (self.octave as i16 - 1) * SEMITONES_PER_OCTAVE;
        if ascending { shift } else { -shift }
    }

    pub fn reset(&mut self) {
        self.octave = 1;
    }
}

impl Default for OctaveCycler {
    fn default() -> Self {
        Self::new()
    }
}

/// Apply `semitones` to `note`, folding back by whole octaves into 0..=127.
#[inline]
pub fn transpose_note(note: u8, semitones: i16) -> u8 {
    let mut pitch = note as i16 + semitones;
    while pitch > 127 {
        pitch -= SEMITONES_PER_OCTAVE;
    }
    while pitch < 0 {
        pitch += SEMITONES_PER_OCTAVE;
    }
    pitch as u8
}
