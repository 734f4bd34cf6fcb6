// src/note_pool.rs

use crate::error::{ArpError, ArpResult};

/// Number of distinct MIDI pitches, and so the most notes the pool can hold.
pub const MAX_HELD_NOTES: usize = 128;

/// The set of currently held source pitches, in arrival order.
///
/// Responsibilities:
/// - keep one entry per held pitch
/// - preserve first-on order across removals
///
/// Does NOT:
/// - decide what plays next
/// - allocate during processing (capacity is reserved up front)
#[derive(Debug, Clone)]
pub struct HeldNotePool {
    notes: Vec<u8>,
}

impl HeldNotePool {
    pub fn new() -> Self {
        Self {
            notes: Vec::with_capacity(MAX_HELD_NOTES),
        }
    }

    /// Hold a pitch. No-op if it is already held or above 127.
    ///
    /// Returns `true` if the pool changed.
    pub fn note_on(&mut self, note: u8) -> bool {
        if note as usize >= MAX_HELD_NOTES || self.notes.contains(&note) {
            return false;
        }
        // Pitches are 0..=127 and unique, so capacity is never exceeded.
        self.notes.push(note);
        true
    }

    /// Release a pitch. No-op if it is not held.
    ///
    /// Returns `true` if the pool changed.
    pub fn note_off(&mut self, note: u8) -> bool {
        match self.notes.iter().position(|&n| n == note) {
            Some(index) => {
                self.notes.remove(index);
                true
            }
            None => false,
        }
    }

    /// Release every pitch.
    pub fn clear(&mut self) {
        self.notes.clear();
    }

    #[inline]
    pub fn size(&self) -> usize {
        self.notes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    /// Pitch at `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index >= size()`. Callers keep indices valid.
    #[inline]
    pub fn at(&self, index: usize) -> u8 {
        self.notes[index]
    }

    /// Checked variant of [`at`](Self::at).
    pub fn try_at(&self, index: usize) -> ArpResult<u8> {
        self.notes
            .get(index)
            .copied()
            .ok_or(ArpError::InvalidIndex {
                index,
                len: self.notes.len(),
            })
    }

    /// Held pitches in arrival order.
    pub fn notes(&self) -> &[u8] {
        &self.notes
    }
}

impl Default for HeldNotePool {
    fn default() -> Self {
        Self::new()
    }
}
