// src/engine.rs

use log::{debug, warn};

use crate::clock::{SequencerClock, try_step_length};
use crate::event::{BlockOutput, InputEvent, OUTPUT_VELOCITY, OutputEvent};
use crate::note_pool::HeldNotePool;
use crate::octave::{OctaveCycler, transpose_note};
use crate::pattern::{self, PatternState};
use crate::state::ArpConfig;

/// Real-time arpeggiator engine.
///
/// This struct runs exclusively on the audio thread.
/// It must not allocate or lock.
/// It is strictly monophonic: at most one emitted note sounds at a time.
pub struct ArpEngine {
    sample_rate: f64,

    /// Held source notes
    pool: HeldNotePool,

    /// Step scheduler
    clock: SequencerClock,

    /// Position within the pool
    pattern: PatternState,

    octave: OctaveCycler,

    /// Last emitted note-on without a matching note-off
    sounding: Option<u8>,

    /// Note cut by `reset`/`prepare`, released at the start of the next block
    pending_release: Option<u8>,

    /// Step length used by the most recent block
    step_length: usize,

    /// Whether the last computed step length was degenerate
    degenerate: bool,
}

/// Snapshot of engine state for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineReadback {
    pub sounding_note: Option<u8>,
    pub current_index: Option<usize>,
    pub octave: u8,
    pub held_notes: usize,
    pub step_length: usize,
    pub sample_clock: usize,
}

impl ArpEngine {
    pub fn new(sample_rate: f64) -> Self {
        Self {
            sample_rate,
            pool: HeldNotePool::new(),
            clock: SequencerClock::new(),
            pattern: PatternState::new(),
            octave: OctaveCycler::new(),
            sounding: None,
            pending_release: None,
            step_length: 1,
            degenerate: false,
        }
    }

    /// Set the sample rate and reset all sequencing state.
    ///
    /// Call before processing starts and whenever the host reconfigures.
    pub fn prepare(&mut self, sample_rate: f64) {
        debug!("Preparing arpeggiator at {} Hz", sample_rate);
        self.sample_rate = sample_rate;
        self.degenerate = false;
        self.clear();
        self.clock.reset();
        self.pattern = PatternState::new();
        self.octave.reset();
    }

    /// Clear held notes and the sounding note. Configuration is untouched.
    ///
    /// The sounding note is released at offset 0 of the next block.
    pub fn reset(&mut self) {
        debug!("Resetting arpeggiator ({} held notes)", self.pool.size());
        self.clear();
    }

    fn clear(&mut self) {
        self.pool.clear();
        self.pattern.clear_position();
        if let Some(note) = self.sounding.take() {
            self.pending_release = Some(note);
        }
    }

    /// Hold a note. Pitches above 127 are ignored.
    #[inline]
    pub fn note_on(&mut self, note: u8) {
        self.pool.note_on(note);
    }

    /// Release a held note. The arpeggio keeps running on the remainder.
    #[inline]
    pub fn note_off(&mut self, note: u8) {
        self.pool.note_off(note);
    }

    /// Release every held note.
    pub fn all_notes_off(&mut self) {
        self.pool.clear();
    }

    /// Apply a host note event immediately.
    ///
    /// `process_block` does this for the events passed to it; callers that
    /// cannot build a slice (FFI) may apply events first and pass none.
    #[inline]
    pub fn handle_event(&mut self, event: &InputEvent) {
        match event.normalized() {
            InputEvent::NoteOn { note, .. } => self.note_on(note),
            InputEvent::NoteOff { note, .. } => self.note_off(note),
        }
    }

    /// Process one audio block.
    ///
    /// Called once per audio block from the audio callback.
    /// Input events are applied first, then the clock advances; if a step
    /// boundary falls in this block the previous note is released and the
    /// next one started at the boundary offset.
    pub fn process_block(
        &mut self,
        num_samples: usize,
        events: &[InputEvent],
        config: &ArpConfig,
    ) -> BlockOutput {
        let mut output = BlockOutput::new();

        if let Some(note) = self.pending_release.take() {
            output.push(OutputEvent::NoteOff { note, offset: 0 });
        }

        for event in events {
            self.handle_event(event);
        }

        if self.pool.is_empty() {
            self.pattern.clear_position();
        }

        self.octave.constrain(config.octave_span);
        self.step_length = self.resolve_step_length(config.speed);

        if let Some(offset) = self.clock.advance(num_samples, self.step_length) {
            self.step(offset as u32, config, &mut output);
        }

        output
    }

    /// Execute one step at `offset`.
    #[inline]
    fn step(&mut self, offset: u32, config: &ArpConfig, output: &mut BlockOutput) {
        if let Some(note) = self.sounding.take() {
            output.push(OutputEvent::NoteOff { note, offset });
        }

        let Some(step) = pattern::select(
            &self.pattern,
            config.mode,
            config.ascending,
            self.pool.size(),
        ) else {
            return;
        };

        self.pattern = step.next;
        if step.advance_octave {
            self.octave.advance(config.octave_span);
        }

        let note = transpose_note(
            self.pool.at(step.index),
            self.octave.transpose(config.ascending),
        );
        output.push(OutputEvent::NoteOn {
            note,
            velocity: OUTPUT_VELOCITY,
            offset,
        });
        self.sounding = Some(note);
    }

    /// Step length for `speed`, floored to one sample.
    ///
    /// Warns once on entering the degenerate state, not every block.
    fn resolve_step_length(&mut self, speed: f32) -> usize {
        match try_step_length(self.sample_rate, speed) {
            Ok(samples) => {
                self.degenerate = false;
                samples
            }
            Err(err) => {
                if !self.degenerate {
                    warn!("{}", err);
                    self.degenerate = true;
                }
                1
            }
        }
    }

    /// Current engine state for display.
    pub fn readback(&self) -> EngineReadback {
        EngineReadback {
            sounding_note: self.sounding,
            current_index: self.pattern.current_index,
            octave: self.octave.octave(),
            held_notes: self.pool.size(),
            step_length: self.step_length,
            sample_clock: self.clock.sample_clock(),
        }
    }

    /// Held notes in arrival order.
    pub fn held_notes(&self) -> &[u8] {
        self.pool.notes()
    }

    #[inline]
    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }
}
