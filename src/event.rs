// src/event.rs

/// ===============================
/// Host-side input events
/// ===============================

/// A raw note event delivered by the host for the current block.
///
/// `offset` is the in-block sample position reported by the host. The
/// engine applies every input event before running block timing, so the
/// offset only matters for ordering within the slice passed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputEvent {
    NoteOn { note: u8, velocity: u8, offset: u32 },

    NoteOff { note: u8, offset: u32 },
}

impl InputEvent {
    /// Note-on with velocity 0 is a note-off.
    #[inline]
    pub fn normalized(self) -> Self {
        match self {
            InputEvent::NoteOn {
                note,
                velocity: 0,
                offset,
            } => InputEvent::NoteOff { note, offset },
            other => other,
        }
    }
}

/// ===============================
/// Engine-side output events
/// ===============================

/// Velocity of every emitted note-on.
pub const OUTPUT_VELOCITY: u8 = 127;

/// A note event emitted by the engine, placed at a sample offset within
/// the block that produced it.
///
/// These events:
/// - are RT-safe (`Copy`, no heap data)
/// - carry an offset in `0..num_samples`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputEvent {
    NoteOn { note: u8, velocity: u8, offset: u32 },

    NoteOff { note: u8, offset: u32 },
}

impl OutputEvent {
    #[inline]
    pub fn note(&self) -> u8 {
        match self {
            OutputEvent::NoteOn { note, .. } | OutputEvent::NoteOff { note, .. } => *note,
        }
    }

    #[inline]
    pub fn offset(&self) -> u32 {
        match self {
            OutputEvent::NoteOn { offset, .. } | OutputEvent::NoteOff { offset, .. } => *offset,
        }
    }

    #[inline]
    pub fn is_note_on(&self) -> bool {
        matches!(self, OutputEvent::NoteOn { .. })
    }
}

/// Events produced by one block: at most a note-off followed by a note-on.
///
/// Fixed capacity, so producing it never allocates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BlockOutput {
    events: [Option<OutputEvent>; 2],
    len: usize,
}

impl BlockOutput {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub(crate) fn push(&mut self, event: OutputEvent) {
        debug_assert!(self.len < self.events.len(), "BlockOutput overflow");
        if let Some(slot) = self.events.get_mut(self.len) {
            *slot = Some(event);
            self.len += 1;
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = &OutputEvent> + '_ {
        self.events.iter().flatten()
    }

    /// The note-on of this block, if one was emitted.
    pub fn note_on(&self) -> Option<OutputEvent> {
        self.iter().copied().find(OutputEvent::is_note_on)
    }

    /// The note-off of this block, if one was emitted.
    pub fn note_off(&self) -> Option<OutputEvent> {
        self.iter().copied().find(|e| !e.is_note_on())
    }
}

impl<'a> IntoIterator for &'a BlockOutput {
    type Item = &'a OutputEvent;
    type IntoIter = std::iter::Flatten<std::slice::Iter<'a, Option<OutputEvent>>>;

    fn into_iter(self) -> Self::IntoIter {
        self.events.iter().flatten()
    }
}
