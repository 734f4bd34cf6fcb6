// Commands from the control thread to the engine.
//
// Configuration travels through `SharedConfig` atomics. Commands cover
// the things that are events rather than values: notes played from an
// on-screen keyboard and panic/reset requests.

/// A command from the control thread to the engine.
///
/// Commands are:
/// - Immutable once created
/// - Drained by the engine at the start of the next block
/// - Applied before that block's host events and timing logic
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Hold a note in the pool.
    NoteOn { note: u8 },

    /// Release a held note.
    NoteOff { note: u8 },

    /// Release every held note. The sounding note stops at the next step.
    AllNotesOff,

    /// Clear the pool and the sounding note, keeping configuration.
    Reset,
}
