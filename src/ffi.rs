// C-compatible FFI bindings for Swift/iOS and plugin-wrapper integration.
//
// Safety requirements:
// - All pointers must be non-null unless documented otherwise
// - All handles must be created by this module and not fabricated
// - Caller must call the corresponding _destroy function for each _create
// - `ArpProcessor` functions belong to the audio thread, `ArpControl`
//   functions to any single control thread

use std::ffi::c_char;

use log::{debug, error};

use crate::bridge::{ControlHandle, EngineHandle, create_bridge};
use crate::engine::EngineReadback;
use crate::event::{InputEvent, OutputEvent};
use crate::state::{ArpConfig, ParamUnit, SequenceMode, params};

#[cfg(feature = "ios")]
use log::LevelFilter;
#[cfg(feature = "ios")]
use oslog::OsLogger;

// Logger subsystem identifier
#[cfg(feature = "ios")]
const LOG_SUBSYSTEM: &str = "com.arpeggiator.engine";

/// `ArpMidiEvent::kind` for a note-off.
pub const ARP_EVENT_NOTE_OFF: u8 = 0;
/// `ArpMidiEvent::kind` for a note-on.
pub const ARP_EVENT_NOTE_ON: u8 = 1;

// ═══════════════════════════════════════════════════════════════════════════
// Logger Initialization
// ═══════════════════════════════════════════════════════════════════════════

/// Initialize the oslog logger.
///
/// This should be called once at application startup before using any other
/// FFI functions. It sets up unified logging that will appear in Console.app
/// and Xcode's debug console.
#[cfg(feature = "ios")]
#[unsafe(no_mangle)]
pub extern "C" fn arp_init_logger() {
    OsLogger::new(LOG_SUBSYSTEM)
        .level_filter(LevelFilter::Debug)
        .init()
        .ok();
}

// ═══════════════════════════════════════════════════════════════════════════
// Opaque Handle Types
// ═══════════════════════════════════════════════════════════════════════════

/// Opaque handle to the ControlHandle (UI/parameter side).
pub struct ArpControl {
    inner: ControlHandle,
}

/// Opaque handle to the EngineHandle (audio side).
pub struct ArpProcessor {
    inner: EngineHandle,
}

// ═══════════════════════════════════════════════════════════════════════════
// FFI Types
// ═══════════════════════════════════════════════════════════════════════════

/// A note event crossing the boundary in either direction.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ArpMidiEvent {
    /// `ARP_EVENT_NOTE_ON` or `ARP_EVENT_NOTE_OFF`
    pub kind: u8,
    pub note: u8,
    pub velocity: u8,
    /// Sample offset within the block
    pub offset: u32,
}

impl ArpMidiEvent {
    fn to_input(self) -> Option<InputEvent> {
        let note = self.note & 0x7f;
        match self.kind {
            ARP_EVENT_NOTE_ON => Some(InputEvent::NoteOn {
                note,
                velocity: self.velocity,
                offset: self.offset,
            }),
            ARP_EVENT_NOTE_OFF => Some(InputEvent::NoteOff {
                note,
                offset: self.offset,
            }),
            _ => None,
        }
    }
}

impl From<OutputEvent> for ArpMidiEvent {
    fn from(event: OutputEvent) -> Self {
        match event {
            OutputEvent::NoteOn {
                note,
                velocity,
                offset,
            } => Self {
                kind: ARP_EVENT_NOTE_ON,
                note,
                velocity,
                offset,
            },
            OutputEvent::NoteOff { note, offset } => Self {
                kind: ARP_EVENT_NOTE_OFF,
                note,
                velocity: 0,
                offset,
            },
        }
    }
}

/// Configuration snapshot.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArpConfigFfi {
    pub speed: f32,
    pub note_duration: f32,
    pub ascending: bool,
    /// 0 = Linear, 1 = Randomize, 2 = Retake
    pub mode: u8,
    pub octave_span: u8,
}

impl From<ArpConfig> for ArpConfigFfi {
    fn from(c: ArpConfig) -> Self {
        Self {
            speed: c.speed,
            note_duration: c.note_duration,
            ascending: c.ascending,
            mode: c.mode.as_u8(),
            octave_span: c.octave_span,
        }
    }
}

/// Readback data from the engine (for UI displays). `-1` means none.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArpReadback {
    pub sounding_note: i32,
    pub current_index: i32,
    pub octave: u8,
    pub held_notes: u32,
    pub step_length: u32,
    pub sample_clock: u32,
}

impl From<EngineReadback> for ArpReadback {
    fn from(r: EngineReadback) -> Self {
        Self {
            sounding_note: r.sounding_note.map_or(-1, i32::from),
            current_index: r.current_index.map_or(-1, |i| i as i32),
            octave: r.octave,
            held_notes: r.held_notes as u32,
            step_length: r.step_length as u32,
            sample_clock: r.sample_clock as u32,
        }
    }
}

impl ArpReadback {
    fn empty() -> Self {
        EngineReadback {
            sounding_note: None,
            current_index: None,
            octave: 1,
            held_notes: 0,
            step_length: 0,
            sample_clock: 0,
        }
        .into()
    }
}

/// Parameter info for host automation and UI controls.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArpParamInfo {
    pub id: u32,
    pub min_value: f32,
    pub max_value: f32,
    pub default_value: f32,
    pub step: f32,
    /// 0 = none, 1 = percent, 2 = beats, 3 = octaves
    pub unit: u8,
}

// ═══════════════════════════════════════════════════════════════════════════
// Lifecycle
// ═══════════════════════════════════════════════════════════════════════════

/// Create a processor/control pair.
///
/// Returns the processor handle. The control handle is returned via
/// `out_control`. Both handles must be destroyed with their respective
/// destroy functions.
///
/// # Safety
/// `out_control` must be a valid pointer to store the control handle.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn arp_create(
    sample_rate: f64,
    out_control: *mut *mut ArpControl,
) -> *mut ArpProcessor {
    if out_control.is_null() {
        error!("arp_create: out_control is null");
        return std::ptr::null_mut();
    }

    let (control, engine) = create_bridge(sample_rate);
    debug!("Created arpeggiator at {} Hz", sample_rate);

    unsafe {
        *out_control = Box::into_raw(Box::new(ArpControl { inner: control }));
    }

    Box::into_raw(Box::new(ArpProcessor { inner: engine }))
}

/// Destroy a control handle.
///
/// # Safety
/// `control` must be a valid pointer returned via `arp_create`.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn arp_control_destroy(control: *mut ArpControl) {
    if !control.is_null() {
        unsafe { drop(Box::from_raw(control)) };
    }
}

/// Destroy a processor handle.
///
/// # Safety
/// `processor` must be a valid pointer returned by `arp_create`.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn arp_processor_destroy(processor: *mut ArpProcessor) {
    if !processor.is_null() {
        unsafe { drop(Box::from_raw(processor)) };
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Processor - Audio Thread
// ═══════════════════════════════════════════════════════════════════════════

/// Prepare for playback at `sample_rate`. Resets all sequencing state.
///
/// # Safety
/// Should not be called while a block is being processed.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn arp_processor_prepare(processor: *mut ArpProcessor, sample_rate: f64) {
    if processor.is_null() {
        error!("arp_processor_prepare: processor is null");
        return;
    }
    unsafe { (*processor).inner.prepare(sample_rate) };
}

/// Clear held notes. The sounding note is released at the next block.
///
/// # Safety
/// `processor` must be valid.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn arp_processor_reset(processor: *mut ArpProcessor) {
    if processor.is_null() {
        return;
    }
    unsafe { (*processor).inner.reset() };
}

/// Process one block.
///
/// Parameters:
/// - `num_samples`: block length
/// - `events`/`num_events`: host note events for this block (may be null when 0)
/// - `out_events`/`out_capacity`: buffer for emitted events; 2 is always enough
///
/// Returns the number of events written to `out_events`.
///
/// # Safety
/// - Must be called from the audio thread
/// - `events` must point to `num_events` valid events
/// - `out_events` must have space for `out_capacity` events
#[unsafe(no_mangle)]
pub unsafe extern "C" fn arp_processor_process(
    processor: *mut ArpProcessor,
    num_samples: u32,
    events: *const ArpMidiEvent,
    num_events: u32,
    out_events: *mut ArpMidiEvent,
    out_capacity: u32,
) -> u32 {
    if processor.is_null() {
        return 0;
    }
    let handle = unsafe { &mut (*processor).inner };

    // Commands precede host events, as in the bridge.
    handle.process_commands();

    if !events.is_null() && num_events > 0 {
        let events = unsafe { std::slice::from_raw_parts(events, num_events as usize) };
        for event in events.iter().filter_map(|e| e.to_input()) {
            handle.engine_mut().handle_event(&event);
        }
    }

    let output = handle.process_block(num_samples as usize, &[]);

    if out_events.is_null() || out_capacity == 0 {
        return 0;
    }
    let out = unsafe { std::slice::from_raw_parts_mut(out_events, out_capacity as usize) };
    let mut written = 0;
    for (slot, event) in out.iter_mut().zip(output.iter()) {
        *slot = (*event).into();
        written += 1;
    }
    written
}

// ═══════════════════════════════════════════════════════════════════════════
// Control - Configuration
// ═══════════════════════════════════════════════════════════════════════════

/// Returns the speed actually stored.
///
/// # Safety
/// `control` must be valid.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn arp_control_set_speed(control: *const ArpControl, speed: f32) -> f32 {
    if control.is_null() {
        return 0.0;
    }
    unsafe { (*control).inner.set_speed(speed) }
}

/// Returns the duration actually stored.
///
/// # Safety
/// `control` must be valid.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn arp_control_set_note_duration(control: *const ArpControl, duration: f32) -> f32 {
    if control.is_null() {
        return 0.0;
    }
    unsafe { (*control).inner.set_note_duration(duration) }
}

/// # Safety
/// `control` must be valid.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn arp_control_set_ascending(control: *const ArpControl, ascending: bool) {
    if control.is_null() {
        return;
    }
    unsafe { (*control).inner.set_ascending(ascending) };
}

/// 0 = Linear, 1 = Randomize, 2 = Retake.
///
/// # Safety
/// `control` must be valid.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn arp_control_set_mode(control: *const ArpControl, mode: u8) {
    if control.is_null() {
        return;
    }
    unsafe { (*control).inner.set_mode(SequenceMode::from_u8(mode)) };
}

/// Returns the span actually stored.
///
/// # Safety
/// `control` must be valid.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn arp_control_set_octave_span(control: *const ArpControl, span: i32) -> u8 {
    if control.is_null() {
        return 0;
    }
    unsafe { (*control).inner.set_octave_span(span) }
}

/// Set a parameter by id.
///
/// Returns the stored value, or NaN for an unknown id.
///
/// # Safety
/// `control` must be valid.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn arp_control_set_param(control: *const ArpControl, id: u32, value: f32) -> f32 {
    if control.is_null() {
        return f32::NAN;
    }
    unsafe { (*control).inner.set_param(id, value) }.unwrap_or(f32::NAN)
}

/// Read a parameter by id. NaN for an unknown id.
///
/// # Safety
/// `control` must be valid.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn arp_control_get_param(control: *const ArpControl, id: u32) -> f32 {
    if control.is_null() {
        return f32::NAN;
    }
    unsafe { (*control).inner.param(id) }.unwrap_or(f32::NAN)
}

/// # Safety
/// `control` must be valid.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn arp_control_get_config(control: *const ArpControl) -> ArpConfigFfi {
    if control.is_null() {
        return ArpConfig::default().into();
    }
    unsafe { (*control).inner.config() }.into()
}

// ═══════════════════════════════════════════════════════════════════════════
// Control - Notes
// ═══════════════════════════════════════════════════════════════════════════

/// Hold a note from the UI (on-screen keyboard).
///
/// # Safety
/// `control` must be valid.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn arp_control_note_on(control: *const ArpControl, note: u8) {
    if control.is_null() {
        return;
    }
    unsafe { (*control).inner.note_on(note & 0x7f) };
}

/// # Safety
/// `control` must be valid.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn arp_control_note_off(control: *const ArpControl, note: u8) {
    if control.is_null() {
        return;
    }
    unsafe { (*control).inner.note_off(note & 0x7f) };
}

/// # Safety
/// `control` must be valid.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn arp_control_all_notes_off(control: *const ArpControl) {
    if control.is_null() {
        return;
    }
    unsafe { (*control).inner.all_notes_off() };
}

// ═══════════════════════════════════════════════════════════════════════════
// Control - Readback
// ═══════════════════════════════════════════════════════════════════════════

/// Engine state as of the last processed block.
///
/// # Safety
/// `control` must be valid.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn arp_control_get_readback(control: *const ArpControl) -> ArpReadback {
    if control.is_null() {
        return ArpReadback::empty();
    }
    unsafe { (*control).inner.readback() }.into()
}

// ═══════════════════════════════════════════════════════════════════════════
// Parameter Registry
// ═══════════════════════════════════════════════════════════════════════════

/// Number of automatable parameters.
#[unsafe(no_mangle)]
pub extern "C" fn arp_param_count() -> u32 {
    params::COUNT as u32
}

/// Fill `out` with the info for parameter `id`.
///
/// Returns `false` for an unknown id.
///
/// # Safety
/// `out` must be a valid pointer.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn arp_param_info(id: u32, out: *mut ArpParamInfo) -> bool {
    if out.is_null() {
        return false;
    }
    let Some(info) = params::info(id) else {
        return false;
    };
    let unit = match info.unit {
        ParamUnit::None => 0,
        ParamUnit::Percent => 1,
        ParamUnit::Beats => 2,
        ParamUnit::Octaves => 3,
    };
    unsafe {
        *out = ArpParamInfo {
            id: info.id,
            min_value: info.min,
            max_value: info.max,
            default_value: info.default,
            step: info.step,
            unit,
        };
    }
    true
}

/// Map a plain value of parameter `id` to 0..1. NaN for an unknown id.
#[unsafe(no_mangle)]
pub extern "C" fn arp_param_normalize(id: u32, value: f32) -> f32 {
    params::info(id).map_or(f32::NAN, |info| info.normalize(value))
}

/// Map a 0..1 value to the plain range of parameter `id`. NaN for an unknown id.
#[unsafe(no_mangle)]
pub extern "C" fn arp_param_denormalize(id: u32, normalized: f32) -> f32 {
    params::info(id).map_or(f32::NAN, |info| info.denormalize(normalized))
}

/// Write the name of parameter `id` into `buf` as a NUL-terminated string.
///
/// `short` selects the compact name. Output is truncated to fit.
/// Returns the number of bytes written, excluding the terminator; 0 for an
/// unknown id.
///
/// # Safety
/// `buf` must have space for `buf_len` bytes.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn arp_param_name(
    id: u32,
    short: bool,
    buf: *mut c_char,
    buf_len: u32,
) -> u32 {
    let Some(info) = params::info(id) else {
        return 0;
    };
    let name = if short { &info.short_name } else { &info.name };
    unsafe { write_c_string(name, buf, buf_len) }
}

/// Write the display string for `value` of parameter `id` into `buf`,
/// e.g. "50 %" or "2 oct".
///
/// Returns the number of bytes written, excluding the terminator; 0 for an
/// unknown id.
///
/// # Safety
/// `buf` must have space for `buf_len` bytes.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn arp_param_format(
    id: u32,
    value: f32,
    buf: *mut c_char,
    buf_len: u32,
) -> u32 {
    let Some(info) = params::info(id) else {
        return 0;
    };
    unsafe { write_c_string(&info.format(value), buf, buf_len) }
}

/// Copy `text` into a caller-owned C buffer, truncating to fit the
/// terminator.
unsafe fn write_c_string(text: &str, buf: *mut c_char, buf_len: u32) -> u32 {
    if buf.is_null() || buf_len == 0 {
        return 0;
    }
    let bytes = text.as_bytes();
    let len = bytes.len().min(buf_len as usize - 1);
    unsafe {
        std::ptr::copy_nonoverlapping(bytes.as_ptr(), buf.cast::<u8>(), len);
        *buf.add(len) = 0;
    }
    len as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    fn note_on(note: u8) -> ArpMidiEvent {
        ArpMidiEvent {
            kind: ARP_EVENT_NOTE_ON,
            note,
            velocity: 100,
            offset: 0,
        }
    }

    #[test]
    fn test_create_process_destroy() {
        let mut control: *mut ArpControl = std::ptr::null_mut();
        let processor = unsafe { arp_create(48_000.0, &mut control) };
        assert!(!control.is_null());
        assert!(!processor.is_null());

        let chord = [note_on(60), note_on(64)];
        let mut out = [ArpMidiEvent::default(); 2];
        let mut emitted = Vec::new();
        for block in 0..30 {
            let (events, count) = if block == 0 {
                (chord.as_ptr(), chord.len() as u32)
            } else {
                (std::ptr::null(), 0)
            };
            let n = unsafe {
                arp_processor_process(processor, 512, events, count, out.as_mut_ptr(), 2)
            };
            emitted.extend_from_slice(&out[..n as usize]);
        }

        let ons: Vec<u8> = emitted
            .iter()
            .filter(|e| e.kind == ARP_EVENT_NOTE_ON)
            .map(|e| e.note)
            .collect();
        assert_eq!(ons, vec![60, 64]);
        assert!(emitted.iter().all(|e| e.kind != ARP_EVENT_NOTE_ON || e.velocity == 127));

        let readback = unsafe { arp_control_get_readback(control) };
        assert_eq!(readback.sounding_note, 64);
        assert_eq!(readback.held_notes, 2);

        unsafe {
            arp_processor_destroy(processor);
            arp_control_destroy(control);
        }
    }

    #[test]
    fn test_config_roundtrip() {
        let mut control: *mut ArpControl = std::ptr::null_mut();
        let processor = unsafe { arp_create(44_100.0, &mut control) };

        unsafe {
            assert_eq!(arp_control_set_speed(control, 2.0), 1.0);
            assert_eq!(arp_control_set_octave_span(control, 2), 2);
            arp_control_set_mode(control, 1);
            arp_control_set_ascending(control, false);
            assert!(arp_control_set_param(control, 42, 1.0).is_nan());
        }

        let config = unsafe { arp_control_get_config(control) };
        assert_eq!(config.speed, 1.0);
        assert_eq!(config.mode, 1);
        assert_eq!(config.octave_span, 2);
        assert!(!config.ascending);

        unsafe {
            arp_processor_destroy(processor);
            arp_control_destroy(control);
        }
    }

    #[test]
    fn test_null_handles_are_ignored() {
        unsafe {
            assert_eq!(
                arp_processor_process(std::ptr::null_mut(), 512, std::ptr::null(), 0, std::ptr::null_mut(), 0),
                0
            );
            assert_eq!(arp_control_get_readback(std::ptr::null()).sounding_note, -1);
            assert!(arp_create(48_000.0, std::ptr::null_mut()).is_null());
        }
    }

    #[test]
    fn test_param_info() {
        let mut info = ArpParamInfo {
            id: 0,
            min_value: 0.0,
            max_value: 0.0,
            default_value: 0.0,
            step: 0.0,
            unit: 0,
        };
        assert_eq!(arp_param_count(), 5);
        assert!(unsafe { arp_param_info(params::OCTAVE_SPAN, &mut info) });
        assert_eq!((info.min_value, info.max_value, info.unit), (1.0, 3.0, 3));
        assert!(!unsafe { arp_param_info(77, &mut info) });
    }

    fn read_c_string(buf: &[c_char], len: u32) -> String {
        let bytes: Vec<u8> = buf[..len as usize].iter().map(|&c| c as u8).collect();
        assert_eq!(buf[len as usize], 0);
        String::from_utf8(bytes).unwrap()
    }

    #[test]
    fn test_param_display_strings() {
        let mut buf: [c_char; 32] = [0; 32];

        let n = unsafe { arp_param_format(params::SPEED, 0.5, buf.as_mut_ptr(), 32) };
        assert_eq!(read_c_string(&buf, n), "50 %");

        let n = unsafe { arp_param_format(params::OCTAVE_SPAN, 2.0, buf.as_mut_ptr(), 32) };
        assert_eq!(read_c_string(&buf, n), "2 oct");

        let n = unsafe { arp_param_name(params::NOTE_DURATION, false, buf.as_mut_ptr(), 32) };
        assert_eq!(read_c_string(&buf, n), "1st Note Duration");

        let n = unsafe { arp_param_name(params::SEQUENCE_MODE, true, buf.as_mut_ptr(), 32) };
        assert_eq!(read_c_string(&buf, n), "Sequ");

        // Truncated to leave room for the terminator.
        let n = unsafe { arp_param_name(params::NOTE_DURATION, false, buf.as_mut_ptr(), 4) };
        assert_eq!(read_c_string(&buf, n), "1st");

        assert_eq!(unsafe { arp_param_format(77, 1.0, buf.as_mut_ptr(), 32) }, 0);
        assert_eq!(unsafe { arp_param_name(0, false, std::ptr::null_mut(), 32) }, 0);
    }

    #[test]
    fn test_param_normalize() {
        assert_eq!(arp_param_normalize(params::NOTE_DURATION, 4.0), 1.0);
        assert_eq!(arp_param_normalize(params::OCTAVE_SPAN, 2.0), 0.5);
        assert_eq!(arp_param_denormalize(params::SPEED, 0.25), 0.25);
        assert_eq!(arp_param_denormalize(params::OCTAVE_SPAN, 1.0), 3.0);
        assert!(arp_param_normalize(77, 0.5).is_nan());
    }
}
