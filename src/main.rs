// src/main.rs

use arpeggiator::{InputEvent, SequenceMode, create_bridge};

/// ===============================
/// Main
/// ===============================

fn main() {
    let sample_rate = 48_000.0;
    let block_frames = 512;
    let blocks = 120;

    // --------------------------------
    // Bridge
    // --------------------------------

    let (control, mut engine) = create_bridge(sample_rate);
    control.set_mode(SequenceMode::Linear);
    control.set_ascending(true);
    control.set_octave_span(2);

    // C major triad, held for the whole run
    let chord: Vec<InputEvent> = [60, 64, 67]
        .into_iter()
        .map(|note| InputEvent::NoteOn {
            note,
            velocity: 100,
            offset: 0,
        })
        .collect();

    // --------------------------------
    // Run blocks
    // --------------------------------

    println!(
        "Starting arpeggiator sanity test ({} blocks of {} at {} Hz)",
        blocks, block_frames, sample_rate
    );

    for block in 0..blocks {
        let events: &[InputEvent] = if block == 0 { &chord } else { &[] };
        let output = engine.process_block(block_frames, events);

        for event in &output {
            println!(
                "block {:>3} @ sample {:>6}: {:?}",
                block,
                block * block_frames + event.offset() as usize,
                event
            );
        }

        if block == blocks / 2 {
            println!("--- switching to Retake, descending ---");
            control.set_mode(SequenceMode::Retake);
            control.set_ascending(false);
        }
    }

    let readback = control.readback();
    println!(
        "Sanity test completed: step {} samples, octave {}, sounding {:?}",
        readback.step_length, readback.octave, readback.sounding_note
    );
}
