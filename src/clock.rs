use crate::error::{ArpError, ArpResult};

//
// ===============================
// MARK: Step length
// ===============================
//

/// Fraction of a second covered by one step at speed 0, before the
/// `0.1 + (1 - speed)` scaling.
const STEP_SECONDS: f64 = 0.25;

/// Floor of the speed scaling, so the fastest step is still non-zero.
const MIN_SPEED_SCALE: f64 = 0.1;

/// Values this close to an integer are treated as that integer before
/// rounding up, so float noise never adds a sample.
const SNAP_EPSILON: f64 = 1e-6;

/// Step length in samples for `speed` at `sample_rate`.
///
/// `ceil(sample_rate * 0.25 * (0.1 + (1 - speed)))`. Returns
/// `StepLengthDegenerate` when that rounds to zero samples.
pub fn try_step_length(sample_rate: f64, speed: f32) -> ArpResult<usize> {
    let speed_scale = MIN_SPEED_SCALE + (1.0 - speed.clamp(0.0, 1.0) as f64);
    let raw = sample_rate * STEP_SECONDS * speed_scale;

    let samples = if (raw - raw.round()).abs() < SNAP_EPSILON {
        raw.round()
    } else {
        raw.ceil()
    };

    // NaN and negative rates fall through to the degenerate case.
    if samples >= 1.0 {
        Ok(samples as usize)
    } else {
        Err(ArpError::StepLengthDegenerate { sample_rate, speed })
    }
}

/// Step length floored to one sample.
#[inline]
pub fn step_length(sample_rate: f64, speed: f32) -> usize {
    try_step_length(sample_rate, speed).unwrap_or(1)
}

//
// ===============================
// MARK: Sequencer clock (RT-safe)
// ===============================
//

/// Sample-counter scheduler that fires one step per step length.
///
/// This struct:
/// - is real-time safe
/// - is copyable
/// - knows nothing about notes
///
/// At most one boundary is reported per block, even if the block spans
/// several step lengths. Changing the step length between blocks takes
/// the running count modulo the new length, which can fire a boundary
/// early or skip one.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct SequencerClock {
    /// Samples elapsed since the last boundary, modulo step length
    sample_clock: usize,
}

impl SequencerClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance by one block.
    ///
    /// Returns the in-block offset of the step boundary, if one falls in
    /// this block. The offset is clamped to `0..num_samples`.
    pub fn advance(&mut self, num_samples: usize, step_length: usize) -> Option<usize> {
        let step_length = step_length.max(1);

        let boundary = if num_samples > 0 && self.sample_clock + num_samples >= step_length {
            let until = step_length.saturating_sub(self.sample_clock);
            Some(until.min(num_samples - 1))
        } else {
            None
        };

        self.sample_clock = (self.sample_clock + num_samples) % step_length;
        boundary
    }

    /// Samples elapsed since the last boundary.
    #[inline]
    pub fn sample_clock(&self) -> usize {
        self.sample_clock
    }

    /// Restart counting from zero.
    pub fn reset(&mut self) {
        self.sample_clock = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_length_formula() {
        assert_eq!(step_length(48_000.0, 0.5), 7200);
        assert_eq!(step_length(48_000.0, 0.0), 13_200);
        assert_eq!(step_length(48_000.0, 1.0), 1200);
        assert_eq!(step_length(96_000.0, 0.0), 26_400);
        // 44100 * 0.25 * 0.65 = 7166.25
        assert_eq!(step_length(44_100.0, 0.45), 7167);
    }

    #[test]
    fn test_speed_is_clamped() {
        assert_eq!(step_length(48_000.0, -3.0), step_length(48_000.0, 0.0));
        assert_eq!(step_length(48_000.0, 9.0), step_length(48_000.0, 1.0));
    }

    #[test]
    fn test_degenerate_step_length_floors_to_one() {
        assert_eq!(
            try_step_length(0.0, 0.5),
            Err(ArpError::StepLengthDegenerate {
                sample_rate: 0.0,
                speed: 0.5
            })
        );
        assert_eq!(step_length(0.0, 0.5), 1);
        assert_eq!(step_length(f64::NAN, 0.5), 1);
        assert_eq!(step_length(-44_100.0, 0.5), 1);
        // 1 Hz at full speed: 0.025 samples, rounds up to 1
        assert_eq!(try_step_length(1.0, 1.0), Ok(1));
    }

    #[test]
    fn test_first_boundary_offset() {
        let mut clock = SequencerClock::new();
        let mut boundaries = Vec::new();

        for block in 0..15 {
            if let Some(offset) = clock.advance(512, 7200) {
                boundaries.push((block, offset));
            }
        }

        // 14 * 512 = 7168, boundary 32 samples into the 15th block
        assert_eq!(boundaries, vec![(14, 32)]);
        assert_eq!(clock.sample_clock(), 7680 - 7200);
    }

    #[test]
    fn test_boundaries_are_step_length_apart() {
        let mut clock = SequencerClock::new();
        let mut positions = Vec::new();

        for block in 0..200usize {
            if let Some(offset) = clock.advance(512, 7200) {
                positions.push(block * 512 + offset);
            }
        }

        assert!(positions.len() > 5);
        for (k, pos) in positions.iter().enumerate() {
            assert_eq!(*pos, (k + 1) * 7200);
        }
    }

    #[test]
    fn test_exact_fit_clamps_to_last_sample() {
        let mut clock = SequencerClock::new();
        assert_eq!(clock.advance(256, 512), None);
        assert_eq!(clock.advance(256, 512), Some(255));
        assert_eq!(clock.sample_clock(), 0);
    }

    #[test]
    fn test_one_boundary_per_block() {
        let mut clock = SequencerClock::new();
        // Block spans four step lengths, still only one boundary.
        assert_eq!(clock.advance(1024, 256), Some(256));
        assert_eq!(clock.sample_clock(), 0);
    }

    #[test]
    fn test_shrinking_step_fires_at_block_start() {
        let mut clock = SequencerClock::new();
        clock.advance(1000, 7200);
        assert_eq!(clock.sample_clock(), 1000);

        // Already past the new, shorter step length.
        assert_eq!(clock.advance(64, 500), Some(0));
        assert_eq!(clock.sample_clock(), 1064 % 500);
    }

    #[test]
    fn test_empty_block() {
        let mut clock = SequencerClock::new();
        assert_eq!(clock.advance(0, 1), None);
        clock.advance(100, 7200);
        clock.reset();
        assert_eq!(clock.sample_clock(), 0);
    }
}
