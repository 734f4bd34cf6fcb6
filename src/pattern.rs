// src/pattern.rs
//
// Pattern selection: which held note plays at the next step.
//
// Everything here is a pure function of the previous pattern state, the
// configured mode and direction, and the pool size. The engine owns the
// state and commits each `Step` it gets back.

use crate::state::SequenceMode;

/// Retake needs at least this many notes to jump by two; smaller pools
/// step linearly.
const RETAKE_MIN_POOL: usize = 3;

/// Position of the pattern within the held-note pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PatternState {
    /// Index of the last selected note. `None` before the first step and
    /// after the pool empties.
    pub current_index: Option<usize>,

    /// Secondary index walked by Randomize.
    pub walk_index: Option<usize>,

    /// Parity counter. Randomize settles on even, advances on odd;
    /// Retake jumps on even, steps back on odd.
    pub step_counter: u32,
}

impl PatternState {
    pub fn new() -> Self {
        Self {
            current_index: None,
            walk_index: None,
            // Odd, so the first Randomize step plays the first held note.
            step_counter: 1,
        }
    }

    /// Forget the position within the pool but keep the phase counters.
    pub fn clear_position(&mut self) {
        self.current_index = None;
    }
}

impl Default for PatternState {
    fn default() -> Self {
        Self::new()
    }
}

/// Result of one selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Step {
    /// Pool index to play. Always `< pool_size`.
    pub index: usize,

    /// The pattern wrapped; the octave cycler must advance once.
    pub advance_octave: bool,

    /// State to commit for the next selection.
    pub next: PatternState,
}

/// Pick the next pool index.
///
/// Returns `None` for an empty pool; the caller must not sound a note.
/// Stored indices larger than the pool (it shrank since the last step)
/// are clamped to the last index first.
pub fn select(
    state: &PatternState,
    mode: SequenceMode,
    ascending: bool,
    pool_size: usize,
) -> Option<Step> {
    let last = pool_size.checked_sub(1)?;
    let current = state.current_index.map(|c| c.min(last));
    let walk = state.walk_index.map(|w| w.min(last));
    let even = state.step_counter % 2 == 0;

    let mut next = PatternState {
        current_index: None,
        walk_index: walk,
        step_counter: state.step_counter.wrapping_add(1),
    };

    let (index, advance_octave) = match mode {
        SequenceMode::Retake if pool_size >= RETAKE_MIN_POOL => {
            let (index, wrapped, restart) = retake(current, even, ascending, pool_size);
            if restart {
                // Next step jumps again.
                next.step_counter = 0;
            }
            (index, wrapped)
        }
        SequenceMode::Linear | SequenceMode::Retake => linear(current, ascending, pool_size),
        SequenceMode::Randomize => {
            let (index, wrapped, walk) = randomize(walk, even, ascending, pool_size);
            next.walk_index = walk;
            (index, wrapped)
        }
    };

    debug_assert!(index < pool_size);
    next.current_index = Some(index);

    Some(Step {
        index,
        advance_octave,
        next,
    })
}

/// One step along the pool, wrapping at the far edge.
fn linear(current: Option<usize>, ascending: bool, n: usize) -> (usize, bool) {
    let last = n - 1;
    match (current, ascending) {
        (None, true) => (0, false),
        (None, false) => (last, false),
        (Some(c), true) if c >= last => (0, true),
        (Some(c), true) => (c + 1, false),
        (Some(0), false) => (last, true),
        (Some(c), false) => (c - 1, false),
    }
}

/// Jump two on even steps, come back one on odd steps.
///
/// Ascending, an odd pool wraps when the jump would leave the pool and an
/// even pool wraps when the step back starts from the top note. Descending
/// mirrors both edges. Returns `(index, wrapped, restart_phase)`.
fn retake(current: Option<usize>, even: bool, ascending: bool, n: usize) -> (usize, bool, bool) {
    let last = n - 1;
    let odd_pool = n % 2 == 1;

    let Some(c) = current else {
        let edge = if ascending { 0 } else { last };
        return (edge, false, true);
    };

    if ascending {
        let wrap = if even {
            (odd_pool && c == n - 2) || c + 2 > last
        } else {
            (!odd_pool && c == last) || c == 0
        };
        match (wrap, even) {
            (true, _) => (0, true, true),
            (false, true) => (c + 2, false, false),
            (false, false) => (c - 1, false, false),
        }
    } else {
        let wrap = if even {
            (odd_pool && c == 1) || c < 2
        } else {
            (!odd_pool && c == 0) || c == last
        };
        match (wrap, even) {
            (true, _) => (last, true, true),
            (false, true) => (c - 2, false, false),
            (false, false) => (c + 1, false, false),
        }
    }
}

/// Alternate between the first held note and a walking index.
///
/// Settle steps (even) play the walk index, starting it at the second
/// note ascending or the last note descending. Advance steps (odd) play
/// index 0 and move the walk. Ascending wraps past the top note; descending
/// walks down through index 0 and wraps below it. Returns
/// `(index, wrapped, walk)`.
fn randomize(
    walk: Option<usize>,
    even: bool,
    ascending: bool,
    n: usize,
) -> (usize, bool, Option<usize>) {
    let last = n - 1;
    let first = if ascending { 1.min(last) } else { last };

    if even {
        let w = walk.unwrap_or(first);
        return (w, false, Some(w));
    }

    let moved = match (walk, ascending) {
        (None, _) => Some(first),
        (Some(w), true) => Some(w + 1),
        (Some(w), false) => w.checked_sub(1),
    };
    let in_range = match moved {
        Some(w) if ascending => w <= last && w >= 1,
        Some(_) => true,
        None => false,
    };

    if in_range {
        (0, false, moved)
    } else {
        (0, true, None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Run `steps` selections on a fixed pool, returning (index, wrapped).
    fn run(mode: SequenceMode, ascending: bool, n: usize, steps: usize) -> Vec<(usize, bool)> {
        let mut state = PatternState::new();
        let mut out = Vec::new();
        for _ in 0..steps {
            let step = select(&state, mode, ascending, n).unwrap();
            out.push((step.index, step.advance_octave));
            state = step.next;
        }
        out
    }

    fn indices(seq: &[(usize, bool)]) -> Vec<usize> {
        seq.iter().map(|(i, _)| *i).collect()
    }

    fn wraps(seq: &[(usize, bool)]) -> Vec<usize> {
        seq.iter()
            .enumerate()
            .filter(|(_, (_, w))| *w)
            .map(|(k, _)| k)
            .collect()
    }

    #[test]
    fn test_empty_pool_selects_nothing() {
        let state = PatternState::new();
        for mode in [
            SequenceMode::Linear,
            SequenceMode::Randomize,
            SequenceMode::Retake,
        ] {
            assert!(select(&state, mode, true, 0).is_none());
            assert!(select(&state, mode, false, 0).is_none());
        }
    }

    #[test]
    fn test_linear_ascending() {
        let seq = run(SequenceMode::Linear, true, 3, 7);
        assert_eq!(indices(&seq), vec![0, 1, 2, 0, 1, 2, 0]);
        assert_eq!(wraps(&seq), vec![3, 6]);
    }

    #[test]
    fn test_linear_descending() {
        let seq = run(SequenceMode::Linear, false, 3, 7);
        assert_eq!(indices(&seq), vec![2, 1, 0, 2, 1, 0, 2]);
        assert_eq!(wraps(&seq), vec![3, 6]);
    }

    #[test]
    fn test_linear_single_note_wraps_every_step() {
        let seq = run(SequenceMode::Linear, true, 1, 4);
        assert_eq!(seq, vec![(0, false), (0, true), (0, true), (0, true)]);
    }

    #[test]
    fn test_retake_ascending_odd_pool() {
        let seq = run(SequenceMode::Retake, true, 3, 8);
        assert_eq!(indices(&seq), vec![0, 2, 1, 0, 2, 1, 0, 2]);
        assert_eq!(wraps(&seq), vec![3, 6]);

        let seq = run(SequenceMode::Retake, true, 5, 9);
        assert_eq!(indices(&seq), vec![0, 2, 1, 3, 2, 4, 3, 0, 2]);
        assert_eq!(wraps(&seq), vec![7]);
    }

    #[test]
    fn test_retake_ascending_even_pool() {
        let seq = run(SequenceMode::Retake, true, 4, 6);
        assert_eq!(indices(&seq), vec![0, 2, 1, 3, 0, 2]);
        assert_eq!(wraps(&seq), vec![4]);

        let seq = run(SequenceMode::Retake, true, 6, 10);
        assert_eq!(indices(&seq), vec![0, 2, 1, 3, 2, 4, 3, 5, 0, 2]);
        assert_eq!(wraps(&seq), vec![8]);
    }

    #[test]
    fn test_retake_descending_mirrors_ascending() {
        for n in 3..8 {
            let up = run(SequenceMode::Retake, true, n, 30);
            let down = run(SequenceMode::Retake, false, n, 30);
            let mirrored: Vec<(usize, bool)> =
                up.iter().map(|(i, w)| (n - 1 - i, *w)).collect();
            assert_eq!(down, mirrored, "pool size {}", n);
        }
    }

    #[test]
    fn test_retake_two_notes_steps_linearly() {
        let seq = run(SequenceMode::Retake, true, 2, 5);
        assert_eq!(indices(&seq), vec![0, 1, 0, 1, 0]);
        assert_eq!(wraps(&seq), vec![2, 4]);

        let seq = run(SequenceMode::Retake, false, 2, 4);
        assert_eq!(indices(&seq), vec![1, 0, 1, 0]);
    }

    #[test]
    fn test_randomize_ascending_pedal() {
        let seq = run(SequenceMode::Randomize, true, 3, 10);
        assert_eq!(indices(&seq), vec![0, 1, 0, 2, 0, 1, 0, 2, 0, 1]);
        assert_eq!(wraps(&seq), vec![4, 8]);
    }

    #[test]
    fn test_randomize_descending_pedal() {
        let seq = run(SequenceMode::Randomize, false, 3, 14);
        assert_eq!(
            indices(&seq),
            vec![0, 2, 0, 1, 0, 0, 0, 2, 0, 1, 0, 0, 0, 2]
        );
        assert_eq!(wraps(&seq), vec![6, 12]);
    }

    #[test]
    fn test_randomize_descending_settles_on_first_note() {
        for n in 2..7 {
            let seq = run(SequenceMode::Randomize, false, n, 4 * n + 2);
            let settles: Vec<usize> = seq.iter().skip(1).step_by(2).map(|(i, _)| *i).collect();
            // Walk goes last..=0 before wrapping.
            let expected: Vec<usize> = (0..n).rev().cycle().take(settles.len()).collect();
            assert_eq!(settles, expected, "pool size {}", n);
            assert_eq!(wraps(&seq), vec![2 * n, 4 * n], "pool size {}", n);
        }
    }

    #[test]
    fn test_randomize_single_note() {
        let seq = run(SequenceMode::Randomize, true, 1, 4);
        assert_eq!(seq, vec![(0, true), (0, false), (0, true), (0, false)]);

        let seq = run(SequenceMode::Randomize, false, 1, 5);
        assert_eq!(
            seq,
            vec![(0, false), (0, false), (0, true), (0, false), (0, true)]
        );
    }

    #[test]
    fn test_randomize_is_deterministic() {
        let a = run(SequenceMode::Randomize, true, 5, 64);
        let b = run(SequenceMode::Randomize, true, 5, 64);
        assert_eq!(a, b);
    }

    #[test]
    fn test_shrinking_pool_keeps_indices_valid() {
        let mut rng: u64 = 42;
        let mut state = PatternState::new();
        let modes = [
            SequenceMode::Linear,
            SequenceMode::Randomize,
            SequenceMode::Retake,
        ];

        for _ in 0..5000 {
            rng = rng
                .wrapping_mul(6364136223846793005)
                .wrapping_add(1442695040888963407);
            let n = 1 + ((rng >> 33) % 8) as usize;
            let mode = modes[((rng >> 40) % 3) as usize];
            let ascending = (rng >> 50) & 1 == 0;

            let step = select(&state, mode, ascending, n).unwrap();
            assert!(step.index < n);
            assert_eq!(step.next.current_index, Some(step.index));
            if let Some(w) = step.next.walk_index {
                assert!(w < n);
            }
            state = step.next;
        }
    }

    #[test]
    fn test_clear_position_restarts_at_edge() {
        let mut state = PatternState::new();
        for _ in 0..2 {
            state = select(&state, SequenceMode::Linear, true, 4).unwrap().next;
        }
        assert_eq!(state.current_index, Some(1));
        state.clear_position();
        let step = select(&state, SequenceMode::Linear, true, 4).unwrap();
        assert_eq!((step.index, step.advance_octave), (0, false));
    }
}
