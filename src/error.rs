// src/error.rs
//
// Invariant violations the arpeggiator can detect.
//
// None of these abort the audio callback. The real-time path recovers
// locally (clamp, floor, short-circuit) and reports through `log`;
// the checked APIs hand the same values back as `Err`.

use crate::state::ParamId;

/// Error raised by checked engine and configuration operations.
#[derive(Debug, Clone, PartialEq)]
pub enum ArpError {
    /// A pool index outside `0..len` was requested.
    InvalidIndex { index: usize, len: usize },

    /// A configuration value fell outside its parameter range.
    ConfigOutOfRange {
        param: ParamId,
        value: f32,
        clamped: f32,
    },

    /// Step length rounded to zero samples.
    StepLengthDegenerate { sample_rate: f64, speed: f32 },
}

impl std::fmt::Display for ArpError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ArpError::InvalidIndex { index, len } => {
                write!(f, "Pool index {} out of range for {} held notes", index, len)
            }
            ArpError::ConfigOutOfRange {
                param,
                value,
                clamped,
            } => {
                write!(
                    f,
                    "Parameter {} value {} out of range, clamped to {}",
                    param, value, clamped
                )
            }
            ArpError::StepLengthDegenerate { sample_rate, speed } => {
                write!(
                    f,
                    "Step length is zero samples (sample rate {}, speed {}), using 1",
                    sample_rate, speed
                )
            }
        }
    }
}

impl std::error::Error for ArpError {}

/// Result of a checked arpeggiator operation.
pub type ArpResult<T> = Result<T, ArpError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::params;

    #[test]
    fn test_display_messages() {
        let err = ArpError::InvalidIndex { index: 3, len: 2 };
        assert_eq!(err.to_string(), "Pool index 3 out of range for 2 held notes");

        let err = ArpError::ConfigOutOfRange {
            param: params::SPEED,
            value: -1.0,
            clamped: 0.0,
        };
        assert!(err.to_string().contains("clamped to 0"));

        let err = ArpError::StepLengthDegenerate {
            sample_rate: 0.0,
            speed: 0.5,
        };
        assert!(err.to_string().contains("using 1"));
    }
}
