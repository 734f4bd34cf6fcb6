// src/state/param_info.rs
//
// Parameter metadata for host UIs and range validation.

use std::fmt;

use crate::error::{ArpError, ArpResult};

/// Unique identifier for an arpeggiator parameter.
pub type ParamId = u32;

/// Well-known parameter ids.
pub mod params {
    use super::{ParamId, ParamInfo, ParamUnit};

    pub const SPEED: ParamId = 0;
    pub const NOTE_DURATION: ParamId = 1;
    pub const ASCENDING: ParamId = 2;
    pub const SEQUENCE_MODE: ParamId = 3;
    pub const OCTAVE_SPAN: ParamId = 4;

    pub const COUNT: usize = 5;

    /// Metadata for every arpeggiator parameter, indexed by id.
    pub fn all() -> [ParamInfo; COUNT] {
        [
            ParamInfo::new(SPEED, "Speed")
                .range(0.0, 1.0)
                .default(0.5)
                .unit(ParamUnit::Percent)
                .step(0.05),
            ParamInfo::new(NOTE_DURATION, "1st Note Duration")
                .range(0.25, 4.0)
                .default(1.0)
                .unit(ParamUnit::Beats)
                .step(0.25),
            ParamInfo::new(ASCENDING, "Ascending")
                .range(0.0, 1.0)
                .default(1.0)
                .step(1.0),
            ParamInfo::new(SEQUENCE_MODE, "Sequence")
                .range(0.0, 2.0)
                .default(0.0)
                .step(1.0),
            ParamInfo::new(OCTAVE_SPAN, "Octaves")
                .range(1.0, 3.0)
                .default(1.0)
                .unit(ParamUnit::Octaves)
                .step(1.0),
        ]
    }

    /// Metadata for a single parameter.
    pub fn info(id: ParamId) -> Option<ParamInfo> {
        all().into_iter().find(|p| p.id == id)
    }
}

/// Unit type for parameter display.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum ParamUnit {
    #[default]
    None,
    /// Percentage (0-100), displayed from a 0..1 value
    Percent,
    /// Beats
    Beats,
    /// Octaves
    Octaves,
}

impl fmt::Display for ParamUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamUnit::None => Ok(()),
            ParamUnit::Percent => write!(f, "%"),
            ParamUnit::Beats => write!(f, "beats"),
            ParamUnit::Octaves => write!(f, "oct"),
        }
    }
}

/// Metadata describing a parameter.
///
/// Used by the UI to:
/// - Display appropriate controls (sliders, toggles, radio groups)
/// - Validate input ranges
/// - Format values for display
#[derive(Debug, Clone)]
pub struct ParamInfo {
    /// Unique ID
    pub id: ParamId,

    /// Human-readable name
    pub name: String,

    /// Short name for compact displays
    pub short_name: String,

    /// Minimum value
    pub min: f32,

    /// Maximum value
    pub max: f32,

    /// Default value
    pub default: f32,

    /// Unit for display
    pub unit: ParamUnit,

    /// Step size for discrete parameters (0 = continuous)
    pub step: f32,
}

impl ParamInfo {
    pub fn new(id: ParamId, name: impl Into<String>) -> Self {
        let name = name.into();
        let short_name = name.chars().take(4).collect();
        Self {
            id,
            name,
            short_name,
            min: 0.0,
            max: 1.0,
            default: 0.0,
            unit: ParamUnit::None,
            step: 0.0,
        }
    }

    pub fn range(mut self, min: f32, max: f32) -> Self {
        self.min = min;
        self.max = max;
        self
    }

    pub fn default(mut self, value: f32) -> Self {
        self.default = value;
        self
    }

    pub fn unit(mut self, unit: ParamUnit) -> Self {
        self.unit = unit;
        self
    }

    pub fn step(mut self, step: f32) -> Self {
        self.step = step;
        self
    }

    /// Clamp a value to the valid range.
    ///
    /// NaN maps to the default.
    #[inline]
    pub fn clamp(&self, value: f32) -> f32 {
        if value.is_nan() {
            self.default
        } else {
            value.clamp(self.min, self.max)
        }
    }

    /// Validate a value, reporting the clamped replacement when out of range.
    pub fn check(&self, value: f32) -> ArpResult<f32> {
        let clamped = self.clamp(value);
        if clamped == value {
            Ok(value)
        } else {
            Err(ArpError::ConfigOutOfRange {
                param: self.id,
                value,
                clamped,
            })
        }
    }

    /// Normalize a value to 0..1 range.
    #[inline]
    pub fn normalize(&self, value: f32) -> f32 {
        (self.clamp(value) - self.min) / (self.max - self.min)
    }

    /// Denormalize a 0..1 value to the parameter range.
    #[inline]
    pub fn denormalize(&self, normalized: f32) -> f32 {
        self.clamp(self.min + normalized.clamp(0.0, 1.0) * (self.max - self.min))
    }

    /// Format a value for display.
    pub fn format(&self, value: f32) -> String {
        let (value, precision) = match self.unit {
            ParamUnit::Percent => (value * 100.0, 0),
            _ if self.step >= 1.0 => (value, 0),
            _ => (value, 2),
        };
        if self.unit == ParamUnit::None {
            format!("{:.prec$}", value, prec = precision)
        } else {
            format!("{:.prec$} {}", value, self.unit, prec = precision)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::params::{all, info};

    #[test]
    fn test_ids_match_positions() {
        for (i, p) in all().iter().enumerate() {
            assert_eq!(p.id as usize, i);
            assert!(p.min <= p.default && p.default <= p.max);
        }
    }

    #[test]
    fn test_check_reports_clamped_value() {
        let speed = info(params::SPEED).unwrap();
        assert_eq!(speed.check(0.25), Ok(0.25));
        assert_eq!(
            speed.check(-0.5),
            Err(ArpError::ConfigOutOfRange {
                param: params::SPEED,
                value: -0.5,
                clamped: 0.0,
            })
        );
        assert_eq!(speed.clamp(f32::NAN), 0.5);
    }

    #[test]
    fn test_normalize_roundtrip_on_duration() {
        let duration = info(params::NOTE_DURATION).unwrap();
        assert_eq!(duration.normalize(0.25), 0.0);
        assert_eq!(duration.normalize(4.0), 1.0);
        assert_eq!(duration.denormalize(1.5), 4.0);
    }

    #[test]
    fn test_format() {
        let speed = info(params::SPEED).unwrap();
        assert_eq!(speed.format(0.5), "50 %");
        let span = info(params::OCTAVE_SPAN).unwrap();
        assert_eq!(span.format(2.0), "2 oct");
        let duration = info(params::NOTE_DURATION).unwrap();
        assert_eq!(duration.format(1.0), "1.00 beats");
        assert_eq!(short_name_of(params::SEQUENCE_MODE), "Sequ");
    }

    fn short_name_of(id: ParamId) -> String {
        info(id).map(|p| p.short_name).unwrap_or_default()
    }

    #[test]
    fn test_unknown_param() {
        assert!(info(99).is_none());
    }
}
