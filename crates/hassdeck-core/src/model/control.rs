// ── Continuous control fields ──
//
// Numeric attributes that are edited by dragging and committed once.
// Each field knows which attribute reflects it and which service sets it.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::Category;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ControlField {
    Temperature,
    CoverPosition,
    CoverTilt,
    FanSpeed,
    ValvePosition,
}

impl ControlField {
    pub fn category(self) -> Category {
        match self {
            Self::Temperature => Category::Climate,
            Self::CoverPosition | Self::CoverTilt => Category::Cover,
            Self::FanSpeed => Category::Fan,
            Self::ValvePosition => Category::Valve,
        }
    }

    /// Attribute in which the hub reports the current value.
    pub fn attribute(self) -> &'static str {
        match self {
            Self::Temperature => "temperature",
            Self::CoverPosition | Self::ValvePosition => "current_position",
            Self::CoverTilt => "current_tilt_position",
            Self::FanSpeed => "percentage",
        }
    }

    /// `(service, data key)` used to commit a new value.
    pub fn service(self) -> (&'static str, &'static str) {
        match self {
            Self::Temperature => ("set_temperature", "temperature"),
            Self::CoverPosition => ("set_cover_position", "position"),
            Self::CoverTilt => ("set_cover_tilt_position", "tilt_position"),
            Self::FanSpeed => ("set_percentage", "percentage"),
            Self::ValvePosition => ("set_valve_position", "position"),
        }
    }

    /// Integer-valued fields go over the wire as integers.
    pub fn is_integral(self) -> bool {
        !matches!(self, Self::Temperature)
    }

    /// Position-like fields accept hub-side rounding.
    pub fn is_tolerance_banded(self) -> bool {
        matches!(
            self,
            Self::CoverPosition | Self::CoverTilt | Self::ValvePosition
        )
    }

    /// Valid input range, when the field has a fixed one.
    pub fn range(self) -> Option<(f64, f64)> {
        match self {
            Self::Temperature => None,
            _ => Some((0.0, 100.0)),
        }
    }
}

impl fmt::Display for ControlField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Temperature => "temperature",
            Self::CoverPosition => "position",
            Self::CoverTilt => "tilt",
            Self::FanSpeed => "speed",
            Self::ValvePosition => "valve position",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cover_position_reads_current_position() {
        assert_eq!(ControlField::CoverPosition.attribute(), "current_position");
        assert_eq!(
            ControlField::CoverPosition.service(),
            ("set_cover_position", "position")
        );
    }

    #[test]
    fn only_positions_are_banded() {
        assert!(ControlField::CoverTilt.is_tolerance_banded());
        assert!(!ControlField::Temperature.is_tolerance_banded());
        assert!(!ControlField::FanSpeed.is_tolerance_banded());
    }
}
