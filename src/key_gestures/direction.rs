use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Minimum pointer travel, in pixels, before a gesture counts as a drag
/// instead of a tap.
pub const DEFAULT_THRESHOLD_PX: f64 = 20.0;

const SECTOR_DEGREES: f64 = 45.0;
const HALF_SECTOR_DEGREES: f64 = SECTOR_DEGREES / 2.0;
// Angles are snapped to this many steps per degree so that sector
// boundaries such as 22.5 survive float error from atan2.
const ANGLE_SNAP: f64 = 1e6;

/// A usable threshold is finite and strictly positive. Anything else would
/// either send every gesture to the center slot or turn a tap into a drag.
pub fn is_valid_threshold(threshold: f64) -> bool {
    threshold.is_finite() && threshold > 0.0
}

/// One of the nine addressable outcomes of a gesture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DirectionSlot {
    Right,
    RightUp,
    Up,
    LeftUp,
    Left,
    LeftDown,
    Down,
    RightDown,
    Center,
}

impl DirectionSlot {
    /// Compass slots in counter-clockwise order starting at 0°.
    pub const COMPASS: [DirectionSlot; 8] = [
        DirectionSlot::Right,
        DirectionSlot::RightUp,
        DirectionSlot::Up,
        DirectionSlot::LeftUp,
        DirectionSlot::Left,
        DirectionSlot::LeftDown,
        DirectionSlot::Down,
        DirectionSlot::RightDown,
    ];

    pub const ALL: [DirectionSlot; 9] = [
        DirectionSlot::Right,
        DirectionSlot::RightUp,
        DirectionSlot::Up,
        DirectionSlot::LeftUp,
        DirectionSlot::Left,
        DirectionSlot::LeftDown,
        DirectionSlot::Down,
        DirectionSlot::RightDown,
        DirectionSlot::Center,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            DirectionSlot::Right => "right",
            DirectionSlot::RightUp => "right_up",
            DirectionSlot::Up => "up",
            DirectionSlot::LeftUp => "left_up",
            DirectionSlot::Left => "left",
            DirectionSlot::LeftDown => "left_down",
            DirectionSlot::Down => "down",
            DirectionSlot::RightDown => "right_down",
            DirectionSlot::Center => "center",
        }
    }

    /// Map an angle in degrees (math convention, Y up) to its compass slot.
    /// Each sector is 45° wide and centered on its axis; a value sitting
    /// exactly on a boundary belongs to the sector that begins there.
    pub fn from_angle(degrees: f64) -> DirectionSlot {
        let angle = degrees.rem_euclid(360.0);
        let sector = ((angle + HALF_SECTOR_DEGREES) / SECTOR_DEGREES).floor() as usize % 8;
        Self::COMPASS[sector]
    }
}

impl fmt::Display for DirectionSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DirectionSlot {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        Self::ALL
            .iter()
            .copied()
            .find(|slot| slot.as_str() == lower)
            .ok_or_else(|| format!("unknown direction slot '{s}'"))
    }
}

/// Angle of a screen-space displacement in degrees within `[0, 360)`.
///
/// Screen Y grows downward, so `dy` is negated before `atan2` to get the
/// usual counter-clockwise compass.
pub fn screen_angle(dx: f64, dy: f64) -> f64 {
    let degrees = (-dy).atan2(dx).to_degrees();
    let snapped = (degrees * ANGLE_SNAP).round() / ANGLE_SNAP;
    snapped.rem_euclid(360.0)
}

/// Classify a pointer displacement. Travel shorter than `threshold`
/// resolves to [`DirectionSlot::Center`].
pub fn classify(dx: f64, dy: f64, threshold: f64) -> DirectionSlot {
    let distance = dx.hypot(dy);
    if !(distance >= threshold) {
        return DirectionSlot::Center;
    }
    DirectionSlot::from_angle(screen_angle(dx, dy))
}
