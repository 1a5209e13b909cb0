//! Navigation solution and frame data model for the Pozyx protocol

use crate::wire::{FRAME_MAG, FRAME_NAV};

/// Frame type carried in field 0 of a sentence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FrameType {
    /// No recognized frame
    #[default]
    None,
    /// Navigation frame: position, velocity, timestamp
    Nav,
    /// Magnetometer frame: field vector
    Mag,
}

impl FrameType {
    /// Map a decoded frame-type code to a frame type.
    ///
    /// Unrecognized codes map to `None`; their fields are still parsed
    /// but never dispatched.
    pub fn from_code(code: u32) -> Self {
        match code {
            FRAME_NAV => FrameType::Nav,
            FRAME_MAG => FrameType::Mag,
            _ => FrameType::None,
        }
    }
}

impl std::fmt::Display for FrameType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FrameType::None => write!(f, "none"),
            FrameType::Nav => write!(f, "NAV"),
            FrameType::Mag => write!(f, "MAG"),
        }
    }
}

/// In-progress decode target, reused across sentences.
///
/// Fields are overwritten in place as they arrive and the struct is
/// never cleared between sentences, so a sentence carrying fewer fields
/// than its predecessor commits a blend of new and stale values. All
/// values are fixed-point unsigned integers; the scale is implied by
/// the field.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PendingFrame {
    /// UTC time of day, hhmmss with two fractional digits retained
    pub time: u32,
    /// UTC date, ddmmyy
    pub date: u32,
    /// Latitude, eight fractional digits retained
    pub latitude: u32,
    /// Longitude, eight fractional digits retained
    pub longitude: u32,
    /// Altitude in cm
    pub altitude: u32,
    /// North velocity in cm/s
    pub vel_north: u32,
    /// East velocity in cm/s
    pub vel_east: u32,
    /// Down velocity in cm/s
    pub vel_down: u32,
    /// Magnetic field X, two fractional digits retained
    pub mag_x: u32,
    /// Magnetic field Y, two fractional digits retained
    pub mag_y: u32,
    /// Magnetic field Z, two fractional digits retained
    pub mag_z: u32,
}

/// Calendar timestamp derived from a navigation frame
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GpsTime {
    pub year: u16,
    pub month: u8,
    pub day: u8,
    pub hours: u8,
    pub minutes: u8,
    pub seconds: u8,
    pub millis: u16,
}

/// Position fix quality
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FixType {
    /// No position fix
    #[default]
    NoFix,
    /// Two-dimensional fix
    Fix2D,
    /// Three-dimensional fix
    Fix3D,
}

impl std::fmt::Display for FixType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FixType::NoFix => write!(f, "no fix"),
            FixType::Fix2D => write!(f, "2D fix"),
            FixType::Fix3D => write!(f, "3D fix"),
        }
    }
}

bitfield::bitfield! {
    /// Validity and liveness flags of the navigation solution
    #[derive(Clone, Copy, Default, PartialEq, Eq)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub struct SolutionFlags(u8);
    impl Debug;
    /// North/east velocity components are valid
    pub valid_velocity_ne, set_valid_velocity_ne: 0;
    /// Down velocity component is valid
    pub valid_velocity_d, set_valid_velocity_d: 1;
    /// Accuracy estimates are valid
    pub valid_accuracy, set_valid_accuracy: 2;
    /// Calendar timestamp is valid
    pub valid_time, set_valid_time: 3;
    /// Magnetometer reading is valid
    pub valid_mag, set_valid_mag: 4;
    /// Toggles on every committed navigation frame
    pub heartbeat, set_heartbeat: 5;
}

/// Latest magnetometer reading, two fractional digits retained
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MagnetometerReading {
    pub x: i16,
    pub y: i16,
    pub z: i16,
}

/// Shared navigation solution record.
///
/// Owned by the host system and mutated only when a verified frame
/// commits; a failed sentence leaves every field untouched.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NavigationSolution {
    /// Fix quality; forced to `Fix3D` on every navigation commit since
    /// the sensor reports no fix-quality signal
    pub fix_type: FixType,
    /// Latitude, fixed-point as sent
    pub latitude: i32,
    /// Longitude, fixed-point as sent
    pub longitude: i32,
    /// Altitude in cm
    pub altitude: i32,
    /// North/east/down velocity in cm/s
    pub vel_ned: [i16; 3],
    /// Scalar ground speed in cm/s, derived from the NE velocity
    pub ground_speed: u16,
    /// Ground course in decidegrees, always in [0, 3600)
    pub ground_course: u16,
    /// Position dilution of precision (placeholder, the sensor
    /// provides none)
    pub pdop: u16,
    /// Horizontal accuracy in cm (placeholder)
    pub h_acc: u16,
    /// Vertical accuracy in cm (placeholder)
    pub v_acc: u16,
    /// Satellite count (placeholder)
    pub sat_count: u8,
    /// Calendar timestamp; untouched while `valid_time` is unset
    pub time: GpsTime,
    /// Validity and liveness flags
    pub flags: SolutionFlags,
    /// Latest magnetometer reading
    pub mag: MagnetometerReading,
}

/// Per-link packet counters
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LinkStats {
    /// Sentences whose checksum verified
    pub packets: u32,
    /// Sentences dropped on checksum mismatch
    pub errors: u32,
}

impl LinkStats {
    /// Record a verified sentence
    pub fn record_packet(&mut self) {
        self.packets = self.packets.wrapping_add(1);
    }

    /// Record a checksum mismatch
    pub fn record_error(&mut self) {
        self.errors = self.errors.wrapping_add(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_type_from_code() {
        assert_eq!(FrameType::from_code(1), FrameType::Nav);
        assert_eq!(FrameType::from_code(2), FrameType::Mag);
        assert_eq!(FrameType::from_code(0), FrameType::None);
        assert_eq!(FrameType::from_code(3), FrameType::None);
        assert_eq!(FrameType::from_code(u32::MAX), FrameType::None);
    }

    #[test]
    fn test_frame_type_display() {
        assert_eq!(FrameType::Nav.to_string(), "NAV");
        assert_eq!(FrameType::Mag.to_string(), "MAG");
    }

    #[test]
    fn test_solution_flags() {
        let mut flags = SolutionFlags::default();
        assert!(!flags.valid_time());

        flags.set_valid_time(true);
        flags.set_valid_mag(true);
        assert!(flags.valid_time());
        assert!(flags.valid_mag());
        assert!(!flags.valid_velocity_ne());

        let heartbeat = flags.heartbeat();
        flags.set_heartbeat(!heartbeat);
        assert_ne!(flags.heartbeat(), heartbeat);
        // toggling leaves the other flags alone
        assert!(flags.valid_time());
    }

    #[test]
    fn test_link_stats_counters() {
        let mut stats = LinkStats::default();
        stats.record_packet();
        stats.record_packet();
        stats.record_error();
        assert_eq!(stats.packets, 2);
        assert_eq!(stats.errors, 1);
    }

    #[test]
    fn test_fix_type_display() {
        assert_eq!(FixType::Fix3D.to_string(), "3D fix");
        assert_eq!(FixType::NoFix.to_string(), "no fix");
    }
}
