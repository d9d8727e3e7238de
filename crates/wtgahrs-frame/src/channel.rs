//! Channel Type discriminators.
//!
//! The byte following the `0x55` header selects what the frame's payload
//! carries. 0x55 itself is never a channel type.

/// Date and time (year, month, day, hour, minute, second).
pub const TIME: u8 = 0x50;

/// Acceleration on X/Y/Z.
pub const ACCELERATION: u8 = 0x51;

/// Angular velocity on X/Y/Z.
pub const ANGULAR_VELOCITY: u8 = 0x52;

/// Orientation: roll, pitch, yaw.
pub const ANGLES: u8 = 0x53;

/// Magnetic field on X/Y/Z.
pub const MAGNETIC_FIELD: u8 = 0x54;

/// Barometric pressure and altitude.
pub const PRESSURE_ALTITUDE: u8 = 0x56;

/// GPS longitude and latitude.
pub const LON_LAT: u8 = 0x57;

/// GPS height, GPS yaw, ground velocity.
pub const HEIGHT_YAW_VELOCITY: u8 = 0x58;

/// Every channel type with a standard decode rule.
pub const KNOWN: [u8; 8] = [
    TIME,
    ACCELERATION,
    ANGULAR_VELOCITY,
    ANGLES,
    MAGNETIC_FIELD,
    PRESSURE_ALTITUDE,
    LON_LAT,
    HEIGHT_YAW_VELOCITY,
];

/// Returns the canonical channel name for a channel type, if it is known.
pub fn channel_name(channel_type: u8) -> Option<&'static str> {
    match channel_type {
        TIME => Some("time"),
        ACCELERATION => Some("acceleration"),
        ANGULAR_VELOCITY => Some("angular_velocity"),
        ANGLES => Some("angles"),
        MAGNETIC_FIELD => Some("magnetic_field"),
        PRESSURE_ALTITUDE => Some("pressure_altitude"),
        LON_LAT => Some("lon_lat"),
        HEIGHT_YAW_VELOCITY => Some("height_yaw_velocity"),
        _ => None,
    }
}

/// Returns true if the channel type has a standard decode rule.
pub fn is_known(channel_type: u8) -> bool {
    channel_name(channel_type).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_types_have_names() {
        for t in KNOWN {
            assert!(is_known(t), "0x{t:02X} should be known");
        }
        assert_eq!(channel_name(LON_LAT), Some("lon_lat"));
    }

    #[test]
    fn header_byte_is_not_a_channel() {
        assert!(!is_known(0x55));
        assert!(!is_known(0x59));
        assert_eq!(channel_name(0x00), None);
    }
}
