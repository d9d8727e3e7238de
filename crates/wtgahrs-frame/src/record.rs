use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

/// A single field as read from the wire, before any scaling.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
pub enum RawValue {
    U8(u8),
    I16(i16),
    I32(i32),
    F32(f32),
}

impl RawValue {
    pub fn as_f64(self) -> f64 {
        match self {
            RawValue::U8(v) => f64::from(v),
            RawValue::I16(v) => f64::from(v),
            RawValue::I32(v) => f64::from(v),
            RawValue::F32(v) => f64::from(v),
        }
    }
}

impl fmt::Display for RawValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RawValue::U8(v) => write!(f, "{v}"),
            RawValue::I16(v) => write!(f, "{v}"),
            RawValue::I32(v) => write!(f, "{v}"),
            RawValue::F32(v) => write!(f, "{v}"),
        }
    }
}

/// The decoded payload of one frame.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum DecodedValue {
    /// Fields exactly as read, for channels without a scale.
    Raw(Vec<RawValue>),
    /// Fields converted to physical units.
    Scaled(Vec<f64>),
}

impl DecodedValue {
    pub fn as_raw(&self) -> Option<&[RawValue]> {
        match self {
            DecodedValue::Raw(values) => Some(values),
            DecodedValue::Scaled(_) => None,
        }
    }

    pub fn as_scaled(&self) -> Option<&[f64]> {
        match self {
            DecodedValue::Scaled(values) => Some(values),
            DecodedValue::Raw(_) => None,
        }
    }

    /// All fields widened to `f64`, whichever form they are in.
    pub fn to_f64_vec(&self) -> Vec<f64> {
        match self {
            DecodedValue::Raw(values) => values.iter().map(|v| v.as_f64()).collect(),
            DecodedValue::Scaled(values) => values.clone(),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            DecodedValue::Raw(values) => values.len(),
            DecodedValue::Scaled(values) => values.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Display for DecodedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        match self {
            DecodedValue::Raw(values) => write_joined(f, values)?,
            DecodedValue::Scaled(values) => write_joined(f, values)?,
        }
        f.write_str("]")
    }
}

fn write_joined<T: fmt::Display>(f: &mut fmt::Formatter<'_>, values: &[T]) -> fmt::Result {
    for (i, v) in values.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{v}")?;
    }
    Ok(())
}

/// Sensor clock reading carried by a `time` frame.
///
/// `year` is the two-digit year as sent by the sensor (e.g. 24 for 2024).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SensorTime {
    pub year: u8,
    pub month: u8,
    pub day: u8,
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
}

/// GPS height, GPS yaw and ground velocity, unscaled.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HeightYawVelocity {
    pub height: i16,
    pub yaw: i16,
    pub velocity: f32,
}

/// The decoded records of one decode pass, keyed by channel name.
///
/// Holds at most one value per channel: when a buffer carries several frames
/// of the same channel, the last one wins.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Records {
    values: BTreeMap<&'static str, DecodedValue>,
}

impl Records {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `value` under `channel`, returning the value it replaced.
    pub fn insert(&mut self, channel: &'static str, value: DecodedValue) -> Option<DecodedValue> {
        self.values.insert(channel, value)
    }

    pub fn get(&self, channel: &str) -> Option<&DecodedValue> {
        self.values.get(channel)
    }

    pub fn contains(&self, channel: &str) -> bool {
        self.values.contains_key(channel)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Channels and values, ordered by channel name.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &DecodedValue)> + '_ {
        self.values.iter().map(|(k, v)| (*k, v))
    }

    /// Merge `other` into `self`; values in `other` win.
    pub fn extend(&mut self, other: Records) {
        self.values.extend(other.values);
    }

    pub fn time(&self) -> Option<SensorTime> {
        let raw = self.get("time")?.as_raw()?;
        let field = |i: usize| match raw.get(i) {
            Some(RawValue::U8(v)) => Some(*v),
            _ => None,
        };
        Some(SensorTime {
            year: field(0)?,
            month: field(1)?,
            day: field(2)?,
            hour: field(3)?,
            minute: field(4)?,
            second: field(5)?,
        })
    }

    /// X/Y/Z acceleration in m/s².
    pub fn acceleration(&self) -> Option<[f64; 3]> {
        self.scaled("acceleration")
    }

    /// X/Y/Z angular velocity in °/s.
    pub fn angular_velocity(&self) -> Option<[f64; 3]> {
        self.scaled("angular_velocity")
    }

    /// Roll, pitch, yaw in degrees.
    pub fn angles(&self) -> Option<[f64; 3]> {
        self.scaled("angles")
    }

    /// X/Y/Z magnetic field in µT.
    pub fn magnetic_field(&self) -> Option<[f64; 3]> {
        self.scaled("magnetic_field")
    }

    /// Pressure in Pa and altitude in m.
    pub fn pressure_altitude(&self) -> Option<[f64; 2]> {
        self.scaled("pressure_altitude")
    }

    /// Longitude and latitude in degrees.
    pub fn lon_lat(&self) -> Option<[f64; 2]> {
        self.scaled("lon_lat")
    }

    pub fn height_yaw_velocity(&self) -> Option<HeightYawVelocity> {
        match self.get("height_yaw_velocity")?.as_raw()? {
            [RawValue::I16(height), RawValue::I16(yaw), RawValue::F32(velocity)] => {
                Some(HeightYawVelocity {
                    height: *height,
                    yaw: *yaw,
                    velocity: *velocity,
                })
            }
            _ => None,
        }
    }

    fn scaled<const N: usize>(&self, channel: &str) -> Option<[f64; N]> {
        self.get(channel)?.as_scaled()?.try_into().ok()
    }
}

impl IntoIterator for Records {
    type Item = (&'static str, DecodedValue);
    type IntoIter = std::collections::btree_map::IntoIter<&'static str, DecodedValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_overwrites_same_channel() {
        let mut records = Records::new();
        assert!(records
            .insert("angles", DecodedValue::Scaled(vec![1.0, 2.0, 3.0]))
            .is_none());
        let old = records.insert("angles", DecodedValue::Scaled(vec![4.0, 5.0, 6.0]));

        assert_eq!(old, Some(DecodedValue::Scaled(vec![1.0, 2.0, 3.0])));
        assert_eq!(records.len(), 1);
        assert_eq!(records.angles(), Some([4.0, 5.0, 6.0]));
    }

    #[test]
    fn typed_accessor_rejects_wrong_arity() {
        let mut records = Records::new();
        records.insert("acceleration", DecodedValue::Scaled(vec![1.0, 2.0]));
        assert_eq!(records.acceleration(), None);
    }

    #[test]
    fn time_accessor_reads_raw_bytes() {
        let mut records = Records::new();
        records.insert(
            "time",
            DecodedValue::Raw([24, 3, 15, 12, 30, 45].map(RawValue::U8).to_vec()),
        );

        let time = records.time().unwrap();
        assert_eq!((time.year, time.month, time.day), (24, 3, 15));
        assert_eq!((time.hour, time.minute, time.second), (12, 30, 45));
    }

    #[test]
    fn height_yaw_velocity_accessor() {
        let mut records = Records::new();
        records.insert(
            "height_yaw_velocity",
            DecodedValue::Raw(vec![
                RawValue::I16(120),
                RawValue::I16(-45),
                RawValue::F32(3.5),
            ]),
        );

        let hyv = records.height_yaw_velocity().unwrap();
        assert_eq!(hyv.height, 120);
        assert_eq!(hyv.yaw, -45);
        assert_eq!(hyv.velocity, 3.5);
    }

    #[test]
    fn serializes_as_flat_map() {
        let mut records = Records::new();
        records.insert("magnetic_field", DecodedValue::Scaled(vec![1.0, -2.0, 0.5]));
        records.insert(
            "time",
            DecodedValue::Raw([24, 1, 2, 3, 4, 5].map(RawValue::U8).to_vec()),
        );

        let json = serde_json::to_string(&records).unwrap();
        assert_eq!(
            json,
            r#"{"magnetic_field":[1.0,-2.0,0.5],"time":[24,1,2,3,4,5]}"#
        );
    }

    #[test]
    fn display_matches_list_form() {
        let value = DecodedValue::Raw(vec![RawValue::I16(7), RawValue::F32(1.5)]);
        assert_eq!(value.to_string(), "[7, 1.5]");
        assert_eq!(DecodedValue::Scaled(vec![0.25]).to_string(), "[0.25]");
    }

    #[test]
    fn extend_prefers_newer_values() {
        let mut first = Records::new();
        first.insert("angles", DecodedValue::Scaled(vec![0.0, 0.0, 0.0]));
        let mut second = Records::new();
        second.insert("angles", DecodedValue::Scaled(vec![9.0, 9.0, 9.0]));
        second.insert("lon_lat", DecodedValue::Scaled(vec![1.0, 2.0]));

        first.extend(second);
        assert_eq!(first.angles(), Some([9.0, 9.0, 9.0]));
        assert_eq!(first.lon_lat(), Some([1.0, 2.0]));
    }
}
