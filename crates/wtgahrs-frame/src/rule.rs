//! Static decode rules, one per channel type.
//!
//! A rule says how long the channel's frames are, how the payload's leading
//! bytes are laid out (little-endian), and how raw fields map to physical
//! units.

use std::sync::OnceLock;

use bytes::{Buf, BufMut, BytesMut};

use crate::channel;
use crate::codec::{DEFAULT_FRAME_LEN, PREFIX_LEN};
use crate::error::{FrameError, Result};
use crate::record::{DecodedValue, RawValue};

/// Wire type of one payload field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    U8,
    I16,
    I32,
    F32,
}

impl FieldKind {
    /// Width of the field on the wire, in bytes.
    pub const fn width(self) -> usize {
        match self {
            FieldKind::U8 => 1,
            FieldKind::I16 => 2,
            FieldKind::I32 | FieldKind::F32 => 4,
        }
    }

    fn read(self, src: &mut &[u8]) -> RawValue {
        match self {
            FieldKind::U8 => RawValue::U8(src.get_u8()),
            FieldKind::I16 => RawValue::I16(src.get_i16_le()),
            FieldKind::I32 => RawValue::I32(src.get_i32_le()),
            FieldKind::F32 => RawValue::F32(src.get_f32_le()),
        }
    }

    // Float-to-int `as` casts saturate, so out-of-range values clamp.
    fn write(self, value: f64, dst: &mut BytesMut) {
        match self {
            FieldKind::U8 => dst.put_u8(value.round() as u8),
            FieldKind::I16 => dst.put_i16_le(value.round() as i16),
            FieldKind::I32 => dst.put_i32_le(value.round() as i32),
            FieldKind::F32 => dst.put_f32_le(value as f32),
        }
    }
}

/// Conversion from raw field values to physical units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Scale {
    /// Fields are reported raw.
    None,
    /// Every field is multiplied by the factor.
    Mul(f64),
    /// Every field is divided by the divisor.
    Div(f64),
    /// Field `i` is multiplied by factor `i`.
    PerField(&'static [f64]),
}

impl Scale {
    pub fn is_none(self) -> bool {
        matches!(self, Scale::None)
    }

    /// The first factor that is zero or not finite, if any.
    fn degenerate_factor(self) -> Option<f64> {
        let bad = |f: &f64| *f == 0.0 || !f.is_finite();
        match self {
            Scale::None => None,
            Scale::Mul(f) | Scale::Div(f) => Some(f).filter(bad),
            Scale::PerField(factors) => factors.iter().copied().find(bad),
        }
    }

    /// Physical value of raw field `index`.
    pub fn apply(self, index: usize, raw: f64) -> f64 {
        match self {
            Scale::None => raw,
            Scale::Mul(factor) => raw * factor,
            Scale::Div(divisor) => raw / divisor,
            Scale::PerField(factors) => raw * factors.get(index).copied().unwrap_or(1.0),
        }
    }

    /// Raw value of field `index` for a physical value; inverse of [`Scale::apply`].
    pub fn invert(self, index: usize, physical: f64) -> f64 {
        match self {
            Scale::None => physical,
            Scale::Mul(factor) => physical / factor,
            Scale::Div(divisor) => physical * divisor,
            Scale::PerField(factors) => physical / factors.get(index).copied().unwrap_or(1.0),
        }
    }
}

/// How to decode the frames of one channel type.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DecodeRule {
    pub channel_type: u8,
    /// Key the decoded value is stored under.
    pub name: &'static str,
    /// Total frame span on the wire, header and type byte included.
    pub frame_len: usize,
    /// Leading payload fields, in wire order.
    pub fields: &'static [FieldKind],
    pub scale: Scale,
}

impl DecodeRule {
    /// Payload bytes per frame (span minus header and type byte).
    pub fn payload_len(&self) -> usize {
        self.frame_len.saturating_sub(PREFIX_LEN)
    }

    /// Bytes the field layout occupies at the start of the payload.
    pub fn layout_len(&self) -> usize {
        self.fields.iter().map(|f| f.width()).sum()
    }

    /// Check that the layout fits the span and the scale fits the layout.
    pub fn validate(&self) -> Result<()> {
        if self.frame_len < PREFIX_LEN {
            return Err(FrameError::FrameTooShort {
                channel_type: self.channel_type,
                len: self.frame_len,
            });
        }
        if self.layout_len() > self.payload_len() {
            return Err(FrameError::LayoutExceedsFrame {
                channel_type: self.channel_type,
                layout: self.layout_len(),
                payload: self.payload_len(),
            });
        }
        if let Scale::PerField(factors) = self.scale {
            if factors.len() != self.fields.len() {
                return Err(FrameError::ScaleMismatch {
                    channel_type: self.channel_type,
                    factors: factors.len(),
                    fields: self.fields.len(),
                });
            }
        }
        if let Some(factor) = self.scale.degenerate_factor() {
            return Err(FrameError::InvalidScale {
                channel_type: self.channel_type,
                factor,
            });
        }
        Ok(())
    }

    /// Decode a frame payload. Trailing payload bytes past the layout are ignored.
    ///
    /// Returns `None` if the payload is shorter than the layout, which cannot
    /// happen for frames cut by a validated [`RuleSet`].
    pub fn decode_payload(&self, payload: &[u8]) -> Option<DecodedValue> {
        if payload.len() < self.layout_len() {
            return None;
        }

        let mut src = payload;
        let raw = self.fields.iter().map(|kind| kind.read(&mut src));

        Some(if self.scale.is_none() {
            DecodedValue::Raw(raw.collect())
        } else {
            DecodedValue::Scaled(
                raw.enumerate()
                    .map(|(i, v)| self.scale.apply(i, v.as_f64()))
                    .collect(),
            )
        })
    }

    /// Encode `values` (physical units, or raw for unscaled rules) as a full
    /// payload, zero-padded to [`DecodeRule::payload_len`].
    pub fn encode_payload(&self, values: &[f64], dst: &mut BytesMut) -> Result<()> {
        if values.len() != self.fields.len() {
            return Err(FrameError::FieldCount {
                channel_type: self.channel_type,
                expected: self.fields.len(),
                got: values.len(),
            });
        }

        dst.reserve(self.payload_len());
        for (i, (kind, value)) in self.fields.iter().zip(values).enumerate() {
            kind.write(self.scale.invert(i, *value), dst);
        }
        dst.put_bytes(0, self.payload_len() - self.layout_len());
        Ok(())
    }
}

const XYZ: &[FieldKind] = &[FieldKind::I16, FieldKind::I16, FieldKind::I16];

/// Decode rules for the WTGAHRS2 output channels. Every frame spans 14 bytes.
pub const STANDARD_RULES: [DecodeRule; 8] = [
    DecodeRule {
        channel_type: channel::TIME,
        name: "time",
        frame_len: DEFAULT_FRAME_LEN,
        fields: &[FieldKind::U8; 6],
        scale: Scale::None,
    },
    DecodeRule {
        channel_type: channel::ACCELERATION,
        name: "acceleration",
        frame_len: DEFAULT_FRAME_LEN,
        fields: XYZ,
        scale: Scale::Mul(16.0 / 32768.0),
    },
    DecodeRule {
        channel_type: channel::ANGULAR_VELOCITY,
        name: "angular_velocity",
        frame_len: DEFAULT_FRAME_LEN,
        fields: XYZ,
        scale: Scale::Mul(2000.0 / 32768.0),
    },
    DecodeRule {
        channel_type: channel::ANGLES,
        name: "angles",
        frame_len: DEFAULT_FRAME_LEN,
        fields: XYZ,
        scale: Scale::Mul(180.0 / 32768.0),
    },
    DecodeRule {
        channel_type: channel::MAGNETIC_FIELD,
        name: "magnetic_field",
        frame_len: DEFAULT_FRAME_LEN,
        fields: XYZ,
        scale: Scale::Div(117.0),
    },
    // Pressure in Pa, altitude in cm reported as m.
    DecodeRule {
        channel_type: channel::PRESSURE_ALTITUDE,
        name: "pressure_altitude",
        frame_len: DEFAULT_FRAME_LEN,
        fields: &[FieldKind::I32, FieldKind::I32],
        scale: Scale::PerField(&[1.0, 0.01]),
    },
    DecodeRule {
        channel_type: channel::LON_LAT,
        name: "lon_lat",
        frame_len: DEFAULT_FRAME_LEN,
        fields: &[FieldKind::I32, FieldKind::I32],
        scale: Scale::Div(10_000_000.0),
    },
    DecodeRule {
        channel_type: channel::HEIGHT_YAW_VELOCITY,
        name: "height_yaw_velocity",
        frame_len: DEFAULT_FRAME_LEN,
        fields: &[FieldKind::I16, FieldKind::I16, FieldKind::F32],
        scale: Scale::None,
    },
];

/// A validated table of decode rules keyed by channel type.
#[derive(Debug, Clone)]
pub struct RuleSet {
    rules: Vec<DecodeRule>,
    index: [Option<u8>; 256],
    default_frame_len: usize,
}

impl RuleSet {
    /// Build a rule set, rejecting invalid or duplicate rules.
    pub fn new(rules: impl IntoIterator<Item = DecodeRule>) -> Result<Self> {
        let mut set = Self::empty();
        for rule in rules {
            set = set.with_rule(rule)?;
        }
        Ok(set)
    }

    /// The standard WTGAHRS2 rules.
    pub fn standard() -> &'static RuleSet {
        static STANDARD: OnceLock<RuleSet> = OnceLock::new();
        STANDARD.get_or_init(|| {
            let mut set = Self::empty();
            for rule in STANDARD_RULES {
                set.push(rule);
            }
            set
        })
    }

    /// Add a rule.
    pub fn with_rule(mut self, rule: DecodeRule) -> Result<Self> {
        rule.validate()?;
        if self.get(rule.channel_type).is_some() {
            return Err(FrameError::DuplicateRule(rule.channel_type));
        }
        self.push(rule);
        Ok(self)
    }

    /// Set the span assumed for frames whose channel type has no rule.
    pub fn with_default_frame_len(mut self, len: usize) -> Result<Self> {
        if len < PREFIX_LEN {
            return Err(FrameError::FrameTooShort {
                channel_type: 0,
                len,
            });
        }
        self.default_frame_len = len;
        Ok(self)
    }

    pub fn get(&self, channel_type: u8) -> Option<&DecodeRule> {
        self.index[channel_type as usize].map(|i| &self.rules[i as usize])
    }

    pub fn iter(&self) -> impl Iterator<Item = &DecodeRule> {
        self.rules.iter()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Span assumed for frames whose channel type has no rule.
    pub fn default_frame_len(&self) -> usize {
        self.default_frame_len
    }

    /// Frame span for a channel type, registered or not.
    pub fn frame_len(&self, channel_type: u8) -> usize {
        self.get(channel_type)
            .map_or(self.default_frame_len, |rule| rule.frame_len)
    }

    /// Longest frame span this set can cut.
    pub fn max_frame_len(&self) -> usize {
        self.rules
            .iter()
            .map(|rule| rule.frame_len)
            .fold(self.default_frame_len, usize::max)
    }

    fn empty() -> Self {
        Self {
            rules: Vec::new(),
            index: [None; 256],
            default_frame_len: DEFAULT_FRAME_LEN,
        }
    }

    // One rule per channel type, so the position always fits in a u8.
    fn push(&mut self, rule: DecodeRule) {
        self.index[rule.channel_type as usize] = Some(self.rules.len() as u8);
        self.rules.push(rule);
    }
}

impl Default for RuleSet {
    fn default() -> Self {
        Self::standard().clone()
    }
}
