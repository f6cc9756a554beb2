//! Encoding of axis readings into input reports.
//!
//! Every enabled axis contributes one little-endian 16-bit field, scaled from
//! its configured input range onto the logical range declared by the report
//! descriptor. Disabled axes contribute nothing.
use byteorder::{ByteOrder, LittleEndian};

use crate::config::{Axis, AxisFlags, AxisRange, AXIS_COUNT};
use crate::descriptor::{LOGICAL_MAXIMUM, LOGICAL_MINIMUM};

/// Bytes per axis field.
pub const FIELD_SIZE: usize = 2;

/// Largest possible report payload, with every axis enabled.
pub const MAX_REPORT_SIZE: usize = FIELD_SIZE * AXIS_COUNT;

/// The logical range every axis is scaled onto.
pub const OUTPUT_RANGE: AxisRange = AxisRange::new(LOGICAL_MINIMUM, LOGICAL_MAXIMUM);

/// Maps `value` from `input` onto `output`.
///
/// The value is first clamped into the input range. If the input range is
/// inverted (`min > max`) the clamped value is reflected within it before
/// scaling. Scaling is proportional with division truncating toward zero; a
/// zero-width input range always yields `output.min`.
pub fn scale(value: i16, input: AxisRange, output: AxisRange) -> i16 {
    let real_min = input.real_min() as i64;
    let real_max = input.real_max() as i64;

    let mut value = (value as i64).clamp(real_min, real_max);
    if input.is_inverted() {
        value = real_max - value + real_min;
    }

    if real_min == real_max {
        return output.min;
    }

    let (out_min, out_max) = (output.min as i64, output.max as i64);
    let scaled = out_min + (value - real_min) * (out_max - out_min) / (real_max - real_min);
    scaled as i16
}

/// Writes the field for a single axis into `out`, returning the number of
/// bytes written: 0 when the axis is disabled, otherwise 2.
///
/// # Panics
///
/// Panics if the axis is enabled and `out` is shorter than two bytes.
pub fn encode_axis(
    enabled: bool,
    value: i16,
    input: AxisRange,
    output: AxisRange,
    out: &mut [u8],
) -> usize {
    if !enabled {
        return 0;
    }
    LittleEndian::write_i16(&mut out[..FIELD_SIZE], scale(value, input, output));
    FIELD_SIZE
}

/// The live state of one report field.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AxisState {
    pub enabled: bool,
    pub value: i16,
    pub range: AxisRange,
}

/// An encoded input report payload. The report ID is not part of it.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ReportBuffer {
    buf: [u8; MAX_REPORT_SIZE],
    len: usize,
}

impl ReportBuffer {
    pub fn as_slice(&self) -> &[u8] {
        &self.buf[..self.len]
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl AsRef<[u8]> for ReportBuffer {
    fn as_ref(&self) -> &[u8] {
        self.as_slice()
    }
}

/// Encodes a full report from the state of every field, indexed by
/// [`Axis::index`]. The payload is `2 * enabled fields` bytes long.
pub fn encode_report(states: &[AxisState; AXIS_COUNT]) -> ReportBuffer {
    let mut report = ReportBuffer {
        buf: [0; MAX_REPORT_SIZE],
        len: 0,
    };
    for axis in Axis::CANONICAL {
        let s = &states[axis.index()];
        report.len += encode_axis(
            s.enabled,
            s.value,
            s.range,
            OUTPUT_RANGE,
            &mut report.buf[report.len..],
        );
    }
    report
}

/// Where each field sits within the report payload.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct ReportLayout {
    offsets: [Option<usize>; AXIS_COUNT],
    len: usize,
}

impl ReportLayout {
    pub fn new(axes: &AxisFlags) -> Self {
        let mut offsets = [None; AXIS_COUNT];
        let mut len = 0;
        for axis in Axis::CANONICAL {
            if axis.is_enabled(axes) {
                offsets[axis.index()] = Some(len);
                len += FIELD_SIZE;
            }
        }
        ReportLayout { offsets, len }
    }

    /// Byte offset of the axis field, or `None` if the axis is disabled.
    pub fn offset(&self, axis: Axis) -> Option<usize> {
        self.offsets[axis.index()]
    }

    /// Total payload length.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode(value: i16, input: AxisRange) -> i16 {
        let mut out = [0u8; 2];
        assert_eq!(encode_axis(true, value, input, OUTPUT_RANGE, &mut out), 2);
        LittleEndian::read_i16(&out)
    }

    fn states(axes: &AxisFlags, value: i16) -> [AxisState; AXIS_COUNT] {
        let mut s = [AxisState::default(); AXIS_COUNT];
        for axis in Axis::CANONICAL {
            s[axis.index()] = AxisState {
                enabled: axis.is_enabled(axes),
                value,
                range: AxisRange::default(),
            };
        }
        s
    }

    #[test]
    fn disabled_axis_writes_nothing() {
        let mut out = [0xAAu8; 2];
        let n = encode_axis(false, 511, AxisRange::default(), OUTPUT_RANGE, &mut out);
        assert_eq!(n, 0);
        assert_eq!(out, [0xAA, 0xAA]);
        // Disabled axes need no room at all.
        assert_eq!(encode_axis(false, 0, AxisRange::default(), OUTPUT_RANGE, &mut []), 0);
    }

    #[test]
    fn midpoint_is_near_zero() {
        let r = AxisRange::new(0, 1023);
        let mut out = [0u8; 2];
        encode_axis(true, 511, r, OUTPUT_RANGE, &mut out);
        // -32767 + 511 * 65534 / 1023 = -33
        assert_eq!(out, [0xDF, 0xFF]);
        assert_eq!(encode(512, r), 32);
    }

    #[test]
    fn boundaries_are_exact() {
        for &(lo, hi) in &[(0, 1023), (-100, 100), (i16::MIN, i16::MAX), (7, 8), (-5, 0)] {
            let r = AxisRange::new(lo, hi);
            assert_eq!(encode(lo, r), LOGICAL_MINIMUM);
            assert_eq!(encode(hi, r), LOGICAL_MAXIMUM);
        }
    }

    #[test]
    fn out_of_range_values_clamp() {
        let r = AxisRange::new(0, 1023);
        assert_eq!(encode(-500, r), LOGICAL_MINIMUM);
        assert_eq!(encode(i16::MIN, r), LOGICAL_MINIMUM);
        assert_eq!(encode(5000, r), LOGICAL_MAXIMUM);
        assert_eq!(encode(i16::MAX, r), LOGICAL_MAXIMUM);
    }

    #[test]
    fn inverted_throttle() {
        let mut out = [0u8; 2];
        encode_axis(true, 0, AxisRange::new(1023, 0), OUTPUT_RANGE, &mut out);
        assert_eq!(out, [0xFF, 0x7F]);
        assert_eq!(encode(1023, AxisRange::new(1023, 0)), LOGICAL_MINIMUM);
    }

    #[test]
    fn inversion_is_a_reflection() {
        for &(lo, hi) in &[(0i16, 1023i16), (-300, 700), (-32767, 32767), (10, 11)] {
            let forward = AxisRange::new(lo, hi);
            let inverted = AxisRange::new(hi, lo);
            let end = (hi as i32 + 50).min(i16::MAX as i32);
            let mut v = (lo as i32 - 50).max(i16::MIN as i32);
            while v <= end {
                let clamped = v.clamp(lo as i32, hi as i32);
                let reflected = (lo as i32 + hi as i32 - clamped) as i16;
                assert_eq!(
                    encode(v as i16, inverted),
                    encode(reflected, forward),
                    "v={} range=[{}, {}]",
                    v,
                    lo,
                    hi
                );
                v += 7;
            }
        }
    }

    #[test]
    fn degenerate_range_yields_output_min() {
        for &v in &[i16::MIN, -1, 0, 42, 1023, i16::MAX] {
            assert_eq!(encode(v, AxisRange::new(42, 42)), LOGICAL_MINIMUM);
            assert_eq!(encode(v, AxisRange::new(-3, -3)), LOGICAL_MINIMUM);
        }
    }

    #[test]
    fn monotonic_scaling() {
        let r = AxisRange::new(-1000, 1000);
        let mut last = encode(-1000, r);
        for v in -999..=1000 {
            let cur = encode(v, r);
            assert!(cur >= last);
            last = cur;
        }
    }

    #[test]
    fn custom_output_range() {
        let out = AxisRange::new(0, 255);
        assert_eq!(scale(0, AxisRange::new(0, 1023), out), 0);
        assert_eq!(scale(1023, AxisRange::new(0, 1023), out), 255);
        assert_eq!(scale(512, AxisRange::new(0, 1023), out), 127);
    }

    #[test]
    fn report_length_follows_enabled_fields() {
        for bits in 0u8..64 {
            let axes = AxisFlags::from_bits(bits);
            let report = encode_report(&states(&axes, 100));
            assert_eq!(report.len(), 2 * axes.field_count());
            assert_eq!(report.len(), ReportLayout::new(&axes).len());
        }
        assert_eq!(encode_report(&states(&AxisFlags::ALL, 0)).len(), 14);
        assert!(encode_report(&states(&AxisFlags::NONE, 0)).is_empty());
    }

    #[test]
    fn fields_land_at_layout_offsets() {
        let axes = AxisFlags {
            throttle: true,
            toe_brake: true,
            steering: true,
            ..AxisFlags::NONE
        };
        let layout = ReportLayout::new(&axes);
        assert_eq!(layout.offset(Axis::Rudder), None);
        assert_eq!(layout.offset(Axis::Throttle), Some(0));
        assert_eq!(layout.offset(Axis::ToeBrakeLeft), Some(2));
        assert_eq!(layout.offset(Axis::ToeBrakeRight), Some(4));
        assert_eq!(layout.offset(Axis::Accelerator), None);
        assert_eq!(layout.offset(Axis::Steering), Some(6));

        let mut s = states(&axes, 0);
        s[Axis::Throttle.index()].value = 1023;
        s[Axis::ToeBrakeRight.index()].range = AxisRange::new(1023, 0);
        s[Axis::Steering.index()].value = 511;
        let report = encode_report(&s);
        let bytes = report.as_slice();
        let field = |axis: Axis| {
            let off = layout.offset(axis).unwrap();
            LittleEndian::read_i16(&bytes[off..off + 2])
        };
        assert_eq!(field(Axis::Throttle), 32767);
        assert_eq!(field(Axis::ToeBrakeLeft), -32767);
        assert_eq!(field(Axis::ToeBrakeRight), 32767);
        assert_eq!(field(Axis::Steering), -33);
    }
}
