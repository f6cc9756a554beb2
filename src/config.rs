//! Device configuration: which axes exist, their input ranges, and the
//! identity the device presents to the host.
use serde::{Deserialize, Serialize};
use usbd_flystick_descriptors::SimulationUsage;

use crate::{Error, Result};

/// Report ID used when none is configured.
pub const DEFAULT_REPORT_ID: u8 = 0x03;
/// Default lower bound of every axis input range.
pub const DEFAULT_AXIS_MINIMUM: i16 = 0;
/// Default upper bound of every axis input range.
pub const DEFAULT_AXIS_MAXIMUM: i16 = 1023;
/// Number of 16-bit fields a report can carry. The toe brake occupies two.
pub const AXIS_COUNT: usize = 7;
/// Upper bound on the bytes [`FlystickConfig::to_bytes`] writes.
pub const MAX_SERIALIZED_SIZE: usize = 64;

/// The kind of flight simulation device announced as the application
/// collection usage.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DeviceType {
    #[default]
    Flight,
    Spaceship,
    Airplane,
}

impl DeviceType {
    pub fn usage(self) -> SimulationUsage {
        match self {
            DeviceType::Flight => SimulationUsage::FlightSimulationDevice,
            DeviceType::Spaceship => SimulationUsage::SpaceshipSimulationDevice,
            DeviceType::Airplane => SimulationUsage::AirplaneSimulationDevice,
        }
    }
}

/// One data field of the input report, listed in the order fields appear
/// on the wire.
#[repr(u8)]
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Axis {
    Rudder = 0,
    Throttle = 1,
    ToeBrakeLeft = 2,
    ToeBrakeRight = 3,
    Accelerator = 4,
    Brake = 5,
    Steering = 6,
}

impl Axis {
    /// Every axis, in report order.
    pub const CANONICAL: [Axis; AXIS_COUNT] = [
        Axis::Rudder,
        Axis::Throttle,
        Axis::ToeBrakeLeft,
        Axis::ToeBrakeRight,
        Axis::Accelerator,
        Axis::Brake,
        Axis::Steering,
    ];

    /// Position of the axis in `CANONICAL`.
    pub fn index(self) -> usize {
        self as usize
    }

    /// Both toe brake sides share a single usage; they are told apart only
    /// by their position in the report.
    pub fn usage(self) -> SimulationUsage {
        match self {
            Axis::Rudder => SimulationUsage::Rudder,
            Axis::Throttle => SimulationUsage::Throttle,
            Axis::ToeBrakeLeft | Axis::ToeBrakeRight => SimulationUsage::ToeBrake,
            Axis::Accelerator => SimulationUsage::Accelerator,
            Axis::Brake => SimulationUsage::Brake,
            Axis::Steering => SimulationUsage::Steering,
        }
    }

    pub fn is_enabled(self, flags: &AxisFlags) -> bool {
        match self {
            Axis::Rudder => flags.rudder,
            Axis::Throttle => flags.throttle,
            Axis::ToeBrakeLeft | Axis::ToeBrakeRight => flags.toe_brake,
            Axis::Accelerator => flags.accelerator,
            Axis::Brake => flags.brake,
            Axis::Steering => flags.steering,
        }
    }
}

/// The set of axes a device exposes. Disabled axes are absent from both the
/// report descriptor and the reports.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AxisFlags {
    pub rudder: bool,
    pub throttle: bool,
    pub toe_brake: bool,
    pub accelerator: bool,
    pub brake: bool,
    pub steering: bool,
}

impl AxisFlags {
    pub const ALL: AxisFlags = AxisFlags {
        rudder: true,
        throttle: true,
        toe_brake: true,
        accelerator: true,
        brake: true,
        steering: true,
    };

    pub const NONE: AxisFlags = AxisFlags {
        rudder: false,
        throttle: false,
        toe_brake: false,
        accelerator: false,
        brake: false,
        steering: false,
    };

    /// Builds the flag set from the low six bits of `bits`, in the order
    /// rudder, throttle, toe brake, accelerator, brake, steering.
    pub fn from_bits(bits: u8) -> Self {
        AxisFlags {
            rudder: bits & 0x01 != 0,
            throttle: bits & 0x02 != 0,
            toe_brake: bits & 0x04 != 0,
            accelerator: bits & 0x08 != 0,
            brake: bits & 0x10 != 0,
            steering: bits & 0x20 != 0,
        }
    }

    /// Number of enabled flags.
    pub fn count(&self) -> usize {
        [
            self.rudder,
            self.throttle,
            self.toe_brake,
            self.accelerator,
            self.brake,
            self.steering,
        ]
        .iter()
        .filter(|f| **f)
        .count()
    }

    /// Number of 16-bit report fields; the toe brake counts twice.
    pub fn field_count(&self) -> usize {
        Axis::CANONICAL.iter().filter(|a| a.is_enabled(self)).count()
    }
}

impl Default for AxisFlags {
    fn default() -> Self {
        AxisFlags::ALL
    }
}

/// The input range an application reports an axis in.
///
/// `min > max` is valid and requests an inverted axis: increasing input
/// values then produce decreasing output values.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AxisRange {
    pub min: i16,
    pub max: i16,
}

impl AxisRange {
    pub const fn new(min: i16, max: i16) -> Self {
        AxisRange { min, max }
    }

    pub fn is_inverted(&self) -> bool {
        self.min > self.max
    }

    pub fn real_min(&self) -> i16 {
        self.min.min(self.max)
    }

    pub fn real_max(&self) -> i16 {
        self.min.max(self.max)
    }
}

impl Default for AxisRange {
    fn default() -> Self {
        AxisRange::new(DEFAULT_AXIS_MINIMUM, DEFAULT_AXIS_MAXIMUM)
    }
}

/// Everything needed to construct a [`Flystick`](crate::flystick::Flystick).
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FlystickConfig {
    pub report_id: u8,
    pub device_type: DeviceType,
    pub axes: AxisFlags,
    /// Input range per report field, indexed by [`Axis::index`].
    pub ranges: [AxisRange; AXIS_COUNT],
}

impl Default for FlystickConfig {
    fn default() -> Self {
        FlystickConfig {
            report_id: DEFAULT_REPORT_ID,
            device_type: DeviceType::default(),
            axes: AxisFlags::default(),
            ranges: [AxisRange::default(); AXIS_COUNT],
        }
    }
}

impl FlystickConfig {
    pub fn with_report_id(mut self, report_id: u8) -> Self {
        self.report_id = report_id;
        self
    }

    pub fn with_device_type(mut self, device_type: DeviceType) -> Self {
        self.device_type = device_type;
        self
    }

    pub fn with_axes(mut self, axes: AxisFlags) -> Self {
        self.axes = axes;
        self
    }

    pub fn with_range(mut self, axis: Axis, range: AxisRange) -> Self {
        self.ranges[axis.index()] = range;
        self
    }

    pub fn range(&self, axis: Axis) -> AxisRange {
        self.ranges[axis.index()]
    }

    /// Checks the configuration can be announced to a host. Report ID 0 is
    /// reserved by HID 1.11, section 6.2.2.7.
    pub fn validate(&self) -> Result<()> {
        if self.report_id == 0 {
            return Err(Error::InvalidReportId);
        }
        Ok(())
    }

    /// Serializes the configuration into `buf`, e.g. for keeping calibration
    /// in flash. Returns the number of bytes written.
    pub fn to_bytes(&self, buf: &mut [u8]) -> Result<usize> {
        // ssmarshal debug-asserts on a short buffer; scratch fits any config.
        let mut scratch = [0u8; MAX_SERIALIZED_SIZE];
        let n = ssmarshal::serialize(&mut scratch, self).map_err(|_| Error::BufferOverflow)?;
        if n > buf.len() {
            return Err(Error::BufferOverflow);
        }
        buf[..n].copy_from_slice(&scratch[..n]);
        Ok(n)
    }

    /// Reads back a configuration written by [`FlystickConfig::to_bytes`],
    /// returning it along with the number of bytes consumed.
    pub fn from_bytes(buf: &[u8]) -> Result<(Self, usize)> {
        // Zero padding keeps the decoder from running off the end of a
        // truncated record; anything read from the padding is rejected.
        let mut scratch = [0u8; MAX_SERIALIZED_SIZE];
        let n = buf.len().min(MAX_SERIALIZED_SIZE);
        scratch[..n].copy_from_slice(&buf[..n]);
        let (config, used) =
            ssmarshal::deserialize::<FlystickConfig>(&scratch).map_err(|_| Error::ParseError)?;
        if used > n {
            return Err(Error::ParseError);
        }
        Ok((config, used))
    }
}
