//! The runtime state of a flight controller: current axis readings, their
//! ranges, and when to push reports out.
use log::{debug, warn};

use crate::config::{Axis, AxisRange, FlystickConfig, AXIS_COUNT};
use crate::descriptor::{self, DeviceDescriptor};
use crate::hid_class::FlystickTransport;
use crate::report::{encode_report, AxisState, ReportBuffer, ReportLayout};
use crate::Result;

/// A flight simulation controller bound to a transport.
///
/// Axis values are plain signed 16-bit readings in whatever range the
/// application configured for the axis. With auto-send active every value
/// change re-encodes and transmits the whole report; otherwise changes
/// accumulate until [`Flystick::send_state`].
pub struct Flystick<T: FlystickTransport> {
    transport: T,
    descriptor: DeviceDescriptor,
    config: FlystickConfig,
    layout: ReportLayout,
    values: [i16; AXIS_COUNT],
    auto_send: bool,
}

impl<T: FlystickTransport> Flystick<T> {
    /// Builds the report descriptor for `config` and registers it with
    /// `transport`. Fails if the configuration cannot be described or the
    /// transport refuses the descriptor.
    pub fn new(config: FlystickConfig, mut transport: T) -> Result<Self> {
        config.validate()?;
        let descriptor = descriptor::build(config.device_type, &config.axes, config.report_id)?;
        transport.register_descriptor(descriptor.clone())?;
        debug!(
            "registered {:?} controller, report id {}, {} byte reports",
            config.device_type,
            config.report_id,
            descriptor.report_len()
        );

        Ok(Flystick {
            transport,
            descriptor,
            layout: ReportLayout::new(&config.axes),
            config,
            values: [0; AXIS_COUNT],
            auto_send: false,
        })
    }

    /// Sets the auto-send mode and sends the current state once.
    pub fn begin(&mut self, auto_send: bool) {
        self.auto_send = auto_send;
        self.flush();
    }

    /// Stops sending on value changes. Explicit `send_state` calls still work.
    pub fn end(&mut self) {
        self.auto_send = false;
    }

    pub fn is_auto_send(&self) -> bool {
        self.auto_send
    }

    pub fn set_axis(&mut self, axis: Axis, value: i16) {
        self.values[axis.index()] = value;
        self.changed();
    }

    pub fn set_rudder(&mut self, value: i16) {
        self.set_axis(Axis::Rudder, value);
    }

    pub fn set_throttle(&mut self, value: i16) {
        self.set_axis(Axis::Throttle, value);
    }

    pub fn set_accelerator(&mut self, value: i16) {
        self.set_axis(Axis::Accelerator, value);
    }

    pub fn set_brake(&mut self, value: i16) {
        self.set_axis(Axis::Brake, value);
    }

    pub fn set_steering(&mut self, value: i16) {
        self.set_axis(Axis::Steering, value);
    }

    /// Sets both toe brakes at once, sending at most one report.
    pub fn set_toe_brake(&mut self, left: i16, right: i16) {
        self.values[Axis::ToeBrakeLeft.index()] = left;
        self.values[Axis::ToeBrakeRight.index()] = right;
        self.changed();
    }

    /// Changes the input range of an axis. Takes effect on the next report;
    /// nothing is sent.
    pub fn set_axis_range(&mut self, axis: Axis, range: AxisRange) {
        self.config.ranges[axis.index()] = range;
    }

    pub fn set_rudder_range(&mut self, min: i16, max: i16) {
        self.set_axis_range(Axis::Rudder, AxisRange::new(min, max));
    }

    pub fn set_throttle_range(&mut self, min: i16, max: i16) {
        self.set_axis_range(Axis::Throttle, AxisRange::new(min, max));
    }

    pub fn set_accelerator_range(&mut self, min: i16, max: i16) {
        self.set_axis_range(Axis::Accelerator, AxisRange::new(min, max));
    }

    pub fn set_brake_range(&mut self, min: i16, max: i16) {
        self.set_axis_range(Axis::Brake, AxisRange::new(min, max));
    }

    pub fn set_steering_range(&mut self, min: i16, max: i16) {
        self.set_axis_range(Axis::Steering, AxisRange::new(min, max));
    }

    pub fn set_toe_brake_range(
        &mut self,
        left_min: i16,
        left_max: i16,
        right_min: i16,
        right_max: i16,
    ) {
        self.set_axis_range(Axis::ToeBrakeLeft, AxisRange::new(left_min, left_max));
        self.set_axis_range(Axis::ToeBrakeRight, AxisRange::new(right_min, right_max));
    }

    pub fn axis_value(&self, axis: Axis) -> i16 {
        self.values[axis.index()]
    }

    /// Encodes the current state without sending it.
    pub fn report(&self) -> ReportBuffer {
        let mut states = [AxisState::default(); AXIS_COUNT];
        for axis in Axis::CANONICAL {
            states[axis.index()] = AxisState {
                enabled: axis.is_enabled(&self.config.axes),
                value: self.values[axis.index()],
                range: self.config.range(axis),
            };
        }
        let report = encode_report(&states);
        debug_assert_eq!(report.len(), self.layout.len());
        report
    }

    /// Encodes and transmits the full report. A failed transmission is
    /// returned but not retried.
    pub fn send_state(&mut self) -> Result<usize> {
        let report = self.report();
        self.transport.transmit(self.config.report_id, report.as_slice())
    }

    pub fn descriptor(&self) -> &DeviceDescriptor {
        &self.descriptor
    }

    pub fn config(&self) -> &FlystickConfig {
        &self.config
    }

    pub fn layout(&self) -> &ReportLayout {
        &self.layout
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// The transport, e.g. for handing a USB class to `UsbDevice::poll`.
    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    pub fn into_transport(self) -> T {
        self.transport
    }

    fn changed(&mut self) {
        if self.auto_send {
            self.flush();
        }
    }

    fn flush(&mut self) {
        if let Err(e) = self.send_state() {
            warn!("dropped report {}: {:?}", self.config.report_id, e);
        }
    }
}
