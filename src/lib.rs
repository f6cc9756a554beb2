//! USB HID flight simulation controller
//!
//! This crate implements a HID device exposing simulation controls (rudder,
//! throttle, toe brakes, accelerator, brake and steering). It generates the
//! report descriptor for whichever axes are enabled, scales application
//! readings into input reports, and sends them to a host through
//! usb-device.
//!
//! ```no_run
//! # use usb_device::class_prelude::*;
//! # fn run<B: UsbBus>(alloc: &UsbBusAllocator<B>) -> usbd_flystick::Result<()> {
//! use usbd_flystick::prelude::*;
//!
//! let config = FlystickConfig::default()
//!     .with_device_type(DeviceType::Airplane)
//!     .with_range(Axis::Throttle, AxisRange::new(1023, 0));
//! let mut stick = Flystick::new(config, FlystickClass::new(alloc, 10))?;
//! stick.begin(true);
//! stick.set_throttle(300);
//! # Ok(())
//! # }
//! ```
#![no_std]

pub use usb_device::UsbError;
pub use usbd_flystick_descriptors::SimulationUsage;

pub mod config;
pub mod descriptor;
pub mod flystick;
pub mod hid_class;
pub mod report;

/// Prelude for applications driving a flight controller.
pub mod prelude {
    pub use crate::config::{Axis, AxisFlags, AxisRange, DeviceType, FlystickConfig};
    pub use crate::descriptor::DeviceDescriptor;
    pub use crate::flystick::Flystick;
    pub use crate::hid_class::{FlystickClass, FlystickTransport};
}

/// Errors raised while configuring or driving a flight controller.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// The report descriptor would not fit in `MAX_DESCRIPTOR_SIZE` bytes.
    DescriptorOverflow,
    /// Report ID 0 is reserved.
    InvalidReportId,
    /// A report was sent before a descriptor was registered.
    NotRegistered,
    /// A descriptor was registered twice.
    AlreadyRegistered,
    /// A buffer was too small for the data written to it.
    BufferOverflow,
    /// Stored data could not be decoded.
    ParseError,
    Usb(UsbError),
}

impl From<UsbError> for Error {
    fn from(e: UsbError) -> Self {
        Error::Usb(e)
    }
}

pub type Result<T> = core::result::Result<T, Error>;
