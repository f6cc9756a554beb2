//! Implements the flight controller as a HID class for a usb-device device.
use log::trace;
use usb_device::class_prelude::*;

use crate::descriptor::DeviceDescriptor;
use crate::report::MAX_REPORT_SIZE;
use crate::{Error, Result};

const USB_CLASS_HID: u8 = 0x03;
const USB_SUBCLASS_NONE: u8 = 0x00;
const USB_PROTOCOL_NONE: u8 = 0x00;

// HID
const HID_DESC_DESCTYPE_HID: u8 = 0x21;
const HID_DESC_DESCTYPE_HID_REPORT: u8 = 0x22;
const HID_DESC_SPEC_1_10: [u8; 2] = [0x10, 0x01];
const HID_DESC_COUNTRY_UNSPEC: u8 = 0x00;

const HID_REQ_SET_IDLE: u8 = 0x0a;
const HID_REQ_GET_IDLE: u8 = 0x02;
const HID_REQ_GET_REPORT: u8 = 0x01;
const HID_REQ_SET_REPORT: u8 = 0x09;

const MAX_PACKET_SIZE: u16 = 64;

/// Whatever carries the device's descriptor and reports to the host.
pub trait FlystickTransport {
    /// Hands over the report descriptor. Called exactly once, before the
    /// first call to `transmit`.
    fn register_descriptor(&mut self, descriptor: DeviceDescriptor) -> Result<()>;

    /// Sends an input report payload under `report_id`. The report ID is
    /// carried separately and is not part of `report`.
    fn transmit(&mut self, report_id: u8, report: &[u8]) -> Result<usize>;
}

impl<T: FlystickTransport + ?Sized> FlystickTransport for &mut T {
    fn register_descriptor(&mut self, descriptor: DeviceDescriptor) -> Result<()> {
        (**self).register_descriptor(descriptor)
    }

    fn transmit(&mut self, report_id: u8, report: &[u8]) -> Result<usize> {
        (**self).transmit(report_id, report)
    }
}

/// Body of the HID class descriptor (without the length & type prefix)
/// announcing one report descriptor of `report_desc_len` bytes.
fn hid_descriptor_body(report_desc_len: usize) -> [u8; 7] {
    [
        // HID Class spec version
        HID_DESC_SPEC_1_10[0],
        HID_DESC_SPEC_1_10[1],
        // Country code not supported
        HID_DESC_COUNTRY_UNSPEC,
        // Number of following descriptors
        1,
        // We have a HID report descriptor the host should read
        HID_DESC_DESCTYPE_HID_REPORT,
        // HID report descriptor size,
        (report_desc_len & 0xFF) as u8,
        (report_desc_len >> 8 & 0xFF) as u8,
    ]
}

/// Prepends `report_id` to `report`, returning the packet length.
fn frame_report(
    report_id: u8,
    report: &[u8],
    packet: &mut [u8; MAX_REPORT_SIZE + 1],
) -> Result<usize> {
    if report.len() > MAX_REPORT_SIZE {
        return Err(Error::BufferOverflow);
    }
    packet[0] = report_id;
    packet[1..=report.len()].copy_from_slice(report);
    Ok(report.len() + 1)
}

/// FlystickClass serves the registered report descriptor to the host and
/// sends input reports over an interrupt IN endpoint.
pub struct FlystickClass<'a, B: UsbBus> {
    if_num: InterfaceNumber,
    in_ep: EndpointIn<'a, B>,
    descriptor: Option<DeviceDescriptor>,
}

impl<'a, B: UsbBus> FlystickClass<'a, B> {
    /// Creates a new FlystickClass with the provided UsbBus.
    ///
    /// poll_ms configures how frequently the host should poll for input
    /// reports. A value of 10 suits a responsive controller; larger values
    /// trade latency for bus bandwidth.
    pub fn new(alloc: &'a UsbBusAllocator<B>, poll_ms: u8) -> Self {
        Self {
            if_num: alloc.interface(),
            in_ep: alloc.interrupt(MAX_PACKET_SIZE, poll_ms),
            descriptor: None,
        }
    }

    /// The report descriptor handed over at registration, if any.
    pub fn descriptor(&self) -> Option<&DeviceDescriptor> {
        self.descriptor.as_ref()
    }

    /// Tries to write a raw input report. Data must already carry the
    /// report ID prefix.
    pub fn push_raw_input(&self, data: &[u8]) -> usb_device::Result<usize> {
        self.in_ep.write(data)
    }

    fn report_desc_len(&self) -> usize {
        self.descriptor.as_ref().map_or(0, |d| d.len())
    }

    /// Answer to GET_DESCRIPTOR(Report). None until a descriptor is
    /// registered.
    fn report_descriptor(&self) -> Option<&[u8]> {
        self.descriptor.as_ref().map(|d| d.bytes())
    }

    /// Full HID class descriptor, as returned for GET_DESCRIPTOR(HID).
    fn hid_descriptor(&self) -> [u8; 9] {
        let mut buf = [0u8; 9];
        // Length of buf inclusive of size prefix
        buf[0] = buf.len() as u8;
        buf[1] = HID_DESC_DESCTYPE_HID;
        buf[2..].copy_from_slice(&hid_descriptor_body(self.report_desc_len()));
        buf
    }
}

impl<B: UsbBus> FlystickTransport for FlystickClass<'_, B> {
    fn register_descriptor(&mut self, descriptor: DeviceDescriptor) -> Result<()> {
        if self.descriptor.is_some() {
            return Err(Error::AlreadyRegistered);
        }
        self.descriptor = Some(descriptor);
        Ok(())
    }

    fn transmit(&mut self, report_id: u8, report: &[u8]) -> Result<usize> {
        if self.descriptor.is_none() {
            return Err(Error::NotRegistered);
        }
        let mut packet = [0u8; MAX_REPORT_SIZE + 1];
        let len = frame_report(report_id, report, &mut packet)?;
        trace!("report {}: {:02x?}", report_id, &packet[1..len]);
        Ok(self.push_raw_input(&packet[..len])?)
    }
}

impl<B: UsbBus> UsbClass<B> for FlystickClass<'_, B> {
    fn get_configuration_descriptors(
        &self,
        writer: &mut DescriptorWriter,
    ) -> usb_device::Result<()> {
        writer.interface(self.if_num, USB_CLASS_HID, USB_SUBCLASS_NONE, USB_PROTOCOL_NONE)?;

        // HID descriptor
        writer.write(HID_DESC_DESCTYPE_HID, &self.hid_descriptor()[2..])?;

        writer.endpoint(&self.in_ep)?;
        Ok(())
    }

    // Handle control requests to the host.
    fn control_in(&mut self, xfer: ControlIn<B>) {
        let req = xfer.request();

        // Bail out if its not relevant to our interface.
        if req.index != u8::from(self.if_num) as u16 {
            return;
        }

        match (req.request_type, req.request) {
            (control::RequestType::Standard, control::Request::GET_DESCRIPTOR) => {
                match (req.value >> 8) as u8 {
                    HID_DESC_DESCTYPE_HID_REPORT => match self.report_descriptor() {
                        Some(bytes) => {
                            xfer.accept_with(bytes).ok();
                        }
                        None => {
                            xfer.reject().ok();
                        }
                    },
                    HID_DESC_DESCTYPE_HID => {
                        let buf = self.hid_descriptor();
                        xfer.accept_with(&buf).ok();
                    }
                    _ => {}
                }
            }
            (control::RequestType::Class, HID_REQ_GET_REPORT) => {
                xfer.reject().ok(); // Not supported for now
            }
            (control::RequestType::Class, HID_REQ_GET_IDLE) => {
                xfer.reject().ok(); // Not supported for now
            }
            _ => {}
        }
    }

    // Handle a control request from the host.
    fn control_out(&mut self, xfer: ControlOut<B>) {
        let req = xfer.request();

        // Bail out if its not relevant to our interface.
        if !(req.recipient == control::Recipient::Interface
            && req.index == u8::from(self.if_num) as u16)
        {
            return;
        }

        match req.request {
            HID_REQ_SET_IDLE => {
                xfer.accept().ok();
            }
            HID_REQ_SET_REPORT => {
                xfer.reject().ok(); // No output reports
            }
            _ => {
                xfer.reject().ok();
            }
        }
    }
}
