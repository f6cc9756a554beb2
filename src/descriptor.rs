//! Implements generation of the flight controller HID report descriptor.
//!
//! The descriptor is built once, from the set of enabled axes, and never
//! changes afterwards. It always has the shape:
//!
//! ```text
//! 0x05, 0x02,        // Usage Page (Simulation Controls)
//! 0x09, 0x01,        // Usage (Flight Simulation Device)
//! 0xA1, 0x01,        // Collection (Application)
//! 0x85, 0x03,        //   Report ID (3)
//! 0x05, 0x02,        //   Usage Page (Simulation Controls)
//! 0x16, 0x01, 0x80,  //   Logical Minimum (-32767)
//! 0x26, 0xFF, 0x7F,  //   Logical Maximum (32767)
//! 0x75, 0x10,        //   Report Size (16)
//! 0x95, 0x07,        //   Report Count (7)
//! 0xA1, 0x00,        //   Collection (Physical)
//! 0x09, 0xBA,        //     Usage (Rudder)
//! ...                //     one Usage per enabled field
//! 0x81, 0x02,        //     Input (Data,Var,Abs)
//! 0xC0,              //   End Collection
//! 0xC0,              // End Collection
//! ```
use byteorder::{ByteOrder, LittleEndian};
use log::debug;
use usbd_flystick_descriptors::*;

use crate::config::{Axis, AxisFlags, DeviceType, AXIS_COUNT};
use crate::{Error, Result};

/// Hard ceiling on the size of a generated descriptor.
pub const MAX_DESCRIPTOR_SIZE: usize = 150;

/// Logical extents declared for every axis field.
pub const LOGICAL_MINIMUM: i16 = -32767;
pub const LOGICAL_MAXIMUM: i16 = 32767;

/// Bits per axis field.
pub const AXIS_REPORT_SIZE: u8 = 16;

/// Bytes emitted independently of which axes are enabled.
const FIXED_DESCRIPTOR_SIZE: usize = 26;

/// Exact length of a descriptor declaring `fields` axis usages.
pub const fn descriptor_len(fields: usize) -> usize {
    FIXED_DESCRIPTOR_SIZE + 2 * fields
}

const _: () = assert!(descriptor_len(AXIS_COUNT) <= MAX_DESCRIPTOR_SIZE);

/// A finished report descriptor.
///
/// Holds exactly the bytes that were written; `len()` is what gets
/// advertised to the host in the HID class descriptor.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DeviceDescriptor {
    bytes: heapless::Vec<u8, MAX_DESCRIPTOR_SIZE>,
    report_id: u8,
    field_count: usize,
}

impl DeviceDescriptor {
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// The report ID declared by the descriptor.
    pub fn report_id(&self) -> u8 {
        self.report_id
    }

    /// Number of 16-bit input fields declared (the Report Count).
    pub fn field_count(&self) -> usize {
        self.field_count
    }

    /// Size in bytes of an input report payload, excluding the report ID.
    pub fn report_len(&self) -> usize {
        self.field_count * (AXIS_REPORT_SIZE as usize / 8)
    }

    /// Walks the encoded items of the descriptor.
    pub fn items(&self) -> Items<'_> {
        Items::new(&self.bytes)
    }

    /// The field usages declared inside the physical collection, in order.
    pub fn usages(&self) -> impl Iterator<Item = SimulationUsage> + '_ {
        let mut depth = 0usize;
        self.items().filter_map(move |item| {
            if item.is_main(MainItemKind::Collection) {
                depth += 1;
            } else if item.is_main(MainItemKind::EndCollection) {
                depth = depth.saturating_sub(1);
            } else if depth == 2 && item.is_local(LocalItemKind::Usage) {
                return SimulationUsage::from_id(item.data);
            }
            None
        })
    }
}

/// Accumulates encoded short items into a bounded buffer.
#[derive(Default)]
struct ItemWriter {
    buf: heapless::Vec<u8, MAX_DESCRIPTOR_SIZE>,
}

impl ItemWriter {
    fn push(&mut self, bytes: &[u8]) -> Result<()> {
        self.buf
            .extend_from_slice(bytes)
            .map_err(|_| Error::DescriptorOverflow)
    }

    fn emit(&mut self, prefix: &mut ItemPrefix, buf: [u8; 4], len: usize) -> Result<()> {
        prefix.set_byte_count(if len == 4 { 3 } else { len as u8 });
        self.push(&[prefix.bits()])?;
        self.push(&buf[..len])
    }

    /// Emits a short item using the fewest data bytes which represent `num`.
    /// Signed items keep their sign bit, so -32767 takes two bytes.
    fn emit_item(&mut self, typ: ItemType, kind: u8, num: i32, signed: bool) -> Result<()> {
        let mut prefix = ItemPrefix::new(typ, kind);

        let mut buf = [0; 4];
        LittleEndian::write_i32(&mut buf, num);
        let len = if signed {
            if i8::try_from(num).is_ok() {
                1
            } else if i16::try_from(num).is_ok() {
                2
            } else {
                4
            }
        } else if num as u32 <= 0xFF {
            1
        } else if num as u32 <= 0xFFFF {
            2
        } else {
            4
        };
        self.emit(&mut prefix, buf, len)
    }

    fn global(&mut self, kind: GlobalItemKind, num: i32, signed: bool) -> Result<()> {
        self.emit_item(ItemType::Global, kind.into(), num, signed)
    }

    fn usage(&mut self, usage: SimulationUsage) -> Result<()> {
        self.emit_item(
            ItemType::Local,
            LocalItemKind::Usage.into(),
            u8::from(usage) as i32,
            false,
        )
    }

    fn collection(&mut self, kind: CollectionKind) -> Result<()> {
        self.emit_item(
            ItemType::Main,
            MainItemKind::Collection.into(),
            u8::from(kind) as i32,
            false,
        )
    }

    fn end_collection(&mut self) -> Result<()> {
        let mut prefix = ItemPrefix::new(ItemType::Main, MainItemKind::EndCollection.into());
        self.emit(&mut prefix, [0; 4], 0)
    }
}

/// Builds the report descriptor for a device of kind `device_type` exposing
/// the axes in `axes`, reporting under `report_id`.
///
/// With no axes enabled the descriptor is still well formed and declares a
/// zero-count input item.
pub fn build(device_type: DeviceType, axes: &AxisFlags, report_id: u8) -> Result<DeviceDescriptor> {
    let field_count = axes.field_count();
    let mut w = ItemWriter::default();

    w.global(
        GlobalItemKind::UsagePage,
        u16::from(UsagePage::SimulationControls) as i32,
        false,
    )?;
    w.usage(device_type.usage())?;
    w.collection(CollectionKind::Application)?;
    w.global(GlobalItemKind::ReportID, report_id as i32, false)?;

    w.global(
        GlobalItemKind::UsagePage,
        u16::from(UsagePage::SimulationControls) as i32,
        false,
    )?;
    w.global(GlobalItemKind::LogicalMin, LOGICAL_MINIMUM as i32, true)?;
    w.global(GlobalItemKind::LogicalMax, LOGICAL_MAXIMUM as i32, true)?;
    w.global(GlobalItemKind::ReportSize, AXIS_REPORT_SIZE as i32, false)?;
    w.global(GlobalItemKind::ReportCount, field_count as i32, false)?;

    w.collection(CollectionKind::Physical)?;
    for axis in Axis::CANONICAL.iter().filter(|a| a.is_enabled(axes)) {
        w.usage(axis.usage())?;
    }
    w.emit_item(
        ItemType::Main,
        MainItemKind::Input.into(),
        MainItemSetting::data_variable_absolute().bits() as i32,
        false,
    )?;
    w.end_collection()?;
    w.end_collection()?;

    debug_assert_eq!(w.buf.len(), descriptor_len(field_count));

    debug!(
        "built report descriptor: {} bytes, report id {}, {} fields",
        w.buf.len(),
        report_id,
        field_count
    );

    Ok(DeviceDescriptor {
        bytes: w.buf,
        report_id,
        field_count,
    })
}
