//! Wire-format enums & bitfields for the HID report descriptors emitted by a
//! flight simulation controller, plus a small item walker used to read
//! descriptors back.
#![no_std]

use bitfield::bitfield;

/// GlobalItemKind describes the global item tags a flight controller
/// descriptor uses, section 6.2.2.7 'Report Descriptor' of the Device
/// Class Definition for HID 1.11.
#[repr(u8)]
#[derive(Copy, Debug, Clone, Eq, PartialEq)]
pub enum GlobalItemKind {
    UsagePage = 0,
    LogicalMin = 1,
    LogicalMax = 2,
    ReportSize = 7,
    ReportID = 8,
    ReportCount = 9,
}

impl From<GlobalItemKind> for u8 {
    fn from(kind: GlobalItemKind) -> u8 {
        kind as u8
    }
}

/// LocalItemKind describes the local item tags a flight controller
/// descriptor uses, section 6.2.2.8 'Local Items' of the Device Class
/// Definition for HID 1.11.
#[repr(u8)]
#[derive(Copy, Debug, Clone, Eq, PartialEq)]
pub enum LocalItemKind {
    Usage = 0,
}

impl From<LocalItemKind> for u8 {
    fn from(kind: LocalItemKind) -> u8 {
        kind as u8
    }
}

/// MainItemKind describes the main item tags of an input-only device,
/// section 6.2.2.4 'Report Descriptor' of the Device Class Definition for
/// HID 1.11.
#[repr(u8)]
#[derive(Copy, Debug, Clone, Eq, PartialEq, Default)]
pub enum MainItemKind {
    #[default]
    Input = 0b1000,
    Collection = 0b1010,
    EndCollection = 0b1100,
}

impl From<MainItemKind> for u8 {
    fn from(kind: MainItemKind) -> u8 {
        kind as u8
    }
}

/// ItemType describes types of items as described in section 6.2.2.7
/// 'Report Descriptor' of the Device Class Definition for HID 1.11.
#[repr(u8)]
#[derive(Copy, Debug, Clone, Eq, PartialEq, Default)]
pub enum ItemType {
    #[default]
    Main = 0,
    Global = 1,
    Local = 2,
}

impl From<ItemType> for u8 {
    fn from(typ: ItemType) -> u8 {
        typ as u8
    }
}

/// CollectionKind is the data byte of a Collection main item, section 6.2.2.6.
#[repr(u8)]
#[derive(Copy, Debug, Clone, Eq, PartialEq)]
pub enum CollectionKind {
    Physical = 0x00,
    Application = 0x01,
}

impl From<CollectionKind> for u8 {
    fn from(kind: CollectionKind) -> u8 {
        kind as u8
    }
}

/// Usage pages referenced by flight controller descriptors.
///
/// Reference: <https://usb.org/sites/default/files/hut1_2.pdf>, section 3.
#[repr(u16)]
#[derive(Copy, Debug, Clone, Eq, PartialEq)]
pub enum UsagePage {
    SimulationControls = 0x02,
}

impl From<UsagePage> for u16 {
    fn from(page: UsagePage) -> u16 {
        page as u16
    }
}

/// Usage ids on the Simulation Controls page (0x02).
///
/// The first three are application collection usages which identify the
/// kind of device, the rest identify individual data fields.
///
/// Reference: <https://usb.org/sites/default/files/hut1_2.pdf>, section 5.
#[repr(u8)]
#[derive(Copy, Debug, Clone, Eq, PartialEq)]
pub enum SimulationUsage {
    FlightSimulationDevice = 0x01,
    SpaceshipSimulationDevice = 0x04,
    AirplaneSimulationDevice = 0x09,
    Rudder = 0xBA,
    Throttle = 0xBB,
    ToeBrake = 0xBF,
    Accelerator = 0xC4,
    Brake = 0xC5,
    Steering = 0xC8,
}

impl SimulationUsage {
    /// Maps a raw usage id back onto a known simulation usage.
    pub fn from_id(id: u32) -> Option<Self> {
        Some(match id {
            0x01 => SimulationUsage::FlightSimulationDevice,
            0x04 => SimulationUsage::SpaceshipSimulationDevice,
            0x09 => SimulationUsage::AirplaneSimulationDevice,
            0xBA => SimulationUsage::Rudder,
            0xBB => SimulationUsage::Throttle,
            0xBF => SimulationUsage::ToeBrake,
            0xC4 => SimulationUsage::Accelerator,
            0xC5 => SimulationUsage::Brake,
            0xC8 => SimulationUsage::Steering,
            _ => return None,
        })
    }
}

impl From<SimulationUsage> for u8 {
    fn from(usage: SimulationUsage) -> u8 {
        usage as u8
    }
}

bitfield! {
    /// MainItemSetting describes the bits which configure invariants on a MainItem.
    #[derive(Clone, Copy, Debug)]
    pub struct MainItemSetting(u8);
    pub is_constant, set_constant: 0;
    pub is_variable, set_variable: 1;
    pub is_relative, set_relative: 2;
    pub is_wrap, set_wrap: 3;
    pub is_non_linear, set_non_linear: 4;
    pub has_no_preferred_state, set_no_preferred_state: 5;
    pub has_null_state, set_has_null_state: 6;
    pub volatile, set_volatile: 7;
}

impl MainItemSetting {
    /// Data,Var,Abs: the setting used for every axis field.
    pub fn data_variable_absolute() -> Self {
        let mut s = MainItemSetting(0);
        s.set_variable(true);
        s
    }

    pub fn bits(&self) -> u8 {
        self.0
    }
}

bitfield! {
    /// ItemPrefix describes the 1 byte prefix describing an item in a descriptor.
    #[derive(Clone, Copy)]
    pub struct ItemPrefix(u8);
    impl Debug;
    pub byte_count, set_byte_count: 1, 0;
    pub typ, set_type: 3, 2;
    pub tag, set_tag: 7, 4;
}

impl ItemPrefix {
    /// A prefix for a short item of type `typ` with tag `tag` and no data.
    pub fn new(typ: ItemType, tag: u8) -> Self {
        let mut p = ItemPrefix(0);
        p.set_type(typ.into());
        p.set_tag(tag);
        p
    }

    pub fn bits(&self) -> u8 {
        self.0
    }

    /// Number of data bytes following the prefix. The size code 3 stands
    /// for four bytes, section 6.2.2.2.
    pub fn data_len(&self) -> usize {
        match self.byte_count() {
            3 => 4,
            n => n as usize,
        }
    }
}

/// Prefix byte reserved for long items, section 6.2.2.3.
pub const LONG_ITEM_PREFIX: u8 = 0xFE;

/// A short item read back from an encoded report descriptor.
#[derive(Copy, Debug, Clone, Eq, PartialEq)]
pub struct Item {
    pub typ: u8,
    pub tag: u8,
    /// Number of data bytes the item carried.
    pub size: usize,
    /// Little-endian data, zero extended.
    pub data: u32,
}

impl Item {
    pub fn is_main(&self, kind: MainItemKind) -> bool {
        self.typ == u8::from(ItemType::Main) && self.tag == u8::from(kind)
    }

    pub fn is_global(&self, kind: GlobalItemKind) -> bool {
        self.typ == u8::from(ItemType::Global) && self.tag == u8::from(kind)
    }

    pub fn is_local(&self, kind: LocalItemKind) -> bool {
        self.typ == u8::from(ItemType::Local) && self.tag == u8::from(kind)
    }

    /// Data interpreted as a two's complement number of `size` bytes, as
    /// used by logical & physical extents.
    pub fn signed_data(&self) -> i32 {
        match self.size {
            1 => self.data as u8 as i8 as i32,
            2 => self.data as u16 as i16 as i32,
            4 => self.data as i32,
            _ => 0,
        }
    }
}

/// Walks the short items of an encoded report descriptor. Long items are
/// skipped; a truncated trailing item ends the walk.
#[derive(Clone, Debug)]
pub struct Items<'a>(&'a [u8]);

impl<'a> Items<'a> {
    pub fn new(desc: &'a [u8]) -> Self {
        Items(desc)
    }
}

impl Iterator for Items<'_> {
    type Item = Item;

    fn next(&mut self) -> Option<Item> {
        loop {
            let (&first, tail) = self.0.split_first()?;
            if first == LONG_ITEM_PREFIX {
                // bDataSize, bLongItemTag, then data.
                let (&size, _) = tail.split_first()?;
                let skip = 2 + size as usize;
                if skip > tail.len() {
                    self.0 = &[];
                    return None;
                }
                self.0 = &tail[skip..];
                continue;
            }

            let prefix = ItemPrefix(first);
            let n = prefix.data_len();
            if n > tail.len() {
                self.0 = &[];
                return None;
            }
            let (data, tail) = tail.split_at(n);
            let mut v = [0u8; 4];
            v[..n].copy_from_slice(data);
            self.0 = tail;
            return Some(Item {
                typ: prefix.typ(),
                tag: prefix.tag(),
                size: n,
                data: u32::from_le_bytes(v),
            });
        }
    }
}

impl core::iter::FusedIterator for Items<'_> {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefix_layout() {
        let mut p = ItemPrefix::new(ItemType::Global, GlobalItemKind::ReportID.into());
        p.set_byte_count(1);
        assert_eq!(p.bits(), 0x85);
        let end = ItemPrefix::new(ItemType::Main, MainItemKind::EndCollection.into());
        assert_eq!(end.bits(), 0xC0);

        let p = ItemPrefix(0x16); // Logical Minimum, 2 bytes
        assert_eq!(p.tag(), u8::from(GlobalItemKind::LogicalMin));
        assert_eq!(p.typ(), u8::from(ItemType::Global));
        assert_eq!(p.data_len(), 2);
        assert_eq!(ItemPrefix(0x17).data_len(), 4);
    }

    #[test]
    fn data_variable_absolute() {
        assert_eq!(MainItemSetting::data_variable_absolute().bits(), 0x02);
    }

    #[test]
    fn walk_items() {
        let desc: &[u8] = &[
            0x05, 0x02, // Usage Page (Simulation Controls)
            0x16, 0x01, 0x80, // Logical Minimum (-32767)
            0xFE, 0x02, 0x10, 0xAA, 0xBB, // long item, skipped
            0x26, 0xFF, 0x7F, // Logical Maximum (32767)
            0xC0, // End Collection
        ];
        let items: [Item; 4] = {
            let mut it = Items::new(desc);
            [
                it.next().unwrap(),
                it.next().unwrap(),
                it.next().unwrap(),
                it.next().unwrap(),
            ]
        };
        assert!(items[0].is_global(GlobalItemKind::UsagePage));
        assert_eq!(items[0].data, 0x02);
        assert!(items[1].is_global(GlobalItemKind::LogicalMin));
        assert_eq!(items[1].signed_data(), -32767);
        assert!(items[2].is_global(GlobalItemKind::LogicalMax));
        assert_eq!(items[2].signed_data(), 32767);
        assert!(items[3].is_main(MainItemKind::EndCollection));
        assert_eq!(items[3].size, 0);
        assert_eq!(Items::new(desc).count(), 4);
    }

    #[test]
    fn truncated_item_ends_walk() {
        let desc: &[u8] = &[0x09, 0xBA, 0x26, 0xFF];
        let mut it = Items::new(desc);
        assert_eq!(it.next().map(|i| i.data), Some(0xBA));
        assert_eq!(it.next(), None);
        assert_eq!(it.next(), None);
    }

    #[test]
    fn simulation_usage_ids() {
        assert_eq!(SimulationUsage::from_id(0xBF), Some(SimulationUsage::ToeBrake));
        assert_eq!(SimulationUsage::from_id(0x30), None);
        assert_eq!(u8::from(SimulationUsage::Steering), 0xC8);
    }
}
