//! Composite bus: MMIO device table dispatched ahead of backing RAM.

use super::{validate_alignment, AccessWidth, Bus, BusFault, Ram};

/// A memory-mapped device occupying a range of the address space.
///
/// Devices receive the absolute address and may reject widths they do not
/// implement by returning [`BusFault::Unmapped`].
pub trait MmioDevice {
    /// Reads a device register.
    ///
    /// # Errors
    ///
    /// Returns a [`BusFault`] when the device does not implement the
    /// requested width.
    fn read(&mut self, addr: u32, width: AccessWidth) -> Result<u32, BusFault>;

    /// Writes a device register.
    ///
    /// # Errors
    ///
    /// Returns a [`BusFault`] when the device does not implement the
    /// requested width.
    fn write(&mut self, addr: u32, width: AccessWidth, value: u32) -> Result<(), BusFault>;
}

struct Mapping {
    base: u32,
    len: u32,
    device: Box<dyn MmioDevice>,
}

impl Mapping {
    fn covers(&self, addr: u32) -> bool {
        addr.wrapping_sub(self.base) < self.len
    }
}

/// The bus the interpreter runs against: a device table consulted first,
/// with RAM as the fall-through.
///
/// MMIO ranges must be disjoint from RAM; the host wires the table at
/// construction time and the interpreter owns the bus for the run.
pub struct SystemBus {
    ram: Ram,
    devices: Vec<Mapping>,
}

impl SystemBus {
    /// Creates a bus over the given RAM with an empty device table.
    #[must_use]
    pub const fn new(ram: Ram) -> Self {
        Self {
            ram,
            devices: Vec::new(),
        }
    }

    /// Maps `device` over `len` bytes starting at `base`.
    pub fn map_device(&mut self, base: u32, len: u32, device: Box<dyn MmioDevice>) {
        self.devices.push(Mapping { base, len, device });
    }

    /// Returns the backing RAM.
    #[must_use]
    pub const fn ram(&self) -> &Ram {
        &self.ram
    }

    /// Returns the backing RAM mutably, for image loading.
    pub const fn ram_mut(&mut self) -> &mut Ram {
        &mut self.ram
    }
}

impl Bus for SystemBus {
    fn read(&mut self, addr: u32, width: AccessWidth) -> Result<u32, BusFault> {
        validate_alignment(addr, width)?;
        for mapping in &mut self.devices {
            if mapping.covers(addr) {
                return mapping.device.read(addr, width);
            }
        }
        self.ram.read(addr, width)
    }

    fn write(&mut self, addr: u32, width: AccessWidth, value: u32) -> Result<(), BusFault> {
        validate_alignment(addr, width)?;
        for mapping in &mut self.devices {
            if mapping.covers(addr) {
                return mapping.device.write(addr, width, value);
            }
        }
        self.ram.write(addr, width, value)
    }
}

#[cfg(test)]
mod tests {
    use super::{AccessWidth, Bus, BusFault, MmioDevice, Ram, SystemBus};

    struct Latch {
        value: u32,
    }

    impl MmioDevice for Latch {
        fn read(&mut self, _addr: u32, _width: AccessWidth) -> Result<u32, BusFault> {
            Ok(self.value)
        }

        fn write(&mut self, _addr: u32, _width: AccessWidth, value: u32) -> Result<(), BusFault> {
            self.value = value;
            Ok(())
        }
    }

    #[test]
    fn device_table_is_dispatched_before_ram() {
        let mut bus = SystemBus::new(Ram::new(0, 64));
        bus.map_device(0x1000_0000, 4, Box::new(Latch { value: 7 }));

        assert_eq!(bus.read(0x1000_0000, AccessWidth::Word), Ok(7));
        bus.write(0x1000_0000, AccessWidth::Word, 42).unwrap();
        assert_eq!(bus.read(0x1000_0000, AccessWidth::Word), Ok(42));

        // RAM is unaffected by device traffic.
        assert_eq!(bus.read(0, AccessWidth::Word), Ok(0));
    }

    #[test]
    fn unmapped_mmio_addresses_fall_through_and_fault() {
        let mut bus = SystemBus::new(Ram::new(0, 64));
        bus.map_device(0x1000_0000, 4, Box::new(Latch { value: 0 }));

        assert_eq!(
            bus.read(0x1000_0004, AccessWidth::Word),
            Err(BusFault::Unmapped { addr: 0x1000_0004 })
        );
    }

    #[test]
    fn alignment_is_checked_before_device_dispatch() {
        let mut bus = SystemBus::new(Ram::new(0, 64));
        bus.map_device(0x1000_0000, 8, Box::new(Latch { value: 0 }));

        let fault = bus.read(0x1000_0002, AccessWidth::Word).unwrap_err();
        assert!(fault.is_misaligned());
    }

    #[test]
    fn instruction_reads_use_word_access() {
        let mut bus = SystemBus::new(Ram::new(0, 64));
        bus.ram_mut().load(0, &[0x13, 0x00, 0x00, 0x00]).unwrap();
        assert_eq!(bus.read_instruction(0), Ok(0x0000_0013));
    }
}
