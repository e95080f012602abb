#![cfg_attr(not(test), no_std)]
//! Component G — the Sunrise IDE / Nextor ATA-over-USB emulator.
//!
//! Owns the task-file registers, the data-register byte latch, the
//! command dispatcher, and the IDE state machine (§3.3, §4.5). The
//! 0x4000..0x7FFF ROM window itself belongs to whichever mapper loop
//! (8/10/11, §4.3) is active; that loop forwards addresses in
//! 0x7C00..0x7EFF here once the control register's IDE-enable bit is set,
//! and reads [`SunriseIde::segment`] to page the ROM the rest of the
//! window falls through to.
//!
//! Cross-core state (the fields [`usb::SharedUsbFlags`] and the sector
//! buffer) is designed to be reachable from both cores via a `'static`
//! reference to one [`SunriseIde`] instance; see §4.6 for the protocol
//! the USB bridge on core 1 is expected to follow against the
//! `on_usb_*`/`report_usb_*` methods below.

pub mod buffer;
pub mod command;
pub mod control;
pub mod data_latch;
pub mod identify;
pub mod state;
pub mod status;
pub mod task_file;
pub mod usb;

use buffer::SharedSectorBuffer;
use data_latch::DataLatch;
use portable_atomic::Ordering;
use state::{IdeFsm, TaskFile};
use status::*;
use task_file::TaskFileReg;
use usb::{SharedUsbFlags, UsbDeviceInfo, UsbMassStorageHost};

const DATA_REGISTER_BASE: u16 = 0x7C00;
const TASK_FILE_BASE: u16 = 0x7E00;

pub struct SunriseIde {
    ide_enable: bool,
    segment: u8,
    registers: TaskFile,
    fsm: IdeFsm,
    data_latch: DataLatch,
    sector_buffer: SharedSectorBuffer,
    buffer_index: usize,
    buffer_length: usize,
    sectors_remaining: u16,
    usb_info: UsbDeviceInfo,
    usb_flags: SharedUsbFlags,
}

impl SunriseIde {
    pub const fn new() -> Self {
        Self {
            ide_enable: false,
            segment: 0,
            registers: TaskFile::power_on(),
            fsm: IdeFsm::Idle,
            data_latch: DataLatch::new(),
            sector_buffer: SharedSectorBuffer::new(),
            buffer_index: 0,
            buffer_length: 0,
            sectors_remaining: 0,
            usb_info: UsbDeviceInfo::new(),
            usb_flags: SharedUsbFlags::new(),
        }
    }

    pub fn ide_enabled(&self) -> bool {
        self.ide_enable
    }

    /// The ROM page selected by the control register; the active mapper
    /// loop applies this to the 0x4000..0x7FFF window outside the IDE
    /// overlay.
    pub fn segment(&self) -> u8 {
        self.segment
    }

    /// Handles a write to the control register at 0x4104 (§4.5).
    pub fn write_control(&mut self, data: u8) {
        let (ide_enable, segment) = control::decode_control_write(data);
        self.ide_enable = ide_enable;
        self.segment = segment;
    }

    /// Reads anywhere in the IDE overlay (0x7C00..0x7EFF). Callers must
    /// check [`SunriseIde::ide_enabled`] first; 0x7F00..0x7FFF is ROM and
    /// never reaches this method.
    pub fn read(&mut self, addr: u16) -> u8 {
        if (DATA_REGISTER_BASE..DATA_REGISTER_BASE + 0x200).contains(&addr) {
            self.read_data_register(addr)
        } else if (TASK_FILE_BASE..TASK_FILE_BASE + 0x100).contains(&addr) {
            self.read_task_file(addr)
        } else {
            0xFF
        }
    }

    /// Writes anywhere in the IDE overlay (§4.5 addressing table).
    pub fn write(&mut self, addr: u16, data: u8) {
        if (DATA_REGISTER_BASE..DATA_REGISTER_BASE + 0x200).contains(&addr) {
            self.write_data_register(addr, data);
        } else if (TASK_FILE_BASE..TASK_FILE_BASE + 0x100).contains(&addr) {
            self.write_task_file(addr, data);
        }
    }

    fn read_data_register(&mut self, addr: u16) -> u8 {
        let odd = addr & 1 != 0;
        // SAFETY: core 0 only calls this while `fsm` is `ReadData`, which
        // core 1 never writes into concurrently (§5).
        let buffer = unsafe { self.sector_buffer.as_slice() };
        let byte = self.data_latch.read(odd, buffer, &mut self.buffer_index);
        if odd && self.buffer_index >= self.buffer_length {
            self.complete_read_transfer();
        }
        byte
    }

    fn write_data_register(&mut self, addr: u16, data: u8) {
        let odd = addr & 1 != 0;
        // SAFETY: core 0 only calls this while `fsm` is `WriteData`.
        let buffer = unsafe { self.sector_buffer.as_mut_slice() };
        let committed = self.data_latch.write(odd, data, buffer, &mut self.buffer_index);
        if committed && self.buffer_index >= self.buffer_length {
            self.complete_write_transfer();
        }
    }

    fn complete_read_transfer(&mut self) {
        self.sectors_remaining = self.sectors_remaining.saturating_sub(1);
        if self.sectors_remaining > 0 {
            let next_lba = self.registers.lba().wrapping_add(1);
            self.registers.set_lba(next_lba);
            self.registers.status = STATUS_BSY;
            self.fsm = IdeFsm::Busy;
            self.usb_flags.request_read(next_lba);
        } else {
            self.fsm = IdeFsm::Idle;
            self.registers.status = STATUS_DRDY | STATUS_DSC;
        }
    }

    fn complete_write_transfer(&mut self) {
        self.sectors_remaining = self.sectors_remaining.saturating_sub(1);
        self.registers.status = STATUS_BSY;
        self.fsm = IdeFsm::Busy;
        self.usb_flags.request_write(self.registers.lba());
    }

    fn read_task_file(&mut self, addr: u16) -> u8 {
        let n = (addr & 0x0F) as u8;
        match task_file::decode(n) {
            TaskFileReg::Data => self.read_data_register(DATA_REGISTER_BASE),
            TaskFileReg::FeatureOrError => self.registers.error,
            TaskFileReg::SectorCount => self.registers.sector_count,
            TaskFileReg::Sector => self.registers.sector,
            TaskFileReg::CylinderLow => self.registers.cylinder_low,
            TaskFileReg::CylinderHigh => self.registers.cylinder_high,
            TaskFileReg::DeviceHead => self.registers.device_head,
            TaskFileReg::CommandOrStatus => self.registers.status,
            TaskFileReg::DeviceControlOrAltStatus => self.registers.status,
            TaskFileReg::Unused => 0xFF,
        }
    }

    fn write_task_file(&mut self, addr: u16, data: u8) {
        let n = (addr & 0x0F) as u8;
        match task_file::decode(n) {
            TaskFileReg::Data => self.write_data_register(DATA_REGISTER_BASE, data),
            TaskFileReg::FeatureOrError => self.registers.feature = data,
            TaskFileReg::SectorCount => self.registers.sector_count = data,
            TaskFileReg::Sector => self.registers.sector = data,
            TaskFileReg::CylinderLow => self.registers.cylinder_low = data,
            TaskFileReg::CylinderHigh => self.registers.cylinder_high = data,
            TaskFileReg::DeviceHead => self.registers.device_head = data,
            TaskFileReg::CommandOrStatus => {
                // SAFETY: core 0 only dispatches commands while the FSM is
                // not mid-transfer with core 1 touching the buffer.
                let buffer = unsafe { self.sector_buffer.as_mut_slice() };
                command::dispatch(
                    data,
                    &mut self.registers,
                    &mut self.fsm,
                    &mut self.sectors_remaining,
                    &mut self.buffer_index,
                    &mut self.buffer_length,
                    &self.usb_info,
                    &self.usb_flags,
                    buffer,
                );
            }
            TaskFileReg::DeviceControlOrAltStatus => {
                command::dispatch_device_control(data, &mut self.registers, &mut self.fsm);
            }
            TaskFileReg::Unused => {}
        }
    }

    /// Called by the USB bridge (core 1, §4.6 step 2) once mount
    /// negotiation and the INQUIRY exchange complete.
    pub fn report_usb_mounted(&mut self, host: &impl UsbMassStorageHost) {
        self.usb_info.mount(host);
        self.usb_flags.device_mounted.store(true, Ordering::Release);
        if self.usb_flags.identify_pending.swap(false, Ordering::AcqRel) {
            // SAFETY: the FSM is `Busy` (set when IDENTIFY was deferred)
            // and core 0 will not touch the buffer until `fsm` moves to
            // `ReadData`, which happens only after this write.
            let buffer = unsafe { self.sector_buffer.as_mut_slice() };
            identify::build(buffer, &self.usb_info);
            self.buffer_index = 0;
            self.buffer_length = 512;
            self.registers.status = STATUS_DRDY | STATUS_DSC | STATUS_DRQ;
            self.fsm = IdeFsm::ReadData;
        }
    }

    /// Called by the USB bridge on device-unmount (§4.6 step 4).
    pub fn report_usb_unmounted(&mut self) {
        self.usb_info.unmount();
        self.usb_flags.device_mounted.store(false, Ordering::Release);
    }

    /// Called by the USB bridge once a requested READ(10) has landed in
    /// the sector buffer (§4.6 step 5).
    pub fn on_usb_read_ready(&mut self) {
        self.buffer_index = 0;
        self.buffer_length = 512;
        self.registers.status = STATUS_DRDY | STATUS_DSC | STATUS_DRQ;
        self.fsm = IdeFsm::ReadData;
    }

    /// Called by the USB bridge once a requested WRITE(10) has completed
    /// (§4.6 step 6).
    pub fn on_usb_write_ready(&mut self) {
        let next_lba = self.registers.lba().wrapping_add(1);
        self.registers.set_lba(next_lba);
        if self.sectors_remaining > 0 {
            self.buffer_index = 0;
            self.buffer_length = 512;
            self.registers.status = STATUS_DRDY | STATUS_DSC | STATUS_DRQ;
            self.fsm = IdeFsm::WriteData;
        } else {
            self.registers.status = STATUS_DRDY | STATUS_DSC;
            self.fsm = IdeFsm::Idle;
        }
    }

    /// Called by the USB bridge when a CSW/transfer failure is observed.
    pub fn on_usb_transfer_failed(&mut self) {
        self.registers.fail(ERROR_ABRT);
        self.fsm = IdeFsm::Idle;
    }

    pub fn usb_flags(&self) -> &SharedUsbFlags {
        &self.usb_flags
    }

    /// Snapshot of the sector buffer for the USB bridge to ship out over a
    /// WRITE(10) (§4.6 step 3).
    pub fn sector_buffer_snapshot(&self) -> [u8; 512] {
        // SAFETY: only called by the bridge while `fsm` is `Busy` with a
        // write in flight, after core 0 has finished filling the buffer.
        unsafe { *self.sector_buffer.as_slice() }
    }

    /// Fills the sector buffer from a completed READ(10) (§4.6 step 3).
    pub fn fill_sector_buffer(&self, data: &[u8; 512]) {
        // SAFETY: only called by the bridge while `fsm` is `Busy` with a
        // read in flight, before core 0 observes `on_usb_read_ready`.
        unsafe { self.sector_buffer.as_mut_slice() }.copy_from_slice(data);
    }

    #[cfg(test)]
    pub fn registers(&self) -> &TaskFile {
        &self.registers
    }

    #[cfg(test)]
    pub fn fsm(&self) -> IdeFsm {
        self.fsm
    }
}

impl Default for SunriseIde {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FakeHost {
        mounted: bool,
        block_count: u32,
    }

    impl UsbMassStorageHost for FakeHost {
        fn poll(&mut self) {}
        fn is_mounted(&self) -> bool {
            self.mounted
        }
        fn block_count(&self) -> u32 {
            self.block_count
        }
        fn block_size(&self) -> u16 {
            512
        }
        fn vendor(&self) -> &str {
            "ACME"
        }
        fn product(&self) -> &str {
            "DISK"
        }
        fn revision(&self) -> &str {
            "1.0"
        }
        fn read10(&mut self, _lba: u32, _buf: &mut [u8; 512]) -> Result<(), usb::UsbTransferError> {
            Ok(())
        }
        fn write10(&mut self, _lba: u32, _buf: &[u8; 512]) -> Result<(), usb::UsbTransferError> {
            Ok(())
        }
    }

    #[test]
    fn identify_with_mounted_device_is_readable_through_data_latch() {
        let mut ide = SunriseIde::new();
        ide.write_control(0x01); // IDE enable, page 0
        ide.report_usb_mounted(&FakeHost {
            mounted: true,
            block_count: 0x1000,
        });
        ide.write(0x7E07, command::IDENTIFY_DEVICE);
        assert_eq!(ide.fsm(), IdeFsm::ReadData);
        let lo = ide.read(0x7C00);
        let hi = ide.read(0x7C01);
        assert_eq!(lo, 0x40);
        assert_eq!(hi, 0x00);
    }

    #[test]
    fn diagnostic_resets_signature() {
        let mut ide = SunriseIde::new();
        ide.write(0x7E07, command::EXECUTE_DEVICE_DIAGNOSTIC);
        assert_eq!(ide.registers().status, 0x50);
        assert_eq!(ide.registers().error, 0x01);
    }

    #[test]
    fn control_register_bit_reversal_matches_invariant() {
        let mut ide = SunriseIde::new();
        ide.write_control(0b0110_0001);
        assert_eq!(ide.segment(), control::reverse_3bits(0b011));
        assert!(ide.ide_enabled());
    }

    #[test]
    fn read_sectors_then_ready_exposes_buffer_and_advances_lba() {
        let mut ide = SunriseIde::new();
        ide.write(0x7E03, 0x00); // sector
        ide.write(0x7E04, 0x00); // cyl low
        ide.write(0x7E05, 0x00); // cyl high
        ide.write(0x7E02, 0x01); // sector count = 1
        ide.write(0x7E07, command::READ_SECTORS);
        assert_eq!(ide.fsm(), IdeFsm::Busy);
        assert!(ide.usb_flags().read_requested.load(Ordering::Acquire));

        let mut page = [0u8; 512];
        page[0] = 0xAB;
        page[1] = 0xCD;
        ide.fill_sector_buffer(&page);
        ide.on_usb_read_ready();
        assert_eq!(ide.fsm(), IdeFsm::ReadData);
        assert_eq!(ide.read(0x7C00), 0xAB);
        assert_eq!(ide.read(0x7C01), 0xCD);
    }
}
