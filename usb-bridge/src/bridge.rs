//! The core-1 polling loop (§4.6 steps 1-6). Call [`poll_once`] in an
//! infinite loop from core 1's entry point, passing the same
//! `SunriseIde` the mapper loop on core 0 is driving (the firmware crate
//! hands both cores a `&'static mut` to the one shared instance; see §9
//! "Global state").

use portable_atomic::Ordering;

use picoverse_sunrise::usb::{UsbMassStorageHost, UsbTransferError};
use picoverse_sunrise::SunriseIde;

/// Services one iteration of the bridge loop: polls the host stack,
/// reconciles mount state, and drains at most one pending read request and
/// one pending write request. Non-blocking — safe to call as fast as the
/// host stack's `poll` wants to be driven.
pub fn poll_once(host: &mut impl UsbMassStorageHost, ide: &mut SunriseIde) {
    host.poll();
    reconcile_mount_state(host, ide);

    if !host.is_mounted() {
        return;
    }

    service_read(host, ide);
    service_write(host, ide);
}

fn reconcile_mount_state(host: &impl UsbMassStorageHost, ide: &mut SunriseIde) {
    let was_mounted = ide.usb_flags().device_mounted.load(Ordering::Acquire);
    let now_mounted = host.is_mounted();
    if now_mounted && !was_mounted {
        ide.report_usb_mounted(host);
    } else if !now_mounted && was_mounted {
        ide.report_usb_unmounted();
    }
}

fn service_read(host: &mut impl UsbMassStorageHost, ide: &mut SunriseIde) {
    if !ide.usb_flags().read_requested.swap(false, Ordering::AcqRel) {
        return;
    }
    ide.usb_flags().read_in_flight.store(true, Ordering::Release);
    let lba = ide.usb_flags().lba.load(Ordering::Acquire);
    match read_one_block(host, lba) {
        Ok(block) => {
            ide.fill_sector_buffer(&block);
            ide.on_usb_read_ready();
        }
        Err(_) => {
            ide.usb_flags().read_failed.store(true, Ordering::Release);
            ide.on_usb_transfer_failed();
        }
    }
    ide.usb_flags().read_in_flight.store(false, Ordering::Release);
}

fn service_write(host: &mut impl UsbMassStorageHost, ide: &mut SunriseIde) {
    if !ide.usb_flags().write_requested.swap(false, Ordering::AcqRel) {
        return;
    }
    ide.usb_flags().write_in_flight.store(true, Ordering::Release);
    let lba = ide.usb_flags().lba.load(Ordering::Acquire);
    let block = ide.sector_buffer_snapshot();
    match write_one_block(host, lba, &block) {
        Ok(()) => ide.on_usb_write_ready(),
        Err(_) => {
            ide.usb_flags().write_failed.store(true, Ordering::Release);
            ide.on_usb_transfer_failed();
        }
    }
    ide.usb_flags().write_in_flight.store(false, Ordering::Release);
}

/// Validates `lba`/block size (§4.6 step 3, §9 open question 3: devices
/// reporting a block size over 512 bytes are rejected outright) and issues
/// a single READ(10) into a 512-byte buffer, leaving the tail zeroed when
/// the device's native block is smaller (the buffer starts zeroed and
/// `read10` is only expected to fill the first `block_size` bytes).
fn read_one_block(host: &mut impl UsbMassStorageHost, lba: u32) -> Result<[u8; 512], UsbTransferError> {
    validate_block_geometry(host, lba)?;
    let mut buf = [0u8; 512];
    host.read10(lba, &mut buf)?;
    Ok(buf)
}

fn write_one_block(host: &mut impl UsbMassStorageHost, lba: u32, buf: &[u8; 512]) -> Result<(), UsbTransferError> {
    validate_block_geometry(host, lba)?;
    host.write10(lba, buf)
}

fn validate_block_geometry(host: &impl UsbMassStorageHost, lba: u32) -> Result<(), UsbTransferError> {
    if lba >= host.block_count() {
        return Err(UsbTransferError::LbaOutOfRange);
    }
    if host.block_size() > 512 {
        return Err(UsbTransferError::BlockSizeUnsupported);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use picoverse_sunrise::status::{STATUS_DRQ, STATUS_ERR};

    struct FakeHost {
        mounted: bool,
        block_count: u32,
        block_size: u16,
        read_result: Option<[u8; 512]>,
        last_write: Option<(u32, [u8; 512])>,
    }

    impl FakeHost {
        fn mounted(block_count: u32, block_size: u16) -> Self {
            Self {
                mounted: true,
                block_count,
                block_size,
                read_result: None,
                last_write: None,
            }
        }
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
            self.block_size
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
        fn read10(&mut self, _lba: u32, buf: &mut [u8; 512]) -> Result<(), UsbTransferError> {
            if let Some(data) = self.read_result {
                *buf = data;
                Ok(())
            } else {
                Err(UsbTransferError::CommandFailed)
            }
        }
        fn write10(&mut self, lba: u32, buf: &[u8; 512]) -> Result<(), UsbTransferError> {
            self.last_write = Some((lba, *buf));
            Ok(())
        }
    }

    #[test]
    fn mount_transition_populates_ide_and_fulfills_identify() {
        let mut ide = SunriseIde::new();
        ide.usb_flags().identify_pending.store(true, Ordering::Release);
        let mut host = FakeHost::mounted(0x1000, 512);
        poll_once(&mut host, &mut ide);
        assert!(ide.usb_flags().device_mounted.load(Ordering::Acquire));
        assert_eq!(ide.read(0x7E07) & STATUS_DRQ, STATUS_DRQ);
    }

    #[test]
    fn read_request_out_of_range_lba_fails_transfer() {
        let mut ide = SunriseIde::new();
        let mut host = FakeHost::mounted(4, 512);
        ide.usb_flags().request_read(100);
        poll_once(&mut host, &mut ide);
        assert_eq!(ide.read(0x7E07) & STATUS_ERR, STATUS_ERR);
    }

    #[test]
    fn oversized_block_size_is_rejected() {
        let mut ide = SunriseIde::new();
        let mut host = FakeHost::mounted(0x1000, 4096);
        ide.usb_flags().request_read(0);
        poll_once(&mut host, &mut ide);
        assert_eq!(ide.read(0x7E01), 0x04);
    }

    #[test]
    fn successful_read_ready_transitions_to_read_data() {
        let mut ide = SunriseIde::new();
        let mut host = FakeHost::mounted(0x1000, 512);
        host.read_result = Some([0xAB; 512]);
        ide.usb_flags().request_read(5);
        poll_once(&mut host, &mut ide);
        assert_eq!(ide.read(0x7E07) & STATUS_DRQ, STATUS_DRQ);
        assert_eq!(ide.read(0x7C00), 0xAB);
    }

    #[test]
    fn successful_write_reaches_host_with_sector_buffer_contents() {
        let mut ide = SunriseIde::new();
        let mut host = FakeHost::mounted(0x1000, 512);
        ide.usb_flags().request_write(7);
        poll_once(&mut host, &mut ide);
        assert_eq!(host.last_write.unwrap().0, 7);
    }
}
