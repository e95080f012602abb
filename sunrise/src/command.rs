//! ATA command dispatch (§4.5 command dispatch table), triggered by a
//! write to the task-file command register (n=7).

use portable_atomic::Ordering;

use crate::identify;
use crate::state::{IdeFsm, TaskFile};
use crate::status::*;
use crate::usb::{SharedUsbFlags, UsbDeviceInfo};

pub const IDENTIFY_DEVICE: u8 = 0xEC;
pub const READ_SECTORS: u8 = 0x20;
pub const WRITE_SECTORS: u8 = 0x30;
pub const EXECUTE_DEVICE_DIAGNOSTIC: u8 = 0x90;
pub const DEVICE_RESET: u8 = 0x08;
pub const SET_FEATURES: u8 = 0xEF;
pub const INITIALIZE_DEVICE_PARAMETERS: u8 = 0x91;
pub const RECALIBRATE: u8 = 0x10;

/// Dispatches one command-register write. `buffer` is the shared sector
/// buffer: populated in place for an immediate IDENTIFY, otherwise left
/// alone (a deferred IDENTIFY or a READ/WRITE is completed later by the
/// USB bridge, §4.6).
#[allow(clippy::too_many_arguments)]
pub fn dispatch(
    cmd: u8,
    regs: &mut TaskFile,
    fsm: &mut IdeFsm,
    sectors_remaining: &mut u16,
    buffer_index: &mut usize,
    buffer_length: &mut usize,
    usb_info: &UsbDeviceInfo,
    usb_flags: &SharedUsbFlags,
    buffer: &mut [u8; 512],
) {
    if regs.is_slave_selected() {
        regs.fail(ERROR_ABRT);
        *fsm = IdeFsm::Idle;
        return;
    }

    match cmd {
        IDENTIFY_DEVICE => {
            if usb_info.mounted {
                identify::build(buffer, usb_info);
                regs.status = STATUS_DRDY | STATUS_DSC | STATUS_DRQ;
                *buffer_index = 0;
                *buffer_length = 512;
                *fsm = IdeFsm::ReadData;
            } else {
                regs.status = STATUS_BSY;
                *fsm = IdeFsm::Busy;
                usb_flags.identify_pending.store(true, Ordering::Release);
            }
        }
        READ_SECTORS => {
            *sectors_remaining = if regs.sector_count == 0 {
                256
            } else {
                regs.sector_count as u16
            };
            regs.status = STATUS_BSY;
            *fsm = IdeFsm::Busy;
            usb_flags.request_read(regs.lba());
        }
        WRITE_SECTORS => {
            *sectors_remaining = if regs.sector_count == 0 {
                256
            } else {
                regs.sector_count as u16
            };
            regs.status = STATUS_DRDY | STATUS_DSC | STATUS_DRQ;
            *buffer_index = 0;
            *buffer_length = 512;
            *fsm = IdeFsm::WriteData;
        }
        EXECUTE_DEVICE_DIAGNOSTIC | DEVICE_RESET => {
            regs.apply_diagnostic_signature();
            *fsm = IdeFsm::Idle;
        }
        SET_FEATURES | INITIALIZE_DEVICE_PARAMETERS | RECALIBRATE => {
            regs.status = STATUS_DRDY | STATUS_DSC;
        }
        _ => {
            regs.fail(ERROR_ABRT);
        }
    }
}

/// Device-control register write (n=14): SRST handling (§4.5).
pub fn dispatch_device_control(data: u8, regs: &mut TaskFile, fsm: &mut IdeFsm) {
    if data & 0x04 != 0 {
        regs.status = STATUS_BSY;
        *fsm = IdeFsm::Idle;
    } else {
        regs.apply_diagnostic_signature();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mounted_info() -> UsbDeviceInfo {
        UsbDeviceInfo {
            mounted: true,
            block_count: 0x1000,
            block_size: 512,
            vendor: heapless::String::try_from("ACME").unwrap(),
            product: heapless::String::try_from("DISK").unwrap(),
            revision: heapless::String::try_from("1.0").unwrap(),
        }
    }

    #[test]
    fn diagnostic_signature_matches_scenario_5() {
        let mut regs = TaskFile::power_on();
        regs.status = 0;
        let mut fsm = IdeFsm::Busy;
        let mut sectors_remaining = 0;
        let mut buffer_index = 0;
        let mut buffer_length = 0;
        let usb_info = UsbDeviceInfo::new();
        let usb_flags = SharedUsbFlags::new();
        let mut buffer = [0u8; 512];
        dispatch(
            EXECUTE_DEVICE_DIAGNOSTIC,
            &mut regs,
            &mut fsm,
            &mut sectors_remaining,
            &mut buffer_index,
            &mut buffer_length,
            &usb_info,
            &usb_flags,
            &mut buffer,
        );
        assert_eq!(regs.status, 0x50);
        assert_eq!(regs.error, 0x01);
        assert_eq!(regs.cylinder_low, 0);
        assert_eq!(regs.cylinder_high, 0);
        assert_eq!(regs.sector_count, 0x01);
        assert_eq!(regs.sector, 0x01);
        assert_eq!(fsm, IdeFsm::Idle);
    }

    #[test]
    fn identify_when_mounted_builds_buffer_immediately() {
        let mut regs = TaskFile::power_on();
        let mut fsm = IdeFsm::Idle;
        let mut sectors_remaining = 0;
        let mut buffer_index = 0;
        let mut buffer_length = 0;
        let usb_info = mounted_info();
        let usb_flags = SharedUsbFlags::new();
        let mut buffer = [0u8; 512];
        dispatch(
            IDENTIFY_DEVICE,
            &mut regs,
            &mut fsm,
            &mut sectors_remaining,
            &mut buffer_index,
            &mut buffer_length,
            &usb_info,
            &usb_flags,
            &mut buffer,
        );
        assert_eq!(fsm, IdeFsm::ReadData);
        assert_eq!(regs.status, STATUS_DRDY | STATUS_DSC | STATUS_DRQ);
        assert_eq!(&buffer[98..100], &[0x00, 0x02]);
    }

    #[test]
    fn identify_when_not_mounted_defers() {
        let mut regs = TaskFile::power_on();
        let mut fsm = IdeFsm::Idle;
        let mut sectors_remaining = 0;
        let mut buffer_index = 0;
        let mut buffer_length = 0;
        let usb_info = UsbDeviceInfo::new();
        let usb_flags = SharedUsbFlags::new();
        let mut buffer = [0u8; 512];
        dispatch(
            IDENTIFY_DEVICE,
            &mut regs,
            &mut fsm,
            &mut sectors_remaining,
            &mut buffer_index,
            &mut buffer_length,
            &usb_info,
            &usb_flags,
            &mut buffer,
        );
        assert_eq!(fsm, IdeFsm::Busy);
        assert_eq!(regs.status, STATUS_BSY);
        assert!(usb_flags.identify_pending.load(Ordering::Acquire));
    }

    #[test]
    fn slave_device_always_rejected() {
        let mut regs = TaskFile::power_on();
        regs.device_head = 0x10;
        let mut fsm = IdeFsm::Idle;
        let mut sectors_remaining = 0;
        let mut buffer_index = 0;
        let mut buffer_length = 0;
        let usb_info = mounted_info();
        let usb_flags = SharedUsbFlags::new();
        let mut buffer = [0u8; 512];
        dispatch(
            READ_SECTORS,
            &mut regs,
            &mut fsm,
            &mut sectors_remaining,
            &mut buffer_index,
            &mut buffer_length,
            &usb_info,
            &usb_flags,
            &mut buffer,
        );
        assert_eq!(regs.status, STATUS_DRDY | STATUS_ERR);
        assert_eq!(regs.error, ERROR_ABRT);
    }

    #[test]
    fn unknown_command_sets_abort() {
        let mut regs = TaskFile::power_on();
        let mut fsm = IdeFsm::Idle;
        let mut sectors_remaining = 0;
        let mut buffer_index = 0;
        let mut buffer_length = 0;
        let usb_info = mounted_info();
        let usb_flags = SharedUsbFlags::new();
        let mut buffer = [0u8; 512];
        dispatch(
            0x00,
            &mut regs,
            &mut fsm,
            &mut sectors_remaining,
            &mut buffer_index,
            &mut buffer_length,
            &usb_info,
            &usb_flags,
            &mut buffer,
        );
        assert_eq!(regs.error, ERROR_ABRT);
        assert_eq!(regs.status, STATUS_DRDY | STATUS_ERR);
    }
}
