//! Component H's board half. §6.4 deliberately leaves the concrete USB
//! host stack unspecified ("assumed external host stack"); this module
//! is the seam a board support crate plugs a real stack into, the same
//! way [`picoverse_sunrise::usb::UsbMassStorageHost`] is the seam
//! [`picoverse_usb_bridge`] drives from the other side. `main` is generic
//! over this trait rather than naming one stack, so swapping host
//! controllers (MAX3421E over SPI today; a native RP2350 OTG peripheral
//! on a future board) never touches [`crate::dispatch`].

use picoverse_sunrise::usb::{UsbMassStorageHost, UsbTransferError};

/// Stand-in host used whenever no physical USB storage device is wired
/// up (boards bringing up the bus engine before the Sunrise daughter
/// board is attached, or any mapper other than 10/11). Reports
/// permanently unmounted; every command sees "not mounted" per §7.
pub struct NoUsbHost;

impl UsbMassStorageHost for NoUsbHost {
    fn poll(&mut self) {}

    fn is_mounted(&self) -> bool {
        false
    }

    fn block_count(&self) -> u32 {
        0
    }

    fn block_size(&self) -> u16 {
        512
    }

    fn vendor(&self) -> &str {
        ""
    }

    fn product(&self) -> &str {
        ""
    }

    fn revision(&self) -> &str {
        ""
    }

    fn read10(&mut self, _lba: u32, _buf: &mut [u8; 512]) -> Result<(), UsbTransferError> {
        Err(UsbTransferError::CommandFailed)
    }

    fn write10(&mut self, _lba: u32, _buf: &[u8; 512]) -> Result<(), UsbTransferError> {
        Err(UsbTransferError::CommandFailed)
    }
}
