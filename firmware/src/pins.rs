//! Component A — GPIO binding. Maps each [`picoverse_core::pins::BusLine`]
//! to a concrete pin number and configures it for PIO use. The cartridge
//! edge connector's address/data/strobe lines are wired to a contiguous
//! run of GPIOs so the PIO `in`/`out` groups in [`crate::pio_bus`] and
//! [`crate::io_bus`] can capture/drive them in one shift.

use rp2040_hal::gpio::{FunctionPio0, Pin, PullDown};
use rp2040_hal::pac;

/// GPIO0..15: the Z80 address bus, A0..A15, captured by the read/write
/// responder's `in pins, 16`/`in pins, 32` groups.
pub const ADDRESS_BASE_PIN: u8 = 0;
/// GPIO16..23: the Z80 data bus, D0..D7, shared between read-drive and
/// write-capture.
pub const DATA_BASE_PIN: u8 = 16;
/// GPIO24: /SLTSL.
pub const SLTSL_PIN: u8 = 24;
/// GPIO25: /RD.
pub const RD_PIN: u8 = 25;
/// GPIO26: /WR.
pub const WR_PIN: u8 = 26;
/// GPIO27: /IORQ.
pub const IORQ_PIN: u8 = 27;
/// GPIO28: /WAIT, side-set output from the read responder.
pub const WAIT_PIN: u8 = 28;

/// Owns the `Pin` handles for the duration of the firmware's single run;
/// none of these are ever reconfigured once [`CartridgePins::claim`] has
/// handed the underlying GPIO numbers to the PIO block.
pub struct CartridgePins {
    pub address: [Pin<rp2040_hal::gpio::DynPinId, FunctionPio0, PullDown>; 16],
    pub data: [Pin<rp2040_hal::gpio::DynPinId, FunctionPio0, PullDown>; 8],
    pub sltsl: Pin<rp2040_hal::gpio::DynPinId, FunctionPio0, PullDown>,
    pub rd: Pin<rp2040_hal::gpio::DynPinId, FunctionPio0, PullDown>,
    pub wr: Pin<rp2040_hal::gpio::DynPinId, FunctionPio0, PullDown>,
    pub iorq: Pin<rp2040_hal::gpio::DynPinId, FunctionPio0, PullDown>,
    pub wait: Pin<rp2040_hal::gpio::DynPinId, FunctionPio0, PullDown>,
}

impl CartridgePins {
    /// Claims every cartridge-edge GPIO and switches it to the PIO0
    /// function. Must run before [`crate::pio_bus::install`] /
    /// [`crate::io_bus::install`] load their programs.
    pub fn claim(pins: rp2040_hal::gpio::Pins) -> Self {
        let to_pio = |pin: rp2040_hal::gpio::DynPin| pin.into_function::<FunctionPio0>().into_pull_type::<PullDown>();

        let address = core::array::from_fn(|i| to_pio(pins.gpio(ADDRESS_BASE_PIN + i as u8).into()));
        let data = core::array::from_fn(|i| to_pio(pins.gpio(DATA_BASE_PIN + i as u8).into()));

        Self {
            address,
            data,
            sltsl: to_pio(pins.gpio(SLTSL_PIN).into()),
            rd: to_pio(pins.gpio(RD_PIN).into()),
            wr: to_pio(pins.gpio(WR_PIN).into()),
            iorq: to_pio(pins.gpio(IORQ_PIN).into()),
            wait: to_pio(pins.gpio(WAIT_PIN).into()),
        }
    }
}
