#![cfg_attr(not(test), no_std)]

//! Shared primitives for the MSX cartridge firmware: the PIO-facing bus
//! protocol, the ROM cache, the GPIO/clock naming used by every board
//! variant, and the small error types that cross component boundaries.
//!
//! Nothing in this crate touches a specific HAL. Board wiring (actual PIO
//! programs, GPIO pin binding, clock configuration) lives in the `firmware`
//! crate; this crate only defines the contracts those pieces satisfy, so
//! the bus protocol and ROM cache policy can be driven by plain
//! `#[cfg(test)]` doubles on the host.

pub mod bus;
pub mod error;
pub mod pins;
pub mod rom_cache;

pub mod prelude {
    pub use crate::bus::{
        BusEngine, ReadCycleSource, ResponseToken, WriteCycleSource, service_plain_read_cycle,
        service_read_cycle,
    };
    pub use crate::error::CartridgeError;
    pub use crate::rom_cache::{RomCache, RomSource};
}
