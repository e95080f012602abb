//! Component A — pin/clock abstraction.
//!
//! This module names the bus lines the cartridge edge connector exposes and
//! the clock targets the firmware configures at boot. It does not bind to
//! GPIO numbers: the board crate (`firmware`) maps each [`BusLine`] to a
//! concrete pin and builds the PIO programs that watch them. Keeping the
//! names here (rather than scattering raw pin numbers through the mapper
//! code) means every other crate in the workspace talks about "/SLTSL" and
//! "/WAIT", never "GPIO22".

/// One of the MSX edge-connector signals the cartridge must drive or sample.
#[derive(Clone, Copy, Debug, PartialEq, Eq, defmt::Format)]
pub enum BusLine {
    /// A0..A15, sampled as a contiguous 16-bit group by the PIO input shifter.
    Address,
    /// D0..D7, driven during a serviced read and sampled during a captured write.
    Data,
    /// Active-low read strobe.
    Rd,
    /// Active-low write strobe.
    Wr,
    /// Active-low I/O request strobe (distinguishes I/O cycles from memory cycles).
    IoRq,
    /// Active-low slot select; asserted by the MSX when this cartridge's
    /// memory slot is addressed.
    SltSl,
    /// Active-low wait-state line the cartridge drives to stretch a cycle.
    Wait,
    /// Bus direction control for the data bus transceiver, where the board
    /// has one (high = cartridge drives, low = cartridge listens).
    BusDir,
}

/// System clock targets. The bus engine's timing budget (§4.1, ≤280 ns per
/// serviced cycle before /WAIT is asserted) is only met above the low end
/// of this range; the high end is the fastest the board's flash/SRAM timing
/// has been characterized at.
pub const MIN_SYSTEM_CLOCK_HZ: u32 = 250_000_000;
pub const MAX_SYSTEM_CLOCK_HZ: u32 = 285_000_000;

/// Konami SCC master clock, fixed by the chip being emulated (§4.7).
pub const SCC_CLOCK_HZ: u32 = 3_579_545;

/// I²S sample rate the DAC is configured for (§4.7, §6.5).
pub const AUDIO_SAMPLE_RATE_HZ: u32 = 44_100;
