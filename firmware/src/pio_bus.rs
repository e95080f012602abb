//! Component B — the PIO binding for the Z80 memory bus (§4.1).
//!
//! Two state machines share one PIO block: a read responder and a write
//! captor. Both watch /SLTSL; the read responder additionally drives
//! /WAIT via side-set and drives D0..D7 once the CPU has supplied a
//! response token. The programs below are the "what" of §4.1 translated
//! into PIO instructions; [`BusReads`]/[`BusWrites`] are the CPU-side
//! handles the rest of the firmware drives through
//! [`picoverse_core::bus::ReadCycleSource`]/[`WriteCycleSource`].

use fugit::HertzU32;
use pio::Program;
use rp2040_hal::pac;
use rp2040_hal::pio::{PIOBuilder, Rx, Tx, PIO, SM0, SM1};

use picoverse_core::bus::{ReadCycleSource, ResponseToken, WriteCycleSource};

use crate::pins::{RD_PIN, WAIT_PIN};

/// /SLTSL, /RD, /WAIT, /WR are passed in as jmp-pin/side-set pins at
/// program install time (§4.1 "Hardware context"); the addresses and
/// data bus are captured as a contiguous 16-/8-bit IN group starting at
/// the board's chosen base pin (see [`crate::pins::CartridgePins`]).
pub fn read_responder_program() -> Program<32> {
    pio_proc::pio_asm!(
        ".side_set 1 opt",
        ".wrap_target",
        "restart:",
        "    wait 0 gpio 24",      // /SLTSL asserted
        "    mov osr, ~null",
        "poll_rd:",
        "    jmp pin restart",     // /SLTSL rose before /RD fell: re-check (the "race fix")
        "    in pins, 16",
        "    push noblock",
        "    pull block       side 0", // assert /WAIT low, block for the response token
        "    out pindirs, 8",
        "    out pins, 8",
        "    wait 1 gpio 25",      // wait for /RD to rise: end of cycle
        "    mov osr, null",
        "    out pindirs, 8   side 1", // tri-state D0..D7, release /WAIT
        ".wrap",
    )
    .program
}

/// Write captor: samples A0..A15 and D0..D7 as one 32-bit word on
/// /SLTSL && /WR, pushes it whole so the CPU side can split it back into
/// (addr, data) without a second FIFO pop.
pub fn write_captor_program() -> Program<32> {
    pio_proc::pio_asm!(
        ".wrap_target",
        "    wait 0 gpio 24",  // /SLTSL asserted
        "    wait 0 gpio 26",  // /WR asserted
        "    in pins, 32",
        "    push block",
        "    wait 1 gpio 26",  // /WR released: end of cycle
        ".wrap",
    )
    .program
}

/// Address/data capture side of the read-responder SM. Holds the RX FIFO
/// (one word per cycle: the captured 16-bit address) and the TX FIFO
/// (one word per cycle: the encoded [`ResponseToken`]).
pub struct BusReads {
    rx: Rx<(pac::PIO0, SM0)>,
    tx: Tx<(pac::PIO0, SM0)>,
}

impl BusReads {
    pub fn new(rx: Rx<(pac::PIO0, SM0)>, tx: Tx<(pac::PIO0, SM0)>) -> Self {
        Self { rx, tx }
    }
}

impl BusReads {
    /// Non-blocking poll, used by loops that must also service a second
    /// PIO block's FIFOs in the same iteration (§4.8 expanded-slot loop).
    pub fn try_next_address(&mut self) -> Option<u16> {
        self.rx.read().map(|word| word as u16)
    }
}

impl ReadCycleSource for BusReads {
    fn next_address(&mut self) -> u16 {
        loop {
            if let Some(word) = self.rx.read() {
                return word as u16;
            }
        }
    }

    fn respond(&mut self, token: ResponseToken) {
        while !self.tx.write(token.encode() as u32) {}
    }
}

/// Write-captor side: one 32-bit word per write cycle, (data << 16) | addr.
pub struct BusWrites {
    rx: Rx<(pac::PIO0, SM1)>,
}

impl BusWrites {
    pub fn new(rx: Rx<(pac::PIO0, SM1)>) -> Self {
        Self { rx }
    }
}

impl WriteCycleSource for BusWrites {
    fn try_pop_write(&mut self) -> Option<(u16, u8)> {
        self.rx.read().map(|word| ((word & 0xFFFF) as u16, (word >> 16) as u8))
    }
}

/// Installs both programs on PIO0's SM0/SM1 at the clock divider needed
/// to keep pace with the Z80's ~280 ns cycle (§4.1, §5 timing budgets).
/// `sys_clock` is the configured system clock (§A "Component A"); the
/// state machines run undivided, since every instruction must resolve
/// inside a handful of nanoseconds.
pub fn install(
    pio: &mut PIO<pac::PIO0>,
    sm0: rp2040_hal::pio::UninitStateMachine<(pac::PIO0, SM0)>,
    sm1: rp2040_hal::pio::UninitStateMachine<(pac::PIO0, SM1)>,
    _sys_clock: HertzU32,
) -> (BusReads, BusWrites) {
    let read_program = pio.install(&read_responder_program()).unwrap();
    let (mut read_sm, read_rx, read_tx) = PIOBuilder::from_program(read_program)
        .in_pin_base(0)
        .out_pins(0, 8)
        .set_pins(0, 8)
        .jmp_pin(RD_PIN)
        .side_set_pin_base(WAIT_PIN)
        .autopush(false)
        .autopull(false)
        .build(sm0);
    read_sm.set_pindirs((0..8).map(|p| (p, rp2040_hal::pio::PinDir::Input)));
    read_sm.start();

    let write_program = pio.install(&write_captor_program()).unwrap();
    let (mut write_sm, write_rx, _write_tx) = PIOBuilder::from_program(write_program)
        .in_pin_base(0)
        .autopush(false)
        .build(sm1);
    write_sm.start();

    (BusReads::new(read_rx, read_tx), BusWrites::new(write_rx))
}
