//! Component F — the second PIO block for I/O cycles, used only by
//! mapper 11's expanded-slot page-register ports (§4.1 "I/O bus
//! extension", §4.8). Triggered by /IORQ + /RD or /IORQ + /WR instead of
//! /SLTSL, and — per §9 open question 1 — /WAIT is deliberately never
//! asserted here: the CPU side must answer from SRAM only, fast enough
//! to beat the Z80's un-stretched I/O cycle.

use pio::Program;
use rp2040_hal::pac;
use rp2040_hal::pio::{PIOBuilder, Rx, Tx, PIO, SM2, SM3};

use picoverse_core::bus::{ReadCycleSource, ResponseToken, WriteCycleSource};

pub fn io_read_program() -> Program<32> {
    pio_proc::pio_asm!(
        ".wrap_target",
        "    wait 0 gpio 27",  // /IORQ
        "    wait 0 gpio 25",  // /RD
        "    in pins, 8",
        "    push noblock",
        "    pull block",
        "    out pindirs, 8",
        "    out pins, 8",
        "    wait 1 gpio 25",
        "    mov osr, null",
        "    out pindirs, 8",
        ".wrap",
    )
    .program
}

pub fn io_write_program() -> Program<32> {
    pio_proc::pio_asm!(
        ".wrap_target",
        "    wait 0 gpio 27",
        "    wait 0 gpio 26",
        "    in pins, 16",
        "    push block",
        "    wait 1 gpio 26",
        ".wrap",
    )
    .program
}

pub struct IoReads {
    rx: Rx<(pac::PIO0, SM2)>,
    tx: Tx<(pac::PIO0, SM2)>,
}

impl IoReads {
    pub fn new(rx: Rx<(pac::PIO0, SM2)>, tx: Tx<(pac::PIO0, SM2)>) -> Self {
        Self { rx, tx }
    }
}

impl IoReads {
    /// Non-blocking poll (§4.8: the expanded-slot loop must service both
    /// PIO blocks in one iteration, never blocking on either alone).
    pub fn try_next_address(&mut self) -> Option<u16> {
        self.rx.read().map(|word| (word & 0xFF) as u16)
    }
}

impl ReadCycleSource for IoReads {
    fn next_address(&mut self) -> u16 {
        loop {
            if let Some(word) = self.rx.read() {
                return (word & 0xFF) as u16;
            }
        }
    }

    fn respond(&mut self, token: ResponseToken) {
        while !self.tx.write(token.encode() as u32) {}
    }
}

pub struct IoWrites {
    rx: Rx<(pac::PIO0, SM3)>,
}

impl IoWrites {
    pub fn new(rx: Rx<(pac::PIO0, SM3)>) -> Self {
        Self { rx }
    }
}

impl WriteCycleSource for IoWrites {
    fn try_pop_write(&mut self) -> Option<(u16, u8)> {
        self.rx.read().map(|word| ((word & 0xFF) as u16, ((word >> 8) & 0xFF) as u8))
    }
}

/// Installs both I/O programs on PIO0's remaining two state machines
/// (SM2/SM3); the bus read/write programs already occupy SM0/SM1 (§4.1).
/// Only instantiated for mapper 11 (§4.8): every other mapper leaves
/// these state machines unconfigured.
pub fn install(
    pio: &mut PIO<pac::PIO0>,
    sm2: rp2040_hal::pio::UninitStateMachine<(pac::PIO0, SM2)>,
    sm3: rp2040_hal::pio::UninitStateMachine<(pac::PIO0, SM3)>,
) -> (IoReads, IoWrites) {
    let read_program = pio.install(&io_read_program()).unwrap();
    let (mut read_sm, read_rx, read_tx) = PIOBuilder::from_program(read_program)
        .in_pin_base(0)
        .out_pins(0, 8)
        .set_pins(0, 8)
        .build(sm2);
    read_sm.start();

    let write_program = pio.install(&io_write_program()).unwrap();
    let (mut write_sm, write_rx, _write_tx) = PIOBuilder::from_program(write_program)
        .in_pin_base(0)
        .build(sm3);
    write_sm.start();

    (IoReads::new(read_rx, read_tx), IoWrites::new(write_rx))
}
