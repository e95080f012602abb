//! I²S DAC output (§6.5, §4.7): one PIO state machine driving the data
//! line side-set to bit clock and word select, fed by DMA from whichever
//! [`picoverse_scc_audio::dac::StereoBuffer`] core 1 last filled. Lives on
//! PIO1 so it never contends with the bus engine's state machines on PIO0.

use pio::Program;
use rp2040_hal::pac;
use rp2040_hal::pio::{PIOBuilder, Tx, PIO, SM0};

use picoverse_scc_audio::dac::StereoBuffer;

pub fn program() -> Program<32> {
    pio_proc::pio_asm!(
        ".side_set 2",
        ".wrap_target",
        "    set x, 14          side 0b01",
        "left_bit:",
        "    out pins, 1        side 0b00",
        "    jmp x-- left_bit   side 0b01",
        "    out pins, 1        side 0b10",
        "    set x, 14          side 0b11",
        "right_bit:",
        "    out pins, 1        side 0b10",
        "    jmp x-- right_bit  side 0b11",
        "    out pins, 1        side 0b00",
        ".wrap",
    )
    .program
}

pub struct I2sOutput {
    tx: Tx<(pac::PIO1, SM0)>,
}

impl I2sOutput {
    pub fn new(tx: Tx<(pac::PIO1, SM0)>) -> Self {
        Self { tx }
    }

    /// Pushes one buffer's worth of frames, blocking on the TX FIFO per
    /// frame the way the PIO program consumes them one OSR load at a
    /// time (§4.7: 256 frames / 44100 Hz ≈ 5.8 ms per buffer).
    pub fn push_buffer(&mut self, buffer: &StereoBuffer) {
        for frame in buffer.frames.iter() {
            let word = ((frame[0] as u16 as u32) << 16) | (frame[1] as u16 as u32);
            while !self.tx.write(word) {}
        }
    }
}

pub fn install(
    pio: &mut PIO<pac::PIO1>,
    sm0: rp2040_hal::pio::UninitStateMachine<(pac::PIO1, SM0)>,
) -> I2sOutput {
    let installed = pio.install(&program()).unwrap();
    let (mut sm, _rx, tx) = PIOBuilder::from_program(installed).out_pins(0, 1).build(sm0);
    sm.start();
    I2sOutput::new(tx)
}
