//! Core-1 entry point for Component I (§4.7). Pulls samples out of the
//! shared synth, boosts and duplicates them into a [`StereoBuffer`], and
//! pushes the buffer to the I²S PIO output in a tight loop — the same
//! "board stashes a `&'static mut`, core 1 takes it once" handoff
//! [`crate::usb_bridge`] uses for Component H.

use picoverse_scc_audio::bridge::fill_buffer;
use picoverse_scc_audio::dac::BufferPool;

use crate::i2s::I2sOutput;
use crate::scc_host::SilentSynth;

static mut SHARED_SYNTH: Option<&'static mut SilentSynth> = None;
static mut SHARED_I2S: Option<I2sOutput> = None;

/// # Safety
/// Must run on core 0 before `spawn(.., entry)`, and at most once per
/// cartridge boot.
pub unsafe fn stash(synth: &'static mut SilentSynth, i2s: I2sOutput) {
    unsafe {
        SHARED_SYNTH = Some(synth);
        SHARED_I2S = Some(i2s);
    }
}

/// Core 1's body while the Konami SCC mapper (3) is active. Cycles a
/// 3-buffer pool (§4.7): fill the next buffer while the previous one
/// drains out through PIO1.
pub fn entry() -> ! {
    #[allow(static_mut_refs)]
    let synth = unsafe { SHARED_SYNTH.take() }.expect("audio bridge entered without a stashed synth");
    #[allow(static_mut_refs)]
    let mut i2s = unsafe { SHARED_I2S.take() }.expect("audio bridge entered without a stashed I2sOutput");
    let mut pool = BufferPool::new();
    loop {
        let buffer = pool.take();
        fill_buffer(synth, buffer);
        i2s.push_buffer(buffer);
    }
}
