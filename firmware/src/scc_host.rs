//! Component I's board half. Like [`crate::usb_host`], §6.6 leaves the
//! concrete SCC/SCC+ synth library unspecified; this module is the seam
//! a board support crate wires a real synth implementation into via
//! [`picoverse_scc_audio::SccSynth`]. `main` only needs this when mapper
//! 3's SCC-audio flag is set (§4.3 "SCC overlay"); every other mapper
//! never touches it.

use picoverse_scc_audio::SccSynth;

/// Stand-in synth for ROMs that don't set the SCC-audio flag. Never
/// claims a register read and always produces silence, so
/// [`picoverse_mappers::konami::KonamiScc`] can be driven uniformly
/// whether or not audio is actually enabled.
pub struct SilentSynth;

impl SccSynth for SilentSynth {
    fn reset(&mut self, _clock_hz: u32, _sample_rate_hz: u32, _enhanced: bool) {}

    fn write(&mut self, _addr: u16, _data: u8) {}

    fn read(&mut self, _addr: u16) -> u8 {
        0xFF
    }

    fn is_active(&self) -> bool {
        false
    }

    fn base_address(&self) -> u16 {
        0x9000
    }

    fn calc(&mut self) -> i16 {
        0
    }
}
